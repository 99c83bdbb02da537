/*
 *  prepare/rasterize.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Draw decoded RGBA frames onto panel canvases
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use image::RgbaImage;

use crate::display::FrameCanvas;

/// Top-left placement of an image on the canvas (floor division when centering)
pub fn placement(canvas: &FrameCanvas, image: &RgbaImage, center: bool) -> (i32, i32) {
    if !center {
        return (0, 0);
    }
    let dx = canvas.width() as i64 - image.width() as i64;
    let dy = canvas.height() as i64 - image.height() as i64;
    (dx.div_euclid(2) as i32, dy.div_euclid(2) as i32)
}

/// Copy `image` onto `canvas`.
///
/// Fully transparent pixels leave the canvas untouched, so sprites composite
/// over whatever the canvas already holds. Pixels falling off the panel are
/// dropped.
pub fn rasterize(image: &RgbaImage, center: bool, canvas: &mut FrameCanvas) {
    let (x_offset, y_offset) = placement(canvas, image, center);
    for (x, y, px) in image.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        if a == 0 {
            continue;
        }
        canvas.set_pixel(x as i32 + x_offset, y as i32 + y_offset, r, g, b);
    }
}
