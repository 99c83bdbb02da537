/*
 *  prepare/scale.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scale-to-fit geometry for the panel
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
use image::imageops::{self, FilterType};

/// Which panel axes the image must cover completely
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillMode {
    pub fill_width: bool,
    pub fill_height: bool,
}

/// Output size of an `image_w` x `image_h` image fitted to the target.
///
/// - both fills: the larger axis fraction applied to both axes, aspect kept,
///   the other axis may overflow the panel
/// - height only: height pinned, width follows the aspect ratio
/// - width only: width pinned, height follows the aspect ratio
/// - neither: exact target size, aspect may distort
pub fn fit_dimensions(
    image_w: u32,
    image_h: u32,
    target_w: u32,
    target_h: u32,
    fill: FillMode,
) -> (u32, u32) {
    if image_w == 0 || image_h == 0 {
        return (target_w, target_h);
    }
    let width_fraction = target_w as f32 / image_w as f32;
    let height_fraction = target_h as f32 / image_h as f32;
    let scaled = |fraction: f32, len: u32| ((fraction * len as f32).round() as u32).max(1);

    match (fill.fill_width, fill.fill_height) {
        (true, true) => {
            let larger = width_fraction.max(height_fraction);
            (scaled(larger, image_w), scaled(larger, image_h))
        }
        (false, true) => (scaled(height_fraction, image_w), target_h),
        (true, false) => (target_w, scaled(width_fraction, image_h)),
        (false, false) => (target_w, target_h),
    }
}

/// Resize every frame to the same fitted size, computed from the first frame
pub fn scale_frames(
    frames: Vec<RgbaImage>,
    target_w: u32,
    target_h: u32,
    fill: FillMode,
    filter: FilterType,
) -> Vec<RgbaImage> {
    let Some(first) = frames.first() else {
        return frames;
    };
    let (w, h) = fit_dimensions(first.width(), first.height(), target_w, target_h, fill);
    frames
        .into_iter()
        .map(|img| {
            if img.dimensions() == (w, h) {
                img
            } else {
                imageops::resize(&img, w, h, filter)
            }
        })
        .collect()
}
