/*
 *  display/framebuffer.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime-sized RGB frame canvas, the unit swapped onto the matrix
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::display::error::DisplayError;

/// Bytes per pixel in the packed RGB representation
pub const BYTES_PER_PIXEL: usize = 3;

/// Off-screen pixel buffer for one full panel frame.
///
/// Drivers hand these out and take them back on every swap, so a canvas is
/// always the exact size of the panel it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCanvas {
    buf: Vec<Rgb888>,
    w: usize,
    h: usize,
}

impl FrameCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![Rgb888::BLACK; w * h], w, h }
    }

    pub fn width(&self) -> u32 { self.w as u32 }
    pub fn height(&self) -> u32 { self.h as u32 }

    /// Set one pixel; coordinates off the panel are silently dropped
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8) {
        if let Some(i) = self.idx(Point::new(x, y)) {
            self.buf[i] = Rgb888::new(r, g, b);
        }
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.idx(Point::new(x, y)).map(|i| self.buf[i])
    }

    /// Blank the whole canvas
    pub fn clear(&mut self) {
        self.buf.fill(Rgb888::BLACK);
    }

    pub fn as_slice(&self) -> &[Rgb888] { &self.buf }

    /// Size of the packed RGB form in bytes
    pub fn packed_len(&self) -> usize {
        self.buf.len() * BYTES_PER_PIXEL
    }

    /// Pack pixels as consecutive R, G, B bytes, row major
    pub fn write_rgb_bytes(&self, out: &mut Vec<u8>) {
        out.reserve(self.packed_len());
        for px in &self.buf {
            out.extend_from_slice(&[px.r(), px.g(), px.b()]);
        }
    }

    /// Overwrite every pixel from a packed RGB buffer of exactly `packed_len()` bytes
    pub fn load_rgb_bytes(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        if bytes.len() != self.packed_len() {
            return Err(DisplayError::BufferSizeMismatch {
                expected: self.packed_len(),
                actual: bytes.len(),
            });
        }
        for (px, rgb) in self.buf.iter_mut().zip(bytes.chunks_exact(BYTES_PER_PIXEL)) {
            *px = Rgb888::new(rgb[0], rgb[1], rgb[2]);
        }
        Ok(())
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl OriginDimensions for FrameCanvas {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for FrameCanvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color);
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Size { width, height } = area.size;
        if width == 0 || height == 0 { return Ok(()); }
        let (x0, y0) = (area.top_left.x as usize, area.top_left.y as usize);
        for row in y0..y0 + height as usize {
            let base = row * self.w;
            self.buf[base + x0..base + x0 + width as usize].fill(color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Line};

    #[test]
    fn test_set_pixel_ignores_off_panel() {
        let mut canvas = FrameCanvas::new(4, 2);
        canvas.set_pixel(-1, 0, 255, 0, 0);
        canvas.set_pixel(4, 0, 255, 0, 0);
        canvas.set_pixel(0, 2, 255, 0, 0);
        canvas.set_pixel(3, 1, 1, 2, 3);
        assert!(canvas.as_slice()[..7].iter().all(|p| *p == Rgb888::BLACK));
        assert_eq!(canvas.get_pixel(3, 1), Some(Rgb888::new(1, 2, 3)));
        assert_eq!(canvas.get_pixel(4, 1), None);
    }

    #[test]
    fn test_rgb_bytes_round_trip() {
        let mut canvas = FrameCanvas::new(2, 2);
        canvas.set_pixel(1, 0, 10, 20, 30);
        let mut bytes = Vec::new();
        canvas.write_rgb_bytes(&mut bytes);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[3..6], &[10, 20, 30]);

        let mut other = FrameCanvas::new(2, 2);
        other.load_rgb_bytes(&bytes).unwrap();
        assert_eq!(other, canvas);
    }

    #[test]
    fn test_load_rejects_wrong_size() {
        let mut canvas = FrameCanvas::new(2, 2);
        let err = canvas.load_rgb_bytes(&[0; 5]).unwrap_err();
        assert!(matches!(err, DisplayError::BufferSizeMismatch { expected: 12, actual: 5 }));
    }

    #[test]
    fn test_embedded_graphics_drawing() {
        let mut canvas = FrameCanvas::new(8, 8);
        Line::new(Point::new(0, 0), Point::new(7, 7))
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::GREEN, 1))
            .draw(&mut canvas)
            .unwrap();
        assert_eq!(canvas.get_pixel(3, 3), Some(Rgb888::GREEN));
        canvas.clear();
        assert_eq!(canvas.get_pixel(3, 3), Some(Rgb888::BLACK));
    }
}
