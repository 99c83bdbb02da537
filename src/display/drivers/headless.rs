/*
 *  display/drivers/headless.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Software matrix: keeps a front buffer and paces swaps on its own
 *  refresh clock, the same way a scanned panel would
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

use log::{debug, trace};
use std::time::{Duration, Instant};

use crate::config::MatrixConfig;
use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameCanvas;
use crate::display::traits::{DisplayCapabilities, MatrixDriver};

#[derive(Debug)]
pub struct HeadlessDriver {
    capabilities: DisplayCapabilities,
    front: FrameCanvas,
    epoch: Instant,
    period: Duration,
    brightness: u8,
    swaps: u64,
}

impl HeadlessDriver {
    pub fn new(config: &MatrixConfig) -> Result<Self, DisplayError> {
        let (width, height) = (config.panel_width(), config.panel_height());
        let refresh_hz = config.refresh_hz();
        if width == 0 || height == 0 || refresh_hz == 0 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "{}x{} @ {}Hz", width, height, refresh_hz)));
        }

        Ok(Self {
            capabilities: DisplayCapabilities {
                width,
                height,
                refresh_hz,
                supports_brightness: true,
            },
            front: FrameCanvas::new(width, height),
            epoch: Instant::now(),
            period: Duration::from_nanos(1_000_000_000 / refresh_hz as u64),
            brightness: config.brightness.unwrap_or(100),
            swaps: 0,
        })
    }

    /// What is currently on the panel
    pub fn front(&self) -> &FrameCanvas {
        &self.front
    }

    pub fn swap_count(&self) -> u64 {
        self.swaps
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Next refresh tick strictly after `elapsed` that is a multiple of `vsync_multiple`
    fn next_boundary(&self, elapsed: Duration, vsync_multiple: u32) -> Duration {
        let period_ns = self.period.as_nanos().max(1);
        let tick = elapsed.as_nanos() / period_ns;
        let multiple = vsync_multiple.max(1) as u128;
        let target = (tick / multiple + 1) * multiple;
        Duration::from_nanos((target * period_ns).min(u64::MAX as u128) as u64)
    }
}

impl MatrixDriver for HeadlessDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.epoch = Instant::now();
        debug!("Headless matrix {}x{} refreshing at {}Hz",
            self.capabilities.width, self.capabilities.height, self.capabilities.refresh_hz);
        Ok(())
    }

    fn swap_on_vsync(
        &mut self,
        canvas: FrameCanvas,
        vsync_multiple: u32,
    ) -> Result<FrameCanvas, DisplayError> {
        let expected = self.dimensions();
        let actual = (canvas.width(), canvas.height());
        if expected != actual {
            return Err(DisplayError::CanvasSizeMismatch { expected, actual });
        }

        let boundary = self.next_boundary(self.epoch.elapsed(), vsync_multiple);
        let wait = boundary.saturating_sub(self.epoch.elapsed());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }

        self.swaps += 1;
        trace!("swap #{} on refresh boundary {:?}", self.swaps, boundary);
        Ok(std::mem::replace(&mut self.front, canvas))
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.front.clear();
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        if percent == 0 || percent > 100 {
            return Err(DisplayError::InvalidConfiguration(
                format!("brightness {} outside 1..=100", percent)));
        }
        self.brightness = percent;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::RgbColor;

    fn driver(hz: u32) -> HeadlessDriver {
        let config = MatrixConfig {
            rows: Some(8),
            cols: Some(16),
            refresh_hz: Some(hz),
            ..Default::default()
        };
        HeadlessDriver::new(&config).unwrap()
    }

    #[test]
    fn test_headless_creation() {
        let d = driver(100);
        assert_eq!(d.dimensions(), (16, 8));
        assert_eq!(d.create_frame_canvas().width(), 16);
        assert_eq!(d.brightness(), 100);
    }

    #[test]
    fn test_next_boundary_respects_multiple() {
        let d = driver(100); // 10ms period
        assert_eq!(d.next_boundary(Duration::from_millis(0), 1), Duration::from_millis(10));
        assert_eq!(d.next_boundary(Duration::from_millis(15), 1), Duration::from_millis(20));
        assert_eq!(d.next_boundary(Duration::from_millis(15), 3), Duration::from_millis(30));
        assert_eq!(d.next_boundary(Duration::from_millis(31), 3), Duration::from_millis(60));
        // zero behaves like one
        assert_eq!(d.next_boundary(Duration::from_millis(15), 0), Duration::from_millis(20));
    }

    #[test]
    fn test_swap_returns_previous_front() {
        let mut d = driver(1000);
        d.init().unwrap();
        let mut canvas = d.create_frame_canvas();
        canvas.set_pixel(0, 0, 9, 9, 9);

        let back = d.swap_on_vsync(canvas, 1).unwrap();
        assert_eq!(back.get_pixel(0, 0).map(|p| p.r()), Some(0));
        assert_eq!(d.front().get_pixel(0, 0).map(|p| p.r()), Some(9));
        assert_eq!(d.swap_count(), 1);

        d.clear().unwrap();
        assert_eq!(d.front().get_pixel(0, 0).map(|p| p.r()), Some(0));
    }

    #[test]
    fn test_swap_rejects_foreign_canvas() {
        let mut d = driver(1000);
        let err = d.swap_on_vsync(FrameCanvas::new(4, 4), 1).unwrap_err();
        assert!(matches!(err, DisplayError::CanvasSizeMismatch { .. }));
    }

    #[test]
    fn test_brightness_range() {
        let mut d = driver(100);
        d.set_brightness(40).unwrap();
        assert_eq!(d.brightness(), 40);
        assert!(d.set_brightness(0).is_err());
        assert!(d.set_brightness(101).is_err());
    }
}
