/*
 *  display/traits.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for matrix driver abstraction
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

use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameCanvas;

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Panel width in pixels (columns x chain length)
    pub width: u32,

    /// Panel height in pixels (rows x parallel chains)
    pub height: u32,

    /// Panel refresh rate, the clock swaps are aligned to
    pub refresh_hz: u32,

    /// Whether the panel supports brightness control
    pub supports_brightness: bool,
}

/// Minimal hardware abstraction - every matrix driver implements this trait
///
/// Drivers are double buffered: the caller draws into an off-screen
/// [`FrameCanvas`] and hands it over with [`MatrixDriver::swap_on_vsync`],
/// getting the previous front buffer back to draw the next frame into.
pub trait MatrixDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Bring the panel up. Called once before the first swap.
    fn init(&mut self) -> Result<(), DisplayError>;

    /// A fresh off-screen canvas matching the panel size
    fn create_frame_canvas(&self) -> FrameCanvas {
        let (w, h) = self.dimensions();
        FrameCanvas::new(w, h)
    }

    /// Show `canvas` on the next refresh boundary that is a multiple of
    /// `vsync_multiple` and return the now writable back buffer.
    ///
    /// May block until that boundary.
    fn swap_on_vsync(
        &mut self,
        canvas: FrameCanvas,
        vsync_multiple: u32,
    ) -> Result<FrameCanvas, DisplayError>;

    /// Blank the panel
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Set panel brightness in percent (1-100)
    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        if !self.capabilities().supports_brightness {
            return Err(DisplayError::UnsupportedOperation);
        }
        if percent == 0 || percent > 100 {
            return Err(DisplayError::InvalidConfiguration(
                format!("brightness {} outside 1..=100", percent)));
        }
        // Default implementation returns error; drivers should override
        Err(DisplayError::UnsupportedOperation)
    }
}
