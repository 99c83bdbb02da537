/*
 *  display/drivers/mock.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock matrix driver for testing without hardware
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

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::clock::{Clock, ManualClock};
use crate::config::MatrixConfig;
use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameCanvas;
use crate::display::traits::{DisplayCapabilities, MatrixDriver};

/// Most recent swaps kept in `shown` and `swap_times`
pub const HISTORY_LIMIT: usize = 4096;

/// Mock matrix driver
///
/// This driver simulates a panel without requiring hardware. It's useful for:
/// - Unit and integration tests
/// - Dry runs (`driver: mock`) where swaps should never block
///
/// Every swap is recorded; with a [`ManualClock`] attached each swap also
/// costs a fixed amount of simulated time, which is how pacing is tested.
#[derive(Debug, Clone)]
pub struct MockDriver {
    front: FrameCanvas,

    capabilities: DisplayCapabilities,

    /// Simulated time source and per-swap cost
    clock: Option<(ManualClock, Duration)>,

    /// Shared state for testing
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of completed swaps
    pub swap_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Vsync multiple passed to the last swap
    pub last_vsync_multiple: Option<u32>,

    /// Last brightness value set
    pub last_brightness: Option<u8>,

    /// Top-left pixel of each frame swapped in, oldest first
    pub shown: VecDeque<Rgb888>,

    /// Simulated clock reading at the start of each swap
    pub swap_times: VecDeque<Duration>,

    /// Fire this token once `swap_count` reaches the given value
    pub cancel_after: Option<(usize, CancelToken)>,

    /// Simulate failures (for error testing)
    pub simulate_swap_failure: bool,
    pub simulate_init_failure: bool,
}

impl MockDriver {
    pub fn new(config: &MatrixConfig) -> Result<Self, DisplayError> {
        let width = config.panel_width();
        let height = config.panel_height();
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidConfiguration(format!("{}x{}", width, height)));
        }

        let capabilities = DisplayCapabilities {
            width,
            height,
            refresh_hz: config.refresh_hz(),
            supports_brightness: true,
        };

        Ok(Self {
            front: FrameCanvas::new(width, height),
            capabilities,
            clock: None,
            state: Arc::new(Mutex::new(MockDriverState::default())),
        })
    }

    /// Create a mock driver with specific dimensions
    pub fn new_with_size(width: u32, height: u32) -> Result<Self, DisplayError> {
        let config = MatrixConfig {
            cols: Some(width),
            rows: Some(height),
            ..Default::default()
        };
        Self::new(&config)
    }

    /// Charge `swap_cost` of simulated time to `clock` on every swap
    pub fn with_clock(mut self, clock: ManualClock, swap_cost: Duration) -> Self {
        self.clock = Some((clock, swap_cost));
        self
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    /// The frame currently "on the panel"
    pub fn front(&self) -> &FrameCanvas {
        &self.front
    }

    fn lock(&self) -> MutexGuard<'_, MockDriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn push_bounded<T>(history: &mut VecDeque<T>, value: T) {
    if history.len() >= HISTORY_LIMIT {
        history.pop_front();
    }
    history.push_back(value);
}

impl MatrixDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();

        if state.simulate_init_failure {
            return Err(DisplayError::InitializationFailed("Simulated init failure".to_string()));
        }

        state.init_count += 1;
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

        {
            let mut state = self.lock();
            if state.simulate_swap_failure {
                return Err(DisplayError::Other("Simulated swap failure".to_string()));
            }

            if let Some((clock, cost)) = self.clock.as_ref() {
                let now = clock.now();
                push_bounded(&mut state.swap_times, now);
                clock.advance(*cost);
            }

            state.swap_count += 1;
            state.last_vsync_multiple = Some(vsync_multiple);
            push_bounded(&mut state.shown, canvas.get_pixel(0, 0).unwrap_or(Rgb888::BLACK));

            if let Some((after, token)) = state.cancel_after.as_ref() {
                if state.swap_count >= *after {
                    token.cancel();
                }
            }
        } // Release lock before touching the buffers

        Ok(std::mem::replace(&mut self.front, canvas))
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.lock().clear_count += 1;
        self.front.clear();
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        self.lock().last_brightness = Some(percent);
        Ok(())
    }
}
