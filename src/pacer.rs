/*
 *  pacer.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame pacing: hold each frame for its delay, less the time the swap took
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
use std::time::Duration;

/// Drift compensation for a frame sequence.
///
/// A swap blocks until vsync, so some of each frame's delay is already gone
/// by the time the swap returns. Only the remainder is slept. Frames that
/// overrun are shown late and never skipped.
#[derive(Debug, Clone)]
pub struct Pacer {
    ema_ms: f32,    // moving avg of swap time
    alpha: f32,     // smoothing (0.1 ~ 0.3)
    frames: u64,
    overruns: u64,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer {
    pub fn new() -> Self {
        Self { ema_ms: 0.0, alpha: 0.2, frames: 0, overruns: 0 }
    }

    /// Record a swap that took `spent` and return how long to hold the frame
    pub fn remaining(&mut self, delay: Duration, spent: Duration) -> Duration {
        self.record_swap(spent);
        if spent >= delay && !delay.is_zero() {
            self.overruns += 1;
        }
        delay.saturating_sub(spent)
    }

    #[inline]
    fn record_swap(&mut self, spent: Duration) {
        let ms = spent.as_secs_f32() * 1000.0;
        self.ema_ms = if self.frames == 0 {
            ms
        } else {
            self.alpha * ms + (1.0 - self.alpha) * self.ema_ms
        };
        self.frames += 1;
    }

    /// Smoothed swap time in milliseconds
    pub fn swap_ema_ms(&self) -> f32 {
        self.ema_ms
    }

    /// Frames whose swap alone used up the whole delay
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
