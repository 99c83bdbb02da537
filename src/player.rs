/*
 *  player.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Playback scheduler - drives one prepared source onto the panel
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

use log::{debug, trace, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::clock::Clock;
use crate::display::{BoxedDriver, DisplayError, FrameCanvas};
use crate::pacer::Pacer;
use crate::source::PreparedSource;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("display error: {0}")]
    Display(#[from] DisplayError),
}

/// Why playback of a source stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Requested number of loops shown
    LoopsDone,
    /// Time budget used up
    Deadline,
    /// Stop requested from outside
    Cancelled,
    /// A whole pass produced no frame
    NoFrames,
    /// The frame stream could not be read any further
    StreamFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    pub reason: Termination,
    /// Passes started over the frame stream
    pub loops: u64,
    /// Frames swapped onto the panel
    pub frames: u64,
    /// Frames whose swap alone used the whole delay
    pub overruns: u64,
    pub swap_ema_ms: f32,
}

/// Owns the panel for a session and plays sources on it one at a time
pub struct Player {
    driver: BoxedDriver,
    clock: Arc<dyn Clock>,
    cancel: CancelToken,
    vsync_multiple: u32,
    canvas: Option<FrameCanvas>,
}

impl Player {
    pub fn new(driver: BoxedDriver, clock: Arc<dyn Clock>, cancel: CancelToken, vsync_multiple: u32) -> Self {
        Self {
            driver,
            clock,
            cancel,
            vsync_multiple: vsync_multiple.max(1),
            canvas: None,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Blank the panel
    pub fn clear(&mut self) -> Result<(), PlayerError> {
        self.driver.clear()?;
        Ok(())
    }

    /// Give the driver back, e.g. to inspect it after a test run
    pub fn into_driver(self) -> BoxedDriver {
        self.driver
    }

    /// Play `source` until its loop count, its time budget or cancellation
    /// ends it, whichever comes first.
    ///
    /// The deadline is fixed when playback starts. A frame read before the
    /// deadline is always shown and held for its full delay, so the last
    /// frame may run past the deadline by up to one delay.
    ///
    /// A frame that fails to read ends this source only; the stream is
    /// rewound and the failure shows up as [`Termination::StreamFailed`].
    pub fn play(&mut self, source: &mut PreparedSource) -> Result<PlaybackReport, PlayerError> {
        let timing = source.timing;
        let deadline = self.clock.now() + timing.session_budget(source.is_multi_frame);
        let mut canvas = match self.canvas.take() {
            Some(canvas) => canvas,
            None => self.driver.create_frame_canvas(),
        };
        let mut pacer = Pacer::new();
        let mut loops: u64 = 0;

        debug!("Playing {} (multi-frame: {}, loops: {}, budget: {:?})",
            source.name, source.is_multi_frame, timing.loops,
            timing.session_budget(source.is_multi_frame));

        let reason = loop {
            if self.cancel.is_cancelled() {
                break Termination::Cancelled;
            }
            if !timing.has_unbounded_loops() && loops >= timing.loops as u64 {
                break Termination::LoopsDone;
            }
            if self.clock.now() >= deadline {
                break Termination::Deadline;
            }

            let shown_before = pacer.frames();
            let mut stream_failed = false;
            while !self.cancel.is_cancelled() && self.clock.now() <= deadline {
                let intrinsic_us = match source.stream.read_next(&mut canvas) {
                    Ok(Some(us)) => us,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("{}: {}, giving up on this source", source.name, e);
                        stream_failed = true;
                        break;
                    }
                };
                let delay = timing.effective_delay(intrinsic_us);

                let t0 = self.clock.now();
                canvas = self.driver.swap_on_vsync(canvas, self.vsync_multiple)?;
                let spent = self.clock.now().saturating_sub(t0);

                let hold = pacer.remaining(delay, spent);
                trace!("{}: frame {} delay {:?} swap {:?}", source.name, pacer.frames(), delay, spent);
                self.clock.sleep_unless_cancelled(hold, &self.cancel);
            }
            source.stream.rewind();
            loops = loops.saturating_add(1);

            if stream_failed {
                break Termination::StreamFailed;
            }
            if pacer.frames() == shown_before && !self.cancel.is_cancelled() && self.clock.now() <= deadline {
                break Termination::NoFrames;
            }
        };

        self.canvas = Some(canvas);
        let report = PlaybackReport {
            reason,
            loops,
            frames: pacer.frames(),
            overruns: pacer.overruns(),
            swap_ema_ms: pacer.swap_ema_ms(),
        };
        debug!("{}: {:?} after {} loop(s), {} frame(s), swap avg {:.2}ms",
            source.name, report.reason, report.loops, report.frames, report.swap_ema_ms);
        Ok(report)
    }
}
