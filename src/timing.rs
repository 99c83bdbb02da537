/*
 *  timing.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Per-source timing directives and the command line timeline binder
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

/// "Unbounded" sentinel, far beyond any real session (2^40 ms, ~34 years)
pub const DISTANT_FUTURE_MS: i64 = 1 << 40;

/// Default display time of a still image
pub const DEFAULT_WAIT_MS: i64 = 1500;

/// Timing directives bound to a single source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Wall clock cap for animations
    pub anim_duration_ms: i64,

    /// How long a still image stays up
    pub wait_ms: i64,

    /// Frame delay override, negative = use the delay stored with each frame
    pub anim_delay_ms: i64,

    /// Loop count, negative = unbounded
    pub loops: i32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            anim_duration_ms: DISTANT_FUTURE_MS,
            wait_ms: DEFAULT_WAIT_MS,
            anim_delay_ms: -1,
            loops: -1,
        }
    }
}

impl TimingConfig {
    pub fn has_unbounded_duration(&self) -> bool {
        self.anim_duration_ms >= DISTANT_FUTURE_MS
    }

    pub fn has_unbounded_loops(&self) -> bool {
        self.loops < 0
    }

    /// Wall clock budget for one playback session of this source.
    /// Animations are capped by the duration directive, stills by the wait.
    pub fn session_budget(&self, is_multi_frame: bool) -> Duration {
        let ms = if is_multi_frame { self.anim_duration_ms } else { self.wait_ms };
        Duration::from_millis(ms.max(0) as u64)
    }

    /// Inter-frame delay after applying the override, if any
    pub fn effective_delay(&self, intrinsic_us: u32) -> Duration {
        if self.anim_delay_ms >= 0 {
            Duration::from_millis(self.anim_delay_ms as u64)
        } else {
            Duration::from_micros(intrinsic_us as u64)
        }
    }

    /// Mutate the active configuration with one directive
    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Wait(ms) => self.wait_ms = ms,
            Directive::Duration(ms) => self.anim_duration_ms = ms,
            Directive::Loops(n) => self.loops = n,
            Directive::Delay(ms) => self.anim_delay_ms = ms,
        }
    }
}

/// A timing directive as issued on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `-w`: still image wait
    Wait(i64),
    /// `-t`: animation duration cap
    Duration(i64),
    /// `-l`: loop count
    Loops(i32),
    /// `-D`: frame delay override
    Delay(i64),
}

impl Directive {
    /// Seconds (fractional) to whole milliseconds, rounded
    pub fn seconds_to_ms(seconds: f32) -> i64 {
        (seconds * 1000.0).round() as i64
    }
}

/// One entry of the ordered command line
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent<S> {
    Directive(Directive),
    Source(S),
}

/// Stamp every source with a copy of the configuration active at its position.
///
/// Directives only ever affect sources that follow them; sources already seen
/// keep the snapshot they were given.
pub fn bind_timeline<S, I>(events: I) -> Vec<(S, TimingConfig)>
where
    I: IntoIterator<Item = TimelineEvent<S>>,
{
    let mut active = TimingConfig::default();
    let mut bound = Vec::new();
    for event in events {
        match event {
            TimelineEvent::Directive(d) => active.apply(d),
            TimelineEvent::Source(s) => bound.push((s, active)),
        }
    }
    bound
}
