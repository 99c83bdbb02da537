/*
 *  func_timer.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scope timer, reports how long a phase took when it goes out of scope
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
use log::info;
use std::time::{Duration, Instant};

pub struct FunctionTimer {
    name: &'static str,
    next: Option<&'static str>,
    start: Instant,
}

impl FunctionTimer {
    pub fn new(name: &'static str) -> Self {
        FunctionTimer {
            name,
            next: None,
            start: Instant::now(),
        }
    }

    /// Name the phase that follows, shown in the report
    pub fn then(mut self, next: &'static str) -> Self {
        self.next = Some(next);
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

// Report on the way out, whichever way the scope is left
impl Drop for FunctionTimer {
    fn drop(&mut self) {
        let secs = self.start.elapsed().as_secs_f64();
        match self.next {
            Some(next) => info!("{} took {:.3}s; now: {}", self.name, secs, next),
            None => info!("{} took {:.3}s", self.name, secs),
        }
    }
}
