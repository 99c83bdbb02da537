/*
 *  lib.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Paced image and animation playback for RGB LED matrix panels
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

pub mod cancel;
pub mod cli;
pub mod clock;
pub mod config;
pub mod display;
pub mod func_timer;
pub mod pacer;
pub mod player;
pub mod playlist;
pub mod prepare;
pub mod source;
pub mod stream;
pub mod timing;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

pub use cancel::CancelToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use player::{PlaybackReport, Player, PlayerError, Termination};
pub use playlist::{Playlist, PlaylistError, RunSummary};
pub use prepare::{ContentPreparer, PrepareError, PrepareOptions, Prepared};
pub use source::PreparedSource;
pub use stream::{FrameStream, StreamError};
pub use timing::{DISTANT_FUTURE_MS, TimingConfig};
