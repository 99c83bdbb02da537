/*
 *  source.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  A playlist entry: one decoded file, ready to play
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

use crate::stream::FrameStream;
use crate::timing::TimingConfig;

/// Fully prepared source: frames already scaled to the panel and serialized
#[derive(Debug)]
pub struct PreparedSource {
    /// Name shown in logs, normally the path given on the command line
    pub name: String,
    pub timing: TimingConfig,
    pub is_multi_frame: bool,
    pub stream: FrameStream,
}

impl PreparedSource {
    pub fn new(name: impl Into<String>, timing: TimingConfig, is_multi_frame: bool, stream: FrameStream) -> Self {
        Self { name: name.into(), timing, is_multi_frame, stream }
    }
}
