/*
 *  playlist.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Playlist orchestration - ordering, repetition and default reconciliation
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

use log::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::player::{Player, PlayerError};
use crate::source::PreparedSource;
use crate::timing::DISTANT_FUTURE_MS;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("nothing to play")]
    Empty,
    #[error("{name}: {source}")]
    Player {
        name: String,
        #[source]
        source: PlayerError,
    },
}

/// Totals for a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passes: u64,
    pub sources_played: u64,
    pub frames: u64,
    pub cancelled: bool,
}

#[derive(Debug, Default)]
pub struct Playlist {
    sources: Vec<PreparedSource>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: PreparedSource) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[PreparedSource] {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut [PreparedSource] {
        &mut self.sources
    }

    /// Adjust defaults that only make sense once the playlist size is known.
    ///
    /// A lone source stays up until interrupted. With several sources an
    /// animation nobody bounded would never hand over, so it plays once.
    pub fn reconcile_defaults(&mut self) {
        match self.sources.as_mut_slice() {
            [] => {}
            [only] => only.timing.wait_ms = DISTANT_FUTURE_MS,
            many => {
                for source in many.iter_mut() {
                    if source.timing.has_unbounded_loops() && source.timing.has_unbounded_duration() {
                        debug!("{}: unbounded, playing once", source.name);
                        source.timing.loops = 1;
                    }
                }
            }
        }
    }

    /// Play the whole list once, or repeatedly with `forever`
    pub fn run(
        &mut self,
        player: &mut Player,
        shuffle: bool,
        forever: bool,
        cancel: &CancelToken,
    ) -> Result<RunSummary, PlaylistError> {
        self.run_with_rng(player, shuffle, forever, cancel, &mut rand::rng())
    }

    pub fn run_with_rng<R: Rng + ?Sized>(
        &mut self,
        player: &mut Player,
        shuffle: bool,
        forever: bool,
        cancel: &CancelToken,
        rng: &mut R,
    ) -> Result<RunSummary, PlaylistError> {
        if self.sources.is_empty() {
            return Err(PlaylistError::Empty);
        }

        let mut summary = RunSummary::default();
        loop {
            if shuffle {
                self.sources.shuffle(rng);
            }
            for source in self.sources.iter_mut() {
                if cancel.is_cancelled() {
                    break;
                }
                let report = player.play(source).map_err(|e| PlaylistError::Player {
                    name: source.name.clone(),
                    source: e,
                })?;
                summary.sources_played += 1;
                summary.frames += report.frames;
            }
            summary.passes += 1;

            if !forever || cancel.is_cancelled() {
                break;
            }
            debug!("Pass {} done, starting over", summary.passes);
        }

        summary.cancelled = cancel.is_cancelled();
        info!("Played {} source(s) over {} pass(es), {} frame(s)",
            summary.sources_played, summary.passes, summary.frames);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::display::{FrameCanvas, MockDriver, MockDriverState};
    use crate::stream::FrameStream;
    use crate::timing::TimingConfig;
    use embedded_graphics::pixelcolor::RgbColor;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Source of `frames` frames, each marked with red = `tag`
    fn source(tag: u8, frames: usize, timing: TimingConfig) -> PreparedSource {
        let mut stream = FrameStream::in_memory();
        let mut c = FrameCanvas::new(2, 2);
        c.set_pixel(0, 0, tag, 0, 0);
        for _ in 0..frames {
            stream.append(&c, 10_000).unwrap();
        }
        PreparedSource::new(format!("src{}", tag), timing, frames > 1, stream)
    }

    fn rig() -> (Player, Arc<Mutex<MockDriverState>>, CancelToken) {
        let clock = ManualClock::new();
        let driver = MockDriver::new_with_size(2, 2).unwrap().with_clock(clock.clone(), Duration::from_millis(1));
        let state = driver.state();
        let cancel = CancelToken::new();
        (Player::new(Box::new(driver), Arc::new(clock), cancel.clone(), 1), state, cancel)
    }

    fn shown_tags(state: &Arc<Mutex<MockDriverState>>) -> Vec<u8> {
        state.lock().unwrap().shown.iter().map(|c| c.r()).collect()
    }

    #[test]
    fn test_single_source_waits_forever() {
        let mut playlist = Playlist::new();
        playlist.push(source(1, 1, TimingConfig::default()));
        playlist.reconcile_defaults();
        assert_eq!(playlist.sources()[0].timing.wait_ms, DISTANT_FUTURE_MS);
        assert_eq!(playlist.sources()[0].timing.loops, -1);
    }

    #[test]
    fn test_several_sources_bound_unbounded_animations() {
        let mut playlist = Playlist::new();
        playlist.push(source(1, 3, TimingConfig::default()));
        playlist.push(source(2, 3, TimingConfig { loops: 4, ..TimingConfig::default() }));
        playlist.push(source(3, 3, TimingConfig { anim_duration_ms: 2000, ..TimingConfig::default() }));
        playlist.reconcile_defaults();

        let loops: Vec<i32> = playlist.sources().iter().map(|s| s.timing.loops).collect();
        assert_eq!(loops, vec![1, 4, -1]);
        assert!(playlist.sources().iter().all(|s| s.timing.wait_ms == 1500));
    }

    #[test]
    fn test_empty_playlist_is_an_error() {
        let (mut player, _, cancel) = rig();
        let mut playlist = Playlist::new();
        assert!(matches!(
            playlist.run(&mut player, false, false, &cancel),
            Err(PlaylistError::Empty)
        ));
    }

    #[test]
    fn test_plays_in_order_once() {
        let (mut player, state, cancel) = rig();
        let mut playlist = Playlist::new();
        playlist.push(source(1, 2, TimingConfig::default()));
        playlist.push(source(2, 1, TimingConfig { wait_ms: 100, ..TimingConfig::default() }));
        playlist.push(source(3, 2, TimingConfig::default()));
        playlist.reconcile_defaults();

        let summary = playlist.run(&mut player, false, false, &cancel).unwrap();
        assert_eq!(summary.passes, 1);
        assert_eq!(summary.sources_played, 3);
        assert!(!summary.cancelled);
        assert_eq!(shown_tags(&state), vec![1, 1, 2, 3, 3]);
    }

    #[test]
    fn test_forever_repeats_until_cancelled() {
        let (mut player, state, cancel) = rig();
        state.lock().unwrap().cancel_after = Some((9, cancel.clone()));
        let mut playlist = Playlist::new();
        playlist.push(source(1, 2, TimingConfig::default()));
        playlist.push(source(2, 2, TimingConfig::default()));
        playlist.reconcile_defaults();

        let summary = playlist.run(&mut player, false, true, &cancel).unwrap();
        assert!(summary.cancelled);
        assert_eq!(shown_tags(&state), vec![1, 1, 2, 2, 1, 1, 2, 2, 1]);
        assert_eq!(summary.passes, 3);
    }

    #[test]
    fn test_cancel_skips_remaining_sources() {
        let (mut player, state, cancel) = rig();
        state.lock().unwrap().cancel_after = Some((1, cancel.clone()));
        let mut playlist = Playlist::new();
        for tag in 1..=3 {
            playlist.push(source(tag, 2, TimingConfig::default()));
        }
        playlist.reconcile_defaults();

        let summary = playlist.run(&mut player, false, true, &cancel).unwrap();
        assert_eq!(summary.sources_played, 1);
        assert_eq!(shown_tags(&state), vec![1]);
    }

    #[test]
    fn test_shuffle_is_a_permutation_per_pass() {
        let (mut player, state, cancel) = rig();
        state.lock().unwrap().cancel_after = Some((5 * 4, cancel.clone()));
        let mut playlist = Playlist::new();
        for tag in 1..=5 {
            playlist.push(source(tag, 1, TimingConfig { wait_ms: 5, ..TimingConfig::default() }));
        }
        playlist.reconcile_defaults();

        let mut rng = StdRng::seed_from_u64(7);
        playlist.run_with_rng(&mut player, true, true, &cancel, &mut rng).unwrap();

        let tags = shown_tags(&state);
        assert_eq!(tags.len(), 20);
        for pass in tags.chunks(5) {
            let mut sorted = pass.to_vec();
            sorted.sort();
            assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_unreadable_source_does_not_stop_the_list() {
        use crate::stream::codec::FrameHeader;
        use crate::stream::{MemStreamIO, StreamIO};

        let mut c = FrameCanvas::new(2, 2);
        c.set_pixel(0, 0, 1, 0, 0);
        let header = FrameHeader { payload_len: c.packed_len() as u32, width: 2, height: 2, delay_us: 10_000 };
        let mut bytes = header.encode().to_vec();
        c.write_rgb_bytes(&mut bytes);
        bytes.extend_from_slice(b"trailing garbage, not a frame");
        let mut io = MemStreamIO::new();
        io.append(&bytes).unwrap();

        let (mut player, state, cancel) = rig();
        let mut playlist = Playlist::new();
        playlist.push(PreparedSource::new("bad", TimingConfig::default(), true, FrameStream::new(Box::new(io))));
        playlist.push(source(2, 2, TimingConfig::default()));
        playlist.reconcile_defaults();

        let summary = playlist.run(&mut player, false, false, &cancel).unwrap();
        assert_eq!(summary.sources_played, 2);
        assert_eq!(shown_tags(&state), vec![1, 2, 2]);
    }

    #[test]
    fn test_player_error_names_source() {
        let (mut player, state, cancel) = rig();
        state.lock().unwrap().simulate_swap_failure = true;
        let mut playlist = Playlist::new();
        playlist.push(source(7, 2, TimingConfig::default()));
        match playlist.run(&mut player, false, false, &cancel) {
            Err(PlaylistError::Player { name, .. }) => assert_eq!(name, "src7"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
