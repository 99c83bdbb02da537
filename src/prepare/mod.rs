/*
 *  prepare/mod.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Content preparation - files in, panel sized frame streams out
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

pub mod decode;
pub mod rasterize;
pub mod scale;

use image::imageops::FilterType;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::display::FrameCanvas;
use crate::playlist::Playlist;
use crate::source::PreparedSource;
use crate::stream::{FileStreamIO, FrameStream, StreamError};
use crate::timing::TimingConfig;
pub use decode::{DecodeError, DecodedSource, RawFrame};
pub use scale::FillMode;

/// Stand-in delay when a frame would otherwise show for zero time or less
pub const FALLBACK_DELAY_US: u32 = 100_000;

#[derive(Debug, Error)]
pub enum PrepareError {
    /// Neither a decodable image nor a readable frame stream
    #[error("{path}: not an image ({image}) and not a frame stream ({stream})")]
    NotDecodable {
        path: PathBuf,
        image: DecodeError,
        stream: StreamError,
    },
    #[error("{path}: cannot open: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: cannot serialize frames: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: StreamError,
    },
    #[error("writing to output stream failed: {0}")]
    Sink(#[source] StreamError),
    #[error("no source could be written to the output stream")]
    NothingStreamed,
}

impl PrepareError {
    /// Fatal errors abort the whole run, the rest only drop one source
    pub fn is_fatal(&self) -> bool {
        matches!(self, PrepareError::Sink(_) | PrepareError::NothingStreamed)
    }
}

/// Delay stored with a frame.
///
/// Animations keep their own per-frame delay (hundredths of a second), stills
/// show for the source's wait time. Non-positive results become
/// [`FALLBACK_DELAY_US`].
pub fn resolve_delay_us(is_multi_frame: bool, delay_cs: u32, timing: &TimingConfig) -> u32 {
    let us = if is_multi_frame {
        delay_cs as i64 * 10_000
    } else {
        timing.wait_ms.saturating_mul(1000)
    };
    if us <= 0 {
        FALLBACK_DELAY_US
    } else {
        us.min(u32::MAX as i64) as u32
    }
}

/// How decoded images are fitted to the panel
#[derive(Debug, Clone, Copy)]
pub struct PrepareOptions {
    pub width: u32,
    pub height: u32,
    pub fill: FillMode,
    pub center: bool,
    pub filter: FilterType,
}

/// What became of one source
#[derive(Debug)]
pub enum Prepared {
    /// Ready for the playlist
    Ready(PreparedSource),
    /// Frames went straight to the output stream
    Streamed { frames: usize },
}

/// Turns source files into frame streams sized for one panel.
///
/// With a sink attached every frame of every source is appended to that one
/// stream instead, and nothing is left to play.
pub struct ContentPreparer {
    options: PrepareOptions,
    scratch: FrameCanvas,
    sink: Option<FrameStream>,
    streamed: usize,
}

impl ContentPreparer {
    pub fn new(options: PrepareOptions) -> Self {
        Self {
            scratch: FrameCanvas::new(options.width, options.height),
            options,
            sink: None,
            streamed: 0,
        }
    }

    /// Send all prepared frames to `sink` rather than per-source streams
    pub fn with_sink(mut self, sink: FrameStream) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.sink.is_some()
    }

    /// Sources written to the sink so far
    pub fn streamed(&self) -> usize {
        self.streamed
    }

    /// Hand the sink back once every source is written.
    ///
    /// Fails when no source made it into the sink.
    pub fn finish_sink(self) -> Result<FrameStream, PrepareError> {
        match self.sink {
            Some(sink) if self.streamed > 0 => Ok(sink),
            _ => Err(PrepareError::NothingStreamed),
        }
    }

    /// Prepare one source with its bound timing
    pub fn prepare(&mut self, path: &Path, timing: TimingConfig) -> Result<Prepared, PrepareError> {
        match decode::decode(path) {
            Ok(decoded) => self.prepare_image(path, decoded, timing),
            Err(image_err) => {
                debug!("{}: not an image ({}), trying as frame stream", path.display(), image_err);
                self.prepare_stream(path, image_err, timing)
            }
        }
    }

    fn prepare_image(
        &mut self,
        path: &Path,
        decoded: DecodedSource,
        timing: TimingConfig,
    ) -> Result<Prepared, PrepareError> {
        let is_multi_frame = decoded.is_multi_frame();
        let frames = decode::coalesce(decoded.frames);
        let delays: Vec<u32> = frames.iter().map(|f| f.delay_cs).collect();
        let images = scale::scale_frames(
            frames.into_iter().map(|f| f.image).collect(),
            self.options.width,
            self.options.height,
            self.options.fill,
            self.options.filter,
        );

        let mut own = FrameStream::in_memory();
        for (image, delay_cs) in images.iter().zip(delays) {
            self.scratch.clear();
            rasterize::rasterize(image, self.options.center, &mut self.scratch);
            let delay_us = resolve_delay_us(is_multi_frame, delay_cs, &timing);
            match self.sink.as_mut() {
                Some(sink) => sink.append(&self.scratch, delay_us).map_err(PrepareError::Sink)?,
                None => own.append(&self.scratch, delay_us).map_err(|source| PrepareError::Encode {
                    path: path.to_path_buf(),
                    source,
                })?,
            }
        }

        debug!("{}: {} frame(s) prepared", path.display(), images.len());
        if self.sink.is_some() {
            self.streamed += 1;
            return Ok(Prepared::Streamed { frames: images.len() });
        }
        Ok(Prepared::Ready(PreparedSource::new(
            path.display().to_string(),
            timing,
            is_multi_frame,
            own,
        )))
    }

    /// Accept a file that already is a frame stream for this panel
    fn prepare_stream(
        &mut self,
        path: &Path,
        image_err: DecodeError,
        timing: TimingConfig,
    ) -> Result<Prepared, PrepareError> {
        let io = FileStreamIO::open(path).map_err(|source| PrepareError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut stream = FrameStream::new(Box::new(io));

        let not_decodable = |stream_err: StreamError| PrepareError::NotDecodable {
            path: path.to_path_buf(),
            image: image_err,
            stream: stream_err,
        };
        // a bad frame anywhere rejects the whole file
        let mut frames = 0usize;
        loop {
            match stream.read_next(&mut self.scratch) {
                Ok(Some(_)) => frames += 1,
                Ok(None) => break,
                Err(e) => return Err(not_decodable(e)),
            }
        }
        if frames == 0 {
            return Err(not_decodable(StreamError::Empty));
        }
        let is_multi_frame = frames > 1;
        stream.rewind();

        if let Some(sink) = self.sink.as_mut() {
            let frames = stream
                .copy_to(sink, &mut self.scratch)
                .map_err(PrepareError::Sink)?;
            debug!("{}: copied {} frame(s) to output", path.display(), frames);
            self.streamed += 1;
            return Ok(Prepared::Streamed { frames });
        }

        info!("{}: playing pre-encoded stream", path.display());
        Ok(Prepared::Ready(PreparedSource::new(
            path.display().to_string(),
            timing,
            is_multi_frame,
            stream,
        )))
    }

    /// Prepare every source in order.
    ///
    /// Sources that fail are logged and left out; only fatal errors stop the
    /// run.
    pub fn prepare_all<I>(&mut self, sources: I) -> Result<Playlist, PrepareError>
    where
        I: IntoIterator<Item = (PathBuf, TimingConfig)>,
    {
        let mut playlist = Playlist::new();
        for (path, timing) in sources {
            match self.prepare(&path, timing) {
                Ok(Prepared::Ready(source)) => playlist.push(source),
                Ok(Prepared::Streamed { .. }) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("Skipping {}", e),
            }
        }
        Ok(playlist)
    }
}
