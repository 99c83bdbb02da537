/*
 *  stream/mod.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame streams - rewindable sequences of (canvas, delay) pairs
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

pub mod codec;
pub mod io;

use log::trace;
use thiserror::Error;

use crate::display::FrameCanvas;
use codec::{FrameHeader, HEADER_LEN};
pub use io::{FileStreamIO, MemStreamIO, StreamIO};

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a frame stream (magic {0:#010x})")]
    BadMagic(u32),
    #[error("stream frames are {}x{}, panel is {}x{}", found.0, found.1, expected.0, expected.1)]
    GeometryMismatch { expected: (u32, u32), found: (u32, u32) },
    #[error("frame payload is {found} bytes, expected {expected}")]
    PayloadMismatch { expected: usize, found: usize },
    #[error("frame {width}x{height} too large to serialize")]
    FrameTooLarge { width: u32, height: u32 },
    #[error("stream truncated inside a frame")]
    Truncated,
    #[error("stream holds no frames")]
    Empty,
}

/// Rewindable sequence of timed frames.
///
/// Written completely first, then replayed any number of times; a stream is
/// never written and read at the same time.
pub struct FrameStream {
    io: Box<dyn StreamIO>,
    read_pos: u64,
    payload: Vec<u8>,
}

impl std::fmt::Debug for FrameStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStream")
            .field("read_pos", &self.read_pos)
            .finish_non_exhaustive()
    }
}

impl FrameStream {
    pub fn new(io: Box<dyn StreamIO>) -> Self {
        Self { io, read_pos: 0, payload: Vec::new() }
    }

    /// Stream held entirely in memory
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemStreamIO::new()))
    }

    /// Append one frame with its display delay
    pub fn append(&mut self, canvas: &FrameCanvas, delay_us: u32) -> Result<(), StreamError> {
        let (width, height) = (canvas.width(), canvas.height());
        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(StreamError::FrameTooLarge { width, height });
        }

        self.payload.clear();
        let header = FrameHeader {
            payload_len: canvas.packed_len() as u32,
            width: width as u16,
            height: height as u16,
            delay_us,
        };
        self.payload.extend_from_slice(&header.encode());
        canvas.write_rgb_bytes(&mut self.payload);
        self.io.append(&self.payload)?;
        Ok(())
    }

    /// Read the next frame into `canvas`, returning its delay in microseconds.
    ///
    /// `Ok(None)` at a clean end of stream. The canvas is only modified when
    /// a whole frame was read.
    pub fn read_next(&mut self, canvas: &mut FrameCanvas) -> Result<Option<u32>, StreamError> {
        let mut raw = [0u8; HEADER_LEN];
        let n = self.io.read_at(&mut raw, self.read_pos)?;
        if n == 0 {
            return Ok(None);
        }
        if n < HEADER_LEN {
            return Err(StreamError::Truncated);
        }

        let header = FrameHeader::decode(&raw)?;
        header.validate_for(canvas.width(), canvas.height(), canvas.packed_len())?;

        self.payload.resize(header.payload_len as usize, 0);
        let got = self.io.read_at(&mut self.payload, self.read_pos + HEADER_LEN as u64)?;
        if got < self.payload.len() {
            return Err(StreamError::Truncated);
        }
        canvas
            .load_rgb_bytes(&self.payload)
            .map_err(|_| StreamError::Truncated)?;

        self.read_pos += (HEADER_LEN + self.payload.len()) as u64;
        trace!("read frame, delay {}us, next at {}", header.delay_us, self.read_pos);
        Ok(Some(header.delay_us))
    }

    /// Size of the serialized stream in bytes
    pub fn byte_len(&self) -> Result<u64, StreamError> {
        Ok(self.io.len()?)
    }

    /// Start reading from the first frame again
    pub fn rewind(&mut self) {
        self.read_pos = 0;
    }

    /// Copy every remaining frame of `self` into `sink` unmodified
    pub fn copy_to(&mut self, sink: &mut FrameStream, scratch: &mut FrameCanvas) -> Result<usize, StreamError> {
        let mut copied = 0;
        while let Some(delay_us) = self.read_next(scratch)? {
            sink.append(scratch, delay_us)?;
            copied += 1;
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

    fn solid(w: u32, h: u32, r: u8) -> FrameCanvas {
        let mut c = FrameCanvas::new(w, h);
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                c.set_pixel(x, y, r, 0, 0);
            }
        }
        c
    }

    #[test]
    fn test_replay_after_rewind() {
        let mut stream = FrameStream::in_memory();
        stream.append(&solid(3, 2, 10), 40_000).unwrap();
        stream.append(&solid(3, 2, 20), 60_000).unwrap();

        let mut canvas = FrameCanvas::new(3, 2);
        for _ in 0..2 {
            assert_eq!(stream.read_next(&mut canvas).unwrap(), Some(40_000));
            assert_eq!(canvas.get_pixel(2, 1), Some(Rgb888::new(10, 0, 0)));
            assert_eq!(stream.read_next(&mut canvas).unwrap(), Some(60_000));
            assert_eq!(canvas.get_pixel(0, 0), Some(Rgb888::new(20, 0, 0)));
            assert_eq!(stream.read_next(&mut canvas).unwrap(), None);
            stream.rewind();
        }
    }

    #[test]
    fn test_empty_stream_ends_immediately() {
        let mut stream = FrameStream::in_memory();
        let mut canvas = FrameCanvas::new(3, 2);
        assert_eq!(stream.read_next(&mut canvas).unwrap(), None);
    }

    #[test]
    fn test_geometry_mismatch() {
        let mut stream = FrameStream::in_memory();
        stream.append(&solid(3, 2, 10), 1).unwrap();
        let mut canvas = FrameCanvas::new(2, 3);
        assert!(matches!(
            stream.read_next(&mut canvas),
            Err(StreamError::GeometryMismatch { .. })
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let mut io = MemStreamIO::new();
        io.append(b"GIF89a, but not really an image at all").unwrap();
        let mut stream = FrameStream::new(Box::new(io));
        let mut canvas = FrameCanvas::new(3, 2);
        assert!(matches!(stream.read_next(&mut canvas), Err(StreamError::BadMagic(_))));
    }

    #[test]
    fn test_truncated_payload() {
        let mut full = FrameStream::in_memory();
        full.append(&solid(3, 2, 10), 1).unwrap();
        let mut bytes = vec![0u8; HEADER_LEN + 18];
        let n = full.io.read_at(&mut bytes, 0).unwrap();
        assert_eq!(n, HEADER_LEN + 18);

        let mut io = MemStreamIO::new();
        io.append(&bytes[..HEADER_LEN + 5]).unwrap();
        let mut cut = FrameStream::new(Box::new(io));
        let mut canvas = FrameCanvas::new(3, 2);
        canvas.set_pixel(0, 0, 1, 1, 1);
        assert!(matches!(cut.read_next(&mut canvas), Err(StreamError::Truncated)));
        // untouched on failure
        assert_eq!(canvas.get_pixel(0, 0), Some(Rgb888::new(1, 1, 1)));
        assert_eq!(canvas.get_pixel(1, 0), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_copy_to_sink() {
        let mut source = FrameStream::in_memory();
        source.append(&solid(2, 2, 1), 10).unwrap();
        source.append(&solid(2, 2, 2), 20).unwrap();

        let mut sink = FrameStream::in_memory();
        let mut scratch = FrameCanvas::new(2, 2);
        assert_eq!(source.copy_to(&mut sink, &mut scratch).unwrap(), 2);
        assert_eq!(sink.byte_len().unwrap(), source.byte_len().unwrap());

        assert_eq!(sink.read_next(&mut scratch).unwrap(), Some(10));
        assert_eq!(sink.read_next(&mut scratch).unwrap(), Some(20));
        assert_eq!(scratch.get_pixel(1, 1), Some(Rgb888::new(2, 0, 0)));
    }
}
