/*
 *  stream/codec.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame header layout for serialized frame streams
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

use crate::stream::StreamError;

pub const FRAME_MAGIC: u32 = 0xED0C_5A48;
pub const HEADER_LEN: usize = 16;

/// Per-frame header. All fields little endian:
///
/// | offset | size | field        |
/// |--------|------|--------------|
/// | 0      | 4    | magic        |
/// | 4      | 4    | payload_len  |
/// | 8      | 2    | width        |
/// | 10     | 2    | height       |
/// | 12     | 4    | delay_us     |
///
/// followed by `payload_len` bytes of packed RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub payload_len: u32,
    pub width: u16,
    pub height: u16,
    pub delay_us: u32,
}

impl FrameHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&FRAME_MAGIC.to_le_bytes());
        out[4..8].copy_from_slice(&self.payload_len.to_le_bytes());
        out[8..10].copy_from_slice(&self.width.to_le_bytes());
        out[10..12].copy_from_slice(&self.height.to_le_bytes());
        out[12..16].copy_from_slice(&self.delay_us.to_le_bytes());
        out
    }

    pub fn decode(raw: &[u8; HEADER_LEN]) -> Result<Self, StreamError> {
        let magic = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        if magic != FRAME_MAGIC {
            return Err(StreamError::BadMagic(magic));
        }
        Ok(Self {
            payload_len: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
            width: u16::from_le_bytes([raw[8], raw[9]]),
            height: u16::from_le_bytes([raw[10], raw[11]]),
            delay_us: u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]),
        })
    }

    /// Check the header describes a frame for a `width` x `height` canvas
    pub fn validate_for(&self, width: u32, height: u32, packed_len: usize) -> Result<(), StreamError> {
        if (self.width as u32, self.height as u32) != (width, height) {
            return Err(StreamError::GeometryMismatch {
                expected: (width, height),
                found: (self.width as u32, self.height as u32),
            });
        }
        if self.payload_len as usize != packed_len {
            return Err(StreamError::PayloadMismatch {
                expected: packed_len,
                found: self.payload_len as usize,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = FrameHeader { payload_len: 12, width: 2, height: 2, delay_us: 100_000 };
        let raw = header.encode();
        assert_eq!(&raw[0..4], &[0x48, 0x5A, 0x0C, 0xED]);
        assert_eq!(FrameHeader::decode(&raw).unwrap(), header);
    }

    #[test]
    fn test_bad_magic() {
        let mut raw = FrameHeader { payload_len: 0, width: 0, height: 0, delay_us: 0 }.encode();
        raw[0] = 0;
        assert!(matches!(FrameHeader::decode(&raw), Err(StreamError::BadMagic(_))));
    }

    #[test]
    fn test_validate_for_canvas() {
        let header = FrameHeader { payload_len: 12, width: 2, height: 2, delay_us: 0 };
        assert!(header.validate_for(2, 2, 12).is_ok());
        assert!(matches!(header.validate_for(4, 2, 24), Err(StreamError::GeometryMismatch { .. })));
        let short = FrameHeader { payload_len: 11, ..header };
        assert!(matches!(short.validate_for(2, 2, 12), Err(StreamError::PayloadMismatch { .. })));
    }
}
