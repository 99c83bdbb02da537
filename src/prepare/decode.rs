/*
 *  prepare/decode.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Still and animated image decoding, plus coalescing of partial frames
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

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Delay, Frame, ImageError, ImageFormat, RgbaImage};
use log::debug;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Image(#[from] ImageError),
    #[error("image contains no frames")]
    Empty,
}

/// One frame as the decoder hands it over; may cover only part of the screen
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub image: RgbaImage,
    pub left: u32,
    pub top: u32,
    /// Intrinsic display time in hundredths of a second
    pub delay_cs: u32,
}

#[derive(Debug, Clone)]
pub struct DecodedSource {
    pub frames: Vec<RawFrame>,
}

impl DecodedSource {
    pub fn is_multi_frame(&self) -> bool {
        self.frames.len() > 1
    }
}

/// Decode a file into its raw frames, in display order
pub fn decode(path: &Path) -> Result<DecodedSource, DecodeError> {
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes)
}

pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedSource, DecodeError> {
    let format = image::guess_format(bytes)?;

    let frames = match format {
        ImageFormat::Gif => collect(GifDecoder::new(Cursor::new(bytes))?)?,
        ImageFormat::Png => {
            let decoder = PngDecoder::new(Cursor::new(bytes))?;
            if decoder.is_apng()? {
                collect(decoder.apng()?)?
            } else {
                still(bytes, format)?
            }
        }
        ImageFormat::WebP => {
            let decoder = WebPDecoder::new(Cursor::new(bytes))?;
            if decoder.has_animation() {
                collect(decoder)?
            } else {
                still(bytes, format)?
            }
        }
        _ => still(bytes, format)?,
    };

    if frames.is_empty() {
        return Err(DecodeError::Empty);
    }
    debug!("Decoded {:?}: {} frame(s), first {}x{}",
        format, frames.len(), frames[0].image.width(), frames[0].image.height());
    Ok(DecodedSource { frames })
}

fn still(bytes: &[u8], format: ImageFormat) -> Result<Vec<RawFrame>, DecodeError> {
    let image = image::load_from_memory_with_format(bytes, format)?.to_rgba8();
    Ok(vec![RawFrame { image, left: 0, top: 0, delay_cs: 0 }])
}

fn collect<'a, D: AnimationDecoder<'a>>(decoder: D) -> Result<Vec<RawFrame>, DecodeError> {
    let frames = decoder.into_frames().collect_frames()?;
    Ok(frames.into_iter().map(raw_frame).collect())
}

fn raw_frame(frame: Frame) -> RawFrame {
    let (left, top) = (frame.left(), frame.top());
    let delay_cs = delay_to_centis(frame.delay());
    RawFrame { image: frame.into_buffer(), left, top, delay_cs }
}

/// Decoder delays are exact ratios of milliseconds; panels think in centiseconds
fn delay_to_centis(delay: Delay) -> u32 {
    let (numer, denom) = delay.numer_denom_ms();
    if denom == 0 {
        return 0;
    }
    ((numer as f64 / denom as f64) / 10.0).round() as u32
}

/// Turn partial frames into self-contained full frames.
///
/// Each frame is composited over the accumulated screen at its offset. A
/// frame that already covers the whole screen replaces it outright.
pub fn coalesce(frames: Vec<RawFrame>) -> Vec<RawFrame> {
    let (width, height) = frames.iter().fold((0, 0), |(w, h), f| {
        (w.max(f.left + f.image.width()), h.max(f.top + f.image.height()))
    });

    let mut screen = RgbaImage::new(width, height);
    frames
        .into_iter()
        .map(|f| {
            let covers = f.left == 0 && f.top == 0 && f.image.dimensions() == (width, height);
            if covers {
                screen = f.image;
            } else {
                image::imageops::overlay(&mut screen, &f.image, f.left as i64, f.top as i64);
            }
            RawFrame { image: screen.clone(), left: 0, top: 0, delay_cs: f.delay_cs }
        })
        .collect()
}
