/*
 *  display/error.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for display subsystem
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

use std::fmt;
use std::error::Error;

/// Unified error type for all display operations
#[derive(Debug)]
pub enum DisplayError {
    /// Panel initialization failed
    InitializationFailed(String),

    /// Invalid configuration
    InvalidConfiguration(String),

    /// Unsupported operation for this display
    UnsupportedOperation,

    /// Framebuffer size mismatch
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Swap handed a canvas that does not belong to this panel
    CanvasSizeMismatch { expected: (u32, u32), actual: (u32, u32) },

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
            DisplayError::UnsupportedOperation =>
                write!(f, "Operation not supported by this display"),
            DisplayError::BufferSizeMismatch { expected, actual } =>
                write!(f, "Buffer size mismatch: expected {} bytes, got {}", expected, actual),
            DisplayError::CanvasSizeMismatch { expected, actual } =>
                write!(f, "Canvas size mismatch: panel is {}x{}, canvas is {}x{}",
                    expected.0, expected.1, actual.0, actual.1),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {}

/// Factory error types
#[derive(Debug)]
pub enum DisplayFactoryError {
    /// Panel geometry is unusable
    InvalidGeometry(String),

    /// Display driver initialization failed
    DriverInitFailed(DisplayError),
}

impl fmt::Display for DisplayFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFactoryError::InvalidGeometry(msg) =>
                write!(f, "Invalid panel geometry: {}", msg),
            DisplayFactoryError::DriverInitFailed(err) =>
                write!(f, "Driver initialization failed: {}", err),
        }
    }
}

impl Error for DisplayFactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayFactoryError::DriverInitFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DisplayError> for DisplayFactoryError {
    fn from(err: DisplayError) -> Self {
        DisplayFactoryError::DriverInitFailed(err)
    }
}
