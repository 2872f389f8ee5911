/*
 *  display/error.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error type for the matrix rendering surface
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

use thiserror::Error;

/// Errors raised by the matrix and its drivers
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("operation not supported by this matrix driver")]
    UnsupportedOperation,

    /// A frame or pixel blob of the wrong length, counted in pixels
    #[error("frame size mismatch: expected {expected} pixels, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("matrix output error: {0}")]
    Io(#[from] std::io::Error),

    /// A board panicked while holding the matrix
    #[error("matrix lock poisoned")]
    Poisoned,

    #[error("{0}")]
    Other(String),
}
