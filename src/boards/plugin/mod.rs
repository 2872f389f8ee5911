/*
 *  boards/plugin/mod.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Native board plugins
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

//! Board classes loaded from shared libraries
//!
//! A manifest entry with a `library` field names a `.so`/`.dylib`/`.dll`
//! inside the module directory:
//!
//! ```json
//! { "id": "marquee", "class_name": "MarqueeBoard", "library": "libsb_board_marquee.so" }
//! ```
//!
//! 1. **FFI Layer** (`ffi.rs`) - C ABI types, copied by plugin crates
//! 2. **Loader** (`loader.rs`) - opens the library, checks the ABI
//! 3. **Adapter** (`adapter.rs`) - wraps a vtable as a board class

use std::path::PathBuf;

use thiserror::Error;

pub mod adapter;
pub mod ffi;
pub mod loader;

pub use adapter::{NativeBoard, NativeBoardClass};
pub use loader::{LoadedLibrary, NativeBoardMeta};

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("library {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("failed to load library: {0}")]
    Load(String),
    #[error("registration symbol missing: {0}")]
    Symbol(String),
    #[error("library has no board class '{0}'")]
    UnknownClass(String),
    #[error("ABI version mismatch: {0}")]
    AbiMismatch(String),
}
