/*
 *  sb-board-marquee
 *
 *  Scrolling text board for the NHL LED Scoreboard, loaded at runtime
 *  through the native board plugin ABI.
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 */

//! # Marquee board plugin
//!
//! Scrolls a line of text right to left across the panel.
//!
//! ## Usage
//!
//! Build with `cargo build -p sb-board-marquee --release` and copy
//! `libsb_board_marquee.so` next to the module's `plugin.json`:
//!
//! ```json
//! {
//!   "id": "marquee",
//!   "version": "1.0.0",
//!   "boards": [{ "id": "marquee", "class_name": "MarqueeBoard",
//!                "library": "libsb_board_marquee.so" }]
//! }
//! ```
//!
//! `config.json` keys: `text`, `color` (`[r, g, b]`), `frame_ms`, `step`.

mod ffi;
mod plugin;

pub use plugin::sb_board_register;
