/*
 *  sb-board-marquee - FFI definitions
 *
 *  Copy of the scoreboard's board plugin ABI. Keep in step with
 *  src/boards/plugin/ffi.rs in the host crate.
 */

//! FFI types for native board plugins
//!
//! All types use `#[repr(C)]`.

#![allow(dead_code)]

use std::ffi::c_char;

/// Board plugin ABI version
pub const SB_BOARD_ABI_VERSION_MAJOR: u32 = 1;
pub const SB_BOARD_ABI_VERSION_MINOR: u32 = 0;
pub const SB_BOARD_ABI_VERSION_PATCH: u32 = 0;

/// Maximum length for error messages
pub const SB_ERROR_MESSAGE_SIZE: usize = 256;

/// Board metadata string sizes
pub const SB_BOARD_NAME_SIZE: usize = 64;
pub const SB_BOARD_VERSION_SIZE: usize = 32;
pub const SB_BOARD_DESCRIPTION_SIZE: usize = 128;

/// Registration symbol every board plugin exports
pub const SB_BOARD_REGISTER_SYMBOL: &[u8] = b"sb_board_register\0";

/// Opaque handle to a plugin board instance
#[repr(C)]
pub struct SbBoardHandle {
    _private: [u8; 0],
}

/// Error codes returned by plugin functions
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbErrorCode {
    Success = 0,
    ErrorGeneric = 1,
    ErrorInvalidArgument = 2,
    ErrorConfig = 3,
    ErrorNullPointer = 4,
    ErrorPanic = 5,
}

/// Error information structure
#[repr(C)]
pub struct SbError {
    pub code: SbErrorCode,
    /// Null-terminated message
    pub message: [c_char; SB_ERROR_MESSAGE_SIZE],
}

impl SbError {
    pub fn new(code: SbErrorCode, message: &str) -> Self {
        let mut error = Self { code, message: [0; SB_ERROR_MESSAGE_SIZE] };
        write_c_buf(&mut error.message, message);
        error
    }

    pub fn success() -> Self {
        Self::new(SbErrorCode::Success, "")
    }

    pub fn message_str(&self) -> String {
        read_c_buf(&self.message)
    }
}

impl Default for SbError {
    fn default() -> Self {
        Self::success()
    }
}

/// Board metadata filled in by the plugin
#[repr(C)]
pub struct SbBoardInfo {
    pub name: [c_char; SB_BOARD_NAME_SIZE],
    pub version: [c_char; SB_BOARD_VERSION_SIZE],
    pub description: [c_char; SB_BOARD_DESCRIPTION_SIZE],
}

impl Default for SbBoardInfo {
    fn default() -> Self {
        Self {
            name: [0; SB_BOARD_NAME_SIZE],
            version: [0; SB_BOARD_VERSION_SIZE],
            description: [0; SB_BOARD_DESCRIPTION_SIZE],
        }
    }
}

/// Construction parameters
#[repr(C)]
pub struct SbCreateParams {
    pub width: u32,
    pub height: u32,
    /// Module `config.json` as a null-terminated JSON object
    pub config_json: *const c_char,
}

/// Frame the plugin draws into, packed RGB888 row-major
#[repr(C)]
pub struct SbCanvas {
    pub pixels: *mut u8,
    pub len: usize,
    pub width: u32,
    pub height: u32,
    /// Frame counter within the current display slot, starts at 0
    pub frame: u32,
}

/// Plugin vtable, one per board class
#[repr(C)]
pub struct SbBoardVTable {
    /// Get plugin ABI version (major, minor, patch)
    pub abi_version: extern "C" fn(major: *mut u32, minor: *mut u32, patch: *mut u32),

    pub board_info: extern "C" fn(info: *mut SbBoardInfo),

    /// True when the board must be built before the first rotation
    pub requires_early_init: extern "C" fn() -> bool,

    pub create: extern "C" fn(
        params: *const SbCreateParams,
        handle: *mut *mut SbBoardHandle,
        error: *mut SbError,
    ) -> SbErrorCode,

    /// Draw one frame; `hold_ms` receives how long to show it, 0 ends the slot
    pub render: extern "C" fn(
        handle: *mut SbBoardHandle,
        canvas: *mut SbCanvas,
        hold_ms: *mut u32,
        error: *mut SbError,
    ) -> SbErrorCode,

    /// Optional resource release before destroy
    pub cleanup: Option<extern "C" fn(handle: *mut SbBoardHandle)>,

    pub destroy: extern "C" fn(handle: *mut SbBoardHandle),
}

/// Plugin registration function type
///
/// Each plugin exports:
/// ```c
/// const SbBoardVTable *sb_board_register(const char *class_name);
/// ```
/// returning null when it has no class of that name.
pub type BoardRegisterFn = extern "C" fn(class_name: *const c_char) -> *const SbBoardVTable;

/// Copy `s` into a C buffer, truncating and null-terminating
pub fn write_c_buf(buf: &mut [c_char], s: &str) {
    if buf.is_empty() {
        return;
    }
    let len = s.len().min(buf.len() - 1);
    for (dst, &b) in buf.iter_mut().zip(s.as_bytes()[..len].iter()) {
        *dst = b as c_char;
    }
    buf[len] = 0;
}

/// Read a null-terminated C buffer
pub fn read_c_buf(buf: &[c_char]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    let bytes: Vec<u8> = buf[..len].iter().map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

