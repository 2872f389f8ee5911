/*
 *  sb-board-marquee - Board Implementation
 *
 *  Implements the scrolling text board behind the plugin vtable
 */

use std::convert::Infallible;
use std::ffi::{c_char, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use serde::Deserialize;

use crate::ffi::*;

const CLASS_NAME: &str = "MarqueeBoard";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarqueeConfig {
    pub text: String,
    pub color: [u8; 3],
    /// Time each frame stays up
    pub frame_ms: u32,
    /// Pixels moved per frame
    pub step: u32,
}

impl Default for MarqueeConfig {
    fn default() -> Self {
        Self {
            text: "LET'S GO!".into(),
            color: [255, 255, 255],
            frame_ms: 50,
            step: 1,
        }
    }
}

/// Packed RGB888 canvas handed over by the host
struct CanvasTarget<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
}

impl OriginDimensions for CanvasTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for CanvasTarget<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if p.x < 0 || p.y < 0 || p.x as u32 >= self.width || p.y as u32 >= self.height {
                continue;
            }
            let i = (p.y as usize * self.width as usize + p.x as usize) * 3;
            if let Some(px) = self.pixels.get_mut(i..i + 3) {
                px.copy_from_slice(&[c.r(), c.g(), c.b()]);
            }
        }
        Ok(())
    }
}

pub struct MarqueeBoard {
    cfg: MarqueeConfig,
    width: u32,
    height: u32,
}

impl MarqueeBoard {
    pub fn new(width: u32, height: u32, config_json: &str) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!("Invalid canvas size {}x{}", width, height));
        }
        let cfg: MarqueeConfig = if config_json.trim().is_empty() {
            MarqueeConfig::default()
        } else {
            serde_json::from_str(config_json).map_err(|e| format!("Bad marquee config: {}", e))?
        };
        Ok(Self { cfg, width, height })
    }

    fn text_width(&self) -> u32 {
        let glyph = FONT_6X10.character_size.width + FONT_6X10.character_spacing;
        self.cfg.text.chars().count() as u32 * glyph
    }

    /// Left edge of the text for a frame; enters at the right, leaves at the left
    pub fn offset(&self, frame: u32) -> i32 {
        let span = self.width + self.text_width();
        let travelled = (frame as u64 * self.cfg.step.max(1) as u64) % span as u64;
        self.width as i32 - travelled as i32
    }

    /// Draw `frame` into `pixels`; returns how long to hold it
    pub fn draw(&self, frame: u32, pixels: &mut [u8]) -> Result<u32, String> {
        let expected = (self.width * self.height * 3) as usize;
        if pixels.len() != expected {
            return Err(format!("Canvas size mismatch: expected {} bytes, got {}", expected, pixels.len()));
        }
        let mut target = CanvasTarget { pixels, width: self.width, height: self.height };
        let [r, g, b] = self.cfg.color;
        let style = MonoTextStyle::new(&FONT_6X10, Rgb888::new(r, g, b));
        let y = (self.height as i32 - FONT_6X10.character_size.height as i32) / 2;
        let _ = Text::with_baseline(&self.cfg.text, Point::new(self.offset(frame), y), style, Baseline::Top)
            .draw(&mut target);
        Ok(self.cfg.frame_ms.max(1))
    }
}

/// Macro to catch panics in FFI functions
macro_rules! catch_panic {
    ($error:expr, $code:block) => {
        match catch_unwind(AssertUnwindSafe(|| $code)) {
            Ok(result) => result,
            Err(panic_info) => {
                let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    format!("Plugin panic: {}", s)
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    format!("Plugin panic: {}", s)
                } else {
                    "Plugin panic: unknown error".to_string()
                };
                if !$error.is_null() {
                    unsafe {
                        *$error = SbError::new(SbErrorCode::ErrorPanic, &message);
                    }
                }
                SbErrorCode::ErrorPanic
            }
        }
    };
}

fn fail(error: *mut SbError, code: SbErrorCode, message: &str) -> SbErrorCode {
    if !error.is_null() {
        unsafe {
            *error = SbError::new(code, message);
        }
    }
    code
}

// ============================================================================
// FFI Vtable Implementations
// ============================================================================

extern "C" fn abi_version(major: *mut u32, minor: *mut u32, patch: *mut u32) {
    if !major.is_null() && !minor.is_null() && !patch.is_null() {
        unsafe {
            *major = SB_BOARD_ABI_VERSION_MAJOR;
            *minor = SB_BOARD_ABI_VERSION_MINOR;
            *patch = SB_BOARD_ABI_VERSION_PATCH;
        }
    }
}

extern "C" fn board_info(info: *mut SbBoardInfo) {
    if info.is_null() {
        return;
    }
    let info = unsafe { &mut *info };
    write_c_buf(&mut info.name, "Marquee");
    write_c_buf(&mut info.version, env!("CARGO_PKG_VERSION"));
    write_c_buf(&mut info.description, "Scrolling text banner");
}

extern "C" fn requires_early_init() -> bool {
    false
}

extern "C" fn create(
    params: *const SbCreateParams,
    handle: *mut *mut SbBoardHandle,
    error: *mut SbError,
) -> SbErrorCode {
    catch_panic!(error, {
        if params.is_null() || handle.is_null() {
            return fail(error, SbErrorCode::ErrorNullPointer, "Null pointer passed to create");
        }
        let params = unsafe { &*params };
        let config = if params.config_json.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(params.config_json) }.to_string_lossy().into_owned()
        };

        match MarqueeBoard::new(params.width, params.height, &config) {
            Ok(board) => {
                unsafe {
                    *handle = Box::into_raw(Box::new(board)) as *mut SbBoardHandle;
                }
                SbErrorCode::Success
            }
            Err(e) => fail(error, SbErrorCode::ErrorConfig, &e),
        }
    })
}

extern "C" fn render(
    handle: *mut SbBoardHandle,
    canvas: *mut SbCanvas,
    hold_ms: *mut u32,
    error: *mut SbError,
) -> SbErrorCode {
    catch_panic!(error, {
        if handle.is_null() || canvas.is_null() || hold_ms.is_null() {
            return fail(error, SbErrorCode::ErrorNullPointer, "Null pointer passed to render");
        }
        let board = unsafe { &*(handle as *const MarqueeBoard) };
        let canvas = unsafe { &mut *canvas };
        if canvas.pixels.is_null() {
            return fail(error, SbErrorCode::ErrorNullPointer, "Canvas has no pixels");
        }
        if canvas.width != board.width || canvas.height != board.height {
            return fail(error, SbErrorCode::ErrorInvalidArgument, "Canvas size changed");
        }
        let pixels = unsafe { std::slice::from_raw_parts_mut(canvas.pixels, canvas.len) };

        match board.draw(canvas.frame, pixels) {
            Ok(ms) => {
                unsafe {
                    *hold_ms = ms;
                }
                SbErrorCode::Success
            }
            Err(e) => fail(error, SbErrorCode::ErrorInvalidArgument, &e),
        }
    })
}

extern "C" fn destroy(handle: *mut SbBoardHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle as *mut MarqueeBoard);
        }
    }
}

// ============================================================================
// Plugin Registration
// ============================================================================

static VTABLE: SbBoardVTable = SbBoardVTable {
    abi_version,
    board_info,
    requires_early_init,
    create,
    render,
    cleanup: None,
    destroy,
};

/// Plugin entry point - returns the vtable for `class_name`, or null
#[no_mangle]
pub extern "C" fn sb_board_register(class_name: *const c_char) -> *const SbBoardVTable {
    if class_name.is_null() {
        return std::ptr::null();
    }
    let name = unsafe { CStr::from_ptr(class_name) };
    if name.to_bytes() == CLASS_NAME.as_bytes() {
        &VTABLE
    } else {
        std::ptr::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_register_by_class_name() {
        let good = CString::new("MarqueeBoard").unwrap();
        let bad = CString::new("ScoreBoard").unwrap();
        assert!(!sb_board_register(good.as_ptr()).is_null());
        assert!(sb_board_register(bad.as_ptr()).is_null());
        assert!(sb_board_register(std::ptr::null()).is_null());
    }

    #[test]
    fn test_offset_wraps() {
        let b = MarqueeBoard::new(64, 32, r#"{"text": "HI", "step": 2}"#).unwrap();
        // 2 glyphs of 6px, span is 76
        assert_eq!(b.offset(0), 64);
        assert_eq!(b.offset(10), 44);
        assert_eq!(b.offset(38), 64);
    }

    #[test]
    fn test_draw_through_vtable() {
        let cfg = CString::new(r#"{"text": "GOAL", "color": [255, 0, 0], "frame_ms": 40}"#).unwrap();
        let params = SbCreateParams { width: 32, height: 16, config_json: cfg.as_ptr() };
        let mut handle: *mut SbBoardHandle = std::ptr::null_mut();
        let mut err = SbError::default();
        assert_eq!((VTABLE.create)(&params, &mut handle, &mut err), SbErrorCode::Success);

        let mut pixels = vec![0u8; 32 * 16 * 3];
        let mut canvas = SbCanvas { pixels: pixels.as_mut_ptr(), len: pixels.len(), width: 32, height: 16, frame: 20 };
        let mut hold = 0u32;
        assert_eq!((VTABLE.render)(handle, &mut canvas, &mut hold, &mut err), SbErrorCode::Success);
        assert_eq!(hold, 40);
        assert!(pixels.chunks(3).any(|p| p == [255, 0, 0]));
        assert!(pixels.chunks(3).all(|p| p[1] == 0 && p[2] == 0));

        (VTABLE.destroy)(handle);
    }

    #[test]
    fn test_bad_config_reports_error() {
        let cfg = CString::new("{ nope").unwrap();
        let params = SbCreateParams { width: 32, height: 16, config_json: cfg.as_ptr() };
        let mut handle: *mut SbBoardHandle = std::ptr::null_mut();
        let mut err = SbError::default();
        assert_eq!((VTABLE.create)(&params, &mut handle, &mut err), SbErrorCode::ErrorConfig);
        assert!(handle.is_null());
        assert!(err.message_str().starts_with("Bad marquee config"));
    }
}
