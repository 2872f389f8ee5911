/*
 *  boards/plugin/adapter.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Native plugin vtable wrapped as a board class and board instance
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

use std::ffi::CString;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error};

use crate::boards::{Board, BoardClass, BoardContext, BoardError, BoardInfo};
use crate::display::{matrix, SharedMatrix};
use crate::interrupts::SleepEvent;

use super::ffi::{SbBoardHandle, SbBoardVTable, SbCanvas, SbCreateParams, SbError, SbErrorCode};
use super::loader::{LoadedLibrary, NativeBoardMeta};
use super::PluginError;

/// Longest a native board may hold the matrix when it keeps asking for frames
const DEFAULT_DISPLAY_SECONDS: u64 = 15;

/// Board class provided by a shared library
pub struct NativeBoardClass {
    library: Arc<LoadedLibrary>,
    vtable: *const SbBoardVTable,
    class_name: String,
    meta: NativeBoardMeta,
    early_init: bool,
}

// SAFETY: the vtable is immutable static data inside `library`, which this
// value keeps loaded; the function pointers carry no thread affinity.
unsafe impl Send for NativeBoardClass {}
unsafe impl Sync for NativeBoardClass {}

impl NativeBoardClass {
    pub fn new(library: Arc<LoadedLibrary>, class_name: &str) -> Result<Self, PluginError> {
        let (vtable, meta) = library.vtable(class_name)?;
        let vtable = vtable as *const SbBoardVTable;
        // SAFETY: pointer just obtained from the live library
        let early_init = catch_ffi_call(|| unsafe { ((*vtable).requires_early_init)() }).unwrap_or(false);
        Ok(Self {
            library,
            vtable,
            class_name: class_name.to_string(),
            meta,
            early_init,
        })
    }

    pub fn meta(&self) -> &NativeBoardMeta {
        &self.meta
    }

    fn vt(&self) -> &SbBoardVTable {
        // SAFETY: see the Send/Sync note above
        unsafe { &*self.vtable }
    }
}

impl BoardClass for NativeBoardClass {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn create(&self, ctx: BoardContext) -> Result<Box<dyn Board>, BoardError> {
        let config = serde_json::Value::Object(ctx.config.clone()).to_string();
        let config = CString::new(config).map_err(|e| BoardError::Config(e.to_string()))?;
        let (width, height) = ctx.display_size;
        let params = SbCreateParams { width, height, config_json: config.as_ptr() };

        let mut handle: *mut SbBoardHandle = std::ptr::null_mut();
        let mut err = SbError::default();
        let vt = self.vt();
        let code = catch_ffi_call(|| (vt.create)(&params, &mut handle, &mut err))
            .map_err(|msg| BoardError::Plugin(msg))?;
        if code != SbErrorCode::Success || handle.is_null() {
            return Err(BoardError::Instantiation(err.message_str()));
        }
        debug!("Created native board instance: {:p}", handle);

        let max_secs = ctx.config_u64("display_seconds", DEFAULT_DISPLAY_SECONDS);
        Ok(Box::new(NativeBoard {
            library: Arc::clone(&self.library),
            vtable: self.vtable,
            handle,
            info: BoardInfo::new(&self.meta.name, &self.meta.version, &self.meta.description),
            matrix: ctx.matrix,
            sleep: ctx.sleep,
            size: (width, height),
            max_display: Duration::from_secs(max_secs),
            cleaned: false,
        }))
    }

    fn requires_early_init(&self) -> bool {
        self.early_init
    }
}

/// Live instance of a native board
pub struct NativeBoard {
    // keeps the vtable and handle code mapped
    #[allow(dead_code)]
    library: Arc<LoadedLibrary>,
    vtable: *const SbBoardVTable,
    handle: *mut SbBoardHandle,
    info: BoardInfo,
    matrix: SharedMatrix,
    sleep: Arc<SleepEvent>,
    size: (u32, u32),
    max_display: Duration,
    cleaned: bool,
}

// SAFETY: the handle is only touched through the vtable while the cache's
// per-board mutex is held, so at most one thread calls into it at a time.
unsafe impl Send for NativeBoard {}

impl NativeBoard {
    fn vt(&self) -> &SbBoardVTable {
        // SAFETY: `library` keeps the vtable alive
        unsafe { &*self.vtable }
    }

    /// Ask the plugin for one frame
    fn frame(&mut self, index: u32, buf: &mut [u8]) -> Result<u32, BoardError> {
        let mut canvas = SbCanvas {
            pixels: buf.as_mut_ptr(),
            len: buf.len(),
            width: self.size.0,
            height: self.size.1,
            frame: index,
        };
        let mut hold_ms = 0u32;
        let mut err = SbError::default();
        let handle = self.handle;
        let vt = self.vt();
        let code = catch_ffi_call(|| (vt.render)(handle, &mut canvas, &mut hold_ms, &mut err))
            .map_err(BoardError::Plugin)?;
        if code != SbErrorCode::Success {
            return Err(BoardError::Render(err.message_str()));
        }
        Ok(hold_ms)
    }
}

impl Board for NativeBoard {
    fn info(&self) -> BoardInfo {
        self.info.clone()
    }

    fn render(&mut self) -> Result<(), BoardError> {
        let (w, h) = self.size;
        let mut buf = vec![0u8; (w * h * 3) as usize];
        let started = Instant::now();
        let mut index = 0u32;
        loop {
            buf.fill(0);
            let hold_ms = self.frame(index, &mut buf)?;
            {
                let mut m = matrix::lock(&self.matrix)?;
                m.blit_rgb(&buf)?;
                m.render()?;
            }
            if hold_ms == 0 || self.sleep.wait(Duration::from_millis(hold_ms as u64)) {
                break;
            }
            index = index.wrapping_add(1);
            if started.elapsed() >= self.max_display {
                break;
            }
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        if let Some(cleanup) = self.vt().cleanup {
            let handle = self.handle;
            if let Err(msg) = catch_ffi_call(|| cleanup(handle)) {
                error!("{}", msg);
            }
        }
    }
}

impl Drop for NativeBoard {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            debug!("Destroying native board instance: {:p}", self.handle);
            let destroy = self.vt().destroy;
            let handle = self.handle;
            let _ = catch_ffi_call(|| destroy(handle));
            self.handle = std::ptr::null_mut();
        }
    }
}

/// Run a plugin call, turning a panic into an error message
fn catch_ffi_call<R, F>(f: F) -> Result<R, String>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|panic_info| {
        let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
            format!("Plugin panic: {}", s)
        } else if let Some(s) = panic_info.downcast_ref::<String>() {
            format!("Plugin panic: {}", s)
        } else {
            "Plugin panic: unknown error".to_string()
        };
        error!("Caught panic in plugin FFI call: {}", message);
        message
    })
}
