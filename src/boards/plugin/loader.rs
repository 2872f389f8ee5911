/*
 *  boards/plugin/loader.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shared library loading and board class lookup
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
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use log::{debug, info, warn};

use super::ffi::{
    read_c_buf, BoardRegisterFn, SbBoardInfo, SbBoardVTable, SB_BOARD_ABI_VERSION_MAJOR,
    SB_BOARD_ABI_VERSION_MINOR, SB_BOARD_ABI_VERSION_PATCH, SB_BOARD_REGISTER_SYMBOL,
};
use super::PluginError;

/// Board metadata read from a plugin vtable
#[derive(Debug, Clone)]
pub struct NativeBoardMeta {
    pub name: String,
    pub version: String,
    pub description: String,
    pub abi_version: (u32, u32, u32),
}

/// A loaded board plugin library
///
/// Kept alive by every class resolved from it; vtables handed out by the
/// library stay valid as long as this value exists.
pub struct LoadedLibrary {
    library: Library,
    path: PathBuf,
}

impl LoadedLibrary {
    pub fn load(path: &Path) -> Result<Self, PluginError> {
        if !path.is_file() {
            return Err(PluginError::NotFound(path.to_path_buf()));
        }
        info!("Loading board plugin from: {}", path.display());

        // SAFETY: loading runs the library's initialisers; board plugins are
        // installed by the operator into the plugin directory.
        let library = unsafe { Library::new(path) }.map_err(|e| PluginError::Load(e.to_string()))?;

        // fail early when the registration symbol is missing
        // SAFETY: symbol type matches the documented registration signature.
        unsafe { library.get::<BoardRegisterFn>(SB_BOARD_REGISTER_SYMBOL) }
            .map_err(|e| PluginError::Symbol(e.to_string()))?;

        Ok(Self { library, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ask the library for a class vtable and check its ABI
    pub fn vtable(&self, class_name: &str) -> Result<(&SbBoardVTable, NativeBoardMeta), PluginError> {
        // SAFETY: checked in `load`, signature fixed by the ABI.
        let register: Symbol<BoardRegisterFn> = unsafe { self.library.get(SB_BOARD_REGISTER_SYMBOL) }
            .map_err(|e| PluginError::Symbol(e.to_string()))?;

        let name = CString::new(class_name)
            .map_err(|_| PluginError::UnknownClass(class_name.to_string()))?;
        let ptr = register(name.as_ptr());
        if ptr.is_null() {
            return Err(PluginError::UnknownClass(class_name.to_string()));
        }
        // SAFETY: non-null vtable pointer into the library's static data,
        // valid while `self.library` is loaded.
        let vtable: &SbBoardVTable = unsafe { &*ptr };

        let (mut major, mut minor, mut patch) = (0u32, 0u32, 0u32);
        (vtable.abi_version)(&mut major, &mut minor, &mut patch);
        debug!("Plugin ABI version: {}.{}.{}", major, minor, patch);

        if major != SB_BOARD_ABI_VERSION_MAJOR {
            return Err(PluginError::AbiMismatch(format!(
                "plugin {}.{}.{} incompatible with host {}.{}.{}",
                major, minor, patch,
                SB_BOARD_ABI_VERSION_MAJOR, SB_BOARD_ABI_VERSION_MINOR, SB_BOARD_ABI_VERSION_PATCH
            )));
        }
        if minor > SB_BOARD_ABI_VERSION_MINOR {
            warn!(
                "Plugin {} has newer minor ABI {}.{}.{} than host {}.{}.{}",
                self.path.display(),
                major, minor, patch,
                SB_BOARD_ABI_VERSION_MAJOR, SB_BOARD_ABI_VERSION_MINOR, SB_BOARD_ABI_VERSION_PATCH
            );
        }

        let mut info = SbBoardInfo::default();
        (vtable.board_info)(&mut info);
        let meta = NativeBoardMeta {
            name: read_c_buf(&info.name),
            version: read_c_buf(&info.version),
            description: read_c_buf(&info.description),
            abi_version: (major, minor, patch),
        };
        info!("Loaded native board: {} v{} ({})", meta.name, meta.version, class_name);
        Ok((vtable, meta))
    }
}
