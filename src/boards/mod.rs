/*
 *  boards/mod.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Board contract, construction context and the legacy adapter
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

//! Board orchestration
//!
//! Everything that ends up on the matrix is a *board*. Boards are declared
//! by a `plugin.json` manifest in a module directory, validated at startup
//! by [`discovery`], held in the [`registry`], instantiated lazily by the
//! [`cache`] and driven by the [`rotation`] loop.
//!
//! ## Layers
//!
//! 1. **Contract** (this file) - the [`Board`] trait, [`BoardContext`] and
//!    the [`LegacyBoardAdapter`]
//! 2. **Catalog** (`catalog.rs`) - compiled board classes addressable by
//!    module and class name
//! 3. **Plugins** (`plugin/`) - native board classes loaded from shared
//!    libraries
//! 4. **Discovery / Registry / Cache / Rotation** - the runtime

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::context::AppContext;
use crate::display::{DisplayError, SharedMatrix};
use crate::interrupts::SleepEvent;

pub mod builtins;
pub mod cache;
pub mod catalog;
pub mod discovery;
pub mod early_init;
pub mod layout;
pub mod manifest;
pub mod registry;
pub mod rotation;

#[cfg(feature = "plugin-system")]
pub mod plugin;

pub use cache::{BoardHandle, InstanceCache};
pub use catalog::{BoardClass, Catalog, StaticClass};
pub use discovery::{Capabilities, CapabilityProbe, Discovery};
pub use layout::BoardLayout;
pub use manifest::BoardManifest;
pub use registry::{BoardDescriptor, BoardSource, Registry};
pub use rotation::{Boards, RotationOutcome, RotationReport};

/// Errors raised by a board while being constructed or rendered
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("board construction failed: {0}")]
    Instantiation(String),
    #[error("render failed: {0}")]
    Render(String),
    #[error("bad board configuration: {0}")]
    Config(String),
    #[error("display: {0}")]
    Display(#[from] DisplayError),
    #[error("plugin: {0}")]
    Plugin(String),
}

/// Board metadata shown by `--list-boards` and in logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl BoardInfo {
    pub fn new(name: &str, version: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
        }
    }
}

/// The contract every board satisfies
///
/// `render` owns the matrix for its whole display time: it draws, flushes
/// and waits on the sleep event before returning. A wait that ends early
/// means an interrupt is pending, the board should return promptly.
pub trait Board: Send {
    fn info(&self) -> BoardInfo;

    fn render(&mut self) -> Result<(), BoardError>;

    fn validate_config(&self) -> bool {
        true
    }

    /// Release resources before the instance is dropped
    fn cleanup(&mut self) {}
}

/// Handles shared by every board instance
#[derive(Clone)]
pub struct BoardRuntime {
    pub app: Arc<AppContext>,
    pub matrix: SharedMatrix,
    pub sleep: Arc<SleepEvent>,
}

impl BoardRuntime {
    pub fn new(app: Arc<AppContext>, matrix: SharedMatrix) -> Self {
        let sleep = Arc::clone(app.sleep_event());
        Self { app, matrix, sleep }
    }

    pub fn display_size(&self) -> (u32, u32) {
        match crate::display::matrix::lock(&self.matrix) {
            Ok(m) => (m.width(), m.height()),
            Err(_) => self.app.config().display().size(),
        }
    }
}

/// Everything a board constructor receives
#[derive(Clone)]
pub struct BoardContext {
    pub app: Arc<AppContext>,
    pub matrix: SharedMatrix,
    pub sleep: Arc<SleepEvent>,
    /// Module directory the board was declared in
    pub board_dir: PathBuf,
    /// Contents of `config.json` in the module directory, empty if absent
    pub config: Map<String, Value>,
    pub layout: Option<BoardLayout>,
    pub display_size: (u32, u32),
}

impl BoardContext {
    pub fn load(rt: &BoardRuntime, board_dir: &Path) -> Self {
        let display_size = rt.display_size();
        Self {
            app: Arc::clone(&rt.app),
            matrix: Arc::clone(&rt.matrix),
            sleep: Arc::clone(&rt.sleep),
            board_dir: board_dir.to_path_buf(),
            config: load_board_config(board_dir),
            layout: BoardLayout::load(board_dir, display_size),
            display_size,
        }
    }

    pub fn config_str(&self, key: &str, default: &str) -> String {
        self.config
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn config_u64(&self, key: &str, default: u64) -> u64 {
        self.config.get(key).and_then(Value::as_u64).unwrap_or(default)
    }

    pub fn config_bool(&self, key: &str, default: bool) -> bool {
        self.config.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// `[r, g, b]` array or colour name
    pub fn config_color(&self, key: &str, default: embedded_graphics::pixelcolor::Rgb888)
        -> embedded_graphics::pixelcolor::Rgb888
    {
        use embedded_graphics::pixelcolor::Rgb888;
        match self.config.get(key) {
            Some(Value::String(name)) => crate::display::named_color(name),
            Some(Value::Array(rgb)) if rgb.len() == 3 => {
                let c = |i: usize| rgb[i].as_u64().unwrap_or(0).min(255) as u8;
                Rgb888::new(c(0), c(1), c(2))
            }
            _ => default,
        }
    }
}

/// Read `config.json` from a module directory
///
/// A missing file yields an empty map; a malformed one is logged and
/// also yields an empty map so the board falls back to its defaults.
pub fn load_board_config(board_dir: &Path) -> Map<String, Value> {
    let path = board_dir.join("config.json");
    if !path.exists() {
        return Map::new();
    }
    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()));
    match parsed {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            log::error!("Board config {} is not a JSON object", path.display());
            Map::new()
        }
        Err(e) => {
            log::error!("Error loading board config {}: {}", path.display(), e);
            Map::new()
        }
    }
}

/// How an older board produces its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyStyle {
    /// Has a `render` entry point
    Render,
    /// Has a `draw` entry point
    Draw,
    /// Does all its work in the constructor
    ConstructorOnly,
}

/// Boards written before the [`Board`] contract existed
///
/// They are constructed from the bare `(app, matrix, sleep)` triple and
/// expose one of three entry styles.
pub trait LegacyBoard: Send {
    fn style(&self) -> LegacyStyle;

    fn render(&mut self) -> Result<(), BoardError> {
        Ok(())
    }

    fn draw(&mut self) -> Result<(), BoardError> {
        Ok(())
    }
}

/// Legacy constructor signature
pub type LegacyFactory =
    fn(Arc<AppContext>, SharedMatrix, Arc<SleepEvent>) -> Result<Box<dyn LegacyBoard>, BoardError>;

/// Wraps a [`LegacyBoard`] so the rotation sees a plain [`Board`]
pub struct LegacyBoardAdapter {
    inner: Box<dyn LegacyBoard>,
    info: BoardInfo,
}

impl LegacyBoardAdapter {
    pub fn new(class_name: &str, inner: Box<dyn LegacyBoard>) -> Self {
        Self {
            inner,
            info: BoardInfo::new(class_name, "1.0.0", &format!("Legacy board: {}", class_name)),
        }
    }

    pub fn construct(class_name: &str, factory: LegacyFactory, ctx: BoardContext) -> Result<Self, BoardError> {
        let inner = factory(ctx.app, ctx.matrix, ctx.sleep)?;
        Ok(Self::new(class_name, inner))
    }
}

impl Board for LegacyBoardAdapter {
    fn info(&self) -> BoardInfo {
        self.info.clone()
    }

    fn render(&mut self) -> Result<(), BoardError> {
        match self.inner.style() {
            LegacyStyle::Render => self.inner.render(),
            LegacyStyle::Draw => self.inner.draw(),
            // already rendered when it was built
            LegacyStyle::ConstructorOnly => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        style: LegacyStyle,
        renders: Arc<AtomicUsize>,
        draws: Arc<AtomicUsize>,
    }

    impl LegacyBoard for Counting {
        fn style(&self) -> LegacyStyle {
            self.style
        }
        fn render(&mut self) -> Result<(), BoardError> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn draw(&mut self) -> Result<(), BoardError> {
            self.draws.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn adapter(style: LegacyStyle) -> (LegacyBoardAdapter, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let renders = Arc::new(AtomicUsize::new(0));
        let draws = Arc::new(AtomicUsize::new(0));
        let inner = Counting { style, renders: renders.clone(), draws: draws.clone() };
        (LegacyBoardAdapter::new("Counting", Box::new(inner)), renders, draws)
    }

    #[test]
    fn test_legacy_adapter_dispatch() {
        let (mut a, r, d) = adapter(LegacyStyle::Render);
        a.render().unwrap();
        assert_eq!((r.load(Ordering::SeqCst), d.load(Ordering::SeqCst)), (1, 0));

        let (mut a, r, d) = adapter(LegacyStyle::Draw);
        a.render().unwrap();
        assert_eq!((r.load(Ordering::SeqCst), d.load(Ordering::SeqCst)), (0, 1));

        let (mut a, r, d) = adapter(LegacyStyle::ConstructorOnly);
        a.render().unwrap();
        assert_eq!((r.load(Ordering::SeqCst), d.load(Ordering::SeqCst)), (0, 0));
        assert_eq!(a.info().description, "Legacy board: Counting");
    }

    #[test]
    fn test_board_config_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_board_config(dir.path()).is_empty());

        std::fs::write(dir.path().join("config.json"), "{ nope").unwrap();
        assert!(load_board_config(dir.path()).is_empty());

        std::fs::write(dir.path().join("config.json"), r#"{"display_seconds": 7}"#).unwrap();
        let cfg = load_board_config(dir.path());
        assert_eq!(cfg.get("display_seconds").and_then(Value::as_u64), Some(7));
    }
}
