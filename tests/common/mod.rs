/*
 *  tests/common/mod.rs
 *
 *  Shared fixtures for the board runtime integration tests
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 */

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scoreboard::boards::{
    Board, BoardClass, BoardContext, BoardDescriptor, BoardError, BoardInfo, BoardRuntime,
    BoardSource, Registry,
};
use scoreboard::config::{BoardsConfig, Config, PushButtonConfig};
use scoreboard::display::drivers::mock::MockDriver;
use scoreboard::display::Matrix;
use scoreboard::{AppContext, SleepEvent};

pub type RenderHook = Arc<dyn Fn(&BoardContext) + Send + Sync>;

/// Render order shared by every board of a test
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, id: &str) {
        self.0.lock().unwrap().push(id.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Board class that records renders, optionally failing or running a hook
pub struct RecordingClass {
    pub name: String,
    pub journal: Journal,
    pub early: bool,
    pub fail: bool,
    pub builds: Arc<AtomicUsize>,
    pub cleanups: Arc<AtomicUsize>,
    pub hook: Option<RenderHook>,
}

impl RecordingClass {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            early: false,
            fail: false,
            builds: Arc::new(AtomicUsize::new(0)),
            cleanups: Arc::new(AtomicUsize::new(0)),
            hook: None,
        }
    }

    pub fn early(mut self) -> Self {
        self.early = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn on_render(mut self, hook: RenderHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl BoardClass for RecordingClass {
    fn class_name(&self) -> &str {
        &self.name
    }

    fn create(&self, ctx: BoardContext) -> Result<Box<dyn Board>, BoardError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BoardError::Instantiation(format!("{} refuses to build", self.name)));
        }
        Ok(Box::new(RecordingBoard {
            id: self.name.clone(),
            journal: self.journal.clone(),
            cleanups: Arc::clone(&self.cleanups),
            hook: self.hook.clone(),
            ctx,
        }))
    }

    fn requires_early_init(&self) -> bool {
        self.early
    }
}

pub struct RecordingBoard {
    id: String,
    journal: Journal,
    cleanups: Arc<AtomicUsize>,
    hook: Option<RenderHook>,
    ctx: BoardContext,
}

impl Board for RecordingBoard {
    fn info(&self) -> BoardInfo {
        BoardInfo::new(&self.id, "0.1.0", "recording test board")
    }

    fn render(&mut self) -> Result<(), BoardError> {
        self.journal.push(&self.id);
        if let Some(hook) = &self.hook {
            hook(&self.ctx);
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

/// Config whose off-day rotation is `ids`
pub fn config_with_off_day(ids: &[&str]) -> Config {
    Config {
        boards: Some(BoardsConfig {
            off_day: ids.iter().map(|s| s.to_string()).collect(),
            ..BoardsConfig::default()
        }),
        pushbutton: Some(PushButtonConfig {
            state_triggered1: "button_board".into(),
            ..PushButtonConfig::default()
        }),
        ..Config::default()
    }
}

pub fn runtime(cfg: Config) -> BoardRuntime {
    let matrix = Matrix::new(Box::new(MockDriver::new(64, 32))).unwrap().shared();
    BoardRuntime::new(AppContext::new(cfg, SleepEvent::new()), matrix)
}

pub fn descriptor(id: &str, class: Arc<dyn BoardClass>, dir: &Path) -> BoardDescriptor {
    BoardDescriptor {
        id: id.to_string(),
        class,
        source: BoardSource::System,
        module_dir: dir.to_path_buf(),
        manifest_id: id.to_string(),
        manifest_version: "0.1.0".into(),
    }
}

/// Registry with one recording board per id, all sharing `journal`
pub fn recording_registry(ids: &[&str], journal: &Journal) -> Registry {
    let mut reg = Registry::new();
    for id in ids {
        let class: Arc<dyn BoardClass> = Arc::new(RecordingClass::new(id, journal));
        reg.register(descriptor(id, class, &scratch_dir())).unwrap();
    }
    reg
}

/// Directory without config or layout files
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join("sb-test-no-such-board-dir")
}

pub fn write(path: &Path, text: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, text).unwrap();
}
