/*
 *  tests/rotation.rs
 *
 *  Rotation order, interrupt priority and termination
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 */

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use log::{Level, LevelFilter, Log, Metadata, Record};

use common::{
    config_with_off_day, descriptor, recording_registry, runtime, scratch_dir, Journal, RecordingClass,
};
use scoreboard::boards::{BoardClass, BoardContext, Boards, Registry, RotationOutcome};
use scoreboard::interrupts::Interrupt;
use scoreboard::RotationMode;

fn register(reg: &mut Registry, class: RecordingClass) {
    let id = class.name.clone();
    let class: Arc<dyn BoardClass> = Arc::new(class);
    reg.register(descriptor(&id, class, &scratch_dir())).unwrap();
}

/// Keeps every log record so tests can check what was reported and at which level
struct CapturedLog(Mutex<Vec<(Level, String)>>);

impl Log for CapturedLog {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut lines = self.0.lock().unwrap_or_else(|p| p.into_inner());
        lines.push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

fn captured_log() -> &'static CapturedLog {
    static LOG: OnceLock<&'static CapturedLog> = OnceLock::new();
    LOG.get_or_init(|| {
        let log: &'static CapturedLog = Box::leak(Box::new(CapturedLog(Mutex::new(Vec::new()))));
        log::set_logger(log).unwrap();
        log::set_max_level(LevelFilter::Debug);
        log
    })
}

fn logged(level: Level, needle: &str) -> bool {
    let lines = captured_log().0.lock().unwrap();
    lines.iter().any(|(l, msg)| *l == level && msg.contains(needle))
}

fn explode(_: &BoardContext) {
    panic!("render blew up");
}

#[test]
fn test_plain_rotation_visits_each_slot_once() {
    let rt = runtime(config_with_off_day(&["a", "b", "c"]));
    let journal = Journal::default();
    let boards = Boards::new(recording_registry(&["a", "b", "c"], &journal));

    let report = boards.off_day(&rt);
    assert_eq!(report.outcome, RotationOutcome::Done);
    assert_eq!(report.rendered, vec!["a", "b", "c"]);
    assert_eq!(journal.entries(), vec!["a", "b", "c"]);
    assert_eq!(rt.app.board_track().curr_board.as_deref(), Some("c"));
}

#[test]
fn test_unknown_board_is_skipped() {
    captured_log();
    let rt = runtime(config_with_off_day(&["a", "ghost", "c"]));
    let journal = Journal::default();
    let boards = Boards::new(recording_registry(&["a", "c"], &journal));

    let report = boards.off_day(&rt);
    assert_eq!(report.outcome, RotationOutcome::Done);
    assert_eq!(report.rendered, vec!["a", "c"]);
    assert_eq!(report.skipped, vec!["ghost"]);
    assert!(logged(Level::Error, "Board 'ghost' not found"));
}

#[test]
fn test_empty_mode_list_renders_nothing() {
    let rt = runtime(config_with_off_day(&["a"]));
    let journal = Journal::default();
    let boards = Boards::new(recording_registry(&["a"], &journal));

    let report = boards.intermission(&rt);
    assert_eq!(report.outcome, RotationOutcome::Done);
    assert!(report.rendered.is_empty());
}

#[test]
fn test_interrupt_priority_order() {
    let rt = runtime(config_with_off_day(&["slot", "next", "last"]));
    let journal = Journal::default();
    let mut reg = recording_registry(&["next", "last", "button_board", "ext", "wxalert"], &journal);
    register(
        &mut reg,
        RecordingClass::new("slot", &journal).on_render(Arc::new(|ctx: &BoardContext| {
            let ints = &ctx.app.interrupts;
            ints.set_screensaver(true);
            ints.trigger_weather_alert();
            ints.trigger_external("ext");
            ints.trigger_manual();
        })),
    );
    register(
        &mut reg,
        RecordingClass::new("screensaver", &journal)
            .on_render(Arc::new(|ctx: &BoardContext| ctx.app.interrupts.set_screensaver(false))),
    );
    let boards = Boards::new(reg);

    let report = boards.off_day(&rt);
    assert_eq!(report.outcome, RotationOutcome::Done);
    // raised during "slot", served in priority order, then "next" is shown and the rotation moves on
    assert_eq!(
        report.rendered,
        vec!["slot", "button_board", "ext", "wxalert", "screensaver", "next", "last"]
    );
    assert!(report.skipped.is_empty());
    assert!(!rt.app.interrupts.any_set());
    assert_eq!(rt.app.board_track().prev_board.as_deref(), Some("next"));
}

#[test]
fn test_trigger_held_while_screensaver_runs() {
    let rt = runtime(config_with_off_day(&["slot"]));
    let journal = Journal::default();
    let saw_manual = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&saw_manual);
    let mut reg = recording_registry(&["slot", "screensaver"], &journal);
    register(
        &mut reg,
        RecordingClass::new("button_board", &journal).on_render(Arc::new(move |ctx: &BoardContext| {
            seen.store(ctx.app.interrupts.is_set(Interrupt::Manual), Ordering::SeqCst);
            ctx.app.interrupts.set_screensaver(false);
        })),
    );
    let boards = Boards::new(reg);

    rt.app.interrupts.set_screensaver(true);
    rt.app.interrupts.trigger_manual();
    let report = boards.off_day(&rt);

    assert!(saw_manual.load(Ordering::SeqCst));
    assert!(!rt.app.interrupts.is_set(Interrupt::Manual));
    assert_eq!(report.rendered, vec!["button_board", "slot"]);
}

#[test]
fn test_trigger_cleared_before_render_otherwise() {
    let rt = runtime(config_with_off_day(&["slot"]));
    let journal = Journal::default();
    let saw_manual = Arc::new(AtomicBool::new(true));
    let seen = Arc::clone(&saw_manual);
    let mut reg = recording_registry(&["slot"], &journal);
    register(
        &mut reg,
        RecordingClass::new("button_board", &journal).on_render(Arc::new(move |ctx: &BoardContext| {
            seen.store(ctx.app.interrupts.is_set(Interrupt::Manual), Ordering::SeqCst);
        })),
    );
    let boards = Boards::new(reg);

    rt.app.interrupts.trigger_manual();
    let report = boards.off_day(&rt);

    assert!(!saw_manual.load(Ordering::SeqCst));
    assert_eq!(report.rendered, vec!["button_board", "slot"]);
}

#[test]
fn test_screensaver_suppressed_during_intermission() {
    let mut cfg = config_with_off_day(&[]);
    if let Some(b) = cfg.boards.as_mut() {
        b.intermission = vec!["a".into(), "b".into()];
    }
    let rt = runtime(cfg);
    let journal = Journal::default();
    let boards = Boards::new(recording_registry(&["a", "b", "screensaver"], &journal));

    rt.app.interrupts.set_screensaver(true);
    let report = boards.run(RotationMode::Intermission, &rt);
    assert_eq!(report.rendered, vec!["a", "b"]);
    assert!(rt.app.interrupts.is_set(Interrupt::Screensaver));
}

#[test]
fn test_missing_screensaver_board_still_terminates() {
    let rt = runtime(config_with_off_day(&["a", "b"]));
    let journal = Journal::default();
    let boards = Boards::new(recording_registry(&["a", "b"], &journal));

    rt.app.interrupts.set_screensaver(true);
    let report = boards.off_day(&rt);
    assert_eq!(report.outcome, RotationOutcome::Done);
    assert!(report.rendered.is_empty());
    assert_eq!(report.skipped, vec!["screensaver", "screensaver"]);
}

#[test]
fn test_shutdown_stops_mid_rotation() {
    let rt = runtime(config_with_off_day(&["a", "b", "c"]));
    let journal = Journal::default();
    let mut reg = recording_registry(&["b", "c"], &journal);
    register(
        &mut reg,
        RecordingClass::new("a", &journal).on_render(Arc::new(|ctx: &BoardContext| ctx.app.request_shutdown())),
    );
    let boards = Boards::new(reg);

    let report = boards.off_day(&rt);
    assert_eq!(report.outcome, RotationOutcome::Shutdown);
    assert_eq!(report.rendered, vec!["a"]);
}

#[test]
fn test_panicking_board_does_not_stop_rotation() {
    let rt = runtime(config_with_off_day(&["boom", "after"]));
    let journal = Journal::default();
    let mut reg = recording_registry(&["after"], &journal);
    register(
        &mut reg,
        RecordingClass::new("boom", &journal).on_render(Arc::new(explode)),
    );
    let boards = Boards::new(reg);

    let report = boards.off_day(&rt);
    assert_eq!(report.rendered, vec!["boom", "after"]);
    assert_eq!(journal.entries(), vec!["boom", "after"]);
}

#[test]
fn test_early_init_builds_only_flagged_boards() {
    let rt = runtime(config_with_off_day(&[]));
    let journal = Journal::default();
    let mut reg = recording_registry(&["a", "b", "c"], &journal);
    register(&mut reg, RecordingClass::new("d", &journal).early());
    register(&mut reg, RecordingClass::new("e", &journal).early());
    let boards = Boards::new(reg);

    assert_eq!(boards.initialize_early(&rt), 2);
    assert_eq!(boards.cache().list_cached(), vec!["d", "e"]);
    assert!(journal.entries().is_empty());
}
