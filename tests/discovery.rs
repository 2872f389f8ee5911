/*
 *  tests/discovery.rs
 *
 *  Board discovery over real module directories
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 */

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{write, Journal, RecordingClass};
use scoreboard::boards::{BoardClass, BoardSource, Capabilities, Catalog, Discovery};

fn catalog(modules: &[&str]) -> Catalog {
    let journal = Journal::default();
    let mut c = Catalog::new();
    for m in modules {
        c.add_module(m, vec![Arc::new(RecordingClass::new(m, &journal)) as Arc<dyn BoardClass>]);
    }
    c
}

fn roots(system: &Path, plugin: &Path) -> Vec<(PathBuf, BoardSource)> {
    vec![
        (system.to_path_buf(), BoardSource::System),
        (plugin.to_path_buf(), BoardSource::Plugin),
    ]
}

#[test]
fn test_bad_modules_do_not_affect_good_ones() {
    let sys = tempfile::tempdir().unwrap();
    let plug = tempfile::tempdir().unwrap();
    write(&sys.path().join("broken/plugin.json"), "{ \"id\": ");
    write(
        &sys.path().join("sleepy/plugin.json"),
        r#"{"id": "sleepy", "enabled": false, "boards": ["sleepy"]}"#,
    );
    write(&sys.path().join("nomanifest/config.json"), "{}");
    write(&plug.path().join("good/plugin.json"), r#"{"id": "good", "boards": ["good"]}"#);

    let catalog = catalog(&["broken", "sleepy", "good"]);
    let caps = Capabilities::compiled();
    let reg = Discovery::new(&catalog, &caps, "2026.1.0").discover(&roots(sys.path(), plug.path()));

    assert_eq!(reg.ids(), vec!["good".to_string()]);
    assert_eq!(reg.resolve("good").map(|d| d.source), Some(BoardSource::Plugin));
}

#[test]
fn test_missing_dependency_excludes_module() {
    let sys = tempfile::tempdir().unwrap();
    let plug = tempfile::tempdir().unwrap();
    write(
        &sys.path().join("stats/plugin.json"),
        r#"{"id": "stats", "requirements": {"dependencies": ["nhl-api>=2.0"]}, "boards": ["stats"]}"#,
    );
    let catalog = catalog(&["stats"]);

    let caps = Capabilities::compiled();
    let reg = Discovery::new(&catalog, &caps, "2026.1.0").discover(&roots(sys.path(), plug.path()));
    assert!(!reg.contains("stats"));

    let caps = Capabilities::compiled().with(["nhl_api"]);
    let reg = Discovery::new(&catalog, &caps, "2026.1.0").discover(&roots(sys.path(), plug.path()));
    assert!(reg.contains("stats"));
}

#[test]
fn test_legacy_dependency_key_is_honoured() {
    let sys = tempfile::tempdir().unwrap();
    let plug = tempfile::tempdir().unwrap();
    write(
        &plug.path().join("stats/plugin.json"),
        r#"{"name": "stats", "requirements": {"python_dependencies": ["definitely-missing-lib>=2.0"]}, "boards": ["stats"]}"#,
    );
    let catalog = catalog(&["stats"]);

    let caps = Capabilities::compiled();
    let reg = Discovery::new(&catalog, &caps, "2026.1.0").discover(&roots(sys.path(), plug.path()));
    assert!(reg.is_empty());

    let caps = Capabilities::compiled().with(["definitely_missing_lib"]);
    let reg = Discovery::new(&catalog, &caps, "2026.1.0").discover(&roots(sys.path(), plug.path()));
    assert_eq!(reg.ids(), vec!["stats".to_string()]);
}

#[test]
fn test_duplicate_id_keeps_system_board() {
    let sys = tempfile::tempdir().unwrap();
    let plug = tempfile::tempdir().unwrap();
    write(&sys.path().join("alpha/plugin.json"), r#"{"id": "alpha", "boards": ["scores"]}"#);
    write(&plug.path().join("beta/plugin.json"), r#"{"id": "beta", "boards": ["scores"]}"#);

    let catalog = catalog(&["alpha", "beta"]);
    let caps = Capabilities::compiled();
    let reg = Discovery::new(&catalog, &caps, "2026.1.0").discover(&roots(sys.path(), plug.path()));

    assert_eq!(reg.len(), 1);
    let desc = reg.resolve("scores").unwrap();
    assert_eq!(desc.source, BoardSource::System);
    assert_eq!(desc.manifest_id, "alpha");
}

#[test]
fn test_unresolvable_board_drops_only_that_board() {
    let sys = tempfile::tempdir().unwrap();
    let plug = tempfile::tempdir().unwrap();
    write(
        &sys.path().join("pair/plugin.json"),
        r#"{"id": "pair", "boards": [
            {"id": "left", "class_name": "pair"},
            {"id": "right", "class_name": "NoSuchClass"}
        ]}"#,
    );
    let catalog = catalog(&["pair"]);
    let caps = Capabilities::compiled();
    let reg = Discovery::new(&catalog, &caps, "2026.1.0").discover(&roots(sys.path(), plug.path()));
    assert_eq!(reg.ids(), vec!["left".to_string()]);
}

#[test]
fn test_shipped_builtins_all_register() {
    let system = Path::new(env!("CARGO_MANIFEST_DIR")).join("boards/builtins");
    let empty = tempfile::tempdir().unwrap();
    let catalog = Catalog::builtin();
    let caps = Capabilities::compiled();
    let reg = Discovery::new(&catalog, &caps, scoreboard::APP_VERSION).discover_dirs(&system, empty.path());

    let mut expected = vec![
        "clock",
        "holiday_countdown",
        "pbdisplay",
        "screensaver",
        "season_countdown",
        "weather",
        "wxalert",
    ];
    expected.sort();
    assert_eq!(reg.ids(), expected);
    assert!(reg.resolve("season_countdown").unwrap().early_init());
    assert!(!reg.resolve("clock").unwrap().early_init());
}
