/*
 *  tests/cache.rs
 *
 *  Instance cache: lazy construction, reuse, eviction
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 */

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{config_with_off_day, descriptor, runtime, scratch_dir, Journal, RecordingClass};
use scoreboard::boards::{BoardClass, InstanceCache};

#[test]
fn test_get_or_create_is_idempotent() {
    let rt = runtime(config_with_off_day(&[]));
    let journal = Journal::default();
    let class = Arc::new(RecordingClass::new("clock", &journal));
    let desc = descriptor("clock", class.clone() as Arc<dyn BoardClass>, &scratch_dir());
    let cache = InstanceCache::new();

    let first = cache.get_or_create(&desc, &rt).expect("first build");
    let second = cache.get_or_create(&desc, &rt).expect("cached");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(class.build_count(), 1);
    assert_eq!(cache.list_cached(), vec!["clock".to_string()]);
}

#[test]
fn test_evict_runs_cleanup_once_and_rebuilds() {
    let rt = runtime(config_with_off_day(&[]));
    let journal = Journal::default();
    let class = Arc::new(RecordingClass::new("weather", &journal));
    let desc = descriptor("weather", class.clone() as Arc<dyn BoardClass>, &scratch_dir());
    let cache = InstanceCache::new();

    let before = cache.get_or_create(&desc, &rt).unwrap();
    assert!(cache.evict("weather"));
    assert!(!cache.evict("weather"));
    assert_eq!(class.cleanups.load(Ordering::SeqCst), 1);
    assert!(!cache.contains("weather"));

    let after = cache.get_or_create(&desc, &rt).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(class.build_count(), 2);
}

#[test]
fn test_failed_construction_is_not_cached() {
    let rt = runtime(config_with_off_day(&[]));
    let journal = Journal::default();
    let class = Arc::new(RecordingClass::new("broken", &journal).failing());
    let desc = descriptor("broken", class.clone() as Arc<dyn BoardClass>, &scratch_dir());
    let cache = InstanceCache::new();

    assert!(cache.get_or_create(&desc, &rt).is_none());
    assert!(cache.get_or_create(&desc, &rt).is_none());
    assert!(!cache.contains("broken"));
    // retried on every request
    assert_eq!(class.build_count(), 2);
}

#[test]
fn test_evict_all_cleans_every_instance() {
    let rt = runtime(config_with_off_day(&[]));
    let journal = Journal::default();
    let a = Arc::new(RecordingClass::new("a", &journal));
    let b = Arc::new(RecordingClass::new("b", &journal));
    let cache = InstanceCache::new();
    cache.get_or_create(&descriptor("a", a.clone() as Arc<dyn BoardClass>, &scratch_dir()), &rt).unwrap();
    cache.get_or_create(&descriptor("b", b.clone() as Arc<dyn BoardClass>, &scratch_dir()), &rt).unwrap();

    assert_eq!(cache.evict_all(), 2);
    assert!(cache.list_cached().is_empty());
    assert_eq!(a.cleanups.load(Ordering::SeqCst), 1);
    assert_eq!(b.cleanups.load(Ordering::SeqCst), 1);
}
