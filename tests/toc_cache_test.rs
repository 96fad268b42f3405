use std::path::PathBuf;

use cfpilot::FileTocCache;
use crazyflie_lib::TocCache;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cfpilot-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn stored_toc_is_returned_by_crc() {
    let dir = temp_dir("roundtrip");
    let cache = FileTocCache::new(&dir);

    cache.store_toc(0xDEADBEEF, r#"{"stateEstimate.roll":0}"#);

    assert_eq!(
        cache.get_toc(0xDEADBEEF).as_deref(),
        Some(r#"{"stateEstimate.roll":0}"#)
    );
    assert_eq!(cache.get_toc(0x12345678), None);

    // A second cache on the same directory sees the entry
    assert!(FileTocCache::new(&dir).get_toc(0xDEADBEEF).is_some());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn entries_are_named_after_the_crc() {
    let dir = temp_dir("naming").join("nested");
    let cache = FileTocCache::new(&dir);

    cache.store_toc(0xAB, "{}");

    assert!(dir.join("000000AB.json").is_file());
    std::fs::remove_dir_all(dir.parent().unwrap()).unwrap();
}

#[test]
fn disabled_cache_never_hits() {
    let cache = FileTocCache::disabled();
    cache.store_toc(1, "{}");

    assert_eq!(cache.get_toc(1), None);
    assert_eq!(cache.dir(), None);
    assert!(FileTocCache::from_dir(None).dir().is_none());
}
