use serde_json::{Value, json};
use std::cell::Cell;
use std::fs::{self, File};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use ec2_prices::cache::{CacheStore, DEFAULT_TTL};
use ec2_prices::error::{ErrorKind, PriceError, Result};

fn backdate(path: &std::path::Path, by: Duration) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - by).unwrap();
}

#[test]
fn test_round_trip_within_ttl_does_not_refetch() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path().join("cache"));
    let calls = Cell::new(0);
    let fetch = || -> Result<Vec<u8>> {
        calls.set(calls.get() + 1);
        Ok(br#"{"answer": 42}"#.to_vec())
    };

    let first: Value = store.get_or_fetch("doc", DEFAULT_TTL, fetch).unwrap();
    assert_eq!(calls.get(), 1);
    assert!(store.path_for("doc").is_file());
    assert_eq!(
        fs::read(store.path_for("doc")).unwrap(),
        br#"{"answer": 42}"#.to_vec()
    );

    let second: Value = store
        .get_or_fetch("doc", DEFAULT_TTL, || -> Result<Vec<u8>> {
            panic!("must not fetch while the entry is fresh")
        })
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(second, json!({"answer": 42}));
}

#[test]
fn test_expired_entry_is_refetched() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());

    let _: Value = store
        .get_or_fetch("doc", DEFAULT_TTL, || Ok(b"[1]".to_vec()))
        .unwrap();
    backdate(&store.path_for("doc"), Duration::from_secs(2 * 86_400));

    let calls = Cell::new(0);
    let refreshed: Value = store
        .get_or_fetch("doc", DEFAULT_TTL, || {
            calls.set(calls.get() + 1);
            Ok(b"[2]".to_vec())
        })
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(refreshed, json!([2]));
    assert_eq!(fs::read(store.path_for("doc")).unwrap(), b"[2]".to_vec());
}

#[test]
fn test_age_just_under_ttl_is_fresh() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let _: Value = store
        .get_or_fetch("doc", DEFAULT_TTL, || Ok(b"1".to_vec()))
        .unwrap();
    backdate(&store.path_for("doc"), Duration::from_secs(3600));

    let ttl = Duration::from_secs(2 * 3600);
    let v: Value = store
        .get_or_fetch("doc", ttl, || Ok(b"2".to_vec()))
        .unwrap();
    assert_eq!(v, json!(1));

    let ttl = Duration::from_secs(1800);
    let v: Value = store
        .get_or_fetch("doc", ttl, || Ok(b"3".to_vec()))
        .unwrap();
    assert_eq!(v, json!(3));
}

#[test]
fn test_zero_ttl_always_refetches() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let calls = Cell::new(0);
    for _ in 0..3 {
        let _: Value = store
            .get_or_fetch("doc", Duration::ZERO, || {
                calls.set(calls.get() + 1);
                Ok(b"{}".to_vec())
            })
            .unwrap();
    }
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_failed_fetch_leaves_existing_entry_untouched() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let _: Value = store
        .get_or_fetch("doc", DEFAULT_TTL, || Ok(b"\"old\"".to_vec()))
        .unwrap();
    let path = store.path_for("doc");
    backdate(&path, Duration::from_secs(2 * 86_400));
    let mtime_before = fs::metadata(&path).unwrap().modified().unwrap();

    let err = store
        .get_or_fetch::<Value, _>("doc", DEFAULT_TTL, || {
            Err(PriceError::Http {
                url: "https://pricing.example/index.json".to_string(),
                status: 503,
            })
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(matches!(err, PriceError::Http { status: 503, .. }));

    assert_eq!(fs::read(&path).unwrap(), b"\"old\"".to_vec());
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), mtime_before);
}

#[test]
fn test_undecodable_response_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    let err = store
        .get_or_fetch::<Value, _>("doc", DEFAULT_TTL, || Ok(b"<html>oops</html>".to_vec()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(!store.path_for("doc").exists());
}

#[test]
fn test_corrupted_fresh_entry_is_refetched() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    fs::write(store.path_for("doc"), b"{\"truncated\": ").unwrap();

    let v: Value = store
        .get_or_fetch("doc", DEFAULT_TTL, || Ok(b"{\"ok\": true}".to_vec()))
        .unwrap();
    assert_eq!(v, json!({"ok": true}));
    assert_eq!(fs::read(store.path_for("doc")).unwrap(), b"{\"ok\": true}".to_vec());
}

#[test]
fn test_creates_nested_cache_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b").join("cache");
    let store = CacheStore::new(&nested);
    let _: Value = store
        .get_or_fetch("doc", DEFAULT_TTL, || Ok(b"null".to_vec()))
        .unwrap();
    assert!(nested.is_dir());
    assert!(store.path_for("doc").is_file());
}

#[test]
fn test_unwritable_cache_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    // A regular file where the cache directory should be
    let blocker = dir.path().join("cache");
    fs::write(&blocker, b"not a directory").unwrap();
    let store = CacheStore::new(&blocker);

    let err = store
        .get_or_fetch::<Value, _>("doc", DEFAULT_TTL, || Ok(b"{}".to_vec()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_age_and_remove() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    assert!(store.age("doc").unwrap().is_none());

    let _: Value = store
        .get_or_fetch("doc", DEFAULT_TTL, || Ok(b"{}".to_vec()))
        .unwrap();
    let age = store.age("doc").unwrap().unwrap();
    assert!(age < Duration::from_secs(60));

    assert!(store.remove("doc").unwrap());
    assert!(!store.remove("doc").unwrap());
    assert!(store.age("doc").unwrap().is_none());
}

#[test]
fn test_clear_only_removes_cache_files() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    for key in ["a", "b", "c"] {
        let _: Value = store
            .get_or_fetch(key, DEFAULT_TTL, || Ok(b"{}".to_vec()))
            .unwrap();
    }
    fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

    assert_eq!(store.clear().unwrap(), 3);
    assert!(dir.path().join("notes.txt").exists());
    assert_eq!(store.clear().unwrap(), 0);

    let missing = CacheStore::new(dir.path().join("does-not-exist"));
    assert_eq!(missing.clear().unwrap(), 0);
}

#[test]
fn test_concurrent_writers_on_different_keys() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path().join("cache"));

    std::thread::scope(|scope| {
        for i in 0..8 {
            let store = &store;
            scope.spawn(move || {
                let key = format!("key-{i}");
                let body = format!("{{\"n\": {i}}}").into_bytes();
                let v: Value = store
                    .get_or_fetch(&key, DEFAULT_TTL, || Ok(body))
                    .unwrap();
                assert_eq!(v["n"], json!(i));
            });
        }
    });

    for i in 0..8 {
        let raw = fs::read(store.path_for(&format!("key-{i}"))).unwrap();
        let v: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(v, json!({"n": i}));
    }
}
