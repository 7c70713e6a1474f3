//! # Cache Module
//!
//! Disk-backed cache for downloaded JSON documents. Each key maps to one
//! file under the cache directory; freshness is the file's modification
//! time, so there is no separate index to keep consistent.
//!
//! Writes go through a temporary file in the same directory followed by a
//! rename, which means concurrent readers of a key never see a partially
//! written document and different keys never contend.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{PriceError, Result};

/// Default cache TTL (24 hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

/// Default cache directory, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = "cache";

const CACHE_SUFFIX: &str = ".cache.json";

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", file_stem(key), CACHE_SUFFIX))
    }

    /// Age of the entry for `key`, or `None` when there is no entry
    pub fn age(&self, key: &str) -> Result<Option<Duration>> {
        entry_age(&self.path_for(key))
    }

    /// Return the cached document for `key` if it is younger than `ttl`,
    /// otherwise call `fetch`, store its bytes and return them decoded.
    ///
    /// A failing `fetch` leaves the existing entry untouched, and bytes that
    /// do not decode as `T` are never written.
    pub fn get_or_fetch<T, F>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let path = self.path_for(key);

        match entry_age(&path)? {
            Some(age) if age < ttl => match read_json::<T>(&path) {
                Ok(value) => {
                    info!(path = %path.display(), age_secs = age.as_secs(), "Using cached document");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Discarding unreadable cache entry");
                }
            },
            Some(age) => {
                debug!(path = %path.display(), age_secs = age.as_secs(), "Cache entry expired");
            }
            None => {
                debug!(path = %path.display(), "Cache miss");
            }
        }

        let bytes = fetch()?;
        let value = serde_json::from_slice::<T>(&bytes).map_err(|source| PriceError::Parse {
            what: format!("document for cache key {key}"),
            source,
        })?;
        self.write_atomic(&path, &bytes)?;
        Ok(value)
    }

    /// Delete the entry for `key`. Returns whether a file was removed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PriceError::io(path, e)),
        }
    }

    /// Delete every cache file in the directory, leaving anything else alone.
    /// Returns the number of files removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(PriceError::io(&self.dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| PriceError::io(&self.dir, e))?;
            let path = entry.path();
            let is_cache_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(CACHE_SUFFIX));
            if is_cache_file && path.is_file() {
                fs::remove_file(&path).map_err(|e| PriceError::io(&path, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| PriceError::io(&self.dir, e))?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| PriceError::io(&self.dir, e))?;
        tmp.write_all(bytes)
            .map_err(|e| PriceError::io(tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| PriceError::io(path, e.error))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Wrote cache entry");
        Ok(())
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

/// Map a cache key to a filename stem. Keys that are already safe file names
/// are used verbatim; anything else is replaced by its SHA-256 digest.
fn file_stem(key: &str) -> String {
    let safe = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if safe {
        return key.to_string();
    }
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

fn entry_age(path: &Path) -> Result<Option<Duration>> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PriceError::io(path, e)),
    };
    if !meta.is_file() {
        return Ok(None);
    }
    let modified = meta.modified().map_err(|e| PriceError::io(path, e))?;
    // mtime in the future (clock skew, copied files) counts as brand new
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    let fetched_at: DateTime<Utc> = modified.into();
    debug!(path = %path.display(), %fetched_at, "Found cache entry");
    Ok(Some(age))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).map_err(|e| PriceError::io(path, e))?;
    serde_json::from_slice(&raw).map_err(|source| PriceError::Parse {
        what: path.display().to_string(),
        source,
    })
}
