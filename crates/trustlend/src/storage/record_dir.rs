//! Versioned JSON record directory.
//!
//! Stores one record per file, named `{key}.json`, inside a base directory.
//!
//! File format:
//! ```json
//! { "version": 1, "record": { ... } }
//! ```
//!
//! Writes go to a sibling `.tmp` file first and are renamed into place, so a
//! reader never observes a half-written record.
//!
//! Read-check-write sequences that must hold across processes take a
//! [`RecordLock`]: an exclusive advisory lock on `{name}.lock` in the same
//! directory.

use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};

// ── File format constants ─────────────────────────────────────────────────────

const RECORD_FILE_VERSION: u32 = 1;

const RECORD_EXT: &str = "json";
const TMP_EXT: &str = "json.tmp";
const LOCK_EXT: &str = "lock";

// ── On-disk structures ────────────────────────────────────────────────────────

/// Wrapper written to disk for each record.
#[derive(Debug, Serialize)]
struct RecordFileRef<'a, T> {
    version: u32,
    record: &'a T,
}

/// Wrapper read back from disk.
#[derive(Debug, Deserialize)]
struct RecordFile<T> {
    version: u32,
    record: T,
}

// ── RecordDir ─────────────────────────────────────────────────────────────────

/// Filesystem-backed directory of `T` records keyed by a file-safe string.
///
/// Single-file writes are atomic. Callers that check stored state before
/// writing hold a [`RecordLock`] across the whole sequence.
pub struct RecordDir<T> {
    base_dir: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for RecordDir<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordDir")
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> RecordDir<T> {
    /// Open (creating if missing) a record directory at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Io` if the directory cannot be created.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            _record: PhantomData,
        })
    }

    /// Directory this store writes into.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persist `record` under `key`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for keys that are not file-safe, `SerializationError`
    /// if encoding fails, `Io` for filesystem errors.
    pub fn save(&self, key: &str, record: &T) -> Result<()> {
        let path = self.record_path(key)?;
        let file = RecordFileRef {
            version: RECORD_FILE_VERSION,
            record,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| MarketError::SerializationError(e.to_string()))?;

        let tmp = path.with_extension(TMP_EXT);
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Load the record stored under `key`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no file exists, `InvalidFileFormat` for malformed or
    /// unsupported files, `Io` for filesystem errors.
    pub fn load(&self, key: &str) -> Result<T> {
        let path = self.record_path(key)?;
        if !path.exists() {
            return Err(MarketError::NotFound(format!("record not found: {key}")));
        }
        self.read_path(&path)
    }

    /// Load the record stored under `key`, or `None` if there is no file.
    pub fn try_load(&self, key: &str) -> Result<Option<T>> {
        let path = self.record_path(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => self.decode(&path, &bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Block until this process holds the exclusive lock named `name`.
    ///
    /// The lock is released when the returned guard is dropped. Lock files
    /// are left in place and never listed as records.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for names that are not file-safe, `Io` if the lock
    /// file cannot be opened or locked.
    pub fn lock(&self, name: &str) -> Result<RecordLock> {
        if !is_file_safe(name) {
            return Err(MarketError::InvalidInput(format!(
                "lock name is not file-safe: {name:?}"
            )));
        }
        let path = self.base_dir.join(format!("{name}.{LOCK_EXT}"));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        FileExt::lock_exclusive(&file)?;
        Ok(RecordLock { file })
    }

    /// Delete the record stored under `key`. Returns whether a file existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.record_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List the keys of all stored records, in no particular order.
    pub fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for entry in std::fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                keys.push(stem.to_string());
            }
        }

        Ok(keys)
    }

    /// Load every stored record, in no particular order.
    pub fn load_all(&self) -> Result<Vec<T>> {
        let keys = self.list_keys()?;
        let mut records = Vec::with_capacity(keys.len());
        for key in &keys {
            records.push(self.load(key)?);
        }
        Ok(records)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn read_path(&self, path: &Path) -> Result<T> {
        let bytes = std::fs::read(path)?;
        self.decode(path, &bytes)
    }

    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<T> {
        let file: RecordFile<T> = serde_json::from_slice(bytes).map_err(|e| {
            MarketError::InvalidFileFormat(format!("failed to parse {}: {e}", path.display()))
        })?;
        if file.version != RECORD_FILE_VERSION {
            return Err(MarketError::InvalidFileFormat(format!(
                "unsupported record version {} in {}",
                file.version,
                path.display()
            )));
        }
        Ok(file.record)
    }

    /// Build `{base_dir}/{key}.json`, rejecting keys that could escape it.
    fn record_path(&self, key: &str) -> Result<PathBuf> {
        if !is_file_safe(key) {
            return Err(MarketError::InvalidInput(format!(
                "record key is not file-safe: {key:?}"
            )));
        }
        Ok(self.base_dir.join(format!("{key}.{RECORD_EXT}")))
    }
}

// ── RecordLock ────────────────────────────────────────────────────────────────

/// Guard for an exclusive lock taken with [`RecordDir::lock`].
#[derive(Debug)]
pub struct RecordLock {
    file: File,
}

impl Drop for RecordLock {
    fn drop(&mut self) {
        // Closing the file releases the lock as well.
        let _ = FileExt::unlock(&self.file);
    }
}

/// Keys are restricted to ASCII alphanumerics, `_` and `-`.
pub fn is_file_safe(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 128
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
