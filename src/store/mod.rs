//! Append-only storage for completed sessions.
//!
//! The timer engine never touches storage. The daemon's event dispatcher
//! appends each completed [`SessionRecord`]; the `history` and `stats`
//! commands read them back.
//!
//! # Storage format
//!
//! [`JsonlSessionStore`] writes one JSON object per line:
//!
//! ```text
//! {"id":"…","intent":"Write report","duration":1500,"completedAt":"2024-05-01T09:25:00Z","type":"focus"}
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::types::SessionRecord;

/// Errors raised by session stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("Session store I/O error at {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Record could not be encoded
    #[error("Failed to serialize session record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only log of completed sessions.
pub trait SessionStore {
    /// Appends a record. Records are never rewritten or removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    fn append(&mut self, record: &SessionRecord) -> Result<(), StoreError>;

    /// Returns every stored record in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load_all(&self) -> Result<Vec<SessionRecord>, StoreError>;
}

// ============================================================================
// JsonlSessionStore
// ============================================================================

/// File-backed store writing one JSON record per line.
#[derive(Debug, Clone)]
pub struct JsonlSessionStore {
    path: PathBuf,
}

impl JsonlSessionStore {
    /// Creates a store at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for JsonlSessionStore {
    fn append(&mut self, record: &SessionRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.flush().map_err(|e| self.io_error(e))?;

        Ok(())
    }

    /// Reads every line; a missing file is an empty history.
    ///
    /// Lines that fail to parse (e.g. a torn write) are skipped with a warning.
    fn load_all(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(line = index + 1, "skipping malformed session record: {}", e),
            }
        }

        Ok(records)
    }
}

// ============================================================================
// MemorySessionStore
// ============================================================================

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: Vec<SessionRecord>,
    should_fail: bool,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent appends fail.
    pub fn set_should_fail(&mut self, should_fail: bool) {
        self.should_fail = should_fail;
    }

    #[must_use]
    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }
}

impl SessionStore for MemorySessionStore {
    fn append(&mut self, record: &SessionRecord) -> Result<(), StoreError> {
        if self.should_fail {
            return Err(StoreError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("Mock failure"),
            });
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self.records.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
