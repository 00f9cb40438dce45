//! Storage is organized through [LogStore].
//! The basic idea is:
//!  - A backend only knows how to read the whole log and how to replace the whole log.
//!  - Every mutation is load-modify-store, so a file and a spreadsheet behave the same way.
//!  - Nothing is cached. Every read goes to the backend because another session may have written
//!    in the meantime.
//!
//! Two sessions appending at the same time can overwrite each other (last writer wins). This is
//! a known limitation of the load-modify-store model and is not hidden by retries.

pub mod csv_file;
pub mod file;
pub mod local;
pub mod schema;
pub mod sheet;

use std::{future::Future, ops::Deref};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::model::entry::{StudyEntry, StudyLog};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed study log: {0}")]
    Schema(String),
    #[error("Storage backend rejected the request: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("No entry at position {position}, the log has {len} entries")]
    NotFound { position: usize, len: usize },
}

/// Interface for abstracting the place entries are kept in.
pub trait LogBackend {
    /// Reads every entry in insertion order.
    fn read_all(&self) -> impl Future<Output = Result<Vec<StudyEntry>, PersistenceError>> + Send;

    /// Replaces the stored log with `entries`.
    fn write_all(
        &self,
        entries: &[StudyEntry],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

impl<T: Deref> LogBackend for T
where
    T::Target: LogBackend,
{
    fn read_all(&self) -> impl Future<Output = Result<Vec<StudyEntry>, PersistenceError>> + Send {
        self.deref().read_all()
    }

    fn write_all(
        &self,
        entries: &[StudyEntry],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send {
        self.deref().write_all(entries)
    }
}

/// Append-only study log on top of a [LogBackend].
pub struct LogStore<B> {
    backend: B,
}

impl<B: LogBackend> LogStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Loads the whole log. A backend failure is logged and turned into an empty log so that a
    /// dashboard can still render zero totals. Callers can't tell "empty" from "unavailable".
    pub async fn load_all(&self) -> StudyLog {
        match self.load_strict().await {
            Ok(log) => log,
            Err(e) => {
                error!("Failed to load study log, treating it as empty: {e}");
                StudyLog::default()
            }
        }
    }

    /// Loads the whole log and reports backend failures. Mutations go through this, since writing
    /// back an empty log after a failed read would wipe the store.
    pub async fn load_strict(&self) -> Result<StudyLog, PersistenceError> {
        let entries = self.backend.read_all().await?;
        debug!("Loaded {} entries", entries.len());
        Ok(StudyLog::new(entries))
    }

    /// Appends `entry` by rewriting the whole log. On error the entry is not recorded.
    pub async fn append(&self, entry: StudyEntry) -> Result<(), PersistenceError> {
        let log = self.load_strict().await?.appended(entry);
        self.backend.write_all(&log).await?;
        info!("Recorded entry, log has {} entries", log.len());
        Ok(())
    }

    /// Removes the entry at `position` of the freshly loaded log. Positions shift when another
    /// session wrote in between, so the caller should reload after a [StoreError::NotFound].
    pub async fn delete_at(&self, position: usize) -> Result<StudyEntry, StoreError> {
        let log = self.load_strict().await?;
        let len = log.len();
        let (removed, rest) = log
            .remove(position)
            .ok_or(StoreError::NotFound { position, len })?;
        self.backend.write_all(&rest).await?;
        info!("Deleted entry at {position}, log has {} entries", rest.len());
        Ok(removed)
    }
}
