//! Spreadsheet backend. A spreadsheet has no row level mutation we can rely on, so the sheet is
//! read as a whole grid and written back as a whole grid.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    model::entry::StudyEntry,
    utils::time::{StudyZone, format_timestamp},
};

use super::{
    LogBackend, PersistenceError,
    schema::{decode_table, encode_table},
};

/// Access to the cells of a single sheet. Implemented by API clients of remote spreadsheets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetClient: Send + Sync {
    /// Every row of the sheet, the header row included.
    async fn get_values(&self) -> Result<Vec<Vec<String>>, PersistenceError>;

    /// Replaces the whole sheet with `rows`.
    async fn update_values(&self, rows: Vec<Vec<String>>) -> Result<(), PersistenceError>;
}

/// Sheet living in memory. Useful for local development and as a stand-in for a remote sheet.
#[derive(Default)]
pub struct MemorySheet {
    rows: Mutex<Vec<Vec<String>>>,
}

impl MemorySheet {
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    fn snapshot(&self) -> Result<Vec<Vec<String>>, PersistenceError> {
        self.rows
            .lock()
            .map(|v| v.clone())
            .map_err(|_| PersistenceError::Backend("sheet lock poisoned".into()))
    }
}

#[async_trait]
impl SheetClient for MemorySheet {
    async fn get_values(&self) -> Result<Vec<Vec<String>>, PersistenceError> {
        self.snapshot()
    }

    async fn update_values(&self, rows: Vec<Vec<String>>) -> Result<(), PersistenceError> {
        let mut current = self
            .rows
            .lock()
            .map_err(|_| PersistenceError::Backend("sheet lock poisoned".into()))?;
        *current = rows;
        Ok(())
    }
}

/// [LogBackend] over a [SheetClient]. Rows are written back with canonical headers.
pub struct SheetBackend<C> {
    client: C,
    zone: StudyZone,
}

impl<C: SheetClient> SheetBackend<C> {
    pub fn new(client: C, zone: StudyZone) -> Self {
        Self { client, zone }
    }
}

impl<C: SheetClient> LogBackend for SheetBackend<C> {
    async fn read_all(&self) -> Result<Vec<StudyEntry>, PersistenceError> {
        let rows = self.client.get_values().await?;
        decode_table(rows, self.zone)
    }

    async fn write_all(&self, entries: &[StudyEntry]) -> Result<(), PersistenceError> {
        let rows = encode_table(entries, format_timestamp);
        self.client.update_values(rows).await?;
        debug!("Wrote {} entries into the sheet", entries.len());
        Ok(())
    }
}
