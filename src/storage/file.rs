use std::path::PathBuf;

use tracing::debug;

use crate::{
    fs::operations::{read_lines_shared, rewrite_exclusive},
    model::entry::StudyEntry,
    utils::time::StudyZone,
};

use super::{LogBackend, PersistenceError, schema::EntryRecord};

pub const LOG_FILE_NAME: &str = "study_log.jsonl";

/// Keeps the log in a single JSON-lines file, one [EntryRecord] per line.
pub struct FileBackend {
    path: PathBuf,
    zone: StudyZone,
}

impl FileBackend {
    pub fn new(path: PathBuf, zone: StudyZone) -> Self {
        Self { path, zone }
    }
}

impl LogBackend for FileBackend {
    async fn read_all(&self) -> Result<Vec<StudyEntry>, PersistenceError> {
        debug!("Reading {:?}", self.path);
        let Some(lines) = read_lines_shared(&self.path).await? else {
            return Ok(vec![]);
        };

        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str::<EntryRecord>(line)
                    .map_err(|e| PersistenceError::Schema(format!("line {}: {e}", index + 1)))?
                    .into_entry(self.zone)
                    .map_err(|e| PersistenceError::Schema(format!("line {}: {e}", index + 1)))
            })
            .collect()
    }

    async fn write_all(&self, entries: &[StudyEntry]) -> Result<(), PersistenceError> {
        let mut buffer = Vec::<u8>::new();
        for entry in entries {
            serde_json::to_writer(&mut buffer, &EntryRecord::from(entry))?;
            buffer.push(b'\n');
        }

        rewrite_exclusive(&self.path, &buffer).await?;
        debug!("Wrote {} entries into {:?}", entries.len(), self.path);
        Ok(())
    }
}
