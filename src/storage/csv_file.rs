//! Log kept as a CSV table with a header row, the format dataframe based dashboards read and write.

use std::path::PathBuf;

use csv::{ReaderBuilder, Writer};
use tracing::debug;

use crate::{
    fs::operations::{read_shared, rewrite_exclusive},
    model::entry::StudyEntry,
    utils::time::{StudyZone, format_naive_timestamp},
};

use super::{
    LogBackend, PersistenceError,
    schema::{decode_table, encode_table},
};

pub const CSV_LOG_FILE_NAME: &str = "study_log.csv";

pub struct CsvBackend {
    path: PathBuf,
    zone: StudyZone,
}

impl CsvBackend {
    pub fn new(path: PathBuf, zone: StudyZone) -> Self {
        Self { path, zone }
    }
}

impl LogBackend for CsvBackend {
    async fn read_all(&self) -> Result<Vec<StudyEntry>, PersistenceError> {
        debug!("Reading {:?}", self.path);
        let Some(contents) = read_shared(&self.path).await? else {
            return Ok(vec![]);
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(contents.as_slice());
        let rows = reader
            .records()
            .map(|record| record.map(|v| v.iter().map(String::from).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()?;

        decode_table(rows, self.zone)
    }

    async fn write_all(&self, entries: &[StudyEntry]) -> Result<(), PersistenceError> {
        // Timestamps are civil time of the zone, so nothing is lost by dropping the offset.
        let mut writer = Writer::from_writer(vec![]);
        for row in encode_table(entries, format_naive_timestamp) {
            writer.write_record(&row)?;
        }
        let buffer = writer
            .into_inner()
            .map_err(|e| PersistenceError::Io(e.into_error()))?;

        rewrite_exclusive(&self.path, &buffer).await?;
        debug!("Wrote {} entries into {:?}", entries.len(), self.path);
        Ok(())
    }
}
