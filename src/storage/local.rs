use std::path::Path;

use crate::{model::entry::StudyEntry, utils::time::StudyZone};

use super::{LogBackend, PersistenceError, csv_file::CsvBackend, file::FileBackend};

/// Log file in the application directory. The file extension picks the format: `.jsonl` and
/// `.json` are JSON lines, anything else is CSV.
pub enum LocalBackend {
    Csv(CsvBackend),
    JsonLines(FileBackend),
}

impl LocalBackend {
    /// Creates the parent directory of `path` if needed.
    pub fn open(path: &Path, zone: StudyZone) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let is_json = path
            .extension()
            .and_then(|v| v.to_str())
            .is_some_and(|v| v.eq_ignore_ascii_case("jsonl") || v.eq_ignore_ascii_case("json"));
        Ok(if is_json {
            LocalBackend::JsonLines(FileBackend::new(path.to_path_buf(), zone))
        } else {
            LocalBackend::Csv(CsvBackend::new(path.to_path_buf(), zone))
        })
    }
}

impl LogBackend for LocalBackend {
    async fn read_all(&self) -> Result<Vec<StudyEntry>, PersistenceError> {
        match self {
            LocalBackend::Csv(v) => v.read_all().await,
            LocalBackend::JsonLines(v) => v.read_all().await,
        }
    }

    async fn write_all(&self, entries: &[StudyEntry]) -> Result<(), PersistenceError> {
        match self {
            LocalBackend::Csv(v) => v.write_all(entries).await,
            LocalBackend::JsonLines(v) => v.write_all(entries).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{FixedOffset, TimeZone};
    use tempfile::tempdir;

    use super::LocalBackend;
    use crate::{
        model::entry::{Method, StudyEntry},
        storage::{LogStore, csv_file::CSV_LOG_FILE_NAME, file::LOG_FILE_NAME},
        utils::time::StudyZone,
    };

    fn entry() -> StudyEntry {
        StudyEntry {
            timestamp: FixedOffset::east_opt(9 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 5, 1, 7, 30, 0)
                .unwrap(),
            subject: "行政法".into(),
            duration_minutes: 20,
            method: Method::Timer,
            notes: None,
        }
    }

    #[test]
    fn extension_selects_format() -> Result<()> {
        let dir = tempdir()?;
        let zone = StudyZone::default();

        assert!(matches!(
            LocalBackend::open(&dir.path().join(CSV_LOG_FILE_NAME), zone)?,
            LocalBackend::Csv(_)
        ));
        assert!(matches!(
            LocalBackend::open(&dir.path().join(LOG_FILE_NAME), zone)?,
            LocalBackend::JsonLines(_)
        ));
        assert!(matches!(
            LocalBackend::open(&dir.path().join("nested/log.JSON"), zone)?,
            LocalBackend::JsonLines(_)
        ));
        assert!(dir.path().join("nested").is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn csv_log_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CSV_LOG_FILE_NAME);
        let store = LogStore::new(LocalBackend::open(&path, StudyZone::default())?);

        store.append(entry()).await?;

        assert_eq!(store.load_strict().await?.to_vec(), vec![entry()]);
        assert!(std::fs::read_to_string(&path)?.starts_with("Timestamp,Subject"));
        Ok(())
    }
}
