//! Stored shape of a [StudyEntry]. Older logs disagree on field names (`Timestamp` vs `date`,
//! `Duration_Minutes` vs `minutes`), every variant is normalized here so nothing past the store
//! sees backend specific names.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{
    model::entry::{Method, StudyEntry},
    utils::time::{StudyZone, format_timestamp, parse_timestamp},
};

use super::PersistenceError;

/// The struct used for storing an entry on the disk, one JSON object per line.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct EntryRecord {
    #[serde(alias = "Timestamp", alias = "date", alias = "Date")]
    pub timestamp: String,
    #[serde(alias = "Subject")]
    pub subject: String,
    #[serde(alias = "Duration_Minutes", alias = "duration_minutes", alias = "Minutes")]
    pub minutes: i64,
    #[serde(default, alias = "Method", skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, alias = "Notes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EntryRecord {
    /// Validates the record and moves its timestamp into `zone`.
    pub fn into_entry(self, zone: StudyZone) -> Result<StudyEntry, PersistenceError> {
        let timestamp = parse_timestamp(&self.timestamp, zone).ok_or_else(|| {
            PersistenceError::Schema(format!("unreadable timestamp {:?}", self.timestamp))
        })?;

        let duration_minutes = u32::try_from(self.minutes)
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| {
                PersistenceError::Schema(format!(
                    "duration has to be at least 1 minute, found {}",
                    self.minutes
                ))
            })?;

        if self.subject.trim().is_empty() {
            return Err(PersistenceError::Schema("empty subject".into()));
        }

        // Logs written before methods were tracked only contain timer sessions.
        let method = match self.method.as_deref().map(str::trim) {
            None | Some("") => Method::Timer,
            Some(v) => v
                .parse::<Method>()
                .map_err(|e| PersistenceError::Schema(e.to_string()))?,
        };

        Ok(StudyEntry {
            timestamp,
            subject: self.subject.as_str().into(),
            duration_minutes,
            method,
            notes: self.notes.filter(|v| !v.is_empty()),
        })
    }
}

impl From<&StudyEntry> for EntryRecord {
    fn from(entry: &StudyEntry) -> Self {
        EntryRecord {
            timestamp: format_timestamp(&entry.timestamp),
            subject: entry.subject.label().to_string(),
            minutes: entry.duration_minutes as i64,
            method: Some(entry.method.to_string()),
            notes: entry.notes.clone(),
        }
    }
}

/// Column of a tabular backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Timestamp,
    Subject,
    Minutes,
    Method,
    Notes,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Timestamp,
        Column::Subject,
        Column::Minutes,
        Column::Method,
        Column::Notes,
    ];

    /// Recognizes every header name used so far, ignoring case and surrounding spaces.
    pub fn from_header(header: &str) -> Option<Column> {
        match header.trim().to_ascii_lowercase().as_str() {
            "timestamp" | "date" => Some(Column::Timestamp),
            "subject" => Some(Column::Subject),
            "minutes" | "duration_minutes" => Some(Column::Minutes),
            "method" => Some(Column::Method),
            "notes" => Some(Column::Notes),
            _ => None,
        }
    }

    /// Header written by this crate.
    pub fn canonical_header(&self) -> &'static str {
        match self {
            Column::Timestamp => "Timestamp",
            Column::Subject => "Subject",
            Column::Minutes => "Duration_Minutes",
            Column::Method => "Method",
            Column::Notes => "Notes",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Column::Timestamp | Column::Subject | Column::Minutes)
    }
}

/// Position of every known column inside a table, resolved from its header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableLayout {
    positions: [Option<usize>; 5],
}

impl TableLayout {
    fn from_headers(headers: &[String]) -> Result<Self, PersistenceError> {
        let mut positions = [None; 5];
        for (index, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header) {
                positions[column as usize].get_or_insert(index);
            }
        }

        let missing = Column::ALL
            .iter()
            .filter(|v| v.is_required() && positions[**v as usize].is_none())
            .map(|v| v.canonical_header())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(PersistenceError::Schema(format!(
                "table is missing columns {}",
                missing.join(", ")
            )));
        }

        Ok(Self { positions })
    }

    fn cell<'a>(&self, row: &'a [String], column: Column) -> Option<&'a str> {
        self.positions[column as usize]
            .and_then(|index| row.get(index))
            .map(|v| v.as_str())
    }

    fn record(&self, row: &[String]) -> Result<EntryRecord, PersistenceError> {
        let text = |column| self.cell(row, column).unwrap_or_default().to_string();
        let optional = |column| {
            self.cell(row, column)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        Ok(EntryRecord {
            timestamp: text(Column::Timestamp),
            subject: text(Column::Subject),
            minutes: parse_minutes(&text(Column::Minutes))?,
            method: optional(Column::Method),
            notes: optional(Column::Notes),
        })
    }
}

/// Spreadsheets and dataframes like to hand numbers back as `30.0`.
fn parse_minutes(cell: &str) -> Result<i64, PersistenceError> {
    let cell = cell.trim();
    cell.parse::<i64>()
        .ok()
        .or_else(|| {
            cell.parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.)
                .map(|v| v as i64)
        })
        .ok_or_else(|| PersistenceError::Schema(format!("unreadable minutes {cell:?}")))
}

/// Decodes a header row followed by entry rows. Blank rows are skipped, an empty table is an empty
/// log.
pub fn decode_table(
    rows: Vec<Vec<String>>,
    zone: StudyZone,
) -> Result<Vec<StudyEntry>, PersistenceError> {
    let mut rows = rows.into_iter();
    let Some(headers) = rows.next() else {
        return Ok(vec![]);
    };
    let layout = TableLayout::from_headers(&headers)?;

    rows.filter(|row| row.iter().any(|v| !v.trim().is_empty()))
        .map(|row| layout.record(&row)?.into_entry(zone))
        .collect()
}

/// Canonical header row followed by one row per entry.
pub fn encode_table(
    entries: &[StudyEntry],
    timestamp: impl Fn(&DateTime<FixedOffset>) -> String,
) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(entries.len() + 1);
    rows.push(
        Column::ALL
            .iter()
            .map(|v| v.canonical_header().to_string())
            .collect::<Vec<_>>(),
    );
    for entry in entries {
        rows.push(vec![
            timestamp(&entry.timestamp),
            entry.subject.label().to_string(),
            entry.duration_minutes.to_string(),
            entry.method.to_string(),
            entry.notes.clone().unwrap_or_default(),
        ]);
    }
    rows
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::{Column, EntryRecord, decode_table};
    use crate::{model::entry::Method, storage::PersistenceError, utils::time::StudyZone};

    #[test]
    fn reads_legacy_field_names() -> anyhow::Result<()> {
        let record: EntryRecord = serde_json::from_str(
            r#"{"Timestamp":"2024-01-01 21:15:00","Subject":"憲法 (Constitution)","Duration_Minutes":30,"Method":"Manual"}"#,
        )?;
        let entry = record.into_entry(StudyZone::default())?;

        assert_eq!(entry.duration_minutes, 30);
        assert_eq!(entry.method, Method::Manual);
        assert_eq!(entry.timestamp.hour(), 21);
        assert_eq!(entry.subject.short_name(), "憲法");
        Ok(())
    }

    #[test]
    fn missing_method_is_timer() -> anyhow::Result<()> {
        let record: EntryRecord = serde_json::from_str(
            r#"{"date":"2024-01-01T12:00:00+09:00","subject":"民法","minutes":5,"notes":"ch. 3"}"#,
        )?;
        let entry = record.into_entry(StudyZone::default())?;

        assert_eq!(entry.method, Method::Timer);
        assert_eq!(entry.notes.as_deref(), Some("ch. 3"));
        Ok(())
    }

    #[test]
    fn rejects_zero_minutes() -> anyhow::Result<()> {
        let record: EntryRecord = serde_json::from_str(
            r#"{"timestamp":"2024-01-01T12:00:00+09:00","subject":"民法","minutes":0}"#,
        )?;
        assert!(matches!(
            record.into_entry(StudyZone::default()),
            Err(PersistenceError::Schema(_))
        ));
        Ok(())
    }

    #[test]
    fn entry_survives_record_conversion() -> anyhow::Result<()> {
        let record: EntryRecord = serde_json::from_str(
            r#"{"timestamp":"2024-01-01T12:00:00+09:00","subject":"民法","minutes":25,"method":"Timer"}"#,
        )?;
        let entry = record.clone().into_entry(StudyZone::default())?;
        assert_eq!(EntryRecord::from(&entry), record);
        Ok(())
    }

    #[test]
    fn dataframe_style_table_is_decoded() -> anyhow::Result<()> {
        let rows: Vec<Vec<String>> = [
            ["Subject", "Duration_Minutes", "Timestamp"],
            ["民法 (Civil Law)", "45.0", "2024-01-01 08:00:00"],
            ["", "", ""],
        ]
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect::<Vec<_>>())
        .collect();

        let entries = decode_table(rows, StudyZone::default())?;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration_minutes, 45);
        assert_eq!(entries[0].method, Method::Timer);
        assert_eq!(entries[0].timestamp.hour(), 8);
        Ok(())
    }

    #[test]
    fn fractional_minutes_are_rejected() {
        let rows = vec![
            vec!["Timestamp".to_string(), "Subject".into(), "Minutes".into()],
            vec!["2024-01-01 08:00:00".into(), "民法".into(), "2.5".into()],
        ];
        assert!(matches!(
            decode_table(rows, StudyZone::default()),
            Err(PersistenceError::Schema(_))
        ));
    }

    #[test]
    fn header_normalization() {
        assert_eq!(Column::from_header(" Date "), Some(Column::Timestamp));
        assert_eq!(
            Column::from_header("Duration_Minutes"),
            Some(Column::Minutes)
        );
        assert_eq!(Column::from_header("NOTES"), Some(Column::Notes));
        assert_eq!(Column::from_header("colour"), None);
    }
}
