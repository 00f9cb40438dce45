use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::model::{
    entry::{Method, StudyEntry},
    subject::{Subject, SubjectSet},
};

/// Upper bound for a manual entry: one calendar day.
pub const DEFAULT_MAX_MANUAL_MINUTES: u32 = 24 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Minutes have to be between {min} and {max}, got {minutes}")]
    MinutesOutOfRange { minutes: i64, min: u32, max: u32 },
    #[error("Unknown subject {0:?}")]
    UnknownSubject(String),
}

/// Checks manually entered sessions before they reach the store.
#[derive(Debug, Clone)]
pub struct ManualEntryValidator {
    subjects: SubjectSet,
    min_minutes: u32,
    max_minutes: u32,
}

impl ManualEntryValidator {
    pub fn new(subjects: SubjectSet, min_minutes: u32, max_minutes: u32) -> Self {
        Self {
            subjects,
            min_minutes,
            max_minutes,
        }
    }

    pub fn resolve_subject(&self, input: &str) -> Result<Subject, ValidationError> {
        self.subjects
            .resolve(input)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownSubject(input.to_string()))
    }

    /// Builds a manual entry stamped with `now`. Notes are passed through untouched, their size
    /// is up to the backend.
    pub fn validate(
        &self,
        subject: &str,
        minutes: i64,
        notes: Option<String>,
        now: DateTime<FixedOffset>,
    ) -> Result<StudyEntry, ValidationError> {
        let subject = self.resolve_subject(subject)?;
        let duration_minutes = u32::try_from(minutes)
            .ok()
            .filter(|v| (self.min_minutes..=self.max_minutes).contains(v))
            .ok_or(ValidationError::MinutesOutOfRange {
                minutes,
                min: self.min_minutes,
                max: self.max_minutes,
            })?;

        Ok(StudyEntry {
            timestamp: now,
            subject,
            duration_minutes,
            method: Method::Manual,
            notes: notes.filter(|v| !v.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::{DEFAULT_MAX_MANUAL_MINUTES, ManualEntryValidator, ValidationError};
    use crate::model::{entry::Method, subject::SubjectSet};

    fn validator() -> ManualEntryValidator {
        ManualEntryValidator::new(
            SubjectSet::new_opt(["憲法 (Constitution)", "民法 (Civil Law)"]).unwrap(),
            1,
            DEFAULT_MAX_MANUAL_MINUTES,
        )
    }

    fn now() -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 22, 0, 0)
            .unwrap()
    }

    #[test]
    fn accepts_bounds() {
        let validator = validator();

        let low = validator.validate("憲法", 1, None, now()).unwrap();
        let high = validator
            .validate("民法 (Civil Law)", 1440, Some("mock exam".into()), now())
            .unwrap();

        assert_eq!(low.duration_minutes, 1);
        assert_eq!(low.method, Method::Manual);
        assert_eq!(low.timestamp, now());
        assert_eq!(high.subject.label(), "民法 (Civil Law)");
        assert_eq!(high.notes.as_deref(), Some("mock exam"));
    }

    #[test]
    fn rejects_out_of_range_minutes() {
        let validator = validator();

        for minutes in [0, -15, 1441] {
            assert_eq!(
                validator.validate("憲法", minutes, None, now()),
                Err(ValidationError::MinutesOutOfRange {
                    minutes,
                    min: 1,
                    max: 1440
                })
            );
        }
    }

    #[test]
    fn rejects_unknown_subject() {
        assert_eq!(
            validator().validate("刑法", 30, None, now()),
            Err(ValidationError::UnknownSubject("刑法".into()))
        );
    }

    #[test]
    fn blank_notes_are_dropped() {
        let entry = validator()
            .validate("憲法", 30, Some("  ".into()), now())
            .unwrap();
        assert_eq!(entry.notes, None);
    }
}
