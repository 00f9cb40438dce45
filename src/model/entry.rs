use std::{fmt::Display, ops::Deref, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::subject::Subject;

/// How an entry got into the log.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum Method {
    #[default]
    Timer,
    Manual,
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Timer => write!(f, "Timer"),
            Method::Manual => write!(f, "Manual"),
        }
    }
}

impl FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timer" => Ok(Method::Timer),
            "manual" => Ok(Method::Manual),
            _ => Err(anyhow!("Unknown method {s}")),
        }
    }
}

/// One immutable record of minutes studied for one subject.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct StudyEntry {
    /// Civil time in the study zone at which the entry was committed.
    pub timestamp: DateTime<FixedOffset>,
    pub subject: Subject,
    /// Always at least 1.
    pub duration_minutes: u32,
    pub method: Method,
    pub notes: Option<String>,
}

impl StudyEntry {
    /// Civil date the entry is bucketed into.
    pub fn civil_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Snapshot of the whole log in insertion order. Positions are deletion keys.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct StudyLog {
    entries: Vec<StudyEntry>,
}

impl StudyLog {
    pub fn new(entries: Vec<StudyEntry>) -> Self {
        Self { entries }
    }

    /// Returns a log with `entry` appended to the end.
    pub fn appended(mut self, entry: StudyEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Splits the entry at `position` out of the log.
    pub fn remove(mut self, position: usize) -> Option<(StudyEntry, StudyLog)> {
        if position < self.entries.len() {
            let removed = self.entries.remove(position);
            Some((removed, self))
        } else {
            None
        }
    }
}

impl Deref for StudyLog {
    type Target = [StudyEntry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl FromIterator<StudyEntry> for StudyLog {
    fn from_iter<T: IntoIterator<Item = StudyEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
