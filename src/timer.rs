//! Two state study timer. A [TimerSession] is a plain value: every transition takes the current
//! session and hands back the next one, so whoever owns the interaction owns the timer.

use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerSession {
    #[default]
    Idle,
    Running { started_at: DateTime<Utc> },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("A study session is already running since {0}")]
    AlreadyRunning(DateTime<Utc>),
    #[error("No study session is running")]
    NotRunning,
}

impl TimerSession {
    /// Starting twice is rejected so duplicated start events can't reset a running session.
    pub fn start(self, now: DateTime<Utc>) -> Result<TimerSession, TimerError> {
        match self {
            TimerSession::Idle => Ok(TimerSession::Running { started_at: now }),
            TimerSession::Running { started_at } => Err(TimerError::AlreadyRunning(started_at)),
        }
    }

    /// Drops the session without recording anything.
    pub fn reset(self) -> TimerSession {
        TimerSession::Idle
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TimerSession::Running { .. })
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            TimerSession::Idle => None,
            TimerSession::Running { started_at } => Some(now - *started_at),
        }
    }
}

/// What to do with a session shorter than the minimum loggable duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ShortSessionPolicy {
    /// Record the minimum instead.
    #[default]
    ClampToMinimum,
    /// Record nothing and warn.
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Record(u32),
    Discard,
}

impl ShortSessionPolicy {
    /// Decides how many minutes a session of `elapsed` is worth. Elapsed time is floored to whole
    /// minutes.
    pub fn apply(&self, elapsed: Duration, min_minutes: u32) -> Commit {
        let minutes = elapsed.num_minutes();
        if minutes >= min_minutes as i64 {
            return Commit::Record(u32::try_from(minutes).unwrap_or(u32::MAX));
        }
        match self {
            ShortSessionPolicy::ClampToMinimum => Commit::Record(min_minutes),
            ShortSessionPolicy::Discard => Commit::Discard,
        }
    }
}
