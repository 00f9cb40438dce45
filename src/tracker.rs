//! Entry point for the presentation layer. Every call reloads the log from the store, so two
//! dashboards over the same store see each other's entries on their next call.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    analysis::{InvalidGoal, Summary, summarize},
    config::Settings,
    model::entry::{Method, StudyEntry, StudyLog},
    storage::{LogBackend, LogStore, PersistenceError, StoreError},
    timer::{Commit, ShortSessionPolicy, TimerError, TimerSession},
    utils::clock::Clock,
    validation::{ManualEntryValidator, ValidationError},
};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    InvalidGoal(#[from] InvalidGoal),
    #[error("No entry at position {position}, the log has {len} entries")]
    NotFound { position: usize, len: usize },
}

impl From<StoreError> for TrackerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Persistence(e) => TrackerError::Persistence(e),
            StoreError::NotFound { position, len } => TrackerError::NotFound { position, len },
        }
    }
}

/// Result of a timer transition. `session` is what the caller holds from now on, which is still
/// the running session when `outcome` is an error.
#[derive(Debug)]
pub struct Transition<T> {
    pub session: TimerSession,
    pub outcome: Result<T, TrackerError>,
}

impl<T> Transition<T> {
    fn unchanged(session: TimerSession, error: impl Into<TrackerError>) -> Self {
        Self {
            session,
            outcome: Err(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Recorded(StudyEntry),
    /// Session was shorter than the minimum and the policy says to drop it.
    Discarded { elapsed: Duration },
}

pub struct StudyTracker<B> {
    store: LogStore<B>,
    clock: Box<dyn Clock>,
    settings: Settings,
    validator: ManualEntryValidator,
}

impl<B: LogBackend> StudyTracker<B> {
    pub fn new(backend: B, settings: Settings, clock: Box<dyn Clock>) -> Self {
        let validator = ManualEntryValidator::new(
            settings.subjects.clone(),
            settings.min_minutes,
            settings.max_manual_minutes,
        );
        Self {
            store: LogStore::new(backend),
            clock,
            settings,
            validator,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Current civil time in the study zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.settings.zone.localize(self.clock.time())
    }

    pub fn today(&self) -> NaiveDate {
        self.settings.zone.civil_date(self.clock.time())
    }

    pub fn with_short_session_policy(mut self, policy: ShortSessionPolicy) -> Self {
        self.settings.short_session_policy = policy;
        self
    }

    pub fn start(&self, session: TimerSession) -> Result<TimerSession, TimerError> {
        let session = session.start(self.clock.time())?;
        info!("Started study session");
        Ok(session)
    }

    pub fn reset(&self, session: TimerSession) -> TimerSession {
        if session.is_running() {
            warn!("Abandoned running study session");
        }
        session.reset()
    }

    /// Stops a running session now and records it for `subject`. The session only becomes idle
    /// once the entry is stored, so a failed save can be retried without losing the elapsed time.
    pub async fn stop(
        &self,
        session: TimerSession,
        subject: &str,
        notes: Option<String>,
    ) -> Transition<StopOutcome> {
        self.stop_at(session, self.clock.time(), subject, notes).await
    }

    /// Same as [StudyTracker::stop] with the session ending at `stopped_at`. Retrying with the same
    /// instant records the time studied, not the time spent dealing with the failure.
    #[instrument(skip(self, notes))]
    pub async fn stop_at(
        &self,
        session: TimerSession,
        stopped_at: DateTime<Utc>,
        subject: &str,
        notes: Option<String>,
    ) -> Transition<StopOutcome> {
        let TimerSession::Running { started_at } = session else {
            return Transition::unchanged(session, TimerError::NotRunning);
        };
        let subject = match self.validator.resolve_subject(subject) {
            Ok(v) => v,
            Err(e) => return Transition::unchanged(session, e),
        };

        let elapsed = stopped_at - started_at;
        let duration_minutes = match self
            .settings
            .short_session_policy
            .apply(elapsed, self.settings.min_minutes)
        {
            Commit::Record(v) => v,
            Commit::Discard => {
                warn!(
                    "Session of {}s is shorter than {} minutes, nothing recorded",
                    elapsed.num_seconds(),
                    self.settings.min_minutes
                );
                return Transition {
                    session: session.reset(),
                    outcome: Ok(StopOutcome::Discarded { elapsed }),
                };
            }
        };

        let entry = StudyEntry {
            timestamp: self.settings.zone.localize(stopped_at),
            subject,
            duration_minutes,
            method: Method::Timer,
            notes: notes.filter(|v| !v.trim().is_empty()),
        };

        match self.store.append(entry.clone()).await {
            Ok(()) => {
                info!("Recorded {duration_minutes} minutes of {}", entry.subject);
                Transition {
                    session: session.reset(),
                    outcome: Ok(StopOutcome::Recorded(entry)),
                }
            }
            Err(e) => {
                error!("Failed to record session, keeping it running: {e}");
                Transition::unchanged(session, e)
            }
        }
    }

    /// Validates and records a manually entered session. Nothing is written when validation
    /// fails.
    #[instrument(skip(self, notes))]
    pub async fn add_manual(
        &self,
        subject: &str,
        minutes: i64,
        notes: Option<String>,
    ) -> Result<StudyEntry, TrackerError> {
        let entry = self.validator.validate(subject, minutes, notes, self.now())?;
        self.store.append(entry.clone()).await?;
        info!("Recorded {minutes} manual minutes of {}", entry.subject);
        Ok(entry)
    }

    /// Deletes the entry at `position` (0-based) of the freshly loaded log.
    pub async fn delete(&self, position: usize) -> Result<StudyEntry, TrackerError> {
        Ok(self.store.delete_at(position).await?)
    }

    /// Every entry, or an empty log when the store can't be read.
    pub async fn entries(&self) -> StudyLog {
        self.store.load_all().await
    }

    pub async fn summary(&self) -> Result<Summary, TrackerError> {
        self.summary_for(self.today()).await
    }

    /// Aggregates as seen on `date`. "Today" figures are computed for `date`.
    pub async fn summary_for(&self, date: NaiveDate) -> Result<Summary, TrackerError> {
        let log = self.store.load_all().await;
        Ok(summarize(
            &log,
            date,
            &self.settings.subjects,
            self.settings.goal_minutes,
        )?)
    }
}
