use std::{io::Write, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::error;

use crate::{
    storage::LogBackend,
    timer::TimerSession,
    tracker::{StopOutcome, StudyTracker},
    utils::{clock::Clock, time::format_minutes},
};

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// What the user asked for after a failed save.
enum Signal {
    Retry,
    Abandon,
}

/// Runs one interactive study session. A session that fails to save stays running until it is
/// either saved or explicitly abandoned.
pub async fn run_timer<B: LogBackend>(
    tracker: &StudyTracker<B>,
    subject: &str,
    notes: Option<String>,
) -> Result<()> {
    // Fail on a bad subject before the user studies for an hour.
    let resolved = tracker
        .settings()
        .subjects
        .resolve(subject)
        .ok_or_else(|| anyhow::anyhow!("Unknown subject {subject:?}, see `studylog subjects`"))?
        .clone();

    let session = tracker.start(TimerSession::Idle)?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("Studying {resolved}. Press Enter or Ctrl-C to stop.");

    wait_for_stop(tracker, session, &mut input).await?;
    let stopped_at = tracker.clock().time();
    println!();

    match save_session(tracker, session, stopped_at, subject, notes, &mut input).await? {
        StopOutcome::Recorded(entry) => println!(
            "Recorded {} of {}",
            format_minutes(entry.duration_minutes as u64),
            entry.subject
        ),
        StopOutcome::Discarded { elapsed } => println!(
            "Session of {}s is too short, nothing was recorded.",
            elapsed.num_seconds()
        ),
    }
    Ok(())
}

/// Records `session` as ended at `stopped_at`. Every failed save asks the user whether to try
/// again, each retry saves immediately with the same end time.
async fn save_session<B: LogBackend, R: AsyncBufRead + Unpin>(
    tracker: &StudyTracker<B>,
    mut session: TimerSession,
    stopped_at: DateTime<Utc>,
    subject: &str,
    notes: Option<String>,
    input: &mut Lines<R>,
) -> Result<StopOutcome> {
    loop {
        let transition = tracker
            .stop_at(session, stopped_at, subject, notes.clone())
            .await;
        session = transition.session;
        let e = match transition.outcome {
            Ok(outcome) => return Ok(outcome),
            Err(e) => e,
        };

        error!("Failed to save study session {e:?}");
        eprintln!("Failed to save the session: {e}");
        eprintln!("The session is kept. Press Enter to retry, type `abandon` to drop it.");
        if let Signal::Abandon = wait_for_retry(input).await? {
            let _ = tracker.reset(session);
            return Err(e.into());
        }
    }
}

/// Refreshes the elapsed time until Enter or Ctrl-C.
async fn wait_for_stop<B: LogBackend, R: AsyncBufRead + Unpin>(
    tracker: &StudyTracker<B>,
    session: TimerSession,
    input: &mut Lines<R>,
) -> Result<()> {
    loop {
        if let Some(elapsed) = session.elapsed(tracker.clock().time()) {
            print!(
                "\r{}m {:02}s",
                elapsed.num_minutes(),
                elapsed.num_seconds() % 60
            );
            std::io::stdout().flush()?;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            line = input.next_line() => {
                line?;
                return Ok(());
            }
            _ = tracker.clock().sleep(REFRESH_INTERVAL) => ()
        }
    }
}

async fn wait_for_retry<R: AsyncBufRead + Unpin>(input: &mut Lines<R>) -> Result<Signal> {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => Ok(Signal::Abandon),
        line = input.next_line() => match line? {
            Some(line) if line.trim().eq_ignore_ascii_case("abandon") => Ok(Signal::Abandon),
            Some(_) => Ok(Signal::Retry),
            // Closed stdin can't confirm anything anymore.
            None => Ok(Signal::Abandon),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};
    use tokio::io::{AsyncBufReadExt, BufReader};

    use super::save_session;
    use crate::{
        config::Settings,
        model::entry::StudyEntry,
        storage::{LogBackend, PersistenceError},
        timer::TimerSession,
        tracker::{StopOutcome, StudyTracker},
        utils::clock::{Clock, test_clock::TestClock},
    };

    /// Backend rejecting the first `failures` writes. Every rejection takes the user five
    /// minutes to read.
    struct SlowToRecover {
        entries: Mutex<Vec<StudyEntry>>,
        failures: AtomicUsize,
        clock: TestClock,
    }

    impl SlowToRecover {
        fn new(failures: usize, clock: &TestClock) -> Self {
            Self {
                entries: Mutex::default(),
                failures: AtomicUsize::new(failures),
                clock: clock.clone(),
            }
        }
    }

    impl LogBackend for SlowToRecover {
        async fn read_all(&self) -> Result<Vec<StudyEntry>, PersistenceError> {
            Ok(self.entries.lock().unwrap().clone())
        }

        async fn write_all(&self, entries: &[StudyEntry]) -> Result<(), PersistenceError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                self.clock.advance(Duration::minutes(5));
                return Err(PersistenceError::Backend("offline".into()));
            }
            *self.entries.lock().unwrap() = entries.to_vec();
            Ok(())
        }
    }

    fn clock() -> TestClock {
        TestClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn single_enter_retries_with_original_stop_time() -> Result<()> {
        let clock = clock();
        let tracker = StudyTracker::new(
            SlowToRecover::new(1, &clock),
            Settings::default(),
            Box::new(clock.clone()),
        );
        let session = tracker.start(TimerSession::Idle)?;
        clock.advance(Duration::minutes(25));
        let stopped_at = clock.time();
        let mut input = BufReader::new(&b"\nnext\n"[..]).lines();

        let outcome =
            save_session(&tracker, session, stopped_at, "民法", None, &mut input).await?;

        let StopOutcome::Recorded(entry) = outcome else {
            panic!("Session should have been recorded");
        };
        assert_eq!(entry.duration_minutes, 25);
        assert_eq!(tracker.entries().await.to_vec(), vec![entry]);
        // Only one line was consumed for the retry.
        assert_eq!(input.next_line().await?, Some("next".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn abandon_drops_the_session() -> Result<()> {
        let clock = clock();
        let tracker = StudyTracker::new(
            SlowToRecover::new(usize::MAX, &clock),
            Settings::default(),
            Box::new(clock.clone()),
        );
        let session = tracker.start(TimerSession::Idle)?;
        clock.advance(Duration::minutes(25));
        let mut input = BufReader::new(&b"\nabandon\n"[..]).lines();

        let result =
            save_session(&tracker, session, clock.time(), "民法", None, &mut input).await;

        assert!(result.is_err());
        assert!(tracker.entries().await.is_empty());
        assert_eq!(input.next_line().await?, None);
        Ok(())
    }
}
