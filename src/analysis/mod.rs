//! Aggregates over a [StudyLog] snapshot. Nothing here is cached, every figure is recomputed from
//! the log it is given.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    model::{
        entry::StudyEntry,
        subject::{Subject, SubjectSet},
    },
    utils::percentage::GoalProgress,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Study goal has to be positive, got {0} minutes")]
pub struct InvalidGoal(pub i64);

/// Sum of minutes, optionally only for one subject.
pub fn total_minutes(log: &[StudyEntry], subject: Option<&Subject>) -> u64 {
    log.iter()
        .filter(|v| subject.map_or(true, |s| *s == v.subject))
        .map(|v| v.duration_minutes as u64)
        .sum()
}

/// Sum of minutes of entries whose civil date is `today`. Entries carry the study zone offset, so
/// this never depends on the local timezone of the machine.
pub fn today_minutes(log: &[StudyEntry], today: NaiveDate) -> u64 {
    log.iter()
        .filter(|v| v.civil_date() == today)
        .map(|v| v.duration_minutes as u64)
        .sum()
}

/// Minutes per subject. Every configured subject is present, unused ones with 0. Subjects that
/// are no longer configured keep their own bucket so the buckets always add up to
/// [total_minutes].
pub fn by_subject(log: &[StudyEntry], subjects: &SubjectSet) -> HashMap<Subject, u64> {
    let mut map = subjects
        .iter()
        .map(|v| (v.clone(), 0))
        .collect::<HashMap<_, _>>();

    for v in log {
        *map.entry(v.subject.clone()).or_insert(0) += v.duration_minutes as u64;
    }
    map
}

/// `min(1, total / goal)`.
pub fn goal_progress(log: &[StudyEntry], goal_minutes: i64) -> Result<GoalProgress, InvalidGoal> {
    let goal = u64::try_from(goal_minutes)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(InvalidGoal(goal_minutes))?;
    GoalProgress::new_opt(total_minutes(log, None), goal).ok_or(InvalidGoal(goal_minutes))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectUsage {
    pub subject: Subject,
    pub minutes: u64,
}

/// Everything the dashboard shows at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub date: NaiveDate,
    pub day_minutes: u64,
    pub total_minutes: u64,
    pub goal_minutes: u64,
    pub progress: GoalProgress,
    /// Configured subjects in configured order, followed by unknown subjects by label.
    pub subjects: Vec<SubjectUsage>,
}

pub fn summarize(
    log: &[StudyEntry],
    date: NaiveDate,
    subjects: &SubjectSet,
    goal_minutes: i64,
) -> Result<Summary, InvalidGoal> {
    let progress = goal_progress(log, goal_minutes)?;
    let mut totals = by_subject(log, subjects);

    let mut usages = subjects
        .iter()
        .map(|v| SubjectUsage {
            subject: v.clone(),
            minutes: totals.remove(v).unwrap_or_default(),
        })
        .collect::<Vec<_>>();
    let mut unknown = totals
        .into_iter()
        .map(|(subject, minutes)| SubjectUsage { subject, minutes })
        .collect::<Vec<_>>();
    unknown.sort_by(|a, b| a.subject.cmp(&b.subject));
    usages.extend(unknown);

    Ok(Summary {
        date,
        day_minutes: today_minutes(log, date),
        total_minutes: total_minutes(log, None),
        goal_minutes: goal_minutes as u64,
        progress,
        subjects: usages,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone};

    use super::{
        InvalidGoal, by_subject, goal_progress, summarize, today_minutes, total_minutes,
    };
    use crate::model::{
        entry::{Method, StudyEntry},
        subject::{Subject, SubjectSet},
    };

    fn entry(date: (i32, u32, u32), hour: u32, subject: &str, minutes: u32) -> StudyEntry {
        StudyEntry {
            timestamp: FixedOffset::east_opt(9 * 3600)
                .unwrap()
                .with_ymd_and_hms(date.0, date.1, date.2, hour, 0, 0)
                .unwrap(),
            subject: subject.into(),
            duration_minutes: minutes,
            method: Method::Timer,
            notes: None,
        }
    }

    fn scenario() -> Vec<StudyEntry> {
        vec![
            entry((2024, 1, 1), 10, "憲法", 30),
            entry((2024, 1, 1), 23, "民法", 45),
            entry((2024, 1, 2), 0, "憲法", 20),
        ]
    }

    fn subjects() -> SubjectSet {
        SubjectSet::new_opt(["憲法", "民法", "行政法"]).unwrap()
    }

    #[test]
    fn scenario_totals() {
        let log = scenario();

        assert_eq!(
            today_minutes(&log, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            75
        );
        assert_eq!(total_minutes(&log, None), 95);
        assert_eq!(total_minutes(&log, Some(&Subject::from("憲法"))), 50);

        let by_subject = by_subject(&log, &subjects());
        assert_eq!(by_subject[&Subject::from("憲法")], 50);
        assert_eq!(by_subject[&Subject::from("民法")], 45);
        assert_eq!(by_subject[&Subject::from("行政法")], 0);

        let progress = *goal_progress(&log, 48000).unwrap();
        assert!((progress - 0.00198).abs() < 0.00001);
    }

    #[test]
    fn today_ignores_other_days() {
        let mut log = scenario();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let before = today_minutes(&log, day);

        log.push(entry((2023, 12, 31), 12, "民法", 500));
        log.push(entry((2024, 1, 3), 12, "民法", 500));

        assert_eq!(before, 20);
        assert_eq!(today_minutes(&log, day), before);
    }

    #[test]
    fn subject_buckets_partition_total() {
        let mut log = scenario();
        log.push(entry((2024, 1, 5), 8, "商法", 15));

        let buckets = by_subject(&log, &subjects());

        assert_eq!(buckets.values().sum::<u64>(), total_minutes(&log, None));
        assert_eq!(buckets[&Subject::from("商法")], 15);
    }

    #[test]
    fn goal_progress_is_monotonic_and_clamped() {
        let mut log = vec![];
        let mut previous = 0.;
        for _ in 0..10 {
            log.push(entry((2024, 1, 1), 10, "憲法", 30));
            let progress = *goal_progress(&log, 100).unwrap();
            assert!(progress >= previous);
            assert!((0. ..=1.).contains(&progress));
            previous = progress;
        }
        assert_eq!(previous, 1.);
    }

    #[test]
    fn non_positive_goal_fails() {
        assert_eq!(goal_progress(&scenario(), 0), Err(InvalidGoal(0)));
        assert_eq!(goal_progress(&scenario(), -60), Err(InvalidGoal(-60)));
    }

    #[test]
    fn summary_orders_configured_subjects_first() {
        let mut log = scenario();
        log.push(entry((2024, 1, 5), 8, "商法", 15));

        let summary = summarize(
            &log,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            &subjects(),
            48000,
        )
        .unwrap();

        assert_eq!(summary.day_minutes, 75);
        assert_eq!(summary.total_minutes, 110);
        assert_eq!(
            summary
                .subjects
                .iter()
                .map(|v| (v.subject.label(), v.minutes))
                .collect::<Vec<_>>(),
            vec![("憲法", 50), ("民法", 45), ("行政法", 0), ("商法", 15)]
        );
    }
}
