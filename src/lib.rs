//! Study time tracking for exam preparation. Sessions are timed or entered by hand, kept in an
//! append-only log and summarized into today's total, per subject totals and progress towards the
//! study goal.
//!
//! [tracker::StudyTracker] is the entry point, [storage::LogStore] owns persistence and
//! [analysis] holds the aggregates.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod fs;
pub mod model;
pub mod storage;
pub mod timer;
pub mod tracker;
pub mod utils;
pub mod validation;
