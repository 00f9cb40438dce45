use std::fmt::Display;

use anyhow::Result;
use chrono::NaiveDate;
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{storage::LogBackend, tracker::StudyTracker};

use super::{Args, output::print_summary};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    #[arg(
        long,
        short,
        help = "Day to show instead of today. Examples are \"yesterday\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Prints the dashboard. Relative dates like "yesterday" are resolved in the study zone.
pub async fn process_summary_command<B: LogBackend>(
    tracker: &StudyTracker<B>,
    SummaryCommand { date, date_style }: SummaryCommand,
) -> Result<()> {
    let date = match date {
        Some(date) => parse_day(&date, date_style, tracker)?,
        None => tracker.today(),
    };
    let summary = tracker.summary_for(date).await?;
    print_summary(&summary);
    Ok(())
}

fn parse_day<B: LogBackend>(
    value: &str,
    date_style: DateStyle,
    tracker: &StudyTracker<B>,
) -> Result<NaiveDate> {
    match parse_date_string(value, tracker.now(), date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {value}: {e}"),
            )
            .into()),
    }
}
