use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Offset every study timestamp is pinned to. Bucketing by day always happens here and never in
/// the observer's local timezone.
pub const DEFAULT_OFFSET_HOURS: i32 = 9;

/// Format used by older logs that stored civil time without an offset.
pub const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed civil timezone used for timestamping and "today" bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyZone(FixedOffset);

impl StudyZone {
    pub fn from_hours(hours: i32) -> Option<Self> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(Self)
    }

    pub fn offset(&self) -> FixedOffset {
        self.0
    }

    /// Converts an instant into civil time of the zone.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.0)
    }

    /// Calendar date an instant belongs to in this zone.
    pub fn civil_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.localize(instant).date_naive()
    }

    /// Reads a civil time without an offset as time in this zone.
    pub fn from_naive(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.0.from_local_datetime(&naive).single()
    }
}

impl Default for StudyZone {
    fn default() -> Self {
        Self::from_hours(DEFAULT_OFFSET_HOURS).expect("+9 hours is a valid offset")
    }
}

/// Parses a stored timestamp. RFC 3339 keeps its own offset and is moved into `zone`, naive
/// timestamps are taken as civil time of `zone`.
pub fn parse_timestamp(value: &str, zone: StudyZone) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(v) = DateTime::parse_from_rfc3339(value) {
        return Some(v.with_timezone(&zone.offset()));
    }
    NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .and_then(|v| zone.from_naive(v))
}

pub fn format_timestamp(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339()
}

/// Civil time without an offset, the way spreadsheet style logs keep it.
pub fn format_naive_timestamp(value: &DateTime<FixedOffset>) -> String {
    value.format(NAIVE_TIMESTAMP_FORMAT).to_string()
}

/// Formats minutes the way the summary prints them, e.g. `12h 05m`.
pub fn format_minutes(minutes: u64) -> String {
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}
