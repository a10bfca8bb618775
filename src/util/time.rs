use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Format a timestamp as a short `MM/DD/YYYY` date.
pub fn short_date(dt: &DateTime<Utc>) -> String {
    dt.format("%m/%d/%Y").to_string()
}

/// Start of the UTC day containing `dt`.
pub fn start_of_day(dt: &DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// The creation-time range a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// From midnight `lookback_days` days before `now` up to `now`.
    /// `None` when the start falls outside the representable date range.
    pub fn ending_at(now: DateTime<Utc>, lookback_days: u32) -> Option<Self> {
        let span = Duration::try_days(i64::from(lookback_days))?;
        let start = start_of_day(&now).checked_sub_signed(span)?;
        Some(Self { start, end: now })
    }

    pub fn describe(&self) -> String {
        format!("{} - {}", short_date(&self.start), short_date(&self.end))
    }
}
