//! Calendar parsing for bar `date`/`time` labels.
//!
//! Every ordering decision in the engine (sorting, first/last bar of a day,
//! trading-day windows) goes through the values produced here, never through
//! string comparison of the raw labels. Upstream feeds are not consistent about
//! formats, so a handful of common layouts are accepted:
//!
//! - dates: `2024-01-02`, `2024/01/02`, `01/02/2024`, `20240102`, or any of the
//!   datetime forms below (the date part is kept)
//! - times: `09:30`, `09:30:00`, `09:30:00.250`, `9:30 AM`, `9:30:00 pm`, or a
//!   full datetime such as `2024-01-02T09:30:00Z` (the local time part is kept)
//!
//! Anything else yields `None`; callers keep the raw label for display.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M:%S",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
    "%I:%M%p",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a calendar date label.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

/// Parse an intra-day time label.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.time()))
}

/// Parse a full datetime label, keeping the wall-clock reading when an offset is present.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Canonical `YYYY-MM-DD` form used as the trading-day key.
pub fn canonical_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Canonical `HH:MM:SS` form.
pub fn canonical_time(t: NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

/// Canonical naive instant label, e.g. `2024-01-02T09:30:00`.
pub fn canonical_instant(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}
