//! Market time-zone helpers for rendered instants.
//!
//! Bars carry naive exchange-local `date`/`time` labels. When a market zone is
//! configured, render output attaches the zone's offset so the charting side can
//! place shapes on an absolute axis.
//!
//! Notes:
//! - Ambiguous local times happen during “fall back” when a wall time occurs twice.
//! - Nonexistent local times happen during “spring forward” when a wall time is skipped.
//! - [`DstPolicy::RENDER`] picks the earlier instant on ambiguity and shifts
//!   forward out of gaps, so every hourly bar gets a deterministic position.
//!
//! Examples
//! - New York “fall back” ambiguity (2024-11-03 01:30 occurs twice):
//!   earliest -> 01:30-04:00, latest -> 01:30-05:00.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, TimeZone};
use chrono_tz::Tz;

use crate::errors::Error;

/// What to do with a wall time that occurs twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ambiguity {
    /// Return an error.
    Reject,
    /// Pick the earlier instant (typically the DST occurrence).
    Earliest,
    /// Pick the later instant (typically the standard-time occurrence).
    Latest,
}

/// What to do with a wall time skipped by a spring-forward transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gap {
    /// Return an error.
    Reject,
    /// Step forward one minute at a time until a valid instant (max 2 hours).
    ShiftForward,
}

/// Policy for DST edge cases when localizing naive timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstPolicy {
    pub ambiguity: Ambiguity,
    pub gap: Gap,
}

impl DstPolicy {
    /// Error on both ambiguous and nonexistent local times.
    pub const STRICT: Self = Self {
        ambiguity: Ambiguity::Reject,
        gap: Gap::Reject,
    };
    /// Policy used when rendering shapes and band axes.
    pub const RENDER: Self = Self {
        ambiguity: Ambiguity::Earliest,
        gap: Gap::ShiftForward,
    };
}

/// Parse an IANA zone name such as `America/New_York`.
pub fn parse_tz(name: &str) -> Result<Tz, Error> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::UnknownTimeZone(name.to_string()))
}

/// Attach `tz` to a naive wall-clock reading according to `policy`.
pub fn localize(naive: NaiveDateTime, tz: Tz, policy: DstPolicy) -> Result<DateTime<Tz>, Error> {
    use chrono::offset::LocalResult::*;

    let fail = |reason| Error::LocalTime {
        naive: naive.to_string(),
        tz: tz.name().to_string(),
        reason,
    };

    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt),
        Ambiguous(a, b) => match policy.ambiguity {
            Ambiguity::Earliest => Ok(a),
            Ambiguity::Latest => Ok(b),
            Ambiguity::Reject => Err(fail("ambiguous")),
        },
        None => match policy.gap {
            Gap::ShiftForward => {
                let mut t = naive;
                for _ in 0..120 {
                    t += Duration::minutes(1);
                    if let Single(dt) = tz.from_local_datetime(&t) {
                        return Ok(dt);
                    }
                }
                Err(fail("nonexistent"))
            }
            Gap::Reject => Err(fail("nonexistent")),
        },
    }
}

/// Format a zoned instant as RFC-3339 with second precision and its own offset.
pub fn to_rfc3339_secs(dt: DateTime<Tz>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
