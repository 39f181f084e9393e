//! Hourly bar records: the loosely typed wire form and the canonical form.
//!
//! [`RawBar`] mirrors what the backend sends. Every field is optional and may be
//! a JSON number, a numeric-looking string, `null`, or something else entirely.
//! [`normalize`] turns it into a [`Bar`]:
//!
//! - required prices and z-scores that fail to parse become `NaN` (never `0.0`),
//! - optional series (`wallLevel`, `wallPercentile`, `durationScore`) become
//!   `None` when absent or `null`, and `Some(NaN)` when present but malformed,
//! - `date`/`time` are parsed with [`crate::datetime`]; the labels are rewritten
//!   to canonical form when parsing succeeds and kept verbatim otherwise.
//!
//! No record is ever dropped here.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    datetime::{canonical_date, canonical_instant, canonical_time, parse_date, parse_time},
    errors::Error,
};

/// One bar as received from the data collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBar {
    /// Calendar day label.
    #[serde(default)]
    pub date: Option<Value>,
    /// Intra-day time label.
    #[serde(default)]
    pub time: Option<Value>,
    /// Opening price.
    #[serde(default)]
    pub open: Option<Value>,
    /// Highest price.
    #[serde(default)]
    pub high: Option<Value>,
    /// Lowest price.
    #[serde(default)]
    pub low: Option<Value>,
    /// Closing price.
    #[serde(default)]
    pub close: Option<Value>,
    /// Volume z-score.
    #[serde(default, alias = "volume_z")]
    pub volume_z: Option<Value>,
    /// Open-to-close range z-score.
    #[serde(default, alias = "range_open_close_z")]
    pub range_open_close_z: Option<Value>,
    /// High-to-low range z-score.
    #[serde(default, alias = "range_high_low_z")]
    pub range_high_low_z: Option<Value>,
    /// Secondary wall series value.
    #[serde(default, alias = "wall_level")]
    pub wall_level: Option<Value>,
    /// Percentile rank of the wall level, in [0, 1].
    #[serde(default, alias = "wall_percentile")]
    pub wall_percentile: Option<Value>,
    /// Day-level duration percentile, meaningful on the day's first bar.
    #[serde(default, alias = "duration_score")]
    pub duration_score: Option<Value>,
}

/// Payload shapes accepted from the backend: a bare array or `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BarPayload {
    Bare(Vec<RawBar>),
    Envelope { data: Vec<RawBar> },
}

/// Decode a JSON bar payload.
pub fn parse_bars_json(s: &str) -> Result<Vec<RawBar>, Error> {
    let payload: BarPayload = serde_json::from_str(s)?;
    Ok(match payload {
        BarPayload::Bare(bars) | BarPayload::Envelope { data: bars } => bars,
    })
}

/// Canonical, immutable bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    /// `YYYY-MM-DD` when parseable, otherwise the raw label.
    pub date: String,
    /// `HH:MM:SS` when parseable, otherwise the raw label.
    pub time: String,
    #[serde(skip)]
    pub day: Option<NaiveDate>,
    #[serde(skip)]
    pub clock: Option<NaiveTime>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume_z: f64,
    pub range_open_close_z: f64,
    pub range_high_low_z: f64,
    pub wall_level: Option<f64>,
    pub wall_percentile: Option<f64>,
    pub duration_score: Option<f64>,
}

impl Bar {
    /// Combined instant, when both labels parsed.
    pub fn instant(&self) -> Option<NaiveDateTime> {
        Some(self.day?.and_time(self.clock?))
    }

    /// Fallback display label built from the (possibly raw) date and time.
    pub fn raw_label(&self) -> String {
        format!("{} {}", self.date, self.time)
    }

    /// Axis label: canonical instant, or the raw label if the instant is unknown.
    pub fn x_label(&self) -> String {
        self.instant()
            .map(canonical_instant)
            .unwrap_or_else(|| self.raw_label())
    }

    /// `close >= open`. A bar with a NaN price counts as down.
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }

    /// Wall level when present and finite.
    pub fn finite_wall_level(&self) -> Option<f64> {
        self.wall_level.filter(|v| v.is_finite())
    }
}

/// Numeric coercion for a present JSON value. Anything unparseable is `NaN`.
pub fn coerce_number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn required(v: &Option<Value>) -> f64 {
    v.as_ref().map(coerce_number).unwrap_or(f64::NAN)
}

fn optional(v: &Option<Value>) -> Option<f64> {
    match v {
        None | Some(Value::Null) => None,
        Some(v) => Some(coerce_number(v)),
    }
}

fn label(v: &Option<Value>) -> String {
    match v {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalize one raw record.
pub fn normalize(raw: &RawBar) -> Bar {
    let raw_date = label(&raw.date);
    let raw_time = label(&raw.time);
    let day = parse_date(&raw_date);
    let clock = parse_time(&raw_time);

    Bar {
        date: day.map(canonical_date).unwrap_or(raw_date),
        time: clock.map(canonical_time).unwrap_or(raw_time),
        day,
        clock,
        open: required(&raw.open),
        high: required(&raw.high),
        low: required(&raw.low),
        close: required(&raw.close),
        volume_z: required(&raw.volume_z),
        range_open_close_z: required(&raw.range_open_close_z),
        range_high_low_z: required(&raw.range_high_low_z),
        wall_level: optional(&raw.wall_level),
        wall_percentile: optional(&raw.wall_percentile),
        duration_score: optional(&raw.duration_score),
    }
}

/// Normalize a batch, preserving order and length.
pub fn normalize_all(raw: &[RawBar]) -> Vec<Bar> {
    raw.iter().map(normalize).collect()
}
