//! Duration-score ring overlays.
//!
//! A day gets a low ring when its first-bar duration score is at or below the
//! low threshold, and a high ring when at or above the high threshold, subject
//! to the overlay mode. The two checks are independent: a misordered duration
//! pair can put one day in both sets.

use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{daily::TradingDay, threshold::ThresholdPair};

/// Relative vertical padding applied around a day's price range.
pub const RING_PAD_RATIO: f64 = 0.02;
/// Minimum vertical padding, so a flat day still draws a visible ring.
pub const RING_PAD_FLOOR: f64 = 0.1;

/// Which rings to draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingMode {
    Low,
    High,
    #[default]
    Both,
}

impl RingMode {
    pub fn includes_low(self) -> bool {
        matches!(self, RingMode::Low | RingMode::Both)
    }

    pub fn includes_high(self) -> bool {
        matches!(self, RingMode::High | RingMode::Both)
    }
}

impl fmt::Display for RingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RingMode::Low => "low",
            RingMode::High => "high",
            RingMode::Both => "both",
        };
        f.write_str(s)
    }
}

impl FromStr for RingMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RingMode::Low),
            "high" => Ok(RingMode::High),
            "both" => Ok(RingMode::Both),
            other => Err(format!("unknown ring mode: {other} (expected low, high or both)")),
        }
    }
}

/// Dates selected for each ring kind, in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RingSelection {
    pub low_ring_days: Vec<String>,
    pub high_ring_days: Vec<String>,
}

impl RingSelection {
    pub fn is_empty(&self) -> bool {
        self.low_ring_days.is_empty() && self.high_ring_days.is_empty()
    }
}

/// Pick ring days from the aggregates. Days without a first-bar score never qualify.
pub fn select_rings<'a, I>(days: I, thresholds: ThresholdPair, mode: RingMode) -> RingSelection
where
    I: IntoIterator<Item = &'a TradingDay>,
{
    let mut sel = RingSelection::default();
    for day in days {
        let Some(score) = day.first_bar_duration_score else {
            continue;
        };
        if mode.includes_low() && score <= thresholds.low {
            sel.low_ring_days.push(day.date.clone());
        }
        if mode.includes_high() && score >= thresholds.high {
            sel.high_ring_days.push(day.date.clone());
        }
    }
    tracing::debug!(
        low = sel.low_ring_days.len(),
        high = sel.high_ring_days.len(),
        %mode,
        "ring selection"
    );
    sel
}

/// Rectangle spanning a day's time range and padded price range.
#[derive(Debug, Clone, PartialEq)]
pub struct RingRect {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub y0: f64,
    pub y1: f64,
}

/// `pad = max(range * 0.02, 0.1)`.
pub fn ring_pad(min_low: f64, max_high: f64) -> f64 {
    ((max_high - min_low) * RING_PAD_RATIO).max(RING_PAD_FLOOR)
}

pub fn ring_rect(day: &TradingDay) -> RingRect {
    let pad = ring_pad(day.min_low, day.max_high);
    RingRect {
        start: day.start_instant(),
        end: day.end_instant(),
        y0: day.min_low - pad,
        y1: day.max_high + pad,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bar::fixtures::bar, daily::aggregate_days};
    use proptest::prelude::*;

    fn day(date: &str, score: Option<f64>) -> TradingDay {
        let mut b = bar(date, "10:00", 100.0, 101.0, 0.0);
        b.duration_score = score;
        aggregate_days(&[b]).swap_remove(date).unwrap()
    }

    #[test]
    fn low_score_selects_low_ring_only() {
        let days = [day("2024-01-02", Some(0.05))];
        let sel = select_rings(&days, ThresholdPair::new(0.1, 0.9), RingMode::Both);
        assert_eq!(sel.low_ring_days, ["2024-01-02"]);
        assert!(sel.high_ring_days.is_empty());
    }

    #[test]
    fn thresholds_are_inclusive() {
        let days = [day("a", Some(0.1)), day("b", Some(0.9)), day("c", Some(0.5))];
        let sel = select_rings(&days, ThresholdPair::new(0.1, 0.9), RingMode::Both);
        assert_eq!(sel.low_ring_days, ["a"]);
        assert_eq!(sel.high_ring_days, ["b"]);
    }

    #[test]
    fn mode_gates_each_kind() {
        let days = [day("a", Some(0.0)), day("b", Some(1.0))];
        let pair = ThresholdPair::new(0.1, 0.9);

        let low = select_rings(&days, pair, RingMode::Low);
        assert_eq!(low.low_ring_days, ["a"]);
        assert!(low.high_ring_days.is_empty());

        let high = select_rings(&days, pair, RingMode::High);
        assert!(high.low_ring_days.is_empty());
        assert_eq!(high.high_ring_days, ["b"]);
    }

    #[test]
    fn misordered_thresholds_may_select_both() {
        let days = [day("a", Some(0.5))];
        let sel = select_rings(&days, ThresholdPair::new(0.8, 0.2), RingMode::Both);
        assert_eq!(sel.low_ring_days, ["a"]);
        assert_eq!(sel.high_ring_days, ["a"]);
    }

    #[test]
    fn missing_or_nan_score_never_qualifies() {
        let days = [day("a", None), day("b", Some(f64::NAN))];
        let sel = select_rings(&days, ThresholdPair::new(1.0, 0.0), RingMode::Both);
        assert!(sel.is_empty());
    }

    #[test]
    fn flat_day_gets_pad_floor() {
        let mut d = day("2024-01-02", None);
        d.min_low = 100.0;
        d.max_high = 100.0;
        let r = ring_rect(&d);
        assert!((r.y0 - 99.9).abs() < 1e-9);
        assert!((r.y1 - 100.1).abs() < 1e-9);
        assert_eq!(r.start, r.end);
    }

    #[test]
    fn wide_day_pads_proportionally() {
        let mut d = day("2024-01-02", None);
        d.min_low = 100.0;
        d.max_high = 200.0;
        let r = ring_rect(&d);
        assert_eq!(r.y0, 98.0);
        assert_eq!(r.y1, 202.0);
    }

    #[test]
    fn ring_mode_parses_case_insensitively() {
        assert_eq!("BOTH".parse::<RingMode>().unwrap(), RingMode::Both);
        assert_eq!(" low ".parse::<RingMode>().unwrap(), RingMode::Low);
        assert!("sideways".parse::<RingMode>().is_err());
        assert_eq!(RingMode::High.to_string(), "high");
    }

    proptest! {
        #[test]
        fn ring_height_respects_pad_floor(low in -1e6f64..1e6, span in 0.0f64..1e4) {
            let mut d = day("2024-01-02", None);
            d.min_low = low;
            d.max_high = low + span;
            let r = ring_rect(&d);
            prop_assert!(r.y1 - r.y0 >= RING_PAD_FLOOR);
        }
    }
}
