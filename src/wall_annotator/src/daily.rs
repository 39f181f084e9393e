//! Per-trading-day aggregates used by ring overlays and wall markers.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::Serialize;

use crate::bar::Bar;

/// Aggregate over the bars sharing one `date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingDay {
    pub date: String,
    /// Label of the earliest bar's time.
    pub start_time: String,
    /// Label of the latest bar's time.
    pub end_time: String,
    #[serde(skip)]
    pub day: Option<NaiveDate>,
    #[serde(skip)]
    pub start: Option<NaiveTime>,
    #[serde(skip)]
    pub end: Option<NaiveTime>,
    pub min_low: f64,
    pub max_high: f64,
    /// `durationScore` of the earliest bar; later bars never contribute.
    pub first_bar_duration_score: Option<f64>,
    /// First finite `wallLevel` of the day, for the daily marker.
    pub wall_level: Option<f64>,
    pub bar_count: usize,
    #[serde(skip)]
    wall_clock: Option<NaiveTime>,
}

impl TradingDay {
    fn open(bar: &Bar) -> Self {
        let wall_level = bar.finite_wall_level();
        Self {
            date: bar.date.clone(),
            start_time: bar.time.clone(),
            end_time: bar.time.clone(),
            day: bar.day,
            start: bar.clock,
            end: bar.clock,
            min_low: bar.low,
            max_high: bar.high,
            first_bar_duration_score: bar.duration_score,
            wall_level,
            bar_count: 1,
            wall_clock: wall_level.and(bar.clock),
        }
    }

    fn absorb(&mut self, bar: &Bar) {
        self.bar_count += 1;
        // f64::min/max ignore a NaN operand, so one bad price never poisons the day.
        self.min_low = self.min_low.min(bar.low);
        self.max_high = self.max_high.max(bar.high);

        if let Some(t) = bar.clock {
            if self.start.is_none_or(|s| t < s) {
                self.start = Some(t);
                self.start_time = bar.time.clone();
                self.first_bar_duration_score = bar.duration_score;
            }
            if self.end.is_none_or(|e| t > e) {
                self.end = Some(t);
                self.end_time = bar.time.clone();
            }
        }

        if let Some(level) = bar.finite_wall_level() {
            let earlier = match (self.wall_clock, bar.clock) {
                (Some(w), Some(t)) => t < w,
                (None, Some(_)) => true,
                _ => false,
            };
            if self.wall_level.is_none() || earlier {
                self.wall_level = Some(level);
                self.wall_clock = bar.clock;
            }
        }
    }

    pub fn start_instant(&self) -> Option<NaiveDateTime> {
        Some(self.day?.and_time(self.start?))
    }

    pub fn end_instant(&self) -> Option<NaiveDateTime> {
        Some(self.day?.and_time(self.end?))
    }

    /// Raw `"date time"` labels for the day's bounds.
    pub fn raw_bounds(&self) -> (String, String) {
        (
            format!("{} {}", self.date, self.start_time),
            format!("{} {}", self.date, self.end_time),
        )
    }

    /// `max_high - min_low`.
    pub fn price_range(&self) -> f64 {
        self.max_high - self.min_low
    }
}

/// Single-pass aggregation keyed by `date`, in first-appearance order.
pub fn aggregate_days(bars: &[Bar]) -> IndexMap<String, TradingDay> {
    let mut days: IndexMap<String, TradingDay> = IndexMap::new();
    for bar in bars {
        match days.get_mut(&bar.date) {
            Some(day) => day.absorb(bar),
            None => {
                days.insert(bar.date.clone(), TradingDay::open(bar));
            }
        }
    }
    days
}
