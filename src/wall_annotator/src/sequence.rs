//! Chronological ordering of normalized bars.
//!
//! Bars are ordered by their parsed `(date, time)` instant. Bars whose date did
//! not parse go before every dated bar, so they are the first to fall out of a
//! lookback window and never pose as the latest trading day. Within a date,
//! bars whose time did not parse go after every timed bar. The sort is stable,
//! so equal keys keep their arrival order.

use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexSet;

use crate::bar::Bar;

/// Bars in chronological order plus the distinct trading days they cover.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequenced {
    pub bars: Vec<Bar>,
    /// Distinct `date` keys in first-appearance order: unparsed labels first, then
    /// parsed dates ascending.
    pub trading_days: Vec<String>,
}

impl Sequenced {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

type ChronoKey = (bool, Option<NaiveDate>, bool, Option<NaiveTime>);

/// Sort key: `(date parsed, date, time missing, time)`.
fn chrono_key(bar: &Bar) -> ChronoKey {
    (bar.day.is_some(), bar.day, bar.clock.is_none(), bar.clock)
}

/// Distinct `date` keys in the order they first appear.
pub fn distinct_days(bars: &[Bar]) -> Vec<String> {
    bars.iter()
        .map(|b| b.date.as_str())
        .collect::<IndexSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Stable chronological sort.
pub fn sequence(mut bars: Vec<Bar>) -> Sequenced {
    bars.sort_by_key(chrono_key);
    let trading_days = distinct_days(&bars);
    Sequenced { bars, trading_days }
}
