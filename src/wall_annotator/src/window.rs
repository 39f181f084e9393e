//! Trading-day lookback window.
//!
//! Lookback counts distinct trading days, not rows: a day with seven bars and a
//! day with one bar are one unit each. A non-positive lookback keeps one day.
//! Bars with an unparsed date sit at the old end of the sequence, so they are
//! kept only when the window spans the whole history.

use std::collections::HashSet;

use crate::{bar::Bar, sequence::Sequenced};

/// Lookback after coercing `n <= 0` to 1.
pub fn effective_lookback(n: i64) -> usize {
    usize::try_from(n.max(1)).unwrap_or(usize::MAX)
}

/// Keep the bars whose `date` is among the last `min(N, days)` trading days.
///
/// `trading_days` must be oldest first, as produced by [`crate::sequence::sequence`].
pub fn select_window(bars: &[Bar], trading_days: &[String], lookback: i64) -> Vec<Bar> {
    let keep = effective_lookback(lookback).min(trading_days.len());
    let kept: HashSet<&str> = trading_days[trading_days.len() - keep..]
        .iter()
        .map(String::as_str)
        .collect();
    bars.iter()
        .filter(|b| kept.contains(b.date.as_str()))
        .cloned()
        .collect()
}

impl Sequenced {
    /// Window this sequence, returning the retained bars and days.
    pub fn window(&self, lookback: i64) -> Sequenced {
        let keep = effective_lookback(lookback).min(self.trading_days.len());
        let trading_days = self.trading_days[self.trading_days.len() - keep..].to_vec();
        let bars = select_window(&self.bars, &self.trading_days, lookback);
        tracing::debug!(
            lookback,
            days_in = self.trading_days.len(),
            days_out = trading_days.len(),
            bars_in = self.bars.len(),
            bars_out = bars.len(),
            "trading-day window"
        );
        Sequenced { bars, trading_days }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bar::fixtures::bar, sequence::sequence};
    use proptest::prelude::*;

    fn three_days() -> Sequenced {
        sequence(vec![
            bar("2024-01-01", "10:00", 1.0, 1.0, 0.0),
            bar("2024-01-02", "10:00", 1.0, 1.0, 0.0),
            bar("2024-01-02", "11:00", 1.0, 1.0, 0.0),
            bar("2024-01-02", "12:00", 1.0, 1.0, 0.0),
            bar("2024-01-03", "10:00", 1.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn lookback_two_keeps_last_two_days() {
        let w = three_days().window(2);
        let dates: Vec<_> = w.bars.iter().map(|b| b.date.as_str()).collect();
        assert_eq!(dates, ["2024-01-02", "2024-01-02", "2024-01-02", "2024-01-03"]);
        assert_eq!(w.trading_days, ["2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn lookback_counts_days_not_rows() {
        // 1 bar on the last day still only costs one unit of lookback.
        let w = three_days().window(1);
        assert_eq!(w.bars.len(), 1);
        assert_eq!(w.bars[0].date, "2024-01-03");
    }

    #[test]
    fn non_positive_lookback_keeps_one_day() {
        for n in [0, -1, i64::MIN] {
            let w = three_days().window(n);
            assert_eq!(w.trading_days, ["2024-01-03"], "lookback {n}");
        }
    }

    #[test]
    fn lookback_beyond_history_keeps_everything() {
        let seq = three_days();
        assert_eq!(seq.window(10).bars, seq.bars);
        assert_eq!(seq.window(i64::MAX).bars.len(), 5);
    }

    #[test]
    fn unparsed_date_never_displaces_the_latest_day() {
        let seq = sequence(vec![
            bar("2024-01-02", "10:00", 1.0, 1.0, 0.0),
            bar("2024-01-03", "10:00", 1.0, 1.0, 0.0),
            bar("n/a", "10:00", 1.0, 1.0, 0.0),
        ]);
        assert_eq!(seq.window(1).trading_days, ["2024-01-03"]);
        assert_eq!(seq.window(2).trading_days, ["2024-01-02", "2024-01-03"]);
        let all = seq.window(3);
        assert_eq!(all.trading_days, ["n/a", "2024-01-02", "2024-01-03"]);
        assert_eq!(all.bars.len(), 3);
    }

    #[test]
    fn empty_input_stays_empty() {
        let w = Sequenced::default().window(3);
        assert!(w.bars.is_empty());
        assert!(w.trading_days.is_empty());
    }

    /// Label for day `d` of February 2024 in one of several layouts; kind 3 is junk.
    fn label(d: u32, kind: u8) -> String {
        match kind {
            0 => format!("2024-02-{d:02}"),
            1 => format!("02/{d:02}/2024"),
            2 => format!("202402{d:02}"),
            _ => format!("junk-{d}"),
        }
    }

    fn mixed_bars(days: &[(u32, u8)]) -> Vec<Bar> {
        days.iter()
            .map(|&(d, kind)| bar(&label(d, kind), "10:00", 1.0, 1.0, 0.0))
            .collect()
    }

    proptest! {
        #[test]
        fn window_is_idempotent(
            days in proptest::collection::vec((1u32..28, 0u8..4), 0..40),
            n in -3i64..10,
        ) {
            let once = sequence(mixed_bars(&days)).window(n);
            let twice = once.window(n);
            prop_assert_eq!(&once.bars, &twice.bars);
            prop_assert_eq!(&once.trading_days, &twice.trading_days);
        }

        #[test]
        fn lookback_one_is_the_max_date(
            first in 1u32..28,
            days in proptest::collection::vec((1u32..28, 0u8..4), 0..40),
        ) {
            let mut all = vec![(first, 0u8)];
            all.extend(days);
            let max = all
                .iter()
                .filter(|(_, kind)| *kind < 3)
                .map(|(d, _)| *d)
                .max()
                .unwrap();
            let w = sequence(mixed_bars(&all)).window(1);
            let want = format!("2024-02-{max:02}");
            prop_assert!(!w.bars.is_empty());
            prop_assert!(w.bars.iter().all(|b| b.date == want), "{:?}", w.trading_days);
            prop_assert_eq!(w.trading_days, vec![want]);
        }
    }
}
