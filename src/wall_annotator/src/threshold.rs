//! Low/high threshold pairs and the interactive coupling rule.
//!
//! The same [`ThresholdPair`] type carries both the percentile pair used for
//! band splitting and the duration pair used for ring selection. Only the
//! percentile pair goes through [`ThresholdPair::adjust`]; the duration pair is
//! allowed to end up misordered.

use serde::{Deserialize, Serialize};

/// Minimum separation kept between a coupled pair's endpoints.
pub const MIN_GAP: f64 = 0.01;

const MAX_LOW: f64 = 1.0 - MIN_GAP;
const MIN_HIGH: f64 = MIN_GAP;

/// A `{low, high}` pair of fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdPair {
    pub low: f64,
    pub high: f64,
}

impl Default for ThresholdPair {
    fn default() -> Self {
        Self { low: 0.1, high: 0.9 }
    }
}

/// Which endpoint of a pair is being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Low,
    High,
}

impl ThresholdPair {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// `low < high` with at least [`MIN_GAP`] between them, both in `[0, 1]`.
    pub fn is_coupled(&self) -> bool {
        (0.0..=1.0).contains(&self.low)
            && (0.0..=1.0).contains(&self.high)
            && self.high - self.low >= MIN_GAP
    }

    /// Both endpoints clamped to `[0, 1]`, order untouched. NaN becomes 0.
    pub fn clamped(self) -> Self {
        Self {
            low: clamp_unit(self.low),
            high: clamp_unit(self.high),
        }
    }

    /// Move one endpoint to `value`, keeping the pair coupled.
    ///
    /// The moved endpoint is clamped into `[0, 1]` (and kept one gap away from
    /// the far edge so the other endpoint still fits). The other endpoint only
    /// moves when it would otherwise sit closer than [`MIN_GAP`] or on the wrong
    /// side. A NaN proposal leaves the pair unchanged.
    pub fn adjust(self, endpoint: Endpoint, value: f64) -> Self {
        if value.is_nan() {
            return self;
        }
        match endpoint {
            Endpoint::Low => {
                let low = value.clamp(0.0, MAX_LOW);
                let high = clamp_unit(self.high);
                let high = if high - low >= MIN_GAP {
                    high
                } else {
                    separated_above(low)
                };
                Self { low, high }
            }
            Endpoint::High => {
                let high = value.clamp(MIN_HIGH, 1.0);
                let low = clamp_unit(self.low);
                let low = if high - low >= MIN_GAP {
                    low
                } else {
                    separated_below(high)
                };
                Self { low, high }
            }
        }
    }

    /// Bring an arbitrary pair into coupled form: low is applied first, then high.
    pub fn coupled(self) -> Self {
        let base = Self::default();
        base.adjust(Endpoint::Low, nan_to(self.low, base.low))
            .adjust(Endpoint::High, nan_to(self.high, base.high))
    }
}

fn nan_to(v: f64, fallback: f64) -> f64 {
    if v.is_nan() { fallback } else { v }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Smallest value `>= low + MIN_GAP` (capped at 1) whose difference from `low`
/// survives rounding. `low <= MAX_LOW`.
fn separated_above(low: f64) -> f64 {
    let mut high = (low + MIN_GAP).min(1.0);
    while high - low < MIN_GAP && high < 1.0 {
        high = f64::from_bits(high.to_bits() + 1);
    }
    high
}

/// Mirror of [`separated_above`]. `high >= MIN_HIGH`.
fn separated_below(high: f64) -> f64 {
    let mut low = (high - MIN_GAP).max(0.0);
    while high - low < MIN_GAP && low > 0.0 {
        low = f64::from_bits(low.to_bits() - 1);
    }
    low
}
