//! Percentile banding of the wall series.
//!
//! Each wall point lands in exactly one of three parallel series; the other two
//! carry a gap (`None`, serialized as `null`) at that position so a line chart
//! breaks instead of interpolating across excluded points.

use serde::Serialize;

use crate::{bar::Bar, threshold::ThresholdPair};

/// One point of the wall series.
#[derive(Debug, Clone, PartialEq)]
pub struct WallPoint {
    /// Axis label of the bar the point belongs to.
    pub x: String,
    pub level: f64,
    pub percentile: Option<f64>,
}

/// Which band a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    Mid,
    High,
}

/// Three aligned series over the same `x` positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PercentileBands {
    pub x: Vec<String>,
    pub high: Vec<Option<f64>>,
    pub mid: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
}

impl PercentileBands {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Wall points for bars carrying a finite `wallLevel`, labelled by `x_label`.
pub fn wall_points<F>(bars: &[Bar], mut x_label: F) -> Vec<WallPoint>
where
    F: FnMut(&Bar) -> String,
{
    bars.iter()
        .filter_map(|b| {
            b.finite_wall_level().map(|level| WallPoint {
                x: x_label(b),
                level,
                percentile: b.wall_percentile,
            })
        })
        .collect()
}

/// Band for a percentile. High is checked first so a misordered pair still
/// yields one band per point; an unknown percentile falls back to mid.
pub fn band_of(percentile: Option<f64>, pair: ThresholdPair) -> Band {
    match percentile.filter(|p| !p.is_nan()) {
        Some(p) if p >= pair.high => Band::High,
        Some(p) if p <= pair.low => Band::Low,
        _ => Band::Mid,
    }
}

/// Split wall points into high/mid/low series.
pub fn split_bands(points: &[WallPoint], pair: ThresholdPair) -> PercentileBands {
    let n = points.len();
    let mut out = PercentileBands {
        x: Vec::with_capacity(n),
        high: Vec::with_capacity(n),
        mid: Vec::with_capacity(n),
        low: Vec::with_capacity(n),
    };
    for p in points {
        let band = band_of(p.percentile, pair);
        let pick = |b: Band| (band == b).then_some(p.level);
        out.x.push(p.x.clone());
        out.high.push(pick(Band::High));
        out.mid.push(pick(Band::Mid));
        out.low.push(pick(Band::Low));
    }
    out
}
