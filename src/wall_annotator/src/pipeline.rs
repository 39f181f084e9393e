//! End-to-end annotation: raw records in, render-ready annotation set out.
//!
//! ```text
//! raw → normalize → sequence → window ─┬─ classify
//!                                      └─ aggregate days ─┬─ bands
//!                                                         └─ rings → shapes
//! ```
//!
//! The whole pass is a pure function of its inputs. Thresholds, mode, lookback
//! and display flags arrive as [`AnnotationParams`]; nothing is read from
//! shared state.

use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    bands::{PercentileBands, split_bands, wall_points},
    bar::{Bar, RawBar, normalize_all},
    classify::{Category, classify},
    daily::{TradingDay, aggregate_days},
    render::{ColorTags, DisplayFlags, Shape, axis_label, build_shapes},
    rings::{RingMode, RingSelection, select_rings},
    sequence::sequence,
    threshold::ThresholdPair,
};

/// Every user-adjustable input of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationParams {
    /// Trading days to keep; `<= 0` keeps one.
    pub lookback: i64,
    /// Coupled pair for band splitting.
    pub percentile: ThresholdPair,
    /// Uncoupled pair for ring selection.
    pub duration: ThresholdPair,
    pub ring_mode: RingMode,
    pub display: DisplayFlags,
    pub colors: ColorTags,
    /// Market zone for rendered axis labels.
    pub market_tz: Option<Tz>,
}

impl Default for AnnotationParams {
    fn default() -> Self {
        Self {
            lookback: 5,
            percentile: ThresholdPair::default(),
            duration: ThresholdPair::default(),
            ring_mode: RingMode::default(),
            display: DisplayFlags::default(),
            colors: ColorTags::default(),
            market_tz: None,
        }
    }
}

/// A bar with its category and axis position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedBar {
    pub x: String,
    pub category: Category,
    #[serde(flatten)]
    pub bar: Bar,
}

/// Render-ready output of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSet {
    /// Windowed bars in chronological order.
    pub bars: Vec<AnnotatedBar>,
    /// Trading days retained by the window, ascending.
    pub trading_days: Vec<String>,
    pub bands: PercentileBands,
    pub days: Vec<TradingDay>,
    pub rings: RingSelection,
    pub shapes: Vec<Shape>,
}

impl AnnotationSet {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.bars.iter().map(|b| b.category).collect()
    }
}

/// Run the full pipeline over raw records.
pub fn annotate(raw: &[RawBar], params: &AnnotationParams) -> AnnotationSet {
    annotate_bars(normalize_all(raw), params)
}

/// Run the pipeline over already-normalized bars (any order).
pub fn annotate_bars(bars: Vec<Bar>, params: &AnnotationParams) -> AnnotationSet {
    let received = bars.len();
    let windowed = sequence(bars).window(params.lookback);
    let tz = params.market_tz;
    let label = |b: &Bar| axis_label(b.instant(), &b.raw_label(), tz);

    let annotated: Vec<AnnotatedBar> = windowed
        .bars
        .iter()
        .map(|b| AnnotatedBar {
            x: label(b),
            category: classify(b),
            bar: b.clone(),
        })
        .collect();

    let days = aggregate_days(&windowed.bars);

    let bands = if params.display.show_bands {
        split_bands(&wall_points(&windowed.bars, label), params.percentile)
    } else {
        PercentileBands::default()
    };

    let rings = select_rings(days.values(), params.duration, params.ring_mode);
    let shapes = build_shapes(&days, &rings, params.display, &params.colors, tz);

    tracing::debug!(
        received,
        kept = annotated.len(),
        days = days.len(),
        wall_points = bands.len(),
        shapes = shapes.len(),
        "annotation pass"
    );

    AnnotationSet {
        bars: annotated,
        trading_days: windowed.trading_days,
        bands,
        days: days.into_values().collect(),
        rings,
        shapes,
    }
}
