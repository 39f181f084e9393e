//! Render contract: shape descriptors handed to the charting side.
//!
//! Colors are opaque tags. Mapping category codes to colors stays with the
//! renderer; only overlay shapes carry a tag.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    daily::TradingDay,
    datetime::canonical_instant,
    rings::{RingSelection, ring_rect},
    timezone::{DstPolicy, localize, to_rfc3339_secs},
};

/// Kind of overlay shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    LowRing,
    HighRing,
    WallMarker,
}

/// Rectangle (or horizontal line when `y0 == y1`) over `[x0, x1] × [y0, y1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub date: String,
    pub x0: String,
    pub x1: String,
    pub y0: f64,
    pub y1: f64,
    pub color: String,
}

/// Show/hide switches. They gate output only; classification and aggregation
/// run regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayFlags {
    pub show_bands: bool,
    pub show_rings: bool,
    pub show_wall_markers: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            show_bands: true,
            show_rings: true,
            show_wall_markers: true,
        }
    }
}

/// Color tags per shape kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorTags {
    pub low_ring: String,
    pub high_ring: String,
    pub wall_marker: String,
}

impl Default for ColorTags {
    fn default() -> Self {
        Self {
            low_ring: "#2E86DE".into(),
            high_ring: "#E74C3C".into(),
            wall_marker: "#F1C40F".into(),
        }
    }
}

impl ColorTags {
    pub fn for_kind(&self, kind: ShapeKind) -> &str {
        match kind {
            ShapeKind::LowRing => &self.low_ring,
            ShapeKind::HighRing => &self.high_ring,
            ShapeKind::WallMarker => &self.wall_marker,
        }
    }
}

/// Axis label for an instant: RFC-3339 in `tz` when given, the naive canonical
/// form otherwise, and `fallback` when the instant is unknown or cannot be placed.
pub fn axis_label(instant: Option<NaiveDateTime>, fallback: &str, tz: Option<Tz>) -> String {
    match (instant, tz) {
        (Some(naive), Some(tz)) => match localize(naive, tz, DstPolicy::RENDER) {
            Ok(dt) => to_rfc3339_secs(dt),
            Err(e) => {
                tracing::warn!(error = %e, "falling back to naive axis label");
                canonical_instant(naive)
            }
        },
        (Some(naive), None) => canonical_instant(naive),
        (None, _) => fallback.to_string(),
    }
}

/// Build ring and wall-marker shapes in chronological day order.
pub fn build_shapes(
    days: &IndexMap<String, TradingDay>,
    rings: &RingSelection,
    flags: DisplayFlags,
    colors: &ColorTags,
    tz: Option<Tz>,
) -> Vec<Shape> {
    let low: HashSet<&str> = rings.low_ring_days.iter().map(String::as_str).collect();
    let high: HashSet<&str> = rings.high_ring_days.iter().map(String::as_str).collect();
    let mut shapes = Vec::new();

    for day in days.values() {
        let (raw_start, raw_end) = day.raw_bounds();
        let x0 = axis_label(day.start_instant(), &raw_start, tz);
        let x1 = axis_label(day.end_instant(), &raw_end, tz);
        let mut push = |kind: ShapeKind, y0: f64, y1: f64| {
            shapes.push(Shape {
                kind,
                date: day.date.clone(),
                x0: x0.clone(),
                x1: x1.clone(),
                y0,
                y1,
                color: colors.for_kind(kind).to_string(),
            });
        };

        if flags.show_rings {
            let rect = ring_rect(day);
            if rect.y0.is_finite() && rect.y1.is_finite() {
                if low.contains(day.date.as_str()) {
                    push(ShapeKind::LowRing, rect.y0, rect.y1);
                }
                if high.contains(day.date.as_str()) {
                    push(ShapeKind::HighRing, rect.y0, rect.y1);
                }
            } else {
                tracing::debug!(date = %day.date, "no finite price range, ring skipped");
            }
        }

        if flags.show_wall_markers {
            if let Some(level) = day.wall_level {
                push(ShapeKind::WallMarker, level, level);
            }
        }
    }
    shapes
}
