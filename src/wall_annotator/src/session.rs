//! Interactive session state and the published annotation board.
//!
//! A [`Session`] owns the current raw snapshot plus the user's controls. Every
//! edit is last-write-wins and triggers a full pipeline pass; there is no
//! incremental update. The result is published on an [`AnnotationBoard`], which
//! readers on any thread can load without locking and always see a complete set.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::{
    bar::RawBar,
    pipeline::{AnnotationParams, AnnotationSet, annotate},
    render::DisplayFlags,
    rings::RingMode,
    source::{BarSource, SourceError},
    threshold::Endpoint,
    window::effective_lookback,
};

/// Lock-free holder of the latest annotation set.
///
/// Starts empty; [`AnnotationBoard::publish`] swaps in a new set atomically.
#[derive(Debug, Clone)]
pub struct AnnotationBoard {
    current: Arc<ArcSwap<AnnotationSet>>,
}

impl Default for AnnotationBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationBoard {
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(AnnotationSet::default())),
        }
    }

    /// Snapshot of the current set.
    pub fn load(&self) -> Arc<AnnotationSet> {
        self.current.load_full()
    }

    pub fn publish(&self, set: AnnotationSet) -> Arc<AnnotationSet> {
        let set = Arc::new(set);
        self.current.store(Arc::clone(&set));
        set
    }
}

/// Snapshot + controls, recomputed on every change.
#[derive(Debug)]
pub struct Session {
    snapshot: Vec<RawBar>,
    params: AnnotationParams,
    board: AnnotationBoard,
}

impl Session {
    pub fn new(params: AnnotationParams) -> Self {
        let session = Self {
            snapshot: Vec::new(),
            params,
            board: AnnotationBoard::new(),
        };
        session.recompute();
        session
    }

    pub fn params(&self) -> &AnnotationParams {
        &self.params
    }

    pub fn snapshot(&self) -> &[RawBar] {
        &self.snapshot
    }

    /// Shared handle for readers.
    pub fn board(&self) -> AnnotationBoard {
        self.board.clone()
    }

    pub fn annotations(&self) -> Arc<AnnotationSet> {
        self.board.load()
    }

    /// Move one percentile endpoint through the coupler.
    pub fn set_percentile(&mut self, endpoint: Endpoint, value: f64) -> Arc<AnnotationSet> {
        self.params.percentile = self.params.percentile.adjust(endpoint, value);
        self.recompute()
    }

    /// Move one duration endpoint. The pair is not coupled and may end up misordered.
    pub fn set_duration(&mut self, endpoint: Endpoint, value: f64) -> Arc<AnnotationSet> {
        match endpoint {
            Endpoint::Low => self.params.duration.low = value,
            Endpoint::High => self.params.duration.high = value,
        }
        self.recompute()
    }

    pub fn set_ring_mode(&mut self, mode: RingMode) -> Arc<AnnotationSet> {
        self.params.ring_mode = mode;
        self.recompute()
    }

    pub fn set_lookback(&mut self, lookback: i64) -> Arc<AnnotationSet> {
        self.params.lookback = lookback;
        self.recompute()
    }

    pub fn set_display(&mut self, display: DisplayFlags) -> Arc<AnnotationSet> {
        self.params.display = display;
        self.recompute()
    }

    /// Install a fetched snapshot. A failed fetch installs an empty one.
    pub fn replace_snapshot(
        &mut self,
        fetched: Result<Vec<RawBar>, SourceError>,
    ) -> Arc<AnnotationSet> {
        self.snapshot = match fetched {
            Ok(bars) => {
                tracing::info!(bars = bars.len(), "snapshot replaced");
                bars
            }
            Err(e) => {
                tracing::warn!(error = %e, "no data available, clearing snapshot");
                Vec::new()
            }
        };
        self.recompute()
    }

    /// Fetch the current lookback from `source` and install the result.
    pub async fn refresh(&mut self, source: &dyn BarSource) -> Arc<AnnotationSet> {
        let lookback = u32::try_from(effective_lookback(self.params.lookback)).unwrap_or(u32::MAX);
        let fetched = source.fetch_bars(lookback).await;
        self.replace_snapshot(fetched)
    }

    fn recompute(&self) -> Arc<AnnotationSet> {
        self.board.publish(annotate(&self.snapshot, &self.params))
    }
}
