//! Gamma-wall hourly bar annotation.
//!
//! Turns a snapshot of hourly bars into render-ready annotations: a category
//! code per bar, three percentile bands over the wall series, and ring and
//! wall-marker shapes per trading day. The core ([`pipeline::annotate`]) is a
//! pure function; [`session`] layers interactive state on top and [`source`]
//! fetches snapshots from the data backend.

pub mod bands;
pub mod bar;
pub mod classify;
pub mod config;
pub mod daily;
pub mod datetime;
pub mod errors;
pub mod pipeline;
pub mod render;
pub mod rings;
pub mod sequence;
pub mod session;
pub mod source;
pub mod threshold;
pub mod timezone;
pub mod window;

pub use pipeline::{AnnotationParams, AnnotationSet, annotate};
