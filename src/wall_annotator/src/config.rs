//! Annotator configuration: parsing, normalization, env overrides.
//!
//! A TOML document carries session defaults. Every field has a default, so an
//! empty document is valid:
//!
//! ```toml
//! lookback = 5
//! ring_mode = "both"
//! market_tz = "America/New_York"
//!
//! [percentile]
//! low = 0.1
//! high = 0.9
//!
//! [duration]
//! low = 0.1
//! high = 0.9
//!
//! [display]
//! show_bands = true
//!
//! [colors]
//! low_ring = "#2E86DE"
//!
//! [source]
//! url = "https://example.invalid/api/bars"
//! token_env = "WALL_API_TOKEN"
//! timeout_secs = 30
//! ```
//!
//! Normalization couples the percentile pair, clamps the duration pair into
//! `[0, 1]` without ordering it, coerces `lookback <= 0` to 1, validates the
//! market zone and trims string fields.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]
//! - Environment overrides layered on top: [`apply_env_overrides`]

use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_parsed;
use toml::from_str;

use crate::{
    pipeline::AnnotationParams,
    render::{ColorTags, DisplayFlags},
    rings::RingMode,
    threshold::ThresholdPair,
    timezone::parse_tz,
};

/// Overrides `lookback` when set.
pub const LOOKBACK_ENV: &str = "WALL_ANNOTATOR_LOOKBACK";
/// Overrides `ring_mode` when set (`low`, `high` or `both`).
pub const RING_MODE_ENV: &str = "WALL_ANNOTATOR_RING_MODE";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotatorConfig {
    /// Trading days to request and retain.
    pub lookback: i64,
    pub ring_mode: RingMode,
    /// IANA zone for rendered instants. Naive output when unset.
    pub market_tz: Option<String>,
    /// Coupled pair for band splitting.
    pub percentile: ThresholdPair,
    /// Ring thresholds. Never reordered.
    pub duration: ThresholdPair,
    pub display: DisplayFlags,
    pub colors: ColorTags,
    pub source: SourceCfg,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            lookback: 5,
            ring_mode: RingMode::default(),
            market_tz: None,
            percentile: ThresholdPair::default(),
            duration: ThresholdPair::default(),
            display: DisplayFlags::default(),
            colors: ColorTags::default(),
            source: SourceCfg::default(),
        }
    }
}

/// Upstream HTTP source settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceCfg {
    /// Bars endpoint; `?lookback=N` is appended per request.
    pub url: Option<String>,
    /// Name of the env var holding a bearer token.
    pub token_env: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            url: None,
            token_env: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Summary of changes performed during normalization.
///
/// All counters are additive for the processed config.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// 1 when the percentile pair had to be reordered or separated.
    pub percentile_coupled: usize,
    /// Duration endpoints moved into `[0, 1]`.
    pub duration_clamped: usize,
    /// 1 when a non-positive lookback was raised to 1.
    pub lookback_coerced: usize,
    /// String fields that changed when trimmed.
    pub fields_trimmed: usize,
    /// 1 when a zero timeout fell back to the default.
    pub timeout_defaulted: usize,
}

impl AnnotatorConfig {
    /// Pipeline parameters for this config.
    ///
    /// Errors when `market_tz` names an unknown zone (normalized configs never do).
    pub fn params(&self) -> anyhow::Result<AnnotationParams> {
        let market_tz = self
            .market_tz
            .as_deref()
            .map(parse_tz)
            .transpose()
            .context("invalid market_tz")?;
        Ok(AnnotationParams {
            lookback: self.lookback,
            percentile: self.percentile,
            duration: self.duration,
            ring_mode: self.ring_mode,
            display: self.display,
            colors: self.colors.clone(),
            market_tz,
        })
    }
}

fn trim_in_place(s: &mut String, report: &mut NormalizationReport) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
        report.fields_trimmed += 1;
    }
}

/// Trim an optional string; blank becomes `None`.
fn trim_optional(v: &mut Option<String>, report: &mut NormalizationReport) {
    if let Some(s) = v.as_mut() {
        trim_in_place(s, report);
        if s.is_empty() {
            *v = None;
        }
    }
}

/// Normalize a config in place.
///
/// Errors:
/// - Unknown `market_tz`
/// - Empty color tags after trimming
pub fn normalize_config(cfg: &mut AnnotatorConfig) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    let coupled = cfg.percentile.coupled();
    if coupled != cfg.percentile {
        report.percentile_coupled += 1;
        cfg.percentile = coupled;
    }

    let clamped = cfg.duration.clamped();
    report.duration_clamped += usize::from(clamped.low != cfg.duration.low)
        + usize::from(clamped.high != cfg.duration.high);
    cfg.duration = clamped;

    if cfg.lookback <= 0 {
        cfg.lookback = 1;
        report.lookback_coerced += 1;
    }

    trim_optional(&mut cfg.market_tz, &mut report);
    if let Some(name) = cfg.market_tz.as_deref() {
        parse_tz(name).with_context(|| format!("market_tz '{name}'"))?;
    }

    for (field, tag) in [
        ("low_ring", &mut cfg.colors.low_ring),
        ("high_ring", &mut cfg.colors.high_ring),
        ("wall_marker", &mut cfg.colors.wall_marker),
    ] {
        trim_in_place(tag, &mut report);
        if tag.is_empty() {
            bail!("colors.{field} cannot be empty after trimming");
        }
    }

    trim_optional(&mut cfg.source.url, &mut report);
    trim_optional(&mut cfg.source.token_env, &mut report);
    if cfg.source.timeout_secs == 0 {
        cfg.source.timeout_secs = DEFAULT_TIMEOUT_SECS;
        report.timeout_defaulted += 1;
    }

    Ok(report)
}

/// Layer [`LOOKBACK_ENV`] and [`RING_MODE_ENV`] over the file values.
pub fn apply_env_overrides(cfg: &mut AnnotatorConfig) -> anyhow::Result<()> {
    if let Some(n) = get_env_parsed::<i64>(LOOKBACK_ENV)? {
        cfg.lookback = n.max(1);
        tracing::debug!(lookback = cfg.lookback, "lookback from environment");
    }
    if let Some(mode) = get_env_parsed::<RingMode>(RING_MODE_ENV)? {
        cfg.ring_mode = mode;
        tracing::debug!(%mode, "ring mode from environment");
    }
    Ok(())
}

/// Parse and normalize a config from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<AnnotatorConfig> {
    let mut cfg: AnnotatorConfig = from_str(toml_str).context("failed to parse config TOML")?;
    let report = normalize_config(&mut cfg).context("normalize_config failed")?;
    if report != NormalizationReport::default() {
        tracing::info!(?report, "config normalized");
    }
    Ok(cfg)
}

/// Read a config TOML file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<AnnotatorConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text).with_context(|| format!("load config {}", path.as_ref().display()))
}
