use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wall_annotator::{
    AnnotationSet,
    config::{AnnotatorConfig, apply_env_overrides, load_config_path},
    rings::RingMode,
    session::Session,
    source::{BarSource, FileBarSource, HttpBarSource},
    threshold::Endpoint,
};

#[derive(Parser)]
#[command(version, about = "Classify hourly bars and build gamma-wall overlays")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Annotate bars read from a JSON file
    Annotate {
        /// JSON array of bars or { "data": [...] } envelope
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        controls: Controls,
    },

    /// Fetch bars from the configured HTTP source, then annotate
    Fetch {
        /// Overrides `source.url` from the config
        #[arg(long)]
        url: Option<String>,

        #[command(flatten)]
        controls: Controls,
    },
}

/// Flags shared by every subcommand.
#[derive(Args)]
struct Controls {
    /// Config TOML (defaults apply when omitted)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Trading days to keep
    #[arg(long, allow_hyphen_values = true)]
    lookback: Option<i64>,

    /// Ring overlay mode: low, high or both
    #[arg(long)]
    mode: Option<RingMode>,

    /// Percentile low threshold (coupled with --pct-high)
    #[arg(long)]
    pct_low: Option<f64>,

    /// Percentile high threshold, applied after --pct-low
    #[arg(long)]
    pct_high: Option<f64>,

    /// Duration low threshold (not coupled)
    #[arg(long)]
    dur_low: Option<f64>,

    /// Duration high threshold (not coupled)
    #[arg(long)]
    dur_high: Option<f64>,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
}

impl Controls {
    fn load_config(&self) -> Result<AnnotatorConfig> {
        let mut cfg = match self.config.as_deref() {
            Some(path) => load_config_path(path)?,
            None => AnnotatorConfig::default(),
        };
        apply_env_overrides(&mut cfg)?;
        Ok(cfg)
    }

    /// Session seeded from config, with command-line edits applied on top.
    fn session(&self, cfg: &AnnotatorConfig) -> Result<Session> {
        let mut session = Session::new(cfg.params()?);
        if let Some(n) = self.lookback {
            session.set_lookback(n);
        }
        if let Some(mode) = self.mode {
            session.set_ring_mode(mode);
        }
        if let Some(v) = self.pct_low {
            session.set_percentile(Endpoint::Low, v);
        }
        if let Some(v) = self.pct_high {
            session.set_percentile(Endpoint::High, v);
        }
        if let Some(v) = self.dur_low {
            session.set_duration(Endpoint::Low, v);
        }
        if let Some(v) = self.dur_high {
            session.set_duration(Endpoint::High, v);
        }
        Ok(session)
    }
}

fn write_set(set: &AnnotationSet, compact: bool) -> Result<()> {
    let mut out = std::io::stdout().lock();
    if compact {
        serde_json::to_writer(&mut out, set)?;
    } else {
        serde_json::to_writer_pretty(&mut out, set)?;
    }
    writeln!(out)?;
    Ok(())
}

async fn annotate_file(input: &Path, controls: &Controls) -> Result<()> {
    let cfg = controls.load_config()?;
    let mut session = controls.session(&cfg)?;
    let bars = FileBarSource::new(input)
        .fetch_bars(0)
        .await
        .with_context(|| format!("load bars from {}", input.display()))?;
    let set = session.replace_snapshot(Ok(bars));
    tracing::info!(
        bars = set.bars.len(),
        days = set.trading_days.len(),
        shapes = set.shapes.len(),
        "annotated"
    );
    write_set(&set, controls.compact)
}

async fn fetch_and_annotate(url: Option<&str>, controls: &Controls) -> Result<()> {
    let cfg = controls.load_config()?;
    let mut session = controls.session(&cfg)?;
    let source = HttpBarSource::from_config(&cfg.source, url).context("build HTTP source")?;
    tracing::info!(url = source.url(), lookback = session.params().lookback, "fetching bars");
    let set = session.refresh(&source).await;
    write_set(&set, controls.compact)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Annotate { input, controls } => annotate_file(&input, &controls).await,
        Cmd::Fetch { url, controls } => fetch_and_annotate(url.as_deref(), &controls).await,
    }
}
