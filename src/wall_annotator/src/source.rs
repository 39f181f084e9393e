//! Upstream bar sources.
//!
//! This module defines the [`BarSource`] trait, the single seam between the
//! annotator and whatever backend serves hourly bars. Two implementations ship
//! with the crate:
//!
//! - [`HttpBarSource`]: `GET <url>?lookback=N`, optional bearer token.
//! - [`FileBarSource`]: reads the same JSON payload from disk.
//!
//! Both accept a bare JSON array or a `{ "data": [...] }` envelope.
//!
//! The annotator never escalates a fetch failure: [`fetch_snapshot`] logs it and
//! hands back an empty snapshot, and the pipeline runs on that.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use wall_annotator::bar::RawBar;
//! use wall_annotator::source::{BarSource, SourceError};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl BarSource for Canned {
//!     async fn fetch_bars(&self, _lookback: u32) -> Result<Vec<RawBar>, SourceError> {
//!         Ok(vec![RawBar::default()])
//!     }
//! }
//! ```

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::{EnvVarError, get_env_var};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};

use crate::{
    bar::{RawBar, parse_bars_json},
    config::SourceCfg,
};

/// Trait for fetching raw bars from the data collaborator.
///
/// Supports dynamic dispatch (`&dyn BarSource`) so the binary can pick a source
/// at runtime.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Fetch bars covering the last `lookback` trading days.
    async fn fetch_bars(&self, lookback: u32) -> Result<Vec<RawBar>, SourceError>;
}

/// Errors that can occur while constructing a source.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: EnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Token contains characters not allowed in a header.
    #[snafu(display("Invalid bearer token format: {source}"))]
    InvalidToken {
        source: header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// No URL in config or on the command line.
    #[snafu(display("No source URL configured"))]
    MissingUrl { backtrace: Backtrace },
}

/// Errors that can occur within a [`BarSource`] implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// Network failure, timeout, or body read failure.
    #[snafu(display("Bar request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The backend answered with a non-success status.
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// Reading a local payload failed.
    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The payload was not a bar array or envelope.
    #[snafu(display("Undecodable bar payload: {source}"))]
    Decode {
        source: crate::errors::Error,
        backtrace: Backtrace,
    },

    /// An error during source configuration or initialization.
    #[snafu(display("Source initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: SourceInitError,
    },
}

/// HTTP bar source.
pub struct HttpBarSource {
    client: Client,
    url: String,
    token: Option<SecretString>,
}

impl HttpBarSource {
    /// Creates a new HTTP source.
    ///
    /// When `token_env` is given, the bearer token is read from that environment
    /// variable and sent on every request.
    pub fn new(
        url: impl Into<String>,
        token_env: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, SourceInitError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context(ClientBuildSnafu)?;
        let source = Self::with_client(client, url);
        match token_env {
            Some(name) => {
                let token = get_env_var(name).context(MissingEnvVarSnafu)?;
                source.with_token(SecretString::new(token.into()))
            }
            None => Ok(source),
        }
    }

    /// Builds a source from config; `url_override` wins over `cfg.url`.
    pub fn from_config(cfg: &SourceCfg, url_override: Option<&str>) -> Result<Self, SourceInitError> {
        let url = url_override
            .or(cfg.url.as_deref())
            .context(MissingUrlSnafu)?;
        Self::new(
            url,
            cfg.token_env.as_deref(),
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    /// Wraps a caller-built client, without a token.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            token: None,
        }
    }

    /// Attach a bearer token. Rejects tokens that cannot travel in a header.
    pub fn with_token(mut self, token: SecretString) -> Result<Self, SourceInitError> {
        header::HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .context(InvalidTokenSnafu)?;
        self.token = Some(token);
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BarSource for HttpBarSource {
    async fn fetch_bars(&self, lookback: u32) -> Result<Vec<RawBar>, SourceError> {
        let mut request = self.client.get(&self.url).query(&[("lookback", lookback)]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = request.send().await.context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let body = response.text().await.context(ReqwestSnafu)?;
        let bars = parse_bars_json(&body).context(DecodeSnafu)?;
        tracing::debug!(url = %self.url, lookback, bars = bars.len(), "fetched bars");
        Ok(bars)
    }
}

/// Local JSON file source. The whole file is the snapshot; `lookback` is left
/// to the pipeline's window.
#[derive(Debug, Clone)]
pub struct FileBarSource {
    path: PathBuf,
}

impl FileBarSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl BarSource for FileBarSource {
    async fn fetch_bars(&self, _lookback: u32) -> Result<Vec<RawBar>, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .context(IoSnafu { path: &self.path })?;
        let bars = parse_bars_json(&text).context(DecodeSnafu)?;
        tracing::debug!(path = %self.path.display(), bars = bars.len(), "read bars");
        Ok(bars)
    }
}

/// Fetch a snapshot, degrading any failure to an empty one.
pub async fn fetch_snapshot(source: &dyn BarSource, lookback: u32) -> Vec<RawBar> {
    match source.fetch_bars(lookback).await {
        Ok(bars) => bars,
        Err(e) => {
            tracing::warn!(error = %e, lookback, "bar fetch failed, continuing with no data");
            Vec::new()
        }
    }
}
