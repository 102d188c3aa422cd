//! Loading records from files and URLs.

use crate::config::SourceConfig;
use crate::models::{Record, Scalar};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Why a record source could not be loaded.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The request could not be sent or the body could not be read.
    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The content is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level JSON value is not an array.
    #[error("expected a JSON array of records, found {0}")]
    NotAnArray(&'static str),

    /// An array element is not a JSON object.
    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },
}

/// A place records can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    File(PathBuf),
    Url(String),
}

impl RecordSource {
    /// Interpret a location: `http://` and `https://` are URLs, anything
    /// else is a file path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            RecordSource::Url(location.to_string())
        } else {
            RecordSource::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSource::File(path) => write!(f, "{}", path.display()),
            RecordSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Options for loading a record source.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Request timeout for remote sources.
    pub timeout_seconds: u64,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
    /// Whether to show a spinner while downloading.
    pub show_progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            accept_invalid_certs: false,
            show_progress: true,
        }
    }
}

impl From<&SourceConfig> for LoadOptions {
    fn from(config: &SourceConfig) -> Self {
        Self {
            timeout_seconds: config.timeout_seconds,
            accept_invalid_certs: config.accept_invalid_certs,
            ..Self::default()
        }
    }
}

/// Load and parse all records from `source`.
pub async fn load_records(
    source: &RecordSource,
    options: &LoadOptions,
) -> Result<Vec<Record>, SourceError> {
    info!("Loading records from: {}", source);

    let text = match source {
        RecordSource::File(path) => {
            std::fs::read_to_string(path).map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?
        }
        RecordSource::Url(url) => fetch_url(url, options).await?,
    };

    debug!("Read {} bytes", text.len());
    let records = parse_records(&text)?;
    info!("Loaded {} records", records.len());

    Ok(records)
}

/// Download the body of `url` as text.
async fn fetch_url(url: &str, options: &LoadOptions) -> Result<String, SourceError> {
    let http_error = |source: reqwest::Error| SourceError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(options.timeout_seconds))
        .danger_accept_invalid_certs(options.accept_invalid_certs)
        .build()
        .map_err(http_error)?;

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Downloading {}", url));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = async {
        let response = client.get(url).send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(http_error)
    }
    .await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    result
}

/// Parse a JSON array of objects into records, keeping field order.
pub fn parse_records(text: &str) -> Result<Vec<Record>, SourceError> {
    let value: Value = serde_json::from_str(text)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => return Err(SourceError::NotAnArray("an object")),
        Value::String(_) => return Err(SourceError::NotAnArray("a string")),
        Value::Number(_) => return Err(SourceError::NotAnArray("a number")),
        Value::Bool(_) => return Err(SourceError::NotAnArray("a boolean")),
        Value::Null => return Err(SourceError::NotAnArray("null")),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .map(|(name, value)| (name, Scalar::from(value)))
                .collect::<Record>()),
            _ => Err(SourceError::NotAnObject { index }),
        })
        .collect()
}
