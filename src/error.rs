//! User-facing error taxonomy.
//!
//! None of these are fatal: callers log them and, for user-triggered actions,
//! surface them through a [`crate::export::Notifier`] alert.

use thiserror::Error;

/// The remote record query failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("record request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("record source answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed record payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no credential for the record source: {0}")]
    Credential(String),
}

/// A single asset could not be loaded. Other assets of the same batch are unaffected.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("failed to load asset {path} for record {record_id}: {reason}")]
pub struct AssetLoadError {
    pub record_id: String,
    pub path: String,
    pub reason: String,
}

impl AssetLoadError {
    pub fn new(record_id: impl Into<String>, path: impl Into<String>, err: &anyhow::Error) -> Self {
        Self {
            record_id: record_id.into(),
            path: path.into(),
            // alternate formatting keeps the whole context chain on one line
            reason: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClipboardError {
    #[error("clipboard is not available: {0}")]
    Unavailable(String),

    #[error("writing to the clipboard failed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share app key is missing, set the {0} environment variable")]
    MissingAppKey(String),

    #[error("share payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("share hand-off failed: {0}")]
    Launch(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("writing the screenshot failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
