//! Error types
//!
//! [`MediaError`] covers the fallible setup paths (loading configuration,
//! compiling selectors and patterns). Per-element failures never surface as
//! errors: an unresolved element simply gets no control, and a bad payload is
//! reported as a [`PayloadError`], logged and skipped.

use feedsave_dom::SelectorError;
use std::path::PathBuf;

/// Setup and configuration errors
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid {field} selector: {source}")]
    Selector {
        field: &'static str,
        source: SelectorError,
    },

    #[error("invalid video extension {0:?}")]
    VideoExtension(String),

    #[error("failed to build video pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

/// A JSON-bearing script could not yield a usable URL
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("malformed percent-escape at byte {0}")]
    MalformedEscape(usize),

    #[error("decoded URL is not valid UTF-8")]
    InvalidUtf8,

    #[error("not an absolute URL: {0}")]
    NotAbsolute(String),

    #[error("payload is not valid JSON: {0}")]
    Json(String),
}
