// src/error.rs
// =============================================================================
// Typed errors for the library.
//
// - ConfigError: building a checker went wrong (bad settings, unreadable
//   config file, HTTP client could not be constructed). These are returned
//   to the caller as Result::Err.
// - ProbeError: a transport-level failure while probing one URL. These never
//   reach the caller as errors: they are folded into a dead verdict.
// =============================================================================

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while constructing a checker or loading its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Network-level failure classes for a single probe.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", content = "detail", rename_all = "snake_case")]
pub enum ProbeError {
    /// Host name could not be resolved.
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// TCP connection refused, reset or unreachable.
    #[error("connection failed: {0}")]
    Connect(String),

    /// TLS handshake or certificate verification failed.
    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("request timed out")]
    Timeout,

    #[error("too many redirects")]
    TooManyRedirects,

    /// The peer spoke, but not in a way we understood.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),

    /// Even the sanitized form could not be turned into a request URL.
    #[error("unusable URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Other(String),
}
