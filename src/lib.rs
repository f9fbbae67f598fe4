// src/lib.rs
// =============================================================================
// Library root for deadlink-checker.
//
// Two pieces live here:
// - urls: turns raw (possibly malformed or internationalized) URL text into
//   a parsed form, a "clean" comparison key and a "sanitized" request URL
// - checker: probes URLs over HTTP(S)/FTP and decides whether they are dead,
//   one at a time or as a bounded-concurrency batch
//
// Everything callers need is re-exported from this file.
// =============================================================================

pub mod checker;
pub mod config;
pub mod error;
pub mod logging;
pub mod urls;

pub use checker::{BatchEntry, BatchResult, DeadlinkChecker, LinkVerdict, ProbeOutcome};
pub use config::{CheckerConfig, ProbeMethod};
pub use error::{ConfigError, ProbeError};
pub use urls::{clean_url, parse_url, Canonicalizer, HostEncoder, ParsedUrl, UrlParts};
