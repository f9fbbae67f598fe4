// src/checker/mod.rs
// =============================================================================
// This module contains all link liveness logic.
//
// Submodules:
// - probe: DeadlinkChecker, the public entry point and scheme dispatch
// - http: HEAD/GET probing with redirects, retries and TLS fallback
// - ftp: control-channel probing for ftp:// links
// - classify: the status-code-to-verdict policy table
// - verdict: LinkVerdict / ProbeOutcome
// - batch: bounded-concurrency fan-out that keeps input order
// =============================================================================

mod batch;
mod classify;
mod ftp;
mod http;
mod probe;
mod verdict;

pub use batch::{BatchEntry, BatchResult};
pub use classify::{classify_ftp_reply, classify_status, StatusClass};
pub use probe::DeadlinkChecker;
pub use verdict::{LinkVerdict, ProbeOutcome};
