// src/checker/verdict.rs
// =============================================================================
// What a probe found, and whether that makes the link dead.
//
// A LinkVerdict is the boolean callers act on plus the outcome that produced
// it, so reports can say *why* a link was judged dead.
// =============================================================================

use super::classify::{classify_ftp_reply, classify_status};
use crate::error::ProbeError;
use serde::Serialize;
use std::fmt;

/// The observable result of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The HTTP exchange finished with this status. `final_url` is set when
    /// redirects moved us somewhere else.
    Status {
        code: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        final_url: Option<String>,
    },
    /// A deep link whose redirect chain ended on the site's front page.
    RedirectedToRoot { code: u16, final_url: String },
    /// Last meaningful FTP reply code.
    FtpReply { code: u16 },
    /// Nothing usable came back.
    Failed { error: ProbeError },
}

impl ProbeOutcome {
    pub fn is_dead(&self) -> bool {
        match self {
            ProbeOutcome::Status { code, .. } => classify_status(*code).is_dead(),
            ProbeOutcome::RedirectedToRoot { .. } => true,
            ProbeOutcome::FtpReply { code } => classify_ftp_reply(*code).is_dead(),
            ProbeOutcome::Failed { .. } => true,
        }
    }

    pub(crate) fn failed(error: ProbeError) -> Self {
        ProbeOutcome::Failed { error }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Status {
                code,
                final_url: Some(final_url),
            } => write!(f, "HTTP {} -> {}", code, final_url),
            ProbeOutcome::Status { code, .. } => write!(f, "HTTP {}", code),
            ProbeOutcome::RedirectedToRoot { final_url, .. } => {
                write!(f, "redirected to site root {}", final_url)
            }
            ProbeOutcome::FtpReply { code } => write!(f, "FTP {}", code),
            ProbeOutcome::Failed { error } => write!(f, "{}", error),
        }
    }
}

/// Dead-or-alive plus the evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkVerdict {
    pub dead: bool,
    pub outcome: ProbeOutcome,
}

impl LinkVerdict {
    pub fn from_outcome(outcome: ProbeOutcome) -> Self {
        Self {
            dead: outcome.is_dead(),
            outcome,
        }
    }
}
