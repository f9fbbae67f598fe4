// src/checker/classify.rs
// =============================================================================
// Status code policy: which answers mean "dead".
//
// | status                          | class        | dead?             |
// |---------------------------------|--------------|-------------------|
// | 2xx                             | Success      | no                |
// | 304                             | NotModified  | no                |
// | other 3xx (not followed)        | Redirect     | yes               |
// | 401 402 403 407 429 451         | Restricted   | no                |
// | 404 410 and every other 4xx     | Missing      | yes               |
// | 5xx                             | ServerError  | no, after retries |
// | anything else                   | Unexpected   | yes               |
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    NotModified,
    /// A 3xx the client handed back instead of following (no Location).
    Redirect,
    /// The resource exists but we were not let in.
    Restricted,
    Missing,
    /// Possibly transient; retried before the verdict is final.
    ServerError,
    Unexpected,
}

impl StatusClass {
    pub fn is_dead(self) -> bool {
        matches!(
            self,
            StatusClass::Redirect | StatusClass::Missing | StatusClass::Unexpected
        )
    }

    pub fn is_transient(self) -> bool {
        self == StatusClass::ServerError
    }

    /// No point re-asking with a heavier request.
    pub fn is_conclusive(self) -> bool {
        matches!(
            self,
            StatusClass::Success | StatusClass::NotModified | StatusClass::Restricted
        )
    }
}

pub fn classify_status(code: u16) -> StatusClass {
    match code {
        200..=299 => StatusClass::Success,
        304 => StatusClass::NotModified,
        300..=399 => StatusClass::Redirect,
        401 | 402 | 403 | 407 | 429 | 451 => StatusClass::Restricted,
        400..=499 => StatusClass::Missing,
        500..=599 => StatusClass::ServerError,
        _ => StatusClass::Unexpected,
    }
}

/// FTP analog: 2xx completion is alive, 530 (login refused) is access control.
pub fn classify_ftp_reply(code: u16) -> StatusClass {
    match code {
        200..=299 => StatusClass::Success,
        530 => StatusClass::Restricted,
        // 4xx replies are the server's "try again later"
        400..=499 => StatusClass::ServerError,
        _ => StatusClass::Missing,
    }
}
