// src/urls/parse.rs
// =============================================================================
// Splits raw URL text into its parts without validating anything.
//
// Accepted shapes:
//   scheme://[userinfo@]host[:port][/path][?query][#fragment]
//   //host/path...            (protocol-relative, scheme is None)
//   host/path...              (bare, scheme is None)
//   mailto:someone@example    (opaque, host is empty)
//
// The host keeps its original spelling (Unicode and casing included) and the
// path keeps its original encoding. Transformations belong to canonical.rs.
// =============================================================================

/// The pieces of a URL, exactly as they appeared in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: Option<String>,
    pub userinfo: Option<String>,
    pub host: String,
    /// Port digits, only kept when they are all ASCII digits.
    pub port: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl ParsedUrl {
    /// True for opaque URLs like `mailto:` that have a scheme but no authority.
    pub fn is_opaque(&self) -> bool {
        self.scheme.is_some() && self.host.is_empty()
    }
}

/// Parse raw URL text. Never fails; malformed input yields partial fields.
pub fn parse(raw: &str) -> ParsedUrl {
    let input = raw.trim();
    let (scheme, rest, has_authority) = split_scheme(input);

    let (authority, remainder) = if has_authority {
        let end = rest
            .find(|c| matches!(c, '/' | '?' | '#'))
            .unwrap_or(rest.len());
        rest.split_at(end)
    } else {
        ("", rest)
    };

    let (userinfo, host_port) = match authority.rfind('@') {
        Some(at) => (Some(authority[..at].to_string()), &authority[at + 1..]),
        None => (None, authority),
    };
    let (host, port) = split_port(host_port);

    let (before_fragment, fragment) = match remainder.split_once('#') {
        Some((before, fragment)) => (before, Some(fragment.to_string())),
        None => (remainder, None),
    };
    let (path, query) = match before_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (before_fragment, None),
    };

    ParsedUrl {
        scheme,
        userinfo,
        host: host.to_string(),
        port: port.map(str::to_string),
        path: path.to_string(),
        query,
        fragment,
    }
}

// Returns (scheme, rest-after-scheme, whether rest starts with an authority).
fn split_scheme(input: &str) -> (Option<String>, &str, bool) {
    if let Some(rest) = input.strip_prefix("//") {
        return (None, rest, true);
    }

    if let Some(idx) = input.find("://") {
        let candidate = &input[..idx];
        if is_scheme(candidate) {
            return (Some(candidate.to_string()), &input[idx + 3..], true);
        }
    }

    // `mailto:x`, `news:y` ... but not `example.com:8080/path`
    if let Some((candidate, rest)) = input.split_once(':') {
        if is_scheme(candidate) && !looks_like_port(rest) {
            return (Some(candidate.to_string()), rest, false);
        }
    }

    (None, input, true)
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn looks_like_port(rest: &str) -> bool {
    let end = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn split_port(host_port: &str) -> (&str, Option<&str>) {
    // IPv6 literal: [::1]:8080
    if host_port.starts_with('[') {
        if let Some(close) = host_port.find(']') {
            let host = &host_port[..=close];
            let port = host_port[close + 1..]
                .strip_prefix(':')
                .filter(|p| is_port(p));
            return (host, port);
        }
    }

    match host_port.rfind(':') {
        Some(colon) if is_port(&host_port[colon + 1..]) => {
            (&host_port[..colon], Some(&host_port[colon + 1..]))
        }
        // "example.com:" has an empty port; drop the colon
        Some(colon) if colon + 1 == host_port.len() => (&host_port[..colon], None),
        _ => (host_port, None),
    }
}

fn is_port(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.bytes().all(|b| b.is_ascii_digit())
}
