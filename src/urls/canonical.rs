// src/urls/canonical.rs
// =============================================================================
// Two outputs derived from one parse:
//
// - clean_url: a comparison key. No scheme, no leading "www.", no fragment,
//   no trailing slash, lowercase host, query kept verbatim. Two citations of
//   the same page produce the same key. Never sent over the network.
//
// - Canonicalizer::sanitize: a fetchable URL. Scheme filled in (https for
//   protocol-relative input), Unicode host converted to xn-- form when the
//   host encoder can, non-ASCII path bytes percent-encoded. Query and
//   fragment are left alone.
// =============================================================================

use super::idn::{system_host_encoder, HostEncoder};
use super::parse::{parse, ParsedUrl};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Scheme given to protocol-relative and bare URLs.
const DEFAULT_SCHEME: &str = "https";

/// Bytes escaped in paths on top of non-ASCII (which is always escaped).
/// `%` is deliberately absent so existing escapes survive untouched.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>');

/// The three fields link-maintenance callers read, in their original form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlParts {
    pub scheme: Option<String>,
    pub host: String,
    pub path: String,
}

/// Raw parse exposed to callers. Host and path are NOT sanitized; use
/// [`Canonicalizer::sanitize`] for the ASCII form.
pub fn parse_url(raw: &str) -> UrlParts {
    let ParsedUrl {
        scheme, host, path, ..
    } = parse(raw);
    UrlParts { scheme, host, path }
}

/// Comparison key for deduplication.
pub fn clean_url(raw: &str) -> String {
    let parsed = parse(raw);

    let host = parsed.host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let mut key = String::with_capacity(raw.len());
    key.push_str(host);
    if let Some(port) = &parsed.port {
        key.push(':');
        key.push_str(port);
    }
    key.push_str(parsed.path.trim_end_matches('/'));
    if let Some(query) = &parsed.query {
        key.push('?');
        key.push_str(query);
    }
    key
}

/// Builds sanitized request URLs using an injected host encoder.
#[derive(Clone)]
pub struct Canonicalizer {
    encoder: Arc<dyn HostEncoder>,
}

impl Canonicalizer {
    pub fn new(encoder: Arc<dyn HostEncoder>) -> Self {
        Self { encoder }
    }

    pub fn sanitize(&self, raw: &str) -> String {
        let parsed = parse(raw);
        let scheme = parsed.scheme.as_deref().unwrap_or(DEFAULT_SCHEME);

        let mut out = String::with_capacity(raw.len() + 16);
        out.push_str(scheme);
        out.push(':');

        if parsed.is_opaque() {
            out.push_str(&encode_path(&parsed.path));
        } else {
            out.push_str("//");
            if let Some(userinfo) = &parsed.userinfo {
                out.push_str(userinfo);
                out.push('@');
            }
            out.push_str(&self.ascii_host(&parsed.host));
            if let Some(port) = &parsed.port {
                out.push(':');
                out.push_str(port);
            }
            if parsed.path.is_empty() {
                out.push('/');
            } else {
                out.push_str(&encode_path(&parsed.path));
            }
        }

        if let Some(query) = &parsed.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &parsed.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }

    fn ascii_host(&self, host: &str) -> String {
        if host.is_ascii() {
            return host.to_string();
        }
        self.encoder
            .to_ascii(host)
            .unwrap_or_else(|| host.to_string())
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(system_host_encoder())
    }
}

impl fmt::Debug for Canonicalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canonicalizer").finish_non_exhaustive()
    }
}

fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ENCODE_SET).to_string()
}
