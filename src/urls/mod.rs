// src/urls/mod.rs
// =============================================================================
// URL handling that never fails.
//
// Submodules:
// - parse: tolerant splitter into scheme / userinfo / host / port / path /
//   query / fragment
// - canonical: the clean comparison key and the sanitized request URL
// - idn: the optional "internationalized host -> ASCII" capability
//
// Citation URLs come from wikitext written by humans and templates, so
// nothing in here returns an error. Garbage in gives best-effort fields out,
// and the prober turns those into a dead verdict later.
// =============================================================================

mod canonical;
mod idn;
mod parse;

pub use canonical::{clean_url, parse_url, Canonicalizer, UrlParts};
pub use idn::{system_host_encoder, HostEncoder, PassthroughEncoder};
#[cfg(feature = "idn")]
pub use idn::IdnaEncoder;
pub use parse::{parse, ParsedUrl};
