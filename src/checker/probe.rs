// src/checker/probe.rs
// =============================================================================
// DeadlinkChecker: the public entry point.
//
// Holds the configuration, the canonicalizer (with its host encoder chosen
// once at construction) and the HTTP clients. It is cheap to clone: clones
// share one Arc'd inner state, which is what lets batch probes run on
// spawned tasks.
//
// Data flow for one URL:
//   raw text -> sanitize -> url::Url -> scheme dispatch (http/https/ftp)
//            -> ProbeOutcome -> LinkVerdict
// =============================================================================

use super::batch::{self, BatchResult};
use super::ftp;
use super::http::HttpProber;
use super::verdict::{LinkVerdict, ProbeOutcome};
use crate::config::CheckerConfig;
use crate::error::{ConfigError, ProbeError};
use crate::urls::{self, Canonicalizer, HostEncoder, UrlParts};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

#[derive(Clone)]
pub struct DeadlinkChecker {
    inner: Arc<Inner>,
}

struct Inner {
    config: CheckerConfig,
    canonicalizer: Canonicalizer,
    http: HttpProber,
}

impl DeadlinkChecker {
    /// Build a checker using the best host encoder this build offers.
    pub fn new(config: CheckerConfig) -> Result<Self, ConfigError> {
        Self::with_canonicalizer(config, Canonicalizer::default())
    }

    /// Build a checker with an explicit host encoder (e.g. to force the
    /// degraded no-IDN mode).
    pub fn with_host_encoder(
        config: CheckerConfig,
        encoder: Arc<dyn HostEncoder>,
    ) -> Result<Self, ConfigError> {
        Self::with_canonicalizer(config, Canonicalizer::new(encoder))
    }

    fn with_canonicalizer(
        config: CheckerConfig,
        canonicalizer: Canonicalizer,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = HttpProber::new(&config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                canonicalizer,
                http,
            }),
        })
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.inner.config
    }

    pub fn parse_url(&self, url: &str) -> UrlParts {
        urls::parse_url(url)
    }

    pub fn clean_url(&self, url: &str) -> String {
        urls::clean_url(url)
    }

    pub fn sanitize_url(&self, url: &str) -> String {
        self.inner.canonicalizer.sanitize(url)
    }

    pub async fn is_link_dead(&self, url: &str) -> bool {
        self.check_link(url).await.dead
    }

    /// Probe one URL and return the verdict together with its evidence.
    pub async fn check_link(&self, url: &str) -> LinkVerdict {
        let sanitized = self.sanitize_url(url);

        let outcome = match Url::parse(&sanitized) {
            Ok(target) => self.dispatch(&target).await,
            Err(e) => ProbeOutcome::failed(ProbeError::InvalidUrl(format!("{sanitized}: {e}"))),
        };

        let verdict = LinkVerdict::from_outcome(outcome);
        debug!(url, dead = verdict.dead, outcome = %verdict.outcome, "probe finished");
        verdict
    }

    /// Probe every URL concurrently (bounded by `max_concurrency`).
    /// The result has one entry per input, in input order.
    pub async fn are_links_dead<S: AsRef<str>>(&self, urls: &[S]) -> BatchResult {
        let urls: Vec<String> = urls.iter().map(|u| u.as_ref().to_string()).collect();
        let limit = self.inner.config.max_concurrency;
        info!(count = urls.len(), limit, "checking links");

        let checker = self.clone();
        let result = batch::check_all(urls, limit, move |url| {
            let checker = checker.clone();
            async move { checker.check_link(&url).await }
        })
        .await;

        info!(
            count = result.len(),
            dead = result.dead_count(),
            "finished checking links"
        );
        result
    }

    async fn dispatch(&self, target: &Url) -> ProbeOutcome {
        match target.scheme() {
            "http" | "https" => self.inner.http.probe(target).await,
            "ftp" => ftp::probe(target, &self.inner.config).await,
            other => ProbeOutcome::failed(ProbeError::UnsupportedScheme(other.to_string())),
        }
    }
}
