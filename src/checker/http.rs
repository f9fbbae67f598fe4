// src/checker/http.rs
// =============================================================================
// Probes http:// and https:// URLs.
//
// Key functionality:
// - Sends a HEAD request first (no body download) and falls back to GET
//   when HEAD is rejected or inconclusive
// - Follows redirects up to the configured limit (reqwest's redirect policy)
// - Retries 5xx answers with exponential backoff before settling
// - Retries a TLS failure once with certificate checks disabled
// - Flags deep links that were redirected to the site's front page
//
// Every failure is turned into a ProbeOutcome; nothing here returns Err
// once the client is built.
// =============================================================================

use super::classify::classify_status;
use super::verdict::ProbeOutcome;
use crate::config::{CheckerConfig, ProbeMethod};
use crate::error::{ConfigError, ProbeError};
use reqwest::{Client, Method};
use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub(crate) struct HttpProber {
    client: Client,
    // Same settings, certificate verification off. Only built when
    // tls_fallback is enabled.
    lenient: Option<Client>,
    config: CheckerConfig,
}

impl HttpProber {
    pub(crate) fn new(config: &CheckerConfig) -> Result<Self, ConfigError> {
        let client = build_client(config, false)?;
        let lenient = if config.tls_fallback {
            Some(build_client(config, true)?)
        } else {
            None
        };

        Ok(Self {
            client,
            lenient,
            config: config.clone(),
        })
    }

    pub(crate) async fn probe(&self, url: &Url) -> ProbeOutcome {
        let first = match self.config.method {
            ProbeMethod::Head => Method::HEAD,
            ProbeMethod::Get => Method::GET,
        };

        let mut outcome = self.request_with_retry(first.clone(), url).await;

        if first == Method::HEAD && needs_full_request(&outcome) {
            debug!(%url, %outcome, "HEAD inconclusive, retrying with GET");
            outcome = self.request_with_retry(Method::GET, url).await;
        }

        if self.config.flag_redirect_to_root {
            outcome = detect_root_redirect(url, outcome);
        }
        outcome
    }

    async fn request_with_retry(&self, method: Method, url: &Url) -> ProbeOutcome {
        let mut attempt = 0u32;
        loop {
            let outcome = self.request(method.clone(), url).await;

            let transient = matches!(
                &outcome,
                ProbeOutcome::Status { code, .. } if classify_status(*code).is_transient()
            );
            if !transient || attempt >= self.config.server_error_retries {
                return outcome;
            }

            let delay = self.config.retry_backoff(attempt);
            warn!(%url, %method, %outcome, ?delay, "server error, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn request(&self, method: Method, url: &Url) -> ProbeOutcome {
        let timeout = if method == Method::HEAD {
            self.config.head_timeout()
        } else {
            self.config.full_timeout()
        };

        with_tls_fallback(url, &self.client, self.lenient.as_ref(), |client| {
            let method = method.clone();
            async move { send(&client, method, url, timeout).await }
        })
        .await
    }
}

// Runs `attempt` on the strict client; a TLS failure is tried once more on
// the lenient one when there is one.
async fn with_tls_fallback<F, Fut>(
    url: &Url,
    strict: &Client,
    lenient: Option<&Client>,
    attempt: F,
) -> ProbeOutcome
where
    F: Fn(Client) -> Fut,
    Fut: Future<Output = Result<ProbeOutcome, ProbeError>>,
{
    match attempt(strict.clone()).await {
        Ok(outcome) => outcome,
        Err(ProbeError::Tls(detail)) => match lenient {
            Some(lenient) => {
                warn!(%url, %detail, "TLS failure, retrying without certificate verification");
                attempt(lenient.clone())
                    .await
                    .unwrap_or_else(ProbeOutcome::failed)
            }
            None => ProbeOutcome::failed(ProbeError::Tls(detail)),
        },
        Err(error) => ProbeOutcome::failed(error),
    }
}

fn build_client(config: &CheckerConfig, accept_invalid_certs: bool) -> Result<Client, ConfigError> {
    let client = Client::builder()
        .connect_timeout(config.connect_timeout())
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .user_agent(config.user_agent.as_str())
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()?;
    Ok(client)
}

async fn send(
    client: &Client,
    method: Method,
    url: &Url,
    timeout: Duration,
) -> Result<ProbeOutcome, ProbeError> {
    let response = client
        .request(method, url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| categorize_error(&e))?;

    // The body is never read: dropping the response closes the stream.
    Ok(analyze_response(url, &response))
}

fn analyze_response(requested: &Url, response: &reqwest::Response) -> ProbeOutcome {
    let final_url = response.url();
    let moved = strip_fragment(final_url) != strip_fragment(requested);

    ProbeOutcome::Status {
        code: response.status().as_u16(),
        final_url: moved.then(|| final_url.to_string()),
    }
}

// HEAD verdicts that get re-checked with GET: any non-conclusive status
// (405, 404, 5xx ...) and failures other than DNS/TLS/redirect loops.
fn needs_full_request(outcome: &ProbeOutcome) -> bool {
    match outcome {
        ProbeOutcome::Status { code, .. } => !classify_status(*code).is_conclusive(),
        ProbeOutcome::Failed { error } => matches!(
            error,
            ProbeError::Timeout | ProbeError::Connect(_) | ProbeError::Protocol(_) | ProbeError::Other(_)
        ),
        _ => false,
    }
}

fn detect_root_redirect(requested: &Url, outcome: ProbeOutcome) -> ProbeOutcome {
    match outcome {
        ProbeOutcome::Status {
            code,
            final_url: Some(final_url),
        } if !classify_status(code).is_dead()
            && !is_site_root(requested)
            && lands_on_root(&final_url) =>
        {
            ProbeOutcome::RedirectedToRoot { code, final_url }
        }
        other => other,
    }
}

fn lands_on_root(final_url: &str) -> bool {
    Url::parse(final_url).map_or(false, |landed| is_site_root(&landed))
}

fn is_site_root(url: &Url) -> bool {
    matches!(url.path(), "" | "/") && url.query().map_or(true, str::is_empty)
}

fn strip_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

// Categorizes reqwest errors into probe failure classes.
//
// reqwest only exposes a few predicates (is_timeout, is_connect, ...), so
// DNS and TLS failures are recognized from the source chain. The top-level
// message is left out of the match because it embeds the request URL.
fn categorize_error(error: &reqwest::Error) -> ProbeError {
    let detail = error_chain(error);

    if error.is_timeout() {
        ProbeError::Timeout
    } else if error.is_redirect() {
        ProbeError::TooManyRedirects
    } else if error.is_connect() {
        let causes = source_chain(error).to_lowercase();
        if is_dns_failure(&causes) {
            ProbeError::Dns(detail)
        } else if is_tls_failure(&causes) {
            ProbeError::Tls(detail)
        } else {
            ProbeError::Connect(detail)
        }
    } else if error.is_request() || error.is_body() || error.is_decode() {
        ProbeError::Protocol(detail)
    } else {
        ProbeError::Other(detail)
    }
}

fn is_dns_failure(causes: &str) -> bool {
    causes.contains("dns error")
        || causes.contains("failed to lookup address")
        || causes.contains("name or service not known")
        || causes.contains("no such host")
}

fn is_tls_failure(causes: &str) -> bool {
    causes.contains("certificate")
        || causes.contains("handshake")
        || causes.contains("tls")
        || causes.contains("ssl")
}

fn error_chain(error: &reqwest::Error) -> String {
    let mut detail = error.to_string();
    let causes = source_chain(error);
    if !causes.is_empty() {
        detail.push_str(": ");
        detail.push_str(&causes);
    }
    detail
}

// Messages of the underlying causes only, without duplicates.
fn source_chain(error: &reqwest::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|seen| seen.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> CheckerConfig {
        CheckerConfig {
            head_timeout_secs: 2.0,
            full_timeout_secs: 2.0,
            connect_timeout_secs: 2.0,
            retry_backoff_ms: 1,
            ..CheckerConfig::default()
        }
    }

    fn url(server: &mockito::Server, path: &str) -> Url {
        Url::parse(&format!("{}{}", server.url(), path)).unwrap()
    }

    #[tokio::test]
    async fn head_success_is_alive_without_get() {
        let mut server = mockito::Server::new_async().await;
        let head = server.mock("HEAD", "/page").with_status(200).create_async().await;
        let get = server
            .mock("GET", "/page")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let prober = HttpProber::new(&test_config()).unwrap();
        let outcome = prober.probe(&url(&server, "/page")).await;

        assert!(!outcome.is_dead());
        head.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_is_dead_after_get_confirms() {
        let mut server = mockito::Server::new_async().await;
        server.mock("HEAD", "/nothing").with_status(404).create_async().await;
        let get = server
            .mock("GET", "/nothing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let prober = HttpProber::new(&test_config()).unwrap();
        let outcome = prober.probe(&url(&server, "/nothing")).await;

        assert_eq!(
            outcome,
            ProbeOutcome::Status {
                code: 404,
                final_url: None
            }
        );
        assert!(outcome.is_dead());
        get.assert_async().await;
    }

    #[tokio::test]
    async fn head_rejected_falls_back_to_get() {
        let mut server = mockito::Server::new_async().await;
        server.mock("HEAD", "/no-head").with_status(405).create_async().await;
        server.mock("GET", "/no-head").with_status(200).create_async().await;

        let prober = HttpProber::new(&test_config()).unwrap();
        let outcome = prober.probe(&url(&server, "/no-head")).await;

        assert!(!outcome.is_dead());
    }

    #[tokio::test]
    async fn forbidden_is_alive() {
        let mut server = mockito::Server::new_async().await;
        server.mock("HEAD", "/private").with_status(403).create_async().await;

        let prober = HttpProber::new(&test_config()).unwrap();
        let outcome = prober.probe(&url(&server, "/private")).await;

        assert!(!outcome.is_dead());
    }

    #[tokio::test]
    async fn server_error_is_retried_then_not_dead() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/flaky")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let prober = HttpProber::new(&test_config()).unwrap();
        let outcome = prober.probe(&url(&server, "/flaky")).await;

        assert!(!outcome.is_dead());
        head.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn redirect_chain_is_followed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/old")
            .with_status(301)
            .with_header("location", "/new")
            .create_async()
            .await;
        server.mock("HEAD", "/new").with_status(200).create_async().await;

        let prober = HttpProber::new(&test_config()).unwrap();
        let outcome = prober.probe(&url(&server, "/old")).await;

        match outcome {
            ProbeOutcome::Status {
                code: 200,
                final_url: Some(final_url),
            } => assert!(final_url.ends_with("/new")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn too_many_redirects_is_dead() {
        let mut server = mockito::Server::new_async().await;
        for hop in 1..=4 {
            server
                .mock("HEAD", format!("/hop{hop}").as_str())
                .with_status(302)
                .with_header("location", &format!("/hop{}", hop + 1))
                .create_async()
                .await;
        }
        server.mock("HEAD", "/hop5").with_status(200).create_async().await;

        let config = CheckerConfig {
            max_redirects: 2,
            ..test_config()
        };
        let prober = HttpProber::new(&config).unwrap();
        let outcome = prober.probe(&url(&server, "/hop1")).await;

        assert_eq!(
            outcome,
            ProbeOutcome::Failed {
                error: ProbeError::TooManyRedirects
            }
        );
    }

    #[tokio::test]
    async fn deep_link_redirected_to_front_page_is_dead() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/article/123")
            .with_status(301)
            .with_header("location", "/")
            .create_async()
            .await;
        server.mock("HEAD", "/").with_status(200).create_async().await;

        let prober = HttpProber::new(&test_config()).unwrap();
        let outcome = prober.probe(&url(&server, "/article/123")).await;

        assert!(matches!(outcome, ProbeOutcome::RedirectedToRoot { code: 200, .. }));
        assert!(outcome.is_dead());

        let lenient = CheckerConfig {
            flag_redirect_to_root: false,
            ..test_config()
        };
        let prober = HttpProber::new(&lenient).unwrap();
        assert!(!prober.probe(&url(&server, "/article/123")).await.is_dead());
    }

    #[tokio::test]
    async fn connection_refused_is_dead() {
        // Grab a free port, then close it so nothing is listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = HttpProber::new(&test_config()).unwrap();
        let target = Url::parse(&format!("http://{addr}/")).unwrap();
        let outcome = prober.probe(&target).await;

        assert!(matches!(outcome, ProbeOutcome::Failed { .. }));
        assert!(outcome.is_dead());
    }

    #[tokio::test]
    async fn silent_server_times_out_as_dead() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = CheckerConfig {
            head_timeout_secs: 0.2,
            full_timeout_secs: 0.2,
            ..test_config()
        };
        let prober = HttpProber::new(&config).unwrap();
        let target = Url::parse(&format!("http://{addr}/slow")).unwrap();
        let outcome = prober.probe(&target).await;

        assert_eq!(
            outcome,
            ProbeOutcome::Failed {
                error: ProbeError::Timeout
            }
        );
    }

    #[test]
    fn site_root_detection() {
        assert!(is_site_root(&Url::parse("https://example.org").unwrap()));
        assert!(is_site_root(&Url::parse("https://example.org/#about").unwrap()));
        assert!(!is_site_root(&Url::parse("https://example.org/?p=1").unwrap()));
        assert!(!is_site_root(&Url::parse("https://example.org/a").unwrap()));
    }

    #[test]
    fn dns_failure_skips_get_fallback() {
        let outcome = ProbeOutcome::failed(ProbeError::Dns("nope".to_string()));
        assert!(!needs_full_request(&outcome));
        let outcome = ProbeOutcome::failed(ProbeError::Timeout);
        assert!(needs_full_request(&outcome));
    }

    #[tokio::test]
    async fn refused_connection_stays_connect_whatever_the_path() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = HttpProber::new(&test_config()).unwrap();
        for path in ["/about", "/certificates/2019", "/ssl-tls-handshake"] {
            let target = Url::parse(&format!("http://{addr}{path}")).unwrap();
            let outcome = prober.request(Method::HEAD, &target).await;
            assert!(
                matches!(
                    outcome,
                    ProbeOutcome::Failed {
                        error: ProbeError::Connect(_)
                    }
                ),
                "{path}: {outcome:?}"
            );
        }
    }

    fn certificate_error() -> ProbeError {
        ProbeError::Tls("invalid peer certificate: UnknownIssuer".to_string())
    }

    #[tokio::test]
    async fn certificate_failure_is_retried_on_lenient_client() {
        let strict = Client::new();
        let lenient = Client::new();
        let target = Url::parse("https://self-signed.example/page").unwrap();
        let calls = AtomicUsize::new(0);

        let outcome = with_tls_fallback(&target, &strict, Some(&lenient), |_client| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(certificate_error())
                } else {
                    Ok(ProbeOutcome::Status {
                        code: 200,
                        final_url: None,
                    })
                }
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!outcome.is_dead());
    }

    #[tokio::test]
    async fn certificate_failure_without_fallback_is_dead() {
        let config = CheckerConfig {
            tls_fallback: false,
            ..test_config()
        };
        let prober = HttpProber::new(&config).unwrap();
        assert!(prober.lenient.is_none());

        let target = Url::parse("https://self-signed.example/page").unwrap();
        let calls = AtomicUsize::new(0);
        let outcome = with_tls_fallback(&target, &prober.client, prober.lenient.as_ref(), |_client| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(certificate_error()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome, ProbeOutcome::failed(certificate_error()));
        assert!(outcome.is_dead());
    }

    #[tokio::test]
    async fn other_failures_skip_lenient_client() {
        let strict = Client::new();
        let lenient = Client::new();
        let target = Url::parse("https://example.org/").unwrap();
        let calls = AtomicUsize::new(0);

        let outcome = with_tls_fallback(&target, &strict, Some(&lenient), |_client| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProbeError::Connect("connection reset".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(outcome.is_dead());
    }
}
