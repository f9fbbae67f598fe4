// src/checker/batch.rs
// =============================================================================
// Fans a list of URLs out to the prober and collects one verdict per input.
//
// How it works:
// 1. Every URL gets its own tokio task, spawned immediately
// 2. A task must hold a semaphore permit while it probes; the permit is an
//    owned guard, so it is released however the task ends (verdict, panic)
// 3. join_all waits for every task, and results are zipped back onto the
//    input list, so output order == input order no matter who finished first
//
// Duplicated inputs are probed independently and each gets its own entry.
// =============================================================================

use super::verdict::{LinkVerdict, ProbeOutcome};
use crate::error::ProbeError;
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

/// One input URL and its verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub url: String,
    #[serde(flatten)]
    pub verdict: LinkVerdict,
}

/// Verdicts in input order, one entry per input (duplicates included).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BatchResult {
    entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter()
    }

    /// Verdict for `url`; the first occurrence wins if it was listed twice.
    pub fn get(&self, url: &str) -> Option<&LinkVerdict> {
        self.entries
            .iter()
            .find(|entry| entry.url == url)
            .map(|entry| &entry.verdict)
    }

    pub fn is_dead(&self, url: &str) -> Option<bool> {
        self.get(url).map(|verdict| verdict.dead)
    }

    /// The bare dead/alive flags, in input order.
    pub fn dead_flags(&self) -> Vec<bool> {
        self.entries.iter().map(|entry| entry.verdict.dead).collect()
    }

    pub fn dead_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.verdict.dead).count()
    }

    pub fn into_entries(self) -> Vec<BatchEntry> {
        self.entries
    }
}

impl IntoIterator for BatchResult {
    type Item = BatchEntry;
    type IntoIter = std::vec::IntoIter<BatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Run `probe` for every URL with at most `limit` probes in flight.
pub(crate) async fn check_all<F, Fut>(urls: Vec<String>, limit: usize, probe: F) -> BatchResult
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = LinkVerdict> + Send + 'static,
{
    let entries = run_bounded(urls, limit, probe)
        .await
        .into_iter()
        .map(|(url, joined)| {
            let verdict = joined.unwrap_or_else(|e| {
                tracing::error!(%url, error = %e, "probe task failed");
                LinkVerdict::from_outcome(ProbeOutcome::failed(ProbeError::Other(format!(
                    "probe task failed: {e}"
                ))))
            });
            BatchEntry { url, verdict }
        })
        .collect();

    BatchResult { entries }
}

// Generic over the task; check_all plugs the prober in.
pub(crate) async fn run_bounded<T, F, Fut>(
    inputs: Vec<String>,
    limit: usize,
    task: F,
) -> Vec<(String, Result<T, JoinError>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));

    let handles: Vec<_> = inputs
        .iter()
        .map(|input| {
            let semaphore = Arc::clone(&semaphore);
            let work = task(input.clone());
            tokio::spawn(async move {
                // The semaphore is never closed, so this only waits.
                let _permit = semaphore.acquire_owned().await.ok();
                work.await
            })
        })
        .collect();

    let results = join_all(handles).await;
    inputs.into_iter().zip(results).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn alive() -> LinkVerdict {
        LinkVerdict::from_outcome(ProbeOutcome::Status {
            code: 200,
            final_url: None,
        })
    }

    fn dead() -> LinkVerdict {
        LinkVerdict::from_outcome(ProbeOutcome::Status {
            code: 404,
            final_url: None,
        })
    }

    #[tokio::test]
    async fn never_exceeds_the_ceiling() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let inputs: Vec<String> = (0..12).map(|i| format!("job-{i}")).collect();

        let results = run_bounded(inputs.clone(), 3, |input| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                input
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(results.len(), 12);
        for (input, output) in results {
            assert_eq!(input, output.unwrap());
        }
    }

    #[tokio::test]
    async fn order_follows_input_not_completion() {
        let urls: Vec<String> = vec!["slow".into(), "fast".into(), "medium".into()];
        let result = check_all(urls, 3, |url| async move {
            let delay = match url.as_str() {
                "slow" => 40,
                "medium" => 20,
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if url == "fast" {
                dead()
            } else {
                alive()
            }
        })
        .await;

        let order: Vec<&str> = result.iter().map(|entry| entry.url.as_str()).collect();
        assert_eq!(order, ["slow", "fast", "medium"]);
        assert_eq!(result.dead_flags(), [false, true, false]);
        assert_eq!(result.dead_count(), 1);
    }

    #[tokio::test]
    async fn duplicates_each_get_an_entry() {
        let urls: Vec<String> = vec!["a".into(), "b".into(), "a".into()];
        let result = check_all(urls, 2, |_| async { alive() }).await;

        assert_eq!(result.len(), 3);
        assert_eq!(result.is_dead("a"), Some(false));
        assert_eq!(result.is_dead("missing"), None);
    }

    #[tokio::test]
    async fn panicking_probe_is_dead_and_frees_its_slot() {
        let urls: Vec<String> = vec!["boom".into(), "ok-1".into(), "ok-2".into()];
        let result = check_all(urls, 1, |url| async move {
            if url == "boom" {
                panic!("probe blew up");
            }
            alive()
        })
        .await;

        assert_eq!(result.dead_flags(), [true, false, false]);
        assert!(matches!(
            result.get("boom").unwrap().outcome,
            ProbeOutcome::Failed {
                error: ProbeError::Other(_)
            }
        ));
    }

    #[tokio::test]
    async fn empty_batch() {
        let result = check_all(Vec::new(), 4, |_| async { alive() }).await;
        assert!(result.is_empty());
    }
}
