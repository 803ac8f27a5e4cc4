//! Liveness verification of candidate streams
//!
//! A lightweight metadata-only probe against each playable URL, admitted
//! through one shared semaphore so in-flight probes never exceed the
//! configured ceiling across all sources. Unreachability is a normal
//! outcome, never an error, and a single failed probe is final: retrying
//! here would double the run's network cost for hosts that are usually just
//! down.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use reqwest::redirect::Policy;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::errors::AppResult;
use crate::models::ContentCandidate;
use crate::utils::UrlUtils;

/// A reachability check against one playable URL
///
/// Production uses [`HttpProbe`]; tests substitute counting doubles.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, url: &str) -> bool;
}

/// HEAD-request probe with a short timeout
///
/// Redirects are not followed: a redirect answer already proves the host is
/// alive, which is all this check is for. 2xx and 3xx count as reachable;
/// any other status, timeout or connection failure counts as down.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn probe(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                status.is_success() || status.is_redirection()
            }
            Err(_) => false,
        }
    }
}

/// Batch verifier with a global concurrency ceiling
///
/// One `Verifier` (and one semaphore) is shared by every source in a run.
pub struct Verifier {
    probe: Arc<dyn LivenessProbe>,
    permits: Arc<Semaphore>,
}

impl Verifier {
    pub fn new(probe: Arc<dyn LivenessProbe>, max_concurrency: usize) -> Self {
        Self {
            probe,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Probe a batch of candidates and keep the reachable ones
    ///
    /// Verdicts are applied in the same index order the probes were
    /// scheduled (`join_all` preserves it), so each verdict maps back to its
    /// candidate no matter how probes complete. Queued probes wait on the
    /// shared semaphore with no priority ordering.
    pub async fn verify_batch(
        &self,
        mut candidates: Vec<ContentCandidate>,
    ) -> Vec<ContentCandidate> {
        if candidates.is_empty() {
            return candidates;
        }

        let probes = candidates.iter().map(|candidate| {
            let probe = Arc::clone(&self.probe);
            let permits = Arc::clone(&self.permits);
            let url = candidate.playable_url.clone();

            async move {
                match permits.acquire().await {
                    Ok(_permit) => probe.probe(&url).await,
                    // Closed semaphore means the run is shutting down
                    Err(_) => false,
                }
            }
        });

        let verdicts = join_all(probes).await;

        let total = candidates.len();
        for (candidate, verified) in candidates.iter_mut().zip(&verdicts) {
            candidate.verified = *verified;
            if !verified {
                debug!(
                    "Dropping unreachable candidate '{}' ({})",
                    candidate.title,
                    UrlUtils::obfuscate_credentials(&candidate.playable_url)
                );
            }
        }

        let reachable: Vec<ContentCandidate> =
            candidates.into_iter().filter(|c| c.verified).collect();
        info!("Verified {} of {} candidates reachable", reachable.len(), total);
        reachable
    }
}
