//! Pipeline orchestration
//!
//! Drives every configured source concurrently through its fetch →
//! normalize → classify → verify sequence, then merges the results in a
//! single-threaded reduction and deduplicates each category exactly once.
//! Tasks return owned candidate vectors instead of appending to shared
//! buckets, so no lock guards the accumulation.
//!
//! A source's total failure is logged and isolated; the run proceeds with
//! whatever the other sources produced.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::classify::ClassificationEngine;
use crate::config::Config;
use crate::dedup::dedup_category;
use crate::errors::AppResult;
use crate::models::{Catalog, Category, ContentCandidate};
use crate::sources::{SourceHandler, build_handlers};
use crate::utils::RetryingHttpClient;
use crate::verify::{HttpProbe, Verifier};

/// One catalog run: sources, shared verifier, nothing else
pub struct Pipeline {
    handlers: Vec<Box<dyn SourceHandler>>,
    verifier: Verifier,
}

impl Pipeline {
    /// Assemble a pipeline from pre-built handlers and verifier (tests
    /// inject doubles here)
    pub fn new(handlers: Vec<Box<dyn SourceHandler>>, verifier: Verifier) -> Self {
        Self { handlers, verifier }
    }

    /// Assemble the production pipeline from configuration
    ///
    /// Fails fast with a configuration error when no usable source is
    /// defined; nothing has touched the network at that point.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let http = Arc::new(RetryingHttpClient::new(
            config.pipeline.fetch_timeout,
            config.pipeline.max_retries,
            config.pipeline.retry_backoff,
        )?);
        let engine = Arc::new(ClassificationEngine::new());
        let handlers = build_handlers(config, http, engine)?;

        let probe = Arc::new(HttpProbe::new(config.pipeline.probe_timeout)?);
        let verifier = Verifier::new(probe, config.pipeline.probe_concurrency);

        Ok(Self::new(handlers, verifier))
    }

    /// Run the full pipeline and return the frozen catalog
    pub async fn run(self) -> Catalog {
        let aliases: Vec<String> = self.handlers.iter().map(|h| h.alias().to_string()).collect();
        info!("Starting catalog run with {} sources", self.handlers.len());

        // Sources run concurrently; the verifier's semaphore bounds probe
        // concurrency globally, not per source.
        let per_source = join_all(self.handlers.iter().map(|handler| {
            let verifier = &self.verifier;
            async move {
                match handler.ingest().await {
                    Ok(candidates) => {
                        info!(
                            "Source '{}' produced {} candidates",
                            handler.alias(),
                            candidates.len()
                        );
                        verifier.verify_batch(candidates).await
                    }
                    Err(e) => {
                        warn!("Source '{}' failed, continuing without it: {}", handler.alias(), e);
                        Vec::new()
                    }
                }
            }
        }))
        .await;

        // Single-threaded reduction into per-category buckets; dedup runs
        // once per category, never interleaved with verification.
        let mut buckets: BTreeMap<Category, Vec<ContentCandidate>> = BTreeMap::new();
        for candidate in per_source.into_iter().flatten() {
            if candidate.premiere {
                buckets
                    .entry(Category::Premiere)
                    .or_default()
                    .push(candidate.clone());
            }
            buckets.entry(candidate.category).or_default().push(candidate);
        }

        let mut catalog = Catalog::new(aliases);
        catalog.categories = buckets
            .into_iter()
            .map(|(category, items)| (category, dedup_category(items)))
            .collect();

        info!(
            "Catalog run finished: {} published entries in {} categories",
            catalog.len(),
            catalog.categories.len()
        );
        catalog
    }
}
