//! Source handler trait definitions
//!
//! The single seam between the orchestrator and concrete source types. Test
//! doubles implement this trait to drive the pipeline without any network.

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::ContentCandidate;

/// A configured catalog source that can be ingested
///
/// `ingest` performs the full fetch → normalize → classify sequence for one
/// source and returns candidates that passed classification and the
/// stream-URL compatibility gate, not yet verified. Individual malformed
/// records are skipped silently; only a whole-source failure surfaces as an
/// error, and the orchestrator isolates that to this source.
#[async_trait]
pub trait SourceHandler: Send + Sync {
    /// Provenance label from the source definition
    fn alias(&self) -> &str;

    /// Fetch and normalize this source's listing into classified candidates
    async fn ingest(&self) -> AppResult<Vec<ContentCandidate>>;
}
