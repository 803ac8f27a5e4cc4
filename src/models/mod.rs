//! Core data models for the catalog pipeline
//!
//! `ContentCandidate` is the common record every source normalizes into; the
//! `Catalog` is the frozen, deduplicated output handed to the sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Poster used when a source provides no artwork in any fallback field
pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/300x450?text=No+Poster";

/// Content buckets of the published catalog
///
/// `Premiere` is additive: a candidate flagged as a recent release appears
/// both under its primary category and under `Premiere`. `Ord` drives the
/// deterministic ordering of catalog output.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    LiveTv,
    Sports,
    Music,
    Kids,
    Docs,
    Movie,
    Series,
    Premiere,
}

/// Quality tier derived from naming heuristics, never from actual bitrate
///
/// Ordering is the dedup ranking: a higher tier always beats a lower one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum Quality {
    #[serde(rename = "SD")]
    #[strum(serialize = "SD")]
    Sd,
    #[serde(rename = "HD")]
    #[strum(serialize = "HD")]
    Hd,
    #[serde(rename = "FHD")]
    #[strum(serialize = "FHD")]
    Fhd,
    #[serde(rename = "4K")]
    #[strum(serialize = "4K")]
    Uhd4k,
}

/// The kind of raw record a candidate was normalized from
///
/// Decides how the classifier assigns a category: VOD and series records
/// carry theirs, live and playlist records go through the rule ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Live,
    Vod,
    Series,
}

/// A normalized content record flowing through the pipeline
///
/// Created by a source handler, classified immediately after creation,
/// verified, and finally published or dropped by the deduplicator. Never
/// mutated after verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCandidate {
    /// Display name; may still carry embedded quality/region tokens
    pub title: String,
    /// Source-scoped identifier; synthesized from the playable URL when the
    /// source provides none. Never used as publication identity.
    pub content_id: String,
    pub category: Category,
    /// URL used for verification and publication. For series this is the
    /// per-series metadata endpoint, not a media URL.
    pub playable_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    pub quality: Quality,
    /// Normalized rating in [0, 10]; 0.0 when the source value was unusable
    pub rating: f64,
    /// Recent-release flag; additive to the primary category
    pub premiere: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<String>,
    pub source_alias: String,
    /// Dedup tie-break weight copied from the source definition
    #[serde(skip)]
    pub source_priority: u32,
    pub verified: bool,
}

/// Metadata block attached to every generated catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetadata {
    pub generated_at: DateTime<Utc>,
    /// Aliases of the sources that contributed to this run
    pub sources: Vec<String>,
}

/// The published catalog: one ordered list per category plus metadata
///
/// Built by the orchestrator, frozen once deduplication finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: CatalogMetadata,
    pub categories: BTreeMap<Category, Vec<ContentCandidate>>,
}

impl Catalog {
    pub fn new(sources: Vec<String>) -> Self {
        Self {
            metadata: CatalogMetadata {
                generated_at: Utc::now(),
                sources,
            },
            categories: BTreeMap::new(),
        }
    }

    /// Published entries for one category; empty when nothing survived
    pub fn category(&self, category: Category) -> &[ContentCandidate] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of published entries across all categories
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
