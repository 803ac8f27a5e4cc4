//! Plaintext playlist source handler
//!
//! Parses line-oriented `#EXTINF` playlists: a directive line carrying an
//! optional logo attribute, an optional group label and a free-text title,
//! followed by a line holding the resource URL. Entries without a usable
//! title or URL are dropped silently; the catalog is built from whatever
//! parses.

use std::sync::Arc;

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::classify::ClassificationEngine;
use crate::config::PlaylistSourceConfig;
use crate::errors::AppResult;
use crate::models::{ContentCandidate, ContentKind};
use crate::sources::synthesize_content_id;
use crate::sources::traits::SourceHandler;
use crate::utils::{RetryingHttpClient, UrlUtils};

/// Handler for one configured playlist source
pub struct PlaylistSourceHandler {
    config: PlaylistSourceConfig,
    http: Arc<RetryingHttpClient>,
    engine: Arc<ClassificationEngine>,
}

/// One parsed playlist entry, before classification
#[derive(Debug, PartialEq)]
struct PlaylistEntry {
    title: String,
    group: Option<String>,
    logo: Option<String>,
    url: String,
}

impl PlaylistSourceHandler {
    pub fn new(
        config: PlaylistSourceConfig,
        http: Arc<RetryingHttpClient>,
        engine: Arc<ClassificationEngine>,
    ) -> Self {
        Self {
            config,
            http,
            engine,
        }
    }

    fn normalize(&self, entry: PlaylistEntry) -> Option<ContentCandidate> {
        let verdict = self.engine.classify(
            &entry.title,
            entry.group.as_deref(),
            None,
            ContentKind::Live,
        );
        if !verdict.included
            || !self.engine.url_is_streamable(&entry.url, ContentKind::Live)
        {
            return None;
        }

        Some(ContentCandidate {
            content_id: synthesize_content_id(&entry.url),
            title: entry.title,
            category: verdict.category?,
            playable_url: entry.url,
            poster_url: entry.logo,
            quality: verdict.quality,
            rating: 0.0,
            premiere: verdict.premiere,
            plot: None,
            genre: None,
            release_date: None,
            cast: None,
            source_alias: self.config.alias.clone(),
            source_priority: self.config.priority,
            verified: false,
        })
    }
}

#[async_trait::async_trait]
impl SourceHandler for PlaylistSourceHandler {
    fn alias(&self) -> &str {
        &self.config.alias
    }

    async fn ingest(&self) -> AppResult<Vec<ContentCandidate>> {
        debug!(
            "Fetching playlist from: {}",
            UrlUtils::obfuscate_credentials(&self.config.url)
        );
        let content = self.http.fetch_text(&self.config.url).await?;

        let entries = parse_playlist(&content);
        let total = entries.len();
        let candidates: Vec<ContentCandidate> = entries
            .into_iter()
            .filter_map(|entry| self.normalize(entry))
            .collect();

        info!(
            "Source '{}': {} of {} playlist entries passed classification",
            self.config.alias,
            candidates.len(),
            total
        );
        Ok(candidates)
    }
}

/// Parse playlist text into entries
///
/// Directive lines other than `#EXTINF` are ignored. A URL line without a
/// preceding `#EXTINF` has no name and is dropped; an `#EXTINF` without a
/// following URL line is likewise dropped.
fn parse_playlist(content: &str) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();
    let mut pending: Option<(String, Option<String>, Option<String>)> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(extinf) = line.strip_prefix("#EXTINF") {
            pending = parse_extinf(extinf);
        } else if line.starts_with('#') {
            continue;
        } else if let Some((title, group, logo)) = pending.take() {
            entries.push(PlaylistEntry {
                title,
                group,
                logo,
                url: line.to_string(),
            });
        } else {
            debug!("Skipping URL without a preceding #EXTINF: {}", line);
        }
    }

    entries
}

/// Extract (title, group, logo) from the remainder of an `#EXTINF` line
fn parse_extinf(extinf: &str) -> Option<(String, Option<String>, Option<String>)> {
    static ATTR_RE: OnceLock<Regex> = OnceLock::new();
    let attr_re =
        ATTR_RE.get_or_init(|| Regex::new(r#"([A-Za-z0-9-]+)="([^"]*)""#).unwrap());

    // Title is everything after the last comma; attributes precede it
    let comma = extinf.rfind(',')?;
    let (attrs_part, title_part) = extinf.split_at(comma);
    let title = title_part.trim_start_matches(',').trim();
    if title.is_empty() {
        return None;
    }

    let mut group = None;
    let mut logo = None;
    for capture in attr_re.captures_iter(attrs_part) {
        let value = capture[2].trim();
        if value.is_empty() {
            continue;
        }
        match capture[1].to_ascii_lowercase().as_str() {
            "group-title" => group = Some(value.to_string()),
            "tvg-logo" => logo = Some(value.to_string()),
            _ => {}
        }
    }

    Some((title.to_string(), group, logo))
}
