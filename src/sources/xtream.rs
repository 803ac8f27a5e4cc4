//! Xtream Codes API source handler
//!
//! Consumes the three read actions of the vendor API (`get_live_streams`,
//! `get_vod_streams`, `get_series`), each a JSON array keyed by query
//! parameters embedding the credential pair. A fourth action
//! (`get_series_info`) is only referenced: series candidates get it as their
//! playable URL so episode resolution can happen downstream, after
//! publication.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::classify::ClassificationEngine;
use crate::config::XtreamSourceConfig;
use crate::errors::{AppResult, SourceError};
use crate::models::{ContentCandidate, ContentKind, PLACEHOLDER_POSTER};
use crate::sources::traits::SourceHandler;
use crate::sources::rating_from_value;
use crate::utils::{RetryingHttpClient, UrlUtils};

/// Handler for one configured Xtream source
pub struct XtreamSourceHandler {
    config: XtreamSourceConfig,
    http: Arc<RetryingHttpClient>,
    engine: Arc<ClassificationEngine>,
}

/// Live-channel record as the vendor emits it
///
/// Every field is optional on the wire; normalization decides what is
/// mandatory. Identifiers arrive as numbers or strings depending on the
/// server build, hence the raw `Value`s.
#[derive(Debug, Deserialize)]
struct XtreamLiveItem {
    name: Option<String>,
    stream_id: Option<Value>,
    stream_icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XtreamVodItem {
    name: Option<String>,
    stream_id: Option<Value>,
    stream_icon: Option<String>,
    rating: Option<Value>,
    container_extension: Option<String>,
    plot: Option<String>,
    genre: Option<String>,
    #[serde(rename = "releaseDate")]
    release_date: Option<String>,
    #[serde(rename = "releasedate")]
    release_date_alt: Option<String>,
    cast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XtreamSeriesItem {
    name: Option<String>,
    // The vendor emits `series_id` or `stream_id` depending on version
    series_id: Option<Value>,
    stream_id: Option<Value>,
    cover: Option<String>,
    stream_icon: Option<String>,
    rating: Option<Value>,
    plot: Option<String>,
    genre: Option<String>,
    #[serde(rename = "releaseDate")]
    release_date: Option<String>,
    #[serde(rename = "releasedate")]
    release_date_alt: Option<String>,
    cast: Option<String>,
}

impl XtreamSourceHandler {
    pub fn new(
        config: XtreamSourceConfig,
        http: Arc<RetryingHttpClient>,
        engine: Arc<ClassificationEngine>,
    ) -> Self {
        Self {
            config,
            http,
            engine,
        }
    }

    fn base_url(&self) -> String {
        UrlUtils::sanitize(&self.config.url)
    }

    /// Build a `player_api.php` URL for one action
    fn api_url(&self, action: &str, extra: &[(&str, &str)]) -> AppResult<String> {
        let mut url = url::Url::parse(&format!("{}/player_api.php", self.base_url()))
            .map_err(|e| crate::errors::AppError::validation(format!(
                "invalid Xtream URL '{}': {e}",
                self.config.url
            )))?;

        url.query_pairs_mut()
            .append_pair("username", &self.config.username)
            .append_pair("password", &self.config.password)
            .append_pair("action", action);
        for (key, value) in extra {
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url.into())
    }

    /// Fetch one action's raw JSON payload
    async fn fetch_payload(&self, action: &str) -> AppResult<Value> {
        let url = self.api_url(action, &[])?;
        debug!(
            "Fetching action '{}' from: {}",
            action,
            UrlUtils::obfuscate_credentials(&url)
        );
        self.http.fetch_json(&url).await
    }

    /// Normalize a `get_live_streams` payload into classified candidates
    pub fn live_candidates(&self, payload: Value) -> AppResult<Vec<ContentCandidate>> {
        let items: Vec<XtreamLiveItem> = parse_action_payload(payload, "get_live_streams")?;
        Ok(items
            .into_iter()
            .filter_map(|item| self.normalize_live(item))
            .collect())
    }

    /// Normalize a `get_vod_streams` payload into classified candidates
    pub fn vod_candidates(&self, payload: Value) -> AppResult<Vec<ContentCandidate>> {
        let items: Vec<XtreamVodItem> = parse_action_payload(payload, "get_vod_streams")?;
        Ok(items
            .into_iter()
            .filter_map(|item| self.normalize_vod(item))
            .collect())
    }

    /// Normalize a `get_series` payload into classified candidates
    pub fn series_candidates(&self, payload: Value) -> AppResult<Vec<ContentCandidate>> {
        let items: Vec<XtreamSeriesItem> = parse_action_payload(payload, "get_series")?;
        Ok(items
            .into_iter()
            .filter_map(|item| self.normalize_series(item))
            .collect())
    }

    fn live_stream_url(&self, stream_id: &str) -> String {
        format!(
            "{}/live/{}/{}/{stream_id}.ts",
            self.base_url(),
            self.config.username,
            self.config.password
        )
    }

    fn vod_stream_url(&self, stream_id: &str, extension: &str) -> String {
        format!(
            "{}/movie/{}/{}/{stream_id}.{extension}",
            self.base_url(),
            self.config.username,
            self.config.password
        )
    }

    fn normalize_live(&self, item: XtreamLiveItem) -> Option<ContentCandidate> {
        let name = non_empty(item.name)?;
        let stream_id = id_string(item.stream_id.as_ref())?;
        let playable_url = self.live_stream_url(&stream_id);

        let verdict = self.engine.classify(&name, None, None, ContentKind::Live);
        if !verdict.included || !self.engine.url_is_streamable(&playable_url, ContentKind::Live) {
            return None;
        }

        Some(ContentCandidate {
            title: name,
            content_id: stream_id,
            category: verdict.category?,
            playable_url,
            poster_url: non_empty(item.stream_icon),
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

    fn normalize_vod(&self, item: XtreamVodItem) -> Option<ContentCandidate> {
        let name = non_empty(item.name)?;
        let stream_id = id_string(item.stream_id.as_ref())?;
        let extension = item.container_extension.unwrap_or_else(|| "mp4".to_string());
        let playable_url = self.vod_stream_url(&stream_id, &extension);
        let release_date = item.release_date.or(item.release_date_alt);

        let verdict = self.engine.classify(
            &name,
            None,
            release_date.as_deref(),
            ContentKind::Vod,
        );
        if !verdict.included || !self.engine.url_is_streamable(&playable_url, ContentKind::Vod) {
            return None;
        }

        Some(ContentCandidate {
            title: name,
            content_id: stream_id,
            category: verdict.category?,
            playable_url,
            poster_url: non_empty(item.stream_icon),
            quality: verdict.quality,
            rating: rating_from_value(item.rating.as_ref()),
            premiere: verdict.premiere,
            plot: item.plot,
            genre: item.genre,
            release_date,
            cast: item.cast,
            source_alias: self.config.alias.clone(),
            source_priority: self.config.priority,
            verified: false,
        })
    }

    fn normalize_series(&self, item: XtreamSeriesItem) -> Option<ContentCandidate> {
        let name = non_empty(item.name)?;
        let series_id =
            id_string(item.series_id.as_ref()).or_else(|| id_string(item.stream_id.as_ref()))?;
        let release_date = item.release_date.or(item.release_date_alt);

        // Not a media URL: episode resolution is deferred to whoever consumes
        // the published catalog.
        let playable_url = self
            .api_url("get_series_info", &[("series_id", series_id.as_str())])
            .ok()?;

        let verdict = self.engine.classify(
            &name,
            None,
            release_date.as_deref(),
            ContentKind::Series,
        );
        if !verdict.included {
            return None;
        }

        let poster = non_empty(item.cover)
            .or_else(|| non_empty(item.stream_icon))
            .unwrap_or_else(|| PLACEHOLDER_POSTER.to_string());

        Some(ContentCandidate {
            title: name,
            content_id: series_id,
            category: verdict.category?,
            playable_url,
            poster_url: Some(poster),
            quality: verdict.quality,
            rating: rating_from_value(item.rating.as_ref()),
            premiere: verdict.premiere,
            plot: item.plot.or_else(|| Some("Sin descripción.".to_string())),
            genre: item.genre.or_else(|| Some("General".to_string())),
            release_date: release_date.or_else(|| Some("N/A".to_string())),
            cast: item.cast.or_else(|| Some("N/A".to_string())),
            source_alias: self.config.alias.clone(),
            source_priority: self.config.priority,
            verified: false,
        })
    }
}

#[async_trait::async_trait]
impl SourceHandler for XtreamSourceHandler {
    fn alias(&self) -> &str {
        &self.config.alias
    }

    async fn ingest(&self) -> AppResult<Vec<ContentCandidate>> {
        let mut candidates = Vec::new();

        // One failing action must not suppress the other two
        let actions: [(&str, fn(&Self, Value) -> AppResult<Vec<ContentCandidate>>); 3] = [
            ("get_live_streams", Self::live_candidates),
            ("get_vod_streams", Self::vod_candidates),
            ("get_series", Self::series_candidates),
        ];

        for (action, normalize) in actions {
            let result = match self.fetch_payload(action).await {
                Ok(payload) => normalize(self, payload),
                Err(e) => Err(e),
            };

            match result {
                Ok(batch) => {
                    info!(
                        "Source '{}': {} candidates from action '{}'",
                        self.config.alias,
                        batch.len(),
                        action
                    );
                    candidates.extend(batch);
                }
                Err(e) => warn!(
                    "Source '{}': action '{}' failed: {}",
                    self.config.alias, action, e
                ),
            }
        }

        Ok(candidates)
    }
}

/// Deserialize an action payload, skipping records that don't fit the shape
///
/// A payload that is not a JSON array is a malformed source response; a
/// record inside the array that fails to deserialize is skipped on its own.
fn parse_action_payload<T: DeserializeOwned>(payload: Value, context: &str) -> AppResult<Vec<T>> {
    let Value::Array(records) = payload else {
        return Err(SourceError::malformed(context, "expected a JSON array").into());
    };

    let total = records.len();
    let items: Vec<T> = records
        .into_iter()
        .filter_map(|record| serde_json::from_value(record).ok())
        .collect();

    if items.len() < total {
        debug!("Skipped {} malformed records", total - items.len());
    }

    Ok(items)
}

/// Identifier from a JSON field that may be a number or a string
fn id_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Treat empty and whitespace-only strings as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Quality};
    use serde_json::json;

    fn handler() -> XtreamSourceHandler {
        XtreamSourceHandler::new(
            XtreamSourceConfig {
                alias: "main".to_string(),
                url: "host:8080".to_string(),
                username: "user".to_string(),
                password: "pass".to_string(),
                priority: 10,
            },
            Arc::new(
                RetryingHttpClient::new(
                    std::time::Duration::from_secs(5),
                    1,
                    std::time::Duration::from_millis(10),
                )
                .unwrap(),
            ),
            Arc::new(ClassificationEngine::with_premiere_years(vec![
                "2024".to_string(),
            ])),
        )
    }

    #[test]
    fn api_url_embeds_credentials_and_action() {
        let url = handler().api_url("get_live_streams", &[]).unwrap();
        assert!(url.starts_with("http://host:8080/player_api.php?"));
        assert!(url.contains("username=user"));
        assert!(url.contains("password=pass"));
        assert!(url.contains("action=get_live_streams"));
    }

    #[test]
    fn live_record_normalizes_with_synthesized_stream_url() {
        let item: XtreamLiveItem =
            serde_json::from_value(json!({"name": "Canal 5 HD", "stream_id": 1})).unwrap();
        let candidate = handler().normalize_live(item).unwrap();

        assert_eq!(candidate.playable_url, "http://host:8080/live/user/pass/1.ts");
        assert_eq!(candidate.content_id, "1");
        assert_eq!(candidate.category, Category::LiveTv);
        assert_eq!(candidate.quality, Quality::Hd);
        assert_eq!(candidate.source_priority, 10);
        assert!(!candidate.verified);
    }

    #[test]
    fn live_record_without_name_is_dropped_silently() {
        let h = handler();
        let missing_name: XtreamLiveItem =
            serde_json::from_value(json!({"stream_id": 1})).unwrap();
        assert!(h.normalize_live(missing_name).is_none());

        let missing_id: XtreamLiveItem =
            serde_json::from_value(json!({"name": "Canal 5"})).unwrap();
        assert!(h.normalize_live(missing_id).is_none());
    }

    #[test]
    fn blocklisted_live_record_is_dropped() {
        let item: XtreamLiveItem =
            serde_json::from_value(json!({"name": "Telecinco España", "stream_id": 2})).unwrap();
        assert!(handler().normalize_live(item).is_none());
    }

    #[test]
    fn vod_record_carries_rating_and_release_date_fallback() {
        let item: XtreamVodItem = serde_json::from_value(json!({
            "name": "Avatar 2024 4K",
            "stream_id": 9,
            "rating": "8.5/10",
            "container_extension": "mkv",
            "releasedate": "2024-03-01"
        }))
        .unwrap();
        let candidate = handler().normalize_vod(item).unwrap();

        assert_eq!(candidate.category, Category::Movie);
        assert_eq!(candidate.quality, Quality::Uhd4k);
        assert_eq!(candidate.rating, 8.5);
        assert_eq!(candidate.release_date.as_deref(), Some("2024-03-01"));
        assert!(candidate.premiere);
        assert_eq!(
            candidate.playable_url,
            "http://host:8080/movie/user/pass/9.mkv"
        );
    }

    #[test]
    fn series_id_falls_back_to_stream_id() {
        let h = handler();

        let with_series_id: XtreamSeriesItem =
            serde_json::from_value(json!({"name": "Breaking Bad", "series_id": 7})).unwrap();
        assert_eq!(h.normalize_series(with_series_id).unwrap().content_id, "7");

        let with_stream_id: XtreamSeriesItem =
            serde_json::from_value(json!({"name": "Breaking Bad", "stream_id": "11"})).unwrap();
        assert_eq!(h.normalize_series(with_stream_id).unwrap().content_id, "11");
    }

    #[test]
    fn series_playable_url_is_the_metadata_endpoint() {
        let item: XtreamSeriesItem =
            serde_json::from_value(json!({"name": "Breaking Bad", "series_id": 7})).unwrap();
        let candidate = handler().normalize_series(item).unwrap();

        assert_eq!(candidate.category, Category::Series);
        assert!(candidate.playable_url.contains("player_api.php"));
        assert!(candidate.playable_url.contains("action=get_series_info"));
        assert!(candidate.playable_url.contains("series_id=7"));
    }

    #[test]
    fn series_premiere_detection_sees_both_release_date_spellings() {
        let h = handler();

        let lowercase_only: XtreamSeriesItem = serde_json::from_value(json!({
            "name": "Some Show", "series_id": 7, "releasedate": "2024-03-01"
        }))
        .unwrap();
        let candidate = h.normalize_series(lowercase_only).unwrap();
        assert_eq!(candidate.release_date.as_deref(), Some("2024-03-01"));
        assert!(candidate.premiere);

        let uppercase: XtreamSeriesItem = serde_json::from_value(json!({
            "name": "Other Show", "series_id": 8, "releaseDate": "2024-05-01"
        }))
        .unwrap();
        assert!(h.normalize_series(uppercase).unwrap().premiere);
    }

    #[test]
    fn series_field_fallbacks_apply_in_order() {
        let h = handler();

        let with_cover: XtreamSeriesItem = serde_json::from_value(json!({
            "name": "Show A", "series_id": 1,
            "cover": "http://img/cover.jpg", "stream_icon": "http://img/icon.jpg"
        }))
        .unwrap();
        assert_eq!(
            h.normalize_series(with_cover).unwrap().poster_url.as_deref(),
            Some("http://img/cover.jpg")
        );

        let icon_only: XtreamSeriesItem = serde_json::from_value(json!({
            "name": "Show B", "series_id": 2, "stream_icon": "http://img/icon.jpg"
        }))
        .unwrap();
        assert_eq!(
            h.normalize_series(icon_only).unwrap().poster_url.as_deref(),
            Some("http://img/icon.jpg")
        );

        let bare: XtreamSeriesItem =
            serde_json::from_value(json!({"name": "Show C", "series_id": 3})).unwrap();
        let candidate = h.normalize_series(bare).unwrap();
        assert_eq!(candidate.poster_url.as_deref(), Some(PLACEHOLDER_POSTER));
        assert_eq!(candidate.release_date.as_deref(), Some("N/A"));
        assert_eq!(candidate.plot.as_deref(), Some("Sin descripción."));
        assert_eq!(candidate.genre.as_deref(), Some("General"));
        assert_eq!(candidate.cast.as_deref(), Some("N/A"));
    }

    #[test]
    fn non_array_payload_is_a_malformed_source() {
        let payload = json!({"user_info": {"auth": 0}});
        let result: AppResult<Vec<XtreamLiveItem>> =
            parse_action_payload(payload, "http://host/player_api.php");
        assert!(result.is_err());
    }

    #[test]
    fn malformed_records_are_skipped_individually() {
        let payload = json!([
            {"name": "Canal 5 HD", "stream_id": 1},
            "not an object",
            {"name": "Azteca 7", "stream_id": 2}
        ]);
        let items: Vec<XtreamLiveItem> =
            parse_action_payload(payload, "http://host/player_api.php").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn id_string_accepts_numbers_and_strings() {
        assert_eq!(id_string(Some(&json!(42))), Some("42".to_string()));
        assert_eq!(id_string(Some(&json!("42"))), Some("42".to_string()));
        assert_eq!(id_string(Some(&json!(""))), None);
        assert_eq!(id_string(Some(&json!(null))), None);
        assert_eq!(id_string(None), None);
    }
}
