//! Construction of source handlers from configuration
//!
//! The one place that decides which concrete handlers exist for a run. A
//! run with zero usable sources is a configuration error, raised here
//! before any network activity.

use std::sync::Arc;

use tracing::warn;

use crate::classify::ClassificationEngine;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::sources::playlist::PlaylistSourceHandler;
use crate::sources::traits::SourceHandler;
use crate::sources::xtream::XtreamSourceHandler;
use crate::utils::RetryingHttpClient;

/// Build one handler per usable configured source
///
/// Xtream sources with blank credentials are skipped with a warning; a
/// misconfigured source should not take the rest of the run down. Zero
/// usable sources overall is fatal.
pub fn build_handlers(
    config: &Config,
    http: Arc<RetryingHttpClient>,
    engine: Arc<ClassificationEngine>,
) -> AppResult<Vec<Box<dyn SourceHandler>>> {
    let mut handlers: Vec<Box<dyn SourceHandler>> = Vec::new();

    for source in &config.sources.xtream {
        if source.username.trim().is_empty() || source.password.trim().is_empty() {
            warn!(
                "Skipping Xtream source '{}': credentials are blank",
                source.alias
            );
            continue;
        }
        handlers.push(Box::new(XtreamSourceHandler::new(
            source.clone(),
            Arc::clone(&http),
            Arc::clone(&engine),
        )));
    }

    for source in &config.sources.playlist {
        handlers.push(Box::new(PlaylistSourceHandler::new(
            source.clone(),
            Arc::clone(&http),
            Arc::clone(&engine),
        )));
    }

    if handlers.is_empty() {
        return Err(AppError::configuration(
            "no usable sources configured: define at least one Xtream source \
             with credentials or one playlist source",
        ));
    }

    Ok(handlers)
}
