//! Source handlers: fetching and normalizing external catalog listings
//!
//! Each handler turns one upstream listing (vendor JSON API or plaintext
//! playlist) into classified `ContentCandidate`s. Shared normalization
//! helpers live here; the handlers themselves are behind the
//! [`traits::SourceHandler`] seam so the orchestrator and tests never depend
//! on a concrete source type.

use sha2::{Digest, Sha256};

pub mod factory;
pub mod playlist;
pub mod traits;
pub mod xtream;

pub use factory::build_handlers;
pub use traits::SourceHandler;

/// Normalize a heterogeneous upstream rating into `[0, 10]`
///
/// Strips a trailing `/10` divisor, drops every non-digit/non-dot character,
/// parses the remainder as a decimal and clamps to 10.0. Anything unparsable
/// ("N/A", empty, garbage) maps to 0.0.
pub fn clean_rating(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let without_divisor = trimmed.strip_suffix("/10").unwrap_or(trimmed);

    let digits: String = without_divisor
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    digits.parse::<f64>().map(|r| r.min(10.0)).unwrap_or(0.0)
}

/// Rating from a JSON field that may be a string, a number, or absent
pub fn rating_from_value(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0).clamp(0.0, 10.0),
        Some(serde_json::Value::String(s)) => clean_rating(s),
        _ => 0.0,
    }
}

/// Stable content id synthesized from a playable URL
///
/// Used when the source provides no identifier of its own. An explicit hash
/// keeps ids reproducible across runs; nothing downstream relies on them for
/// identity.
pub fn synthesize_content_id(playable_url: &str) -> String {
    let digest = Sha256::digest(playable_url.as_bytes());
    hex::encode(digest)[..16].to_string()
}
