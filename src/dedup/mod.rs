//! Deduplication and prioritization of verified candidates
//!
//! Publication identity is the normalized title: lower-cased, with known
//! quality/region/bracket tokens stripped, then reduced to alphanumerics.
//! An explicit normalization function compared by equality keeps the result
//! independent of hash seeds and map iteration order.
//!
//! Ranking among duplicates is quality-first, then configured source
//! priority, then first-seen. First-seen is the documented deterministic
//! fallback: the incumbent stays unless a strictly better variant arrives.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::models::ContentCandidate;

/// Known quality/region/bracket tokens carried inside display titles
fn strip_tokens() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(4k|uhd|2160p?|fhd|1080p?|720p?|hd|sd|hevc|x265|h\.?265|vip|mx|latino|24/7)\b",
        )
        .unwrap()
    })
}

/// Title identity key for deduplication
///
/// Two candidates whose normalized titles are equal are duplicates,
/// regardless of casing, punctuation or source.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = strip_tokens().replace_all(&lowered, " ");
    stripped.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Whether `challenger` should replace the `incumbent` duplicate
fn outranks(challenger: &ContentCandidate, incumbent: &ContentCandidate) -> bool {
    if challenger.quality != incumbent.quality {
        return challenger.quality > incumbent.quality;
    }
    challenger.source_priority > incumbent.source_priority
}

/// Collapse one category's candidates to the best variant per title
///
/// Output is sorted by title for reproducibility. Idempotent: running it on
/// its own output changes nothing.
pub fn dedup_category(candidates: Vec<ContentCandidate>) -> Vec<ContentCandidate> {
    let mut kept: Vec<ContentCandidate> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let key = normalize_title(&candidate.title);
        match by_key.get(&key) {
            Some(&slot) => {
                if outranks(&candidate, &kept[slot]) {
                    debug!(
                        "Duplicate '{}': '{}' ({}) replaces '{}' ({})",
                        key,
                        candidate.title,
                        candidate.source_alias,
                        kept[slot].title,
                        kept[slot].source_alias
                    );
                    kept[slot] = candidate;
                }
            }
            None => {
                by_key.insert(key, kept.len());
                kept.push(candidate);
            }
        }
    }

    kept.sort_by(|a, b| a.title.cmp(&b.title));
    kept
}
