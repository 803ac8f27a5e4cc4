//! Rule-based classification of normalized candidates
//!
//! One ordered table of `(matcher, category)` pairs evaluated by a single
//! first-match function decides category membership; quality and premiere
//! detection run independently. The ladder order is deliberate: children's
//! content is checked before sports, sports before music, and the general
//! regional-relevance test comes last, so a name matching both a sports term
//! and a regional term always lands in SPORTS.
//!
//! The catalog is opt-in: a title matching no rung and no exclusion rule is
//! excluded.

use chrono::{Datelike, Utc};
use regex::Regex;
use tracing::trace;

use crate::models::{Category, ContentKind, Quality};

/// Verdict for one candidate title
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub included: bool,
    pub category: Option<Category>,
    pub quality: Quality,
    pub premiere: bool,
}

impl Classification {
    fn excluded() -> Self {
        Self {
            included: false,
            category: None,
            quality: Quality::Sd,
            premiere: false,
        }
    }
}

/// Compiled classification rules
///
/// Compile once per run; `classify` is a pure function of its arguments.
pub struct ClassificationEngine {
    /// Adult/camcorder-rip/trailer markers; always exclude
    content_markers: Regex,
    /// Full out-of-scope region blocklist
    region_blocklist: Regex,
    /// Narrower region set consulted for sports candidates only
    sports_region_blocklist: Regex,
    /// Ordered category ladder, first match wins
    ladder: Vec<(Regex, Category)>,
    /// Descending-priority quality tokens
    quality_rules: Vec<(Regex, Quality)>,
    /// Year tokens that mark a candidate as a premiere
    premiere_years: Vec<String>,
    /// Playable URLs that can never be streamed, regardless of name
    incompatible_urls: Vec<Regex>,
}

impl ClassificationEngine {
    /// Engine with premiere years derived from the current date
    pub fn new() -> Self {
        let year = Utc::now().year();
        Self::with_premiere_years(vec![year.to_string(), (year - 1).to_string()])
    }

    /// Engine with explicit premiere year tokens (tests pin these)
    pub fn with_premiere_years(premiere_years: Vec<String>) -> Self {
        let rule = |pattern: &str| {
            Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in rule '{pattern}': {e}"))
        };

        Self {
            content_markers: rule(
                r"(?i)\b(xxx|adult[os]?|porn\w*|erotic\w*|onlyfans|cam(rip)?|hdcam|ts[ .-]?screener|screener|trailer)\b",
            ),
            region_blocklist: rule(
                r"(?i)\b(espa[ñn]a|spain|portugal|francia|france|italia|italy|alemania|germany|deutschland|turquia|turkey|arabic|india)\b|^(es|uk|fr|de|it|pt|tr|ar)\s*[:|]",
            ),
            sports_region_blocklist: rule(r"(?i)\b(espa[ñn]a|spain)\b|^es\s*[:|]"),
            ladder: vec![
                (
                    rule(r"(?i)\b(kids|infantil(es)?|ni[ñn]os|disney|cartoon\w*|nick(elodeon)?|junior|baby|boomerang)\b"),
                    Category::Kids,
                ),
                (
                    rule(r"(?i)\b(sports?|deportes?|espn|fox sports|tudn|afizzionados|nfl|nba|mlb|ufc|wwe|f[uú]tbol|futbol|soccer|golf|tenis|box(eo)?|f1|formula)\b"),
                    Category::Sports,
                ),
                (
                    rule(r"(?i)\b(music|m[uú]sica|mtv|vh1|vevo|radio|hits|conciertos?|banda|exa)\b"),
                    Category::Music,
                ),
                (
                    rule(r"(?i)\b(docu(mental(es)?)?|discovery|history|nat ?geo\w*|animal planet|a&e|investigaci[oó]n|ciencia)\b"),
                    Category::Docs,
                ),
                (
                    rule(r"(?i)\b(m[eé]xico|mx|latino[s]?|azteca|televisa|univisi[oó]n|telemundo|unicable|milenio|foro ?tv|canal|imagen|multimedios|estrellas)\b"),
                    Category::LiveTv,
                ),
            ],
            quality_rules: vec![
                (rule(r"(?i)\b(4k|uhd|2160p?)\b"), Quality::Uhd4k),
                (rule(r"(?i)\b(fhd|1080p?|hevc|x265|h\.?265)\b"), Quality::Fhd),
                (rule(r"(?i)\b(hd|720p?)\b"), Quality::Hd),
            ],
            premiere_years,
            incompatible_urls: vec![
                rule(r"(?i)(youtube\.com|youtu\.be|dailymotion\.com|vimeo\.com)"),
                rule(r"(?i)\.(html?|aspx)(\?.*)?$"),
            ],
        }
    }

    /// Classify one candidate title
    ///
    /// Pure function of its arguments: identical inputs always yield the same
    /// verdict. `group` is the free-text group label playlist sources carry;
    /// `release_date` feeds premiere detection only.
    pub fn classify(
        &self,
        title: &str,
        group: Option<&str>,
        release_date: Option<&str>,
        kind: ContentKind,
    ) -> Classification {
        let title = title.trim();
        if title.is_empty() {
            return Classification::excluded();
        }

        // Group labels participate in rule matching alongside the title
        let haystack = match group {
            Some(g) if !g.trim().is_empty() => format!("{title} {g}"),
            _ => title.to_string(),
        };

        if self.content_markers.is_match(&haystack) {
            trace!("Excluded by content marker: {}", title);
            return Classification::excluded();
        }

        let category = match kind {
            ContentKind::Vod => Some(Category::Movie),
            ContentKind::Series => Some(Category::Series),
            ContentKind::Live => first_match(&self.ladder, &haystack),
        };

        let Some(category) = category else {
            trace!("No rung matched, excluding: {}", title);
            return Classification::excluded();
        };

        // Sports legitimately originates from a broader set of regions, so it
        // is held to the narrower blocklist; everything else gets the full one.
        let region_blocked = if category == Category::Sports {
            self.sports_region_blocklist.is_match(&haystack)
        } else {
            self.region_blocklist.is_match(&haystack)
        };
        if region_blocked {
            trace!("Excluded by region blocklist: {}", title);
            return Classification::excluded();
        }

        Classification {
            included: true,
            category: Some(category),
            quality: self.detect_quality(&haystack),
            premiere: self.is_premiere(title, release_date),
        }
    }

    /// Quality from descending-priority name tokens; SD when nothing matches
    pub fn detect_quality(&self, text: &str) -> Quality {
        self.quality_rules
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|&(_, quality)| quality)
            .unwrap_or(Quality::Sd)
    }

    /// Premiere when the title or release-date metadata carries a recent year
    pub fn is_premiere(&self, title: &str, release_date: Option<&str>) -> bool {
        self.premiere_years.iter().any(|year| {
            title.contains(year) || release_date.is_some_and(|date| date.contains(year))
        })
    }

    /// Stream-URL compatibility gate, run before verification is scheduled
    ///
    /// A name can pass every content rule while the resource behind it is
    /// structurally unusable. Series URLs are exempt: they point at the
    /// metadata endpoint by design.
    pub fn url_is_streamable(&self, url: &str, kind: ContentKind) -> bool {
        if kind == ContentKind::Series {
            return true;
        }
        !self.incompatible_urls.iter().any(|re| re.is_match(url))
    }
}

impl Default for ClassificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// First matching entry of an ordered rule table; later rules never run
fn first_match(ladder: &[(Regex, Category)], haystack: &str) -> Option<Category> {
    ladder
        .iter()
        .find(|(re, _)| re.is_match(haystack))
        .map(|&(_, category)| category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn engine() -> ClassificationEngine {
        ClassificationEngine::with_premiere_years(vec!["2024".to_string(), "2023".to_string()])
    }

    #[rstest]
    #[case("Canal 5 HD", Category::LiveTv)]
    #[case("Disney Kids MX", Category::Kids)]
    #[case("ESPN Deportes", Category::Sports)]
    #[case("MTV Hits", Category::Music)]
    #[case("Discovery Channel México", Category::Docs)]
    fn ladder_assigns_expected_category(#[case] title: &str, #[case] expected: Category) {
        let verdict = engine().classify(title, None, None, ContentKind::Live);
        assert!(verdict.included, "{title} should be included");
        assert_eq!(verdict.category, Some(expected), "{title}");
    }

    #[test]
    fn kids_outranks_general_regional_terms() {
        // Matches both the kids rung and the regional rung; kids is first
        let verdict = engine().classify("Canal Disney México", None, None, ContentKind::Live);
        assert_eq!(verdict.category, Some(Category::Kids));
    }

    #[test]
    fn sports_outranks_general_regional_terms() {
        let verdict = engine().classify("Canal Fox Sports MX", None, None, ContentKind::Live);
        assert_eq!(verdict.category, Some(Category::Sports));
    }

    #[test]
    fn classification_is_deterministic() {
        let e = engine();
        let a = e.classify("Azteca 7 FHD", Some("Mexico"), None, ContentKind::Live);
        let b = e.classify("Azteca 7 FHD", Some("Mexico"), None, ContentKind::Live);
        assert_eq!(a, b);
    }

    #[rstest]
    #[case("Telecinco España")]
    #[case("ES: La Sexta")]
    #[case("RAI Italia")]
    #[case("Canal XXX Nights")]
    #[case("Avengers CAMRip")]
    #[case("Dune Trailer")]
    fn blocklisted_titles_are_excluded(#[case] title: &str) {
        let verdict = engine().classify(title, None, None, ContentKind::Live);
        assert!(!verdict.included, "{title} should be excluded");
        assert_eq!(verdict.category, None);
    }

    #[test]
    fn sports_uses_the_narrow_region_set() {
        let e = engine();
        // Italian sports feed: blocked region for general content, fine for sports
        let sports = e.classify("Futbol Italia Serie A", None, None, ContentKind::Live);
        assert_eq!(sports.category, Some(Category::Sports));
        assert!(sports.included);

        // Spanish sports feed stays out even under the narrow set
        let blocked = e.classify("Futbol España LaLiga", None, None, ContentKind::Live);
        assert!(!blocked.included);
    }

    #[test]
    fn unmatched_titles_are_excluded_by_default() {
        let verdict = engine().classify("Some Random Feed", None, None, ContentKind::Live);
        assert!(!verdict.included);
    }

    #[test]
    fn empty_titles_never_reach_the_rules() {
        let e = engine();
        assert!(!e.classify("", None, None, ContentKind::Live).included);
        assert!(!e.classify("   ", None, None, ContentKind::Vod).included);
    }

    #[test]
    fn group_label_participates_in_matching() {
        let verdict = engine().classify(
            "Channel 123",
            Some("Deportes Latino"),
            None,
            ContentKind::Live,
        );
        assert_eq!(verdict.category, Some(Category::Sports));
    }

    #[test]
    fn vod_and_series_keep_their_kind_category() {
        let e = engine();
        let movie = e.classify("Avatar 2024 4K", None, None, ContentKind::Vod);
        assert_eq!(movie.category, Some(Category::Movie));

        let series = e.classify("Breaking Bad", None, None, ContentKind::Series);
        assert_eq!(series.category, Some(Category::Series));
    }

    #[test]
    fn vod_still_honors_the_hard_exclusions() {
        let verdict = engine().classify("Pelicula España 1080p", None, None, ContentKind::Vod);
        assert!(!verdict.included);
    }

    #[rstest]
    #[case("Canal 5 4K", Quality::Uhd4k)]
    #[case("Canal 5 UHD", Quality::Uhd4k)]
    #[case("Cine 2160p", Quality::Uhd4k)]
    #[case("Canal 5 FHD", Quality::Fhd)]
    #[case("Cine 1080p HEVC", Quality::Fhd)]
    #[case("Canal 5 HD", Quality::Hd)]
    #[case("Cine 720p", Quality::Hd)]
    #[case("Canal 5", Quality::Sd)]
    fn quality_tokens_rank_in_descending_priority(#[case] title: &str, #[case] expected: Quality) {
        assert_eq!(engine().detect_quality(title), expected, "{title}");
    }

    #[test]
    fn premiere_from_title_or_release_date() {
        let e = engine();
        assert!(e.is_premiere("Avatar 2024", None));
        assert!(e.is_premiere("Avatar", Some("2024-03-01")));
        assert!(!e.is_premiere("Avatar", Some("2019-03-01")));
        assert!(!e.is_premiere("Avatar", None));
    }

    #[test]
    fn premiere_is_additive_to_the_primary_category() {
        let verdict = engine().classify("Avatar 2024 4K", None, None, ContentKind::Vod);
        assert!(verdict.included);
        assert_eq!(verdict.category, Some(Category::Movie));
        assert!(verdict.premiere);
    }

    #[rstest]
    #[case("https://youtube.com/watch?v=abc", false)]
    #[case("https://youtu.be/abc", false)]
    #[case("http://host/page.html", false)]
    #[case("http://host/page.htm?id=1", false)]
    #[case("http://host/live/u/p/1.ts", true)]
    #[case("http://host/movie/u/p/9.mkv", true)]
    fn url_gate_rejects_unstreamable_resources(#[case] url: &str, #[case] ok: bool) {
        assert_eq!(engine().url_is_streamable(url, ContentKind::Live), ok, "{url}");
    }

    #[test]
    fn series_metadata_urls_bypass_the_gate() {
        let url = "http://host/player_api.php?username=u&password=p&action=get_series_info&series_id=7";
        assert!(engine().url_is_streamable(url, ContentKind::Series));
    }
}
