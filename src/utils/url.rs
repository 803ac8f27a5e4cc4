//! URL utilities for consistent URL handling
//!
//! Scheme normalization, joining and credential obfuscation used throughout
//! the pipeline. Vendor stream URLs embed the credential pair both in query
//! parameters and in path segments, so obfuscation handles both forms.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Ensure a URL has an HTTP/HTTPS scheme, defaulting to HTTP
    ///
    /// Useful for handling configured hosts where the protocol was omitted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stream_catalog::utils::url::UrlUtils;
    ///
    /// assert_eq!(UrlUtils::normalize_scheme("example.com"), "http://example.com");
    /// assert_eq!(UrlUtils::normalize_scheme("https://example.com"), "https://example.com");
    /// ```
    pub fn normalize_scheme(url: &str) -> String {
        let trimmed = url.trim();

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        }
    }

    /// Normalize scheme and strip trailing slashes
    pub fn sanitize(url: &str) -> String {
        let mut sanitized = Self::normalize_scheme(url);
        while sanitized.len() > 8 && sanitized.ends_with('/') {
            sanitized.pop();
        }
        sanitized
    }

    /// Mask usernames and passwords in URLs so credentials never reach logs
    ///
    /// Handles URL userinfo (`user:pass@host`), `username`/`password` query
    /// parameters, and the Xtream-style path form `/live/{user}/{pass}/{id}`.
    pub fn obfuscate_credentials(url: &str) -> String {
        static QUERY_RE: OnceLock<Regex> = OnceLock::new();
        static PATH_RE: OnceLock<Regex> = OnceLock::new();

        let mut obfuscated = url.to_string();

        if let Ok(parsed) = Url::parse(url) {
            if !parsed.username().is_empty() || parsed.password().is_some() {
                let mut masked = parsed.clone();
                let _ = masked.set_username("****");
                let _ = masked.set_password(Some("****"));
                obfuscated = masked.to_string();
            }
        }

        let query_re = QUERY_RE
            .get_or_init(|| Regex::new(r"(username|password)=[^&\s]*").unwrap());
        obfuscated = query_re.replace_all(&obfuscated, "$1=****").to_string();

        let path_re = PATH_RE
            .get_or_init(|| Regex::new(r"/(live|movie|series)/[^/\s]+/[^/\s]+/").unwrap());
        path_re.replace_all(&obfuscated, "/$1/****/****/").to_string()
    }
}
