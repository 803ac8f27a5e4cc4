//! Shared utilities
//!
//! Small cross-cutting helpers: the retrying HTTP client, URL handling and
//! retry jitter.

pub mod http;
pub mod jitter;
pub mod url;

pub use http::RetryingHttpClient;
pub use url::UrlUtils;
