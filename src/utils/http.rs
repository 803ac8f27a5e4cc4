//! Retrying HTTP client used by every catalog fetch
//!
//! One primitive owns timeout, bounded retry with exponential backoff and
//! jitter, gzip payload decompression, and text decoding with a Latin-1
//! fallback. Source handlers never roll their own retry loops; liveness
//! probing deliberately does not go through this client (a failed probe is
//! final, never retried).

use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult, SourceError};
use crate::utils::jitter::generate_jitter_ms;
use crate::utils::url::UrlUtils;

/// HTTP client with uniform retry/backoff semantics for catalog fetches
pub struct RetryingHttpClient {
    client: Client,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl RetryingHttpClient {
    /// Create a client with a total request timeout and retry policy
    pub fn new(
        fetch_timeout: Duration,
        max_attempts: u32,
        retry_backoff: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_backoff,
        })
    }

    /// Fetch a URL, returning decompressed bytes, retrying transient failures
    pub async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.fetch_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(message) => {
                    warn!(
                        "Fetch attempt {}/{} failed for {}: {}",
                        attempt,
                        self.max_attempts,
                        UrlUtils::obfuscate_credentials(url),
                        message
                    );
                    last_error = message;

                    if attempt < self.max_attempts {
                        let backoff = self.retry_backoff.as_millis() as u64
                            * 2u64.saturating_pow(attempt - 1);
                        let delay = backoff + generate_jitter_ms(backoff / 4);
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        Err(AppError::Source(SourceError::FetchFailed {
            url: UrlUtils::obfuscate_credentials(url),
            attempts: self.max_attempts,
            message: last_error,
        }))
    }

    /// Fetch a URL as text, decoding UTF-8 with a Latin-1 fallback
    ///
    /// Playlist providers are inconsistent about encodings; a payload that is
    /// not valid UTF-8 is reinterpreted byte-for-byte as ISO-8859-1.
    pub async fn fetch_text(&self, url: &str) -> AppResult<String> {
        let bytes = self.fetch_bytes(url).await?;
        Ok(decode_text(bytes))
    }

    /// Fetch a URL and parse the payload as JSON
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let bytes = self.fetch_bytes(url).await?;

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Source(SourceError::malformed(
                UrlUtils::obfuscate_credentials(url),
                format!("invalid JSON: {e}"),
            ))
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UrlUtils::obfuscate_credentials(&e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;

        debug!("Fetched {} bytes of raw content", bytes.len());
        maybe_decompress(bytes.to_vec())
    }
}

/// Decompress gzip payloads, passing everything else through untouched
fn maybe_decompress(bytes: Vec<u8>) -> Result<Vec<u8>, String> {
    if bytes.len() < 2 || bytes[0] != 0x1f || bytes[1] != 0x8b {
        return Ok(bytes);
    }

    debug!("Payload is gzip-compressed, decompressing");
    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| format!("gzip decompression failed: {e}"))?;
    Ok(decompressed)
}

/// Decode bytes as UTF-8, falling back to Latin-1
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("Payload is not UTF-8, decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn decompresses_gzip_payloads() {
        let original = "#EXTM3U\n#EXTINF:-1,Canal 5 HD\nhttp://host/a.ts\n";
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let result = maybe_decompress(compressed).unwrap();
        assert_eq!(String::from_utf8(result).unwrap(), original);
    }

    #[test]
    fn passes_through_plain_payloads() {
        let plain = b"#EXTM3U\n".to_vec();
        assert_eq!(maybe_decompress(plain.clone()).unwrap(), plain);
    }

    #[test]
    fn decodes_latin1_when_not_utf8() {
        // "Telecinco España" encoded as ISO-8859-1 (0xF1 = n-tilde)
        let bytes = b"Telecinco Espa\xf1a".to_vec();
        assert_eq!(decode_text(bytes), "Telecinco España");
    }

    #[test]
    fn decodes_utf8_directly() {
        let bytes = "Música".as_bytes().to_vec();
        assert_eq!(decode_text(bytes), "Música");
    }
}
