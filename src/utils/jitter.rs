//! Jitter for retry backoff
//!
//! Uses system time as pseudo-randomness so retries spread out without an
//! external random crate.

/// Return a pseudo-random jitter between 0 and `max_jitter_ms` (inclusive)
pub fn generate_jitter_ms(max_jitter_ms: u64) -> u64 {
    if max_jitter_ms == 0 {
        return 0;
    }

    (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        % (max_jitter_ms + 1) as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_within_bounds() {
        for _ in 0..100 {
            assert!(generate_jitter_ms(50) <= 50);
        }
        assert_eq!(generate_jitter_ms(0), 0);
    }
}
