//! Serde support for human-readable durations in configuration
//!
//! Accepts either a bare number of seconds or a humantime string such as
//! "30s", "500ms" or "1h30m"; serializes back to the humantime form.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::{fmt, time::Duration};

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl Visitor<'_> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("seconds as a number or a human-readable duration string")
        }

        fn visit_u64<E>(self, seconds: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(seconds))
        }

        fn visit_i64<E>(self, seconds: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(seconds)
                .map(Duration::from_secs)
                .map_err(|_| de::Error::custom("duration must be non-negative"))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(value)
                .map_err(|e| de::Error::custom(format!("invalid duration '{value}': {e}")))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}
