//! Serde helpers for human-readable durations in configuration.

use serde::{Deserialize, Deserializer, Serializer, de};
use std::time::Duration;

/// `Option<Duration>` as seconds (number) or a humantime string (`"30s"`, `"1m30s"`).
pub mod option_duration {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Seconds(u64),
        Text(String),
    }

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => {
                let duration_str = humantime::format_duration(*d).to_string();
                serializer.serialize_some(&duration_str)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Seconds(seconds)) => Ok(Some(Duration::from_secs(seconds))),
            Some(Repr::Text(value)) => humantime::parse_duration(&value)
                .map(Some)
                .map_err(|e| de::Error::custom(format!("Invalid duration '{value}': {e}"))),
        }
    }
}
