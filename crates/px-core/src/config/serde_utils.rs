//! Shared serialization/deserialization utilities for configuration
//!
//! This module provides common serde helpers used across configuration types.

/// Helper module for Duration serialization as milliseconds
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Config {
///     #[serde(with = "px_core::config::serde_utils::duration_millis")]
///     delay: Duration,
/// }
/// ```
pub mod duration_millis {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize a Duration as milliseconds (u64)
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    /// Deserialize a Duration from milliseconds (u64)
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for Unix permission bits written as an octal string
///
/// Serializes as `"0666"`; accepts either an octal string or a plain integer.
pub mod octal_mode {
    use serde::{self, de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u32),
    }

    /// Serialize permission bits as a zero-prefixed octal string
    pub fn serialize<S>(mode: &u32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:04o}", mode))
    }

    /// Deserialize permission bits from an octal string or integer
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mode = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) => {
                let digits = s.trim_start_matches("0o");
                u32::from_str_radix(digits, 8)
                    .map_err(|_| de::Error::custom(format!("invalid octal mode {:?}", s)))?
            }
        };
        if mode > 0o7777 {
            return Err(de::Error::custom(format!("mode {:o} out of range", mode)));
        }
        Ok(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        #[serde(with = "duration_millis")]
        delay: Duration,
        #[serde(with = "octal_mode")]
        mode: u32,
    }

    #[test]
    fn test_serialize() {
        let config = TestConfig {
            delay: Duration::from_millis(250),
            mode: 0o644,
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("delay = 250"));
        assert!(text.contains("mode = \"0644\""));
    }

    #[test]
    fn test_deserialize_string_and_integer_modes() {
        let config: TestConfig = toml::from_str("delay = 60\nmode = \"0o600\"").unwrap();
        assert_eq!(config.delay, Duration::from_millis(60));
        assert_eq!(config.mode, 0o600);

        let config: TestConfig = toml::from_str("delay = 1\nmode = 438").unwrap();
        assert_eq!(config.mode, 0o666);
    }

    #[test]
    fn test_rejects_bad_modes() {
        assert!(toml::from_str::<TestConfig>("delay = 1\nmode = \"0999\"").is_err());
        assert!(toml::from_str::<TestConfig>("delay = 1\nmode = 99999").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let config = TestConfig {
            delay: Duration::from_millis(3600),
            mode: 0o666,
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: TestConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, parsed);
    }
}
