use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for a synchronization session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of headers requested in a single chunk.
    ///
    /// Caps per-round-trip memory and validation cost.
    pub chunk_size: u64,
    /// How long a state waits for a response before reporting a timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { chunk_size: 192, timeout: Duration::from_secs(30) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.chunk_size, 192);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn deserializes_humantime_timeout() {
        let config: SyncConfig =
            serde_json::from_str(r#"{ "chunk_size": 64, "timeout": "5s" }"#).unwrap();
        assert_eq!(config.chunk_size, 64);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: SyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
    }
}
