//! Tunables of a transfer attempt. Every field has a default, so an empty
//! json object is a valid configuration.
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::FeeMode;
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub receipt: PollConfig,
    pub self_relay: RelayPollConfig,
    /// Lifetime of the outgoing ICS-721 packet.
    pub packet_timeout_secs: u64,
    pub fee: FeeMode,
    pub memo: Option<String>,
    pub address_cache_ttl_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            receipt: PollConfig::default(),
            self_relay: RelayPollConfig::default(),
            packet_timeout_secs: 600,
            fee: FeeMode::Auto,
            memo: None,
            address_cache_ttl_secs: 300,
        }
    }
}

impl TransferConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn address_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.address_cache_ttl_secs)
    }
}

/// Fixed-interval polling with a hard attempt limit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            max_attempts: 60,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Polling of the self-relay watch loop. Unbounded unless `max_attempts` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayPollConfig {
    pub interval_ms: u64,
    pub max_attempts: Option<u32>,
}

impl Default for RelayPollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 4000,
            max_attempts: None,
        }
    }
}

impl RelayPollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Coin;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TransferConfig::from_json("{}").unwrap();
        assert_eq!(config, TransferConfig::default());
        assert_eq!(config.receipt.interval(), Duration::from_millis(500));
        assert_eq!(config.receipt.max_attempts, 60);
        assert_eq!(config.self_relay.interval(), Duration::from_secs(4));
        assert_eq!(config.self_relay.max_attempts, None);
        assert_eq!(config.packet_timeout_secs, 600);
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = TransferConfig::from_json(
            r#"{
                "receipt": { "max_attempts": 5 },
                "self_relay": { "max_attempts": 10 },
                "fee": { "mode": "fixed", "amount": [{ "denom": "ustars", "amount": "5000" }], "gas": 400000 },
                "memo": "via astral"
            }"#,
        )
        .unwrap();

        assert_eq!(config.receipt.max_attempts, 5);
        assert_eq!(config.receipt.interval_ms, 500);
        assert_eq!(config.self_relay.max_attempts, Some(10));
        assert_eq!(
            config.fee,
            FeeMode::Fixed {
                amount: vec![Coin {
                    denom: "ustars".to_string(),
                    amount: "5000".to_string(),
                }],
                gas: 400_000,
            }
        );
        assert_eq!(config.memo.as_deref(), Some("via astral"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(TransferConfig::from_json(r#"{"receipt": {"max_attempts": -1}}"#).is_err());
    }
}
