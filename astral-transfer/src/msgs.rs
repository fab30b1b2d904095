//! Message shapes of the cw721 NFT contracts and the cw-ics721 bridge.
use astral_types::identifiers::ChannelId;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime};

use crate::error::ClientError;

/// Queries answered by the ICS-721 bridge contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeQueryMsg {
    /// The outgoing proxy, if the bridge enforces one.
    Proxy {},
    /// The class id of a contract the bridge instantiated.
    ClassId { contract: String },
    /// The contract the bridge instantiated for a class id.
    NftContract { class_id: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cw721QueryMsg {
    OwnerOf { token_id: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OwnerOfResponse {
    pub owner: String,
    #[serde(default)]
    pub approvals: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cw721ExecuteMsg {
    TransferNft {
        recipient: String,
        token_id: String,
    },
    /// Hands the token to `contract` together with a base64 json `msg`.
    SendNft {
        contract: String,
        token_id: String,
        msg: String,
    },
    Approve {
        spender: String,
        token_id: String,
    },
}

/// Executions accepted by the bridge's outgoing proxy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyExecuteMsg {
    SendNft {
        cw721: String,
        token_id: String,
        msg: String,
    },
}

/// The instruction the bridge reads from `send_nft`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcOutgoingMsg {
    pub receiver: String,
    pub channel_id: ChannelId,
    pub timeout: IbcTimeout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcTimeout {
    pub block: Option<Value>,
    /// Nanoseconds since the unix epoch, as a decimal string.
    pub timestamp: String,
}

impl IbcTimeout {
    pub fn after(now: OffsetDateTime, timeout_secs: u64) -> Self {
        let secs = i64::try_from(timeout_secs).unwrap_or(i64::MAX);
        let deadline = now.saturating_add(Duration::seconds(secs));
        Self {
            block: None,
            timestamp: deadline.unix_timestamp_nanos().to_string(),
        }
    }
}

pub fn to_json<T: Serialize>(msg: &T) -> Result<Value, ClientError> {
    serde_json::to_value(msg).map_err(|e| ClientError::FailedToEncode {
        description: e.to_string(),
    })
}

/// Encodes `msg` as the base64 json binary cosmwasm contracts expect.
pub fn to_binary<T: Serialize>(msg: &T) -> Result<String, ClientError> {
    let bytes = serde_json::to_vec(msg).map_err(|e| ClientError::FailedToEncode {
        description: e.to_string(),
    })?;
    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_query_shapes() {
        assert_eq!(to_json(&BridgeQueryMsg::Proxy {}).unwrap(), json!({"proxy": {}}));
        assert_eq!(
            to_json(&BridgeQueryMsg::NftContract {
                class_id: "wasm.stars1b/channel-3/stars1a".to_string()
            })
            .unwrap(),
            json!({"nft_contract": {"class_id": "wasm.stars1b/channel-3/stars1a"}})
        );
        assert_eq!(
            to_json(&Cw721QueryMsg::OwnerOf {
                token_id: "7".to_string()
            })
            .unwrap(),
            json!({"owner_of": {"token_id": "7"}})
        );
    }

    #[test]
    fn test_outgoing_msg_binary() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let msg = IbcOutgoingMsg {
            receiver: "juno1receiver".to_string(),
            channel_id: ChannelId::new(4),
            timeout: IbcTimeout::after(now, 600),
            memo: None,
        };
        assert_eq!(msg.timeout.timestamp, "1700000600000000000");

        let decoded = STANDARD.decode(to_binary(&msg).unwrap()).unwrap();
        let value: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(
            value,
            json!({
                "receiver": "juno1receiver",
                "channel_id": "channel-4",
                "timeout": {"block": null, "timestamp": "1700000600000000000"},
            })
        );
    }

    #[test]
    fn test_owner_of_requires_owner() {
        let parsed: Result<OwnerOfResponse, _> =
            serde_json::from_value(json!({"owner": "stars1x", "approvals": []}));
        assert_eq!(parsed.unwrap().owner, "stars1x");
        assert!(serde_json::from_value::<OwnerOfResponse>(json!({"approvals": []})).is_err());
    }
}
