//! Typed wrappers around the bridge and cw721 smart queries.
use astral_types::class::PrefixedClassId;
use serde_json::Value;
use tracing::debug;

use crate::context::ChainQueryClient;
use crate::error::ClientError;
use crate::msgs::{to_json, BridgeQueryMsg, Cw721QueryMsg, OwnerOfResponse};

/// Reads an optional address-like string from a query response.
fn optional_string(contract: &str, value: Value) -> Result<Option<String>, ClientError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(ClientError::InvalidResponse {
            contract: contract.to_string(),
            description: format!("expected a string or null, got {other}"),
        }),
    }
}

/// The outgoing proxy configured on `bridge`, if any.
pub async fn query_proxy(
    client: &dyn ChainQueryClient,
    bridge: &str,
) -> Result<Option<String>, ClientError> {
    let msg = to_json(&BridgeQueryMsg::Proxy {})?;
    let response = client.query_contract_smart(bridge, &msg).await?;
    optional_string(bridge, response)
}

/// The raw class id `bridge` recorded for `nft_contract`. `None` means the
/// contract was not created by the bridge, so it is the origin of its class.
pub async fn query_class_id(
    client: &dyn ChainQueryClient,
    bridge: &str,
    nft_contract: &str,
) -> Result<Option<String>, ClientError> {
    let msg = to_json(&BridgeQueryMsg::ClassId {
        contract: nft_contract.to_string(),
    })?;
    let response = client.query_contract_smart(bridge, &msg).await?;
    optional_string(bridge, response)
}

/// The contract `bridge` instantiated for `class_id`, once it exists.
pub async fn query_nft_contract(
    client: &dyn ChainQueryClient,
    bridge: &str,
    class_id: &PrefixedClassId,
) -> Result<Option<String>, ClientError> {
    let msg = to_json(&BridgeQueryMsg::NftContract {
        class_id: class_id.to_string(),
    })?;
    let response = client.query_contract_smart(bridge, &msg).await?;
    optional_string(bridge, response)
}

/// The owner of `token_id`, or `None` while the contract does not know it.
pub async fn query_owner(
    client: &dyn ChainQueryClient,
    nft_contract: &str,
    token_id: &str,
) -> Result<Option<String>, ClientError> {
    let msg = to_json(&Cw721QueryMsg::OwnerOf {
        token_id: token_id.to_string(),
    })?;
    let response = client.query_contract_smart(nft_contract, &msg).await?;
    match serde_json::from_value::<OwnerOfResponse>(response) {
        Ok(OwnerOfResponse { owner, .. }) if !owner.is_empty() => Ok(Some(owner)),
        Ok(_) => Ok(None),
        Err(e) => {
            debug!(contract = nft_contract, token_id, error = %e, "owner_of returned no owner");
            Ok(None)
        }
    }
}
