use astral_types::request::{TransferRequest, TxnKind, TxnRecord};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::config::TransferConfig;
use crate::context::Signer;
use crate::error::ClientError;
use crate::msgs::{
    to_binary, to_json, Cw721ExecuteMsg, IbcOutgoingMsg, IbcTimeout, ProxyExecuteMsg,
};
use crate::planner::Route;

/// A contract execution ready to be signed.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedTxn {
    pub kind: TxnKind,
    pub contract: String,
    pub msg: Value,
}

/// `transfer_nft` to the receiver on the same chain.
pub fn direct_send_txn(request: &TransferRequest) -> Result<PreparedTxn, ClientError> {
    let msg = Cw721ExecuteMsg::TransferNft {
        recipient: request.receiver.clone(),
        token_id: request.token_id.clone(),
    };
    Ok(PreparedTxn {
        kind: TxnKind::Direct,
        contract: request.nft_contract.clone(),
        msg: to_json(&msg)?,
    })
}

fn outgoing_msg(
    request: &TransferRequest,
    route: &Route,
    config: &TransferConfig,
    now: OffsetDateTime,
) -> IbcOutgoingMsg {
    IbcOutgoingMsg {
        receiver: request.receiver.clone(),
        channel_id: route.source.channel.clone(),
        timeout: IbcTimeout::after(now, config.packet_timeout_secs),
        memo: None,
    }
}

/// `send_nft` handing the token straight to the source bridge.
pub fn ibc_send_txn(
    request: &TransferRequest,
    route: &Route,
    config: &TransferConfig,
    now: OffsetDateTime,
) -> Result<PreparedTxn, ClientError> {
    let msg = Cw721ExecuteMsg::SendNft {
        contract: route.source_bridge.clone(),
        token_id: request.token_id.clone(),
        msg: to_binary(&outgoing_msg(request, route, config, now))?,
    };
    Ok(PreparedTxn {
        kind: TxnKind::Send,
        contract: request.nft_contract.clone(),
        msg: to_json(&msg)?,
    })
}

/// `approve` letting `proxy` move the token.
pub fn approve_txn(request: &TransferRequest, proxy: &str) -> Result<PreparedTxn, ClientError> {
    let msg = Cw721ExecuteMsg::Approve {
        spender: proxy.to_string(),
        token_id: request.token_id.clone(),
    };
    Ok(PreparedTxn {
        kind: TxnKind::Approve,
        contract: request.nft_contract.clone(),
        msg: to_json(&msg)?,
    })
}

/// `send_nft` executed on the proxy, which pulls the approved token.
pub fn proxy_send_txn(
    request: &TransferRequest,
    route: &Route,
    proxy: &str,
    config: &TransferConfig,
    now: OffsetDateTime,
) -> Result<PreparedTxn, ClientError> {
    let msg = ProxyExecuteMsg::SendNft {
        cw721: request.nft_contract.clone(),
        token_id: request.token_id.clone(),
        msg: to_binary(&outgoing_msg(request, route, config, now))?,
    };
    Ok(PreparedTxn {
        kind: TxnKind::Send,
        contract: proxy.to_string(),
        msg: to_json(&msg)?,
    })
}

/// Signs and broadcasts `prepared`. Failures are captured in the returned
/// record rather than returned as errors.
pub async fn submit_txn(
    signer: &dyn Signer,
    sender: &str,
    config: &TransferConfig,
    prepared: Result<PreparedTxn, ClientError>,
    kind: TxnKind,
) -> TxnRecord {
    let prepared = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!(%kind, error = %e, "failed to build transaction");
            return TxnRecord::failed(kind, String::new(), Value::Null, e.to_string());
        }
    };

    let result = signer
        .execute(
            sender,
            &prepared.contract,
            &prepared.msg,
            &config.fee,
            config.memo.as_deref(),
            &[],
        )
        .await;

    match result {
        Ok(response) => {
            info!(%kind, contract = %prepared.contract, tx_hash = %response.tx_hash, "transaction submitted");
            TxnRecord::succeeded(kind, prepared.contract, prepared.msg, response.tx_hash)
        }
        Err(e) => {
            warn!(%kind, contract = %prepared.contract, error = %e, "transaction failed");
            TxnRecord::failed(kind, prepared.contract, prepared.msg, e.to_string())
        }
    }
}
