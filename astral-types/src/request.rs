//! Defines the transfer request submitted by the UI and the transaction
//! records accumulated while it executes.
use core::fmt::{Display, Error as FmtError, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::ChannelEndpoint;
use crate::identifiers::ChainId;

/// A request to move one NFT, fixed once the transfer starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub nft_contract: String,
    pub token_id: String,
    /// Address of the current owner, signing on the source chain.
    pub sender: String,
    pub source_chain: ChainId,
    pub dest_chain: ChainId,
    /// Source-side endpoint of the bridge connection picked by the user.
    /// Ignored for same-chain transfers.
    pub selected_channel: Option<ChannelEndpoint>,
    pub receiver: String,
}

impl TransferRequest {
    pub fn is_same_chain(&self) -> bool {
        self.source_chain == self.dest_chain
    }
}

/// How a transfer reaches its destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStrategy {
    /// A plain `transfer_nft` on the source chain.
    DirectSend,
    /// A `send_nft` to the ICS-721 bridge.
    BasicIbcSend,
    /// An approval of the bridge proxy followed by a send through it.
    ApprovalGatedIbcSend,
}

impl TransferStrategy {
    pub fn is_cross_chain(&self) -> bool {
        !matches!(self, Self::DirectSend)
    }

    pub fn requires_approval(&self) -> bool {
        matches!(self, Self::ApprovalGatedIbcSend)
    }
}

impl Display for TransferStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::DirectSend => write!(f, "direct_send"),
            Self::BasicIbcSend => write!(f, "basic_ibc_send"),
            Self::ApprovalGatedIbcSend => write!(f, "approval_gated_ibc_send"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnKind {
    Approve,
    Send,
    Direct,
}

impl Display for TxnKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Send => write!(f, "send"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

/// A transaction submitted during one transfer attempt. Failed submissions are
/// kept with their error for diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxnRecord {
    pub kind: TxnKind,
    pub contract: String,
    pub payload: Value,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

impl TxnRecord {
    pub fn succeeded(kind: TxnKind, contract: String, payload: Value, tx_hash: String) -> Self {
        Self {
            kind,
            contract,
            payload,
            tx_hash: Some(tx_hash),
            error: None,
        }
    }

    pub fn failed(kind: TxnKind, contract: String, payload: Value, error: String) -> Self {
        Self {
            kind,
            contract,
            payload,
            tx_hash: None,
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
