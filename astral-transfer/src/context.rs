//! Defines the collaborator traits the orchestrator needs from its host: a
//! transaction signer, read-only contract queries per chain, the network
//! directory and the relay library.
use std::sync::Arc;

use astral_types::chain::{AssetInfo, ChainInfo};
use astral_types::channel::ChannelEndpoint;
use astral_types::identifiers::ChainId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, RelayError};

/// A native token amount attached to a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

/// How the signer prices a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum FeeMode {
    /// Simulate and let the wallet pick the fee.
    #[default]
    Auto,
    Fixed { amount: Vec<Coin>, gas: u64 },
}

/// The result of a broadcast contract execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecuteResponse {
    pub tx_hash: String,
}

/// Signs and broadcasts contract executions on behalf of the connected wallet.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        fee: &FeeMode,
        memo: Option<&str>,
        funds: &[Coin],
    ) -> Result<ExecuteResponse, ClientError>;
}

/// Read-only smart queries against one chain.
#[async_trait]
pub trait ChainQueryClient: Send + Sync {
    async fn query_contract_smart(&self, contract: &str, msg: &Value)
        -> Result<Value, ClientError>;
}

/// Hands out a query client per chain.
pub trait ChainClients: Send + Sync {
    fn query_client(&self, chain_id: &ChainId) -> Option<Arc<dyn ChainQueryClient>>;

    /// Like [`query_client`](Self::query_client), failing for unconfigured chains.
    fn client_for(&self, chain_id: &ChainId) -> Result<Arc<dyn ChainQueryClient>, ClientError> {
        self.query_client(chain_id)
            .ok_or_else(|| ClientError::MissingClient(chain_id.clone()))
    }
}

/// Chain metadata known to the application.
pub trait NetworkDirectory: Send + Sync {
    /// Resolves the chain an address belongs to by its bech32 prefix.
    fn chain_for_address(&self, address: &str) -> Option<ChainInfo>;

    fn chain_by_id(&self, chain_id: &ChainId) -> Option<ChainInfo>;

    fn assets_for_chain(&self, chain_id: &ChainId) -> Option<AssetInfo>;
}

/// One side of a relay link. `A` is the chain the packet was sent from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkSide {
    A,
    B,
}

/// A signing session opened by the relay library on one chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelaySession {
    pub chain_id: ChainId,
    pub signer_address: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingPacket {
    pub sequence: u64,
}

/// Opens signing sessions and links them over an existing channel pair.
#[async_trait]
pub trait RelayBackend: Send + Sync {
    async fn open_session(&self, chain_id: &ChainId) -> Result<RelaySession, RelayError>;

    /// Links two sessions over the `a`/`b` endpoints of an existing connection.
    async fn link(
        &self,
        session_a: RelaySession,
        session_b: RelaySession,
        a: &ChannelEndpoint,
        b: &ChannelEndpoint,
    ) -> Result<Box<dyn RelayLink>, RelayError>;
}

/// A live link between two chains.
#[async_trait]
pub trait RelayLink: Send + Sync {
    /// Relays every pending packet and acknowledgement once.
    async fn relay_all(&self) -> Result<(), RelayError>;

    /// Packets committed on `side` and not yet received on the other side.
    async fn pending_packets(&self, side: LinkSide) -> Result<Vec<PendingPacket>, RelayError>;

    /// Acknowledgements written on `side` and not yet delivered back.
    async fn pending_acks(&self, side: LinkSide) -> Result<Vec<PendingPacket>, RelayError>;
}
