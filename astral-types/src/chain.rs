//! Chain metadata resolved from the network directory.
use serde::{Deserialize, Serialize};

use crate::identifiers::ChainId;

/// Static metadata describing a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: ChainId,
    pub pretty_name: String,
    pub bech32_prefix: String,
}

/// Display metadata of a chain's native asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub symbol: String,
    pub logo_uri: Option<String>,
}
