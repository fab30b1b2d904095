use serde::{Deserialize, Serialize};

use crate::identifiers::{ChainId, ChannelId};

/// One row of an NFT's reconstructed provenance: where the class lived and
/// through which bridge it left.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub chain_id: ChainId,
    pub nft_contract: String,
    pub bridge: Option<String>,
    pub channel_id: Option<ChannelId>,
    pub is_origin: bool,
}
