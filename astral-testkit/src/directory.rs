//! A static [`NetworkDirectory`] over a fixed list of chains.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use astral_transfer::context::NetworkDirectory;
use astral_transfer::types::chain::{AssetInfo, ChainInfo};
use astral_transfer::types::identifiers::ChainId;
use astral_transfer::types::validate::bech32_prefix;

#[derive(Debug, Default)]
pub struct MockDirectory {
    chains: Vec<ChainInfo>,
    assets: HashMap<ChainId, AssetInfo>,
    address_lookups: AtomicUsize,
}

impl MockDirectory {
    pub fn with_chain(mut self, chain: ChainInfo, asset: Option<AssetInfo>) -> Self {
        if let Some(asset) = asset {
            self.assets.insert(chain.chain_id.clone(), asset);
        }
        self.chains.push(chain);
        self
    }

    /// How many times `chain_for_address` was called.
    pub fn address_lookups(&self) -> usize {
        self.address_lookups.load(Ordering::SeqCst)
    }
}

impl NetworkDirectory for MockDirectory {
    fn chain_for_address(&self, address: &str) -> Option<ChainInfo> {
        self.address_lookups.fetch_add(1, Ordering::SeqCst);
        let prefix = bech32_prefix(address)?;
        self.chains
            .iter()
            .find(|chain| chain.bech32_prefix == prefix)
            .cloned()
    }

    fn chain_by_id(&self, chain_id: &ChainId) -> Option<ChainInfo> {
        self.chains
            .iter()
            .find(|chain| &chain.chain_id == chain_id)
            .cloned()
    }

    fn assets_for_chain(&self, chain_id: &ChainId) -> Option<AssetInfo> {
        self.assets.get(chain_id).cloned()
    }
}
