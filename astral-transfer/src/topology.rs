//! The static registry of bridge connections and the channel lookups built on
//! top of it.
use std::sync::Arc;

use astral_types::chain::{AssetInfo, ChainInfo};
use astral_types::channel::{ChannelEndpoint, NftConnection};
use astral_types::class::TracePrefix;
use astral_types::error::TransferError;
use astral_types::identifiers::ChainId;

use crate::context::NetworkDirectory;
use crate::error::ConfigError;

/// A channel a user can pick on the source chain, together with display
/// metadata of the chain on the other side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelOption {
    pub endpoint: ChannelEndpoint,
    pub counterparty: ChannelEndpoint,
    pub counterparty_chain: Option<ChainInfo>,
    pub counterparty_asset: Option<AssetInfo>,
}

pub struct ChannelTopology {
    connections: Vec<NftConnection>,
    directory: Arc<dyn NetworkDirectory>,
}

impl ChannelTopology {
    pub fn new(connections: Vec<NftConnection>, directory: Arc<dyn NetworkDirectory>) -> Self {
        Self {
            connections,
            directory,
        }
    }

    /// Loads the registry from its json form, a list of
    /// `{"channel_a": {..}, "channel_b": {..}}` objects.
    pub fn from_json(raw: &str, directory: Arc<dyn NetworkDirectory>) -> Result<Self, ConfigError> {
        let connections: Vec<NftConnection> = serde_json::from_str(raw)?;
        Ok(Self::new(connections, directory))
    }

    pub fn connections(&self) -> &[NftConnection] {
        &self.connections
    }

    pub fn directory(&self) -> &Arc<dyn NetworkDirectory> {
        &self.directory
    }

    /// Every endpoint on `chain_id`, in registry order.
    pub fn find_channels_for_chain(&self, chain_id: &ChainId) -> Vec<ChannelOption> {
        self.connections
            .iter()
            .filter_map(|connection| {
                let label = connection.label_on_chain(chain_id)?;
                let counterparty = connection.endpoint(label.opposite()).clone();
                Some(ChannelOption {
                    endpoint: connection.endpoint(label).clone(),
                    counterparty_chain: self.directory.chain_by_id(&counterparty.chain_id),
                    counterparty_asset: self.directory.assets_for_chain(&counterparty.chain_id),
                    counterparty,
                })
            })
            .collect()
    }

    /// The `src`-side endpoint of the first connection linking `src` and `dest`.
    pub fn find_shared_channel(&self, src: &ChainId, dest: &ChainId) -> Option<ChannelEndpoint> {
        if src == dest {
            return None;
        }
        self.connections
            .iter()
            .filter(|connection| connection.connects(src, dest))
            .find_map(|connection| {
                connection
                    .label_on_chain(src)
                    .map(|label| connection.endpoint(label).clone())
            })
    }

    /// The endpoint on the other side of the connection `endpoint` belongs to.
    pub fn opposite_hop(&self, endpoint: &ChannelEndpoint) -> Result<ChannelEndpoint, TransferError> {
        self.connections
            .iter()
            .find_map(|connection| {
                connection
                    .label_of(endpoint)
                    .map(|label| connection.endpoint(label.opposite()).clone())
            })
            .ok_or_else(|| TransferError::UnknownChannel {
                chain_id: endpoint.chain_id.clone(),
                port_id: endpoint.port.clone(),
                channel_id: endpoint.channel.clone(),
            })
    }

    /// The configured endpoint on `chain_id` recorded by a class-id hop.
    pub fn endpoint_for_hop(
        &self,
        chain_id: &ChainId,
        hop: &TracePrefix,
    ) -> Result<ChannelEndpoint, TransferError> {
        self.connections
            .iter()
            .flat_map(|connection| connection.endpoints())
            .map(|(_, endpoint)| endpoint)
            .find(|endpoint| &endpoint.chain_id == chain_id && endpoint.matches(hop))
            .cloned()
            .ok_or_else(|| TransferError::UnknownChannel {
                chain_id: chain_id.clone(),
                port_id: hop.port_id.clone(),
                channel_id: hop.channel_id.clone(),
            })
    }

    /// Distinct bridge contracts deployed on `chain_id`.
    pub fn bridges_on_chain(&self, chain_id: &ChainId) -> Vec<String> {
        let mut bridges: Vec<String> = Vec::new();
        for option in self.find_channels_for_chain(chain_id) {
            if let Some(bridge) = option.endpoint.bridge_address() {
                if !bridges.iter().any(|known| known == bridge) {
                    bridges.push(bridge.to_string());
                }
            }
        }
        bridges
    }
}
