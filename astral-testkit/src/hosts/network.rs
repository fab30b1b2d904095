use std::collections::HashMap;
use std::sync::Arc;

use astral_transfer::context::{ChainClients, ChainQueryClient};
use astral_transfer::error::RelayError;
use astral_transfer::topology::ChannelTopology;
use astral_transfer::types::channel::ChannelEndpoint;
use astral_transfer::types::identifiers::ChainId;
use tracing::info;

use super::MockChain;

/// A set of [`MockChain`]s linked by the bridge connections of a topology.
pub struct MockNetwork {
    chains: HashMap<ChainId, Arc<MockChain>>,
    topology: Arc<ChannelTopology>,
}

impl MockNetwork {
    pub fn new(topology: Arc<ChannelTopology>) -> Self {
        Self {
            chains: HashMap::new(),
            topology,
        }
    }

    pub fn with_chain(mut self, chain: MockChain) -> Self {
        self.chains
            .insert(chain.chain_id().clone(), Arc::new(chain));
        self
    }

    pub fn chain(&self, chain_id: &ChainId) -> Option<Arc<MockChain>> {
        self.chains.get(chain_id).cloned()
    }

    pub fn topology(&self) -> &Arc<ChannelTopology> {
        &self.topology
    }

    /// Delivers every packet queued on `source` to the opposite endpoint.
    pub fn relay_packets(&self, source: &ChannelEndpoint) -> Result<usize, RelayError> {
        let destination = self
            .topology
            .opposite_hop(source)
            .map_err(|e| RelayError::RelayFailed {
                description: e.to_string(),
            })?;
        let (Some(chain_a), Some(chain_b)) = (
            self.chain(&source.chain_id),
            self.chain(&destination.chain_id),
        ) else {
            return Err(RelayError::RelayFailed {
                description: format!("no mock chain behind {source} or {destination}"),
            });
        };

        let packets = chain_a.take_outgoing(source);
        for packet in &packets {
            chain_b
                .receive_packet(packet, &destination)
                .map_err(|description| RelayError::RelayFailed { description })?;
        }
        info!(%source, %destination, relayed = packets.len(), "relayed packets");
        Ok(packets.len())
    }

    /// Acts as a live relayer: delivers everything pending on every endpoint.
    pub fn relay_everything(&self) -> Result<usize, RelayError> {
        let mut relayed = 0;
        for connection in self.topology.connections() {
            let endpoints = connection.endpoints();
            if !endpoints
                .iter()
                .all(|(_, endpoint)| self.chains.contains_key(&endpoint.chain_id))
            {
                continue;
            }
            for (_, endpoint) in endpoints {
                relayed += self.relay_packets(endpoint)?;
            }
        }
        Ok(relayed)
    }
}

impl ChainClients for MockNetwork {
    fn query_client(&self, chain_id: &ChainId) -> Option<Arc<dyn ChainQueryClient>> {
        self.chain(chain_id)
            .map(|chain| -> Arc<dyn ChainQueryClient> { chain })
    }
}
