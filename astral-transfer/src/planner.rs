//! Chooses how a transfer reaches its destination and resolves everything the
//! executor needs to submit it.
use astral_types::channel::ChannelEndpoint;
use astral_types::class::{derive_next_class_id, ClassId, PrefixedClassId};
use astral_types::error::TransferError;
use astral_types::request::{TransferRequest, TransferStrategy};
use astral_types::validate::validate_bech32_address;
use tracing::{debug, info};

use crate::context::{ChainClients, NetworkDirectory};
use crate::query::{query_class_id, query_proxy};
use crate::topology::ChannelTopology;

/// The resolved path of a cross-chain transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub source: ChannelEndpoint,
    pub destination: ChannelEndpoint,
    /// Bridge contract on the source chain.
    pub source_bridge: String,
    /// Bridge contract on the destination chain.
    pub destination_bridge: String,
    pub proxy: Option<String>,
    /// Class id of the NFT contract on the source chain.
    pub class_id: PrefixedClassId,
    /// Class id the NFT will carry on the destination chain.
    pub expected_class_id: PrefixedClassId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPlan {
    pub strategy: TransferStrategy,
    pub route: Option<Route>,
}

impl TransferPlan {
    pub fn direct() -> Self {
        Self {
            strategy: TransferStrategy::DirectSend,
            route: None,
        }
    }
}

pub struct TransferPlanner<'a> {
    topology: &'a ChannelTopology,
    directory: &'a dyn NetworkDirectory,
    clients: &'a dyn ChainClients,
}

impl<'a> TransferPlanner<'a> {
    pub fn new(
        topology: &'a ChannelTopology,
        directory: &'a dyn NetworkDirectory,
        clients: &'a dyn ChainClients,
    ) -> Self {
        Self {
            topology,
            directory,
            clients,
        }
    }

    /// Validates `request` and picks its strategy: a direct send for
    /// same-chain transfers, otherwise an IBC send that goes through the
    /// bridge's proxy when one is configured.
    pub async fn plan(&self, request: &TransferRequest) -> Result<TransferPlan, TransferError> {
        self.validate_recipient(request)?;

        if request.is_same_chain() {
            debug!(chain_id = %request.source_chain, "same-chain transfer");
            return Ok(TransferPlan::direct());
        }

        let route = self.resolve_route(request).await?;
        let strategy = if route.proxy.is_some() {
            TransferStrategy::ApprovalGatedIbcSend
        } else {
            TransferStrategy::BasicIbcSend
        };

        info!(
            %strategy,
            source = %route.source,
            destination = %route.destination,
            class_id = %route.class_id,
            expected_class_id = %route.expected_class_id,
            "planned transfer"
        );

        Ok(TransferPlan {
            strategy,
            route: Some(route),
        })
    }

    fn validate_recipient(&self, request: &TransferRequest) -> Result<(), TransferError> {
        let chain = self
            .directory
            .chain_by_id(&request.dest_chain)
            .ok_or_else(|| TransferError::UnknownChain(request.dest_chain.clone()))?;

        validate_bech32_address(&request.receiver, &chain.bech32_prefix).map_err(|e| {
            TransferError::InvalidRecipient {
                address: request.receiver.clone(),
                chain_id: request.dest_chain.clone(),
                validation_error: e,
            }
        })
    }

    async fn resolve_route(&self, request: &TransferRequest) -> Result<Route, TransferError> {
        let source = match &request.selected_channel {
            Some(selected) => selected.clone(),
            None => self
                .topology
                .find_shared_channel(&request.source_chain, &request.dest_chain)
                .ok_or_else(|| TransferError::NoRoute {
                    source: request.source_chain.clone(),
                    destination: request.dest_chain.clone(),
                })?,
        };

        let destination = self.topology.opposite_hop(&source)?;
        if source.chain_id != request.source_chain || destination.chain_id != request.dest_chain {
            return Err(TransferError::MismatchedRoute {
                channel_id: source.channel.clone(),
                source: request.source_chain.clone(),
                destination: request.dest_chain.clone(),
            });
        }

        let source_bridge = bridge_of(&source)?;
        let destination_bridge = bridge_of(&destination)?;

        let client = self.clients.client_for(&source.chain_id)?;
        let proxy = query_proxy(client.as_ref(), &source_bridge).await?;
        let class_id = match query_class_id(client.as_ref(), &source_bridge, &request.nft_contract)
            .await?
        {
            Some(raw) => raw.parse::<PrefixedClassId>()?,
            None => PrefixedClassId::origin(request.nft_contract.parse::<ClassId>()?),
        };
        let expected_class_id = derive_next_class_id(
            &class_id,
            &source.trace_prefix(),
            &destination.trace_prefix(),
        );

        Ok(Route {
            source,
            destination,
            source_bridge,
            destination_bridge,
            proxy,
            class_id,
            expected_class_id,
        })
    }
}

fn bridge_of(endpoint: &ChannelEndpoint) -> Result<String, TransferError> {
    endpoint
        .bridge_address()
        .map(ToString::to_string)
        .ok_or_else(|| TransferError::UnsupportedChannel {
            port_id: endpoint.port.clone(),
        })
}
