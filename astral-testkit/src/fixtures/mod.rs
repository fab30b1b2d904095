//! Canonical three-chain network and request fixtures, for testing purposes
//! only!
use std::sync::Arc;

use astral_transfer::config::TransferConfig;
use astral_transfer::context::Signer;
use astral_transfer::executor::TransferContext;
use astral_transfer::topology::ChannelTopology;
use astral_transfer::types::chain::{AssetInfo, ChainInfo};
use astral_transfer::types::channel::{ChannelEndpoint, NftConnection};
use astral_transfer::types::identifiers::ChainId;
use astral_transfer::types::request::TransferRequest;
use subtle_encoding::bech32;
use typed_builder::TypedBuilder;

use crate::directory::MockDirectory;
use crate::hosts::{MockChain, MockNetwork};

pub const STARGAZE: &str = "stargaze-1";
pub const JUNO: &str = "juno-1";
pub const OSMOSIS: &str = "osmosis-1";

pub const STARS_BRIDGE: &str = "stars1bridge";
pub const STARS_PROXY: &str = "stars1proxy";
pub const JUNO_BRIDGE: &str = "juno1bridge";
pub const OSMO_BRIDGE: &str = "osmo1bridge";

/// The collection minted on Stargaze by [`NetworkConfig`].
pub const COLLECTION: &str = "stars1collection";
pub const TOKEN_ID: &str = "7";

pub fn chain_id(chain_id: &str) -> ChainId {
    chain_id.parse().expect("valid chain id")
}

/// Returns a valid bech32 account address under `prefix`.
pub fn dummy_address(prefix: &str, seed: u8) -> String {
    bech32::encode(prefix, [seed; 20])
}

/// The owner of [`COLLECTION`] token [`TOKEN_ID`].
pub fn dummy_owner() -> String {
    dummy_address("stars", 1)
}

pub fn dummy_endpoint(chain: &str, bridge: &str, channel: u64) -> ChannelEndpoint {
    ChannelEndpoint::new(
        chain_id(chain),
        format!("wasm.{bridge}").parse().expect("valid port"),
        format!("channel-{channel}").parse().expect("valid channel"),
    )
}

/// Stargaze `channel-207` <-> Juno `channel-93`, and Osmosis `channel-12`
/// <-> Stargaze `channel-230`.
pub fn dummy_connections() -> Vec<NftConnection> {
    vec![
        NftConnection::new(
            dummy_endpoint(STARGAZE, STARS_BRIDGE, 207),
            dummy_endpoint(JUNO, JUNO_BRIDGE, 93),
        ),
        NftConnection::new(
            dummy_endpoint(OSMOSIS, OSMO_BRIDGE, 12),
            dummy_endpoint(STARGAZE, STARS_BRIDGE, 230),
        ),
    ]
}

fn chain_info(chain: &str, pretty_name: &str, prefix: &str) -> ChainInfo {
    ChainInfo {
        chain_id: chain_id(chain),
        pretty_name: pretty_name.to_string(),
        bech32_prefix: prefix.to_string(),
    }
}

fn asset(symbol: &str) -> Option<AssetInfo> {
    Some(AssetInfo {
        symbol: symbol.to_string(),
        logo_uri: Some(format!("https://assets.example/{}.png", symbol.to_lowercase())),
    })
}

pub fn dummy_directory() -> MockDirectory {
    MockDirectory::default()
        .with_chain(chain_info(STARGAZE, "Stargaze", "stars"), asset("STARS"))
        .with_chain(chain_info(JUNO, "Juno", "juno"), asset("JUNO"))
        .with_chain(chain_info(OSMOSIS, "Osmosis", "osmo"), None)
}

pub fn dummy_topology() -> ChannelTopology {
    ChannelTopology::new(dummy_connections(), Arc::new(dummy_directory()))
}

/// Configuration of the three-chain [`MockNetwork`] used in tests.
#[derive(TypedBuilder, Debug)]
#[builder(build_method(into = MockNetwork))]
pub struct NetworkConfig {
    /// Outgoing proxy guarding the Stargaze bridge.
    #[builder(default, setter(strip_option, into))]
    pub stargaze_proxy: Option<String>,
    /// Mints [`COLLECTION`] token [`TOKEN_ID`] to [`dummy_owner`].
    #[builder(default = true)]
    pub mint_collection: bool,
}

impl From<NetworkConfig> for MockNetwork {
    fn from(config: NetworkConfig) -> Self {
        let stargaze = MockChain::new(chain_id(STARGAZE), "stars")
            .with_bridge(STARS_BRIDGE, config.stargaze_proxy.as_deref());
        if config.mint_collection {
            stargaze.mint(COLLECTION, TOKEN_ID, &dummy_owner());
        }

        MockNetwork::new(Arc::new(dummy_topology()))
            .with_chain(stargaze)
            .with_chain(MockChain::new(chain_id(JUNO), "juno").with_bridge(JUNO_BRIDGE, None))
            .with_chain(MockChain::new(chain_id(OSMOSIS), "osmo").with_bridge(OSMO_BRIDGE, None))
    }
}

/// Configuration of the `TransferRequest` type for building dummy requests.
/// Defaults to sending the minted collection token from Stargaze to Juno.
#[derive(TypedBuilder, Debug)]
#[builder(build_method(into = TransferRequest))]
pub struct TransferRequestConfig {
    #[builder(default = COLLECTION.to_string(), setter(into))]
    pub nft_contract: String,
    #[builder(default = TOKEN_ID.to_string(), setter(into))]
    pub token_id: String,
    #[builder(default = dummy_owner(), setter(into))]
    pub sender: String,
    #[builder(default = chain_id(STARGAZE))]
    pub source_chain: ChainId,
    #[builder(default = chain_id(JUNO))]
    pub dest_chain: ChainId,
    #[builder(default, setter(strip_option))]
    pub selected_channel: Option<ChannelEndpoint>,
    #[builder(default = dummy_address("juno", 2), setter(into))]
    pub receiver: String,
}

impl From<TransferRequestConfig> for TransferRequest {
    fn from(config: TransferRequestConfig) -> Self {
        TransferRequest {
            nft_contract: config.nft_contract,
            token_id: config.token_id,
            sender: config.sender,
            source_chain: config.source_chain,
            dest_chain: config.dest_chain,
            selected_channel: config.selected_channel,
            receiver: config.receiver,
        }
    }
}

/// Wires a [`TransferContext`] to a [`MockNetwork`], signing on `signer_chain`.
#[derive(TypedBuilder)]
#[builder(build_method(into = TransferContext))]
pub struct TransferContextConfig {
    pub network: Arc<MockNetwork>,
    #[builder(default = chain_id(STARGAZE))]
    pub signer_chain: ChainId,
    #[builder(default)]
    pub config: TransferConfig,
}

impl From<TransferContextConfig> for TransferContext {
    fn from(config: TransferContextConfig) -> Self {
        let signer: Arc<dyn Signer> = config
            .network
            .chain(&config.signer_chain)
            .expect("signer chain is part of the network");
        TransferContext {
            signer,
            topology: config.network.topology().clone(),
            clients: config.network,
            config: config.config,
        }
    }
}
