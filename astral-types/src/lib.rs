//! Domain types of the Astral interchain NFT transfer orchestrator: ICS-24
//! identifiers, the [ICS-721](https://github.com/cosmos/ibc/blob/main/spec/app/ics-721-nft-transfer/README.md)
//! composite class-id codec, bridge topology types and the transfer state
//! machine.
#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(
    warnings,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]

pub mod chain;
pub mod channel;
pub mod class;
pub mod error;
pub mod identifiers;
pub mod provenance;
pub mod request;
pub mod state;
pub mod validate;

pub use chain::{AssetInfo, ChainInfo};
pub use channel::{ChannelEndpoint, EndpointLabel, NftConnection};
pub use class::{
    derive_next_class_id, join_class_id, parse_class_id, ClassId, PrefixedClassId, TraceHop,
    TracePath, TracePrefix,
};
pub use provenance::ProvenanceEntry;
pub use request::{TransferRequest, TransferStrategy, TxnKind, TxnRecord};
pub use state::{FailureKind, TransferEvent, TransferState, TransferView};

/// Delimiter between the segments of a composite class id.
pub const CLASS_ID_DELIMITER: char = '/';

/// Route prefix of the destination page shown once a transfer lands.
pub const NFT_ROUTE_PREFIX: &str = "/my-nfts";

/// Builds the navigation target for a token held by `contract`.
pub fn nft_url(contract: &str, token_id: &str) -> String {
    format!("{NFT_ROUTE_PREFIX}/{contract}/{token_id}")
}
