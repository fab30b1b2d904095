//! The Astral interchain NFT transfer orchestrator.
//!
//! Plans a transfer, drives it through the [`TransferExecutor`] state machine,
//! confirms receipt on the destination chain and, when no relayer picks the
//! packet up, coordinates a self-relay. All chain access goes through the
//! collaborator traits in [`context`].
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

pub mod cache;
pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod handler;
pub mod msgs;
pub mod planner;
pub mod poller;
pub mod provenance;
pub mod query;
pub mod relay;
pub mod topology;

#[cfg(test)]
mod testing;

pub use cache::CachedDirectory;
pub use cancel::CancellationToken;
pub use config::TransferConfig;
pub use executor::{TransferContext, TransferExecutor};
pub use planner::{Route, TransferPlan, TransferPlanner};
pub use poller::{ReceiptConfirmationPoller, ReceiptOutcome};
pub use provenance::reconstruct_provenance;
pub use relay::{RelayOutcome, SelfRelayCoordinator};
pub use topology::ChannelTopology;

/// Re-exports the Astral transfer domain types.
pub mod types {
    #[doc(inline)]
    pub use astral_types::*;
}
