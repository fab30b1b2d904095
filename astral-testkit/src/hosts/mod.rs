//! Simulated chains hosting cw721 collections and ICS-721 bridges.
mod mock_chain;
mod network;

pub use mock_chain::*;
pub use network::*;
