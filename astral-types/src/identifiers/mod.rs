//! Defines identifier types for chains, ports and channels.

mod chain_id;
mod channel_id;
mod port_id;

pub use chain_id::ChainId;
pub use channel_id::ChannelId;
pub use port_id::PortId;
