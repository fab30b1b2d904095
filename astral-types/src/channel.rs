//! Defines the bridge channel endpoints and the statically configured
//! connections between them.
use core::fmt::{Display, Error as FmtError, Formatter};

use serde::{Deserialize, Serialize};

use crate::class::TracePrefix;
use crate::identifiers::{ChainId, ChannelId, PortId};

/// One side of a bridge connection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelEndpoint {
    pub chain_id: ChainId,
    pub port: PortId,
    pub channel: ChannelId,
}

impl ChannelEndpoint {
    pub fn new(chain_id: ChainId, port: PortId, channel: ChannelId) -> Self {
        Self {
            chain_id,
            port,
            channel,
        }
    }

    /// Address of the bridge contract bound to this endpoint's port, if any.
    pub fn bridge_address(&self) -> Option<&str> {
        self.port.contract_address()
    }

    pub fn trace_prefix(&self) -> TracePrefix {
        TracePrefix::from(self)
    }

    /// Returns true if this endpoint is the hop recorded by `prefix`.
    pub fn matches(&self, prefix: &TracePrefix) -> bool {
        self.port == prefix.port_id && self.channel == prefix.channel_id
    }
}

impl Display for ChannelEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}:{}/{}", self.chain_id, self.port, self.channel)
    }
}

/// Label of an endpoint within a [`NftConnection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointLabel {
    ChannelA,
    ChannelB,
}

impl EndpointLabel {
    pub fn opposite(self) -> Self {
        match self {
            Self::ChannelA => Self::ChannelB,
            Self::ChannelB => Self::ChannelA,
        }
    }
}

/// A bridge connection between two chains, as configured for the frontend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftConnection {
    pub channel_a: ChannelEndpoint,
    pub channel_b: ChannelEndpoint,
}

impl NftConnection {
    pub fn new(channel_a: ChannelEndpoint, channel_b: ChannelEndpoint) -> Self {
        Self {
            channel_a,
            channel_b,
        }
    }

    pub fn endpoint(&self, label: EndpointLabel) -> &ChannelEndpoint {
        match label {
            EndpointLabel::ChannelA => &self.channel_a,
            EndpointLabel::ChannelB => &self.channel_b,
        }
    }

    pub fn endpoints(&self) -> [(EndpointLabel, &ChannelEndpoint); 2] {
        [
            (EndpointLabel::ChannelA, &self.channel_a),
            (EndpointLabel::ChannelB, &self.channel_b),
        ]
    }

    /// Label of the side whose endpoint equals `endpoint`.
    pub fn label_of(&self, endpoint: &ChannelEndpoint) -> Option<EndpointLabel> {
        self.endpoints()
            .into_iter()
            .find(|(_, candidate)| *candidate == endpoint)
            .map(|(label, _)| label)
    }

    /// Label of the side on `chain_id`, if the connection touches that chain.
    pub fn label_on_chain(&self, chain_id: &ChainId) -> Option<EndpointLabel> {
        self.endpoints()
            .into_iter()
            .find(|(_, candidate)| &candidate.chain_id == chain_id)
            .map(|(label, _)| label)
    }

    /// Returns true if the connection links `a` and `b` in either direction.
    pub fn connects(&self, a: &ChainId, b: &ChainId) -> bool {
        (&self.channel_a.chain_id == a && &self.channel_b.chain_id == b)
            || (&self.channel_a.chain_id == b && &self.channel_b.chain_id == a)
    }
}
