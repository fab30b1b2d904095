//! A scripted stand-in for the external relay library.
use core::time::Duration;
use std::sync::Arc;

use astral_transfer::context::{LinkSide, PendingPacket, RelayBackend, RelayLink, RelaySession};
use astral_transfer::error::RelayError;
use astral_transfer::types::channel::ChannelEndpoint;
use astral_transfer::types::identifiers::ChainId;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::fixtures::dummy_address;
use crate::hosts::MockNetwork;

/// Opens sessions on the chains of a [`MockNetwork`] and relays between them.
pub struct MockRelayBackend {
    network: Arc<MockNetwork>,
    relay_delay: Duration,
    failing_session: Option<ChainId>,
    failing_relay: Option<String>,
    sessions: Mutex<Vec<RelaySession>>,
}

impl MockRelayBackend {
    pub fn new(network: Arc<MockNetwork>) -> Self {
        Self {
            network,
            relay_delay: Duration::ZERO,
            failing_session: None,
            failing_relay: None,
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Time `relay_all` takes before packets land.
    pub fn with_relay_delay(mut self, delay: Duration) -> Self {
        self.relay_delay = delay;
        self
    }

    pub fn with_failing_session(mut self, chain_id: ChainId) -> Self {
        self.failing_session = Some(chain_id);
        self
    }

    pub fn with_failing_relay(mut self, description: &str) -> Self {
        self.failing_relay = Some(description.to_string());
        self
    }

    pub fn sessions(&self) -> Vec<RelaySession> {
        self.sessions.lock().clone()
    }
}

#[async_trait]
impl RelayBackend for MockRelayBackend {
    async fn open_session(&self, chain_id: &ChainId) -> Result<RelaySession, RelayError> {
        if self.failing_session.as_ref() == Some(chain_id) {
            return Err(RelayError::SessionFailed {
                chain_id: chain_id.clone(),
                description: "wallet refused to sign".to_string(),
            });
        }
        let chain = self
            .network
            .chain(chain_id)
            .ok_or_else(|| RelayError::SessionFailed {
                chain_id: chain_id.clone(),
                description: "chain is not reachable".to_string(),
            })?;

        let session = RelaySession {
            chain_id: chain_id.clone(),
            signer_address: dummy_address(chain.bech32_prefix(), 200),
        };
        self.sessions.lock().push(session.clone());
        Ok(session)
    }

    async fn link(
        &self,
        session_a: RelaySession,
        session_b: RelaySession,
        a: &ChannelEndpoint,
        b: &ChannelEndpoint,
    ) -> Result<Box<dyn RelayLink>, RelayError> {
        let opposite = self
            .network
            .topology()
            .opposite_hop(a)
            .map_err(|e| RelayError::LinkFailed {
                description: e.to_string(),
            })?;
        if &opposite != b || session_a.chain_id != a.chain_id || session_b.chain_id != b.chain_id {
            return Err(RelayError::LinkFailed {
                description: format!("{a} and {b} are not two ends of one connection"),
            });
        }

        Ok(Box::new(MockRelayLink {
            network: self.network.clone(),
            a: a.clone(),
            b: b.clone(),
            delay: self.relay_delay,
            failure: self.failing_relay.clone(),
        }))
    }
}

pub struct MockRelayLink {
    network: Arc<MockNetwork>,
    a: ChannelEndpoint,
    b: ChannelEndpoint,
    delay: Duration,
    failure: Option<String>,
}

impl MockRelayLink {
    fn endpoint(&self, side: LinkSide) -> &ChannelEndpoint {
        match side {
            LinkSide::A => &self.a,
            LinkSide::B => &self.b,
        }
    }
}

#[async_trait]
impl RelayLink for MockRelayLink {
    async fn relay_all(&self) -> Result<(), RelayError> {
        tokio::time::sleep(self.delay).await;
        if let Some(description) = &self.failure {
            return Err(RelayError::RelayFailed {
                description: description.clone(),
            });
        }
        let relayed = self.network.relay_packets(&self.a)? + self.network.relay_packets(&self.b)?;
        debug!(relayed, "mock relay finished");
        Ok(())
    }

    async fn pending_packets(&self, side: LinkSide) -> Result<Vec<PendingPacket>, RelayError> {
        let endpoint = self.endpoint(side);
        let chain = self
            .network
            .chain(&endpoint.chain_id)
            .ok_or_else(|| RelayError::QueryFailed {
                description: format!("no chain behind {endpoint}"),
            })?;
        Ok(chain
            .pending_outgoing(endpoint)
            .into_iter()
            .map(|packet| PendingPacket {
                sequence: packet.sequence,
            })
            .collect())
    }

    /// Acknowledgements are written and delivered together with the packet.
    async fn pending_acks(&self, _side: LinkSide) -> Result<Vec<PendingPacket>, RelayError> {
        Ok(Vec::new())
    }
}
