//! Relays a stalled transfer packet with the user's own signing sessions.
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::config::RelayPollConfig;
use crate::context::{ChainQueryClient, LinkSide, RelayBackend, RelayLink};
use crate::error::RelayError;
use crate::planner::Route;
use crate::query::{query_nft_contract, query_owner};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The destination contract reports an owner for the token.
    Completed { contract: String, owner: String },
    /// Opening a session or linking the chains failed.
    SetupFailed(String),
    Failed(String),
    Cancelled,
}

/// Drives one self-relay attempt over the route of a submitted transfer.
///
/// Relaying runs once, concurrently with a watch loop that logs the pending
/// queues and completes only when the destination chain reports an owner for
/// the token.
pub struct SelfRelayCoordinator<'a> {
    backend: &'a dyn RelayBackend,
    destination: &'a dyn ChainQueryClient,
    route: &'a Route,
    token_id: &'a str,
    config: &'a RelayPollConfig,
    cancel: &'a CancellationToken,
}

impl<'a> SelfRelayCoordinator<'a> {
    pub fn new(
        backend: &'a dyn RelayBackend,
        destination: &'a dyn ChainQueryClient,
        route: &'a Route,
        token_id: &'a str,
        config: &'a RelayPollConfig,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            backend,
            destination,
            route,
            token_id,
            config,
            cancel,
        }
    }

    pub async fn start(&self) -> RelayOutcome {
        let link = match self.cancel.run_until_cancelled(self.connect()).await {
            None => {
                info!("self-relay cancelled during setup");
                return RelayOutcome::Cancelled;
            }
            Some(Ok(link)) => link,
            Some(Err(e)) => {
                warn!(error = %e, "self-relay setup failed");
                return RelayOutcome::SetupFailed(e.to_string());
            }
        };

        let relay = link.relay_all();
        let watch = self.watch_delivery(link.as_ref());
        tokio::pin!(relay, watch);

        let mut relayed = false;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("self-relay cancelled");
                    return RelayOutcome::Cancelled;
                }
                result = &mut relay, if !relayed => {
                    relayed = true;
                    match result {
                        Ok(()) => info!("relayed pending packets"),
                        Err(e) => {
                            warn!(error = %e, "relaying failed");
                            return RelayOutcome::Failed(e.to_string());
                        }
                    }
                }
                outcome = &mut watch => return outcome,
            }
        }
    }

    async fn connect(&self) -> Result<Box<dyn RelayLink>, RelayError> {
        let source = &self.route.source;
        let destination = &self.route.destination;

        let session_a = self.backend.open_session(&source.chain_id).await?;
        let session_b = self.backend.open_session(&destination.chain_id).await?;
        info!(
            chain_a = %source.chain_id,
            chain_b = %destination.chain_id,
            "opened relay sessions"
        );

        self.backend
            .link(session_a, session_b, source, destination)
            .await
    }

    async fn watch_delivery(&self, link: &dyn RelayLink) -> RelayOutcome {
        let mut contract: Option<String> = None;
        let mut attempt: u32 = 0;

        loop {
            if let Some(max) = self.config.max_attempts {
                if attempt >= max {
                    return RelayOutcome::Failed(format!(
                        "token `{}` not delivered after {attempt} checks",
                        self.token_id
                    ));
                }
            }
            attempt += 1;

            match pending_count(link).await {
                Ok(pending) => debug!(attempt, pending, "pending relay queues"),
                Err(e) => warn!(attempt, error = %e, "failed to inspect relay queues"),
            }

            if contract.is_none() {
                let class_id = &self.route.expected_class_id;
                match query_nft_contract(self.destination, &self.route.destination_bridge, class_id)
                    .await
                {
                    Ok(found) => contract = found,
                    Err(e) => warn!(attempt, %class_id, error = %e, "nft_contract query failed"),
                }
            }

            if let Some(contract) = &contract {
                match query_owner(self.destination, contract, self.token_id).await {
                    Ok(Some(owner)) => {
                        info!(%contract, token_id = self.token_id, %owner, "self-relay delivered the token");
                        return RelayOutcome::Completed {
                            contract: contract.clone(),
                            owner,
                        };
                    }
                    Ok(None) => debug!(attempt, %contract, "owner not reported yet"),
                    Err(e) => warn!(attempt, %contract, error = %e, "owner_of query failed"),
                }
            }

            if !self.cancel.sleep(self.config.interval()).await {
                return RelayOutcome::Cancelled;
            }
        }
    }
}

/// Packets and acknowledgements still waiting on either side of the link.
async fn pending_count(link: &dyn RelayLink) -> Result<usize, RelayError> {
    let mut pending = 0;
    for side in [LinkSide::A, LinkSide::B] {
        pending += link.pending_packets(side).await?.len();
        pending += link.pending_acks(side).await?.len();
    }
    Ok(pending)
}
