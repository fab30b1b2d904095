//! Drives one transfer attempt through the [`TransferView`] state machine and
//! publishes every transition to its subscribers.
use std::sync::Arc;

use astral_types::error::TransferError;
use astral_types::nft_url;
use astral_types::request::{TransferRequest, TransferStrategy, TxnKind};
use astral_types::state::{TransferEvent, TransferState, TransferView};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::config::TransferConfig;
use crate::context::{ChainClients, RelayBackend, Signer};
use crate::error::ClientError;
use crate::handler::{
    approve_txn, direct_send_txn, ibc_send_txn, proxy_send_txn, submit_txn, PreparedTxn,
};
use crate::planner::{Route, TransferPlan, TransferPlanner};
use crate::poller::{ReceiptConfirmationPoller, ReceiptOutcome};
use crate::relay::{RelayOutcome, SelfRelayCoordinator};
use crate::topology::ChannelTopology;

/// The collaborators shared by every transfer attempt.
#[derive(Clone)]
pub struct TransferContext {
    pub signer: Arc<dyn Signer>,
    pub clients: Arc<dyn ChainClients>,
    pub topology: Arc<ChannelTopology>,
    pub config: TransferConfig,
}

/// Executes a single [`TransferRequest`].
///
/// Recoverable failures end up in the published view as an error state with
/// a message; only calls made from the wrong state or against missing
/// configuration return `Err`.
pub struct TransferExecutor {
    ctx: TransferContext,
    request: TransferRequest,
    plan: Option<TransferPlan>,
    view: watch::Sender<TransferView>,
    cancel: CancellationToken,
}

impl TransferExecutor {
    pub fn new(ctx: TransferContext, request: TransferRequest) -> Self {
        let (view, _) = watch::channel(TransferView::default());
        Self {
            ctx,
            request,
            plan: None,
            view,
            cancel: CancellationToken::new(),
        }
    }

    pub fn request(&self) -> &TransferRequest {
        &self.request
    }

    pub fn plan(&self) -> Option<&TransferPlan> {
        self.plan.as_ref()
    }

    pub fn view(&self) -> TransferView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TransferView> {
        self.view.subscribe()
    }

    /// A handle that stops the running poll loop when cancelled, for example
    /// when the transfer modal is dismissed.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        info!(token_id = %self.request.token_id, "transfer cancelled");
        self.cancel.cancel();
    }

    /// Plans and submits the transfer, then waits for the destination chain to
    /// confirm receipt of cross-chain sends.
    pub async fn submit(&mut self) -> Result<TransferView, TransferError> {
        self.ensure_state(TransferState::Setup, "submit")?;
        self.cancel.reset();

        let planned = TransferPlanner::new(
            &self.ctx.topology,
            self.ctx.topology.directory().as_ref(),
            self.ctx.clients.as_ref(),
        )
        .plan(&self.request)
        .await;

        let plan = match planned {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "transfer rejected");
                self.transition(TransferEvent::PlanRejected {
                    description: e.to_string(),
                })?;
                return Ok(self.view());
            }
        };

        self.transition(TransferEvent::Submit(plan.strategy))?;
        self.plan = Some(plan.clone());

        match (plan.strategy, plan.route) {
            (TransferStrategy::DirectSend, _) => self.send_direct().await?,
            (TransferStrategy::BasicIbcSend, Some(route)) => self.send_ibc(&route).await?,
            (TransferStrategy::ApprovalGatedIbcSend, Some(route)) => {
                self.send_gated(&route).await?
            }
            (strategy, None) => {
                return Err(TransferError::InvalidTransition {
                    state: self.view().view.to_string(),
                    event: format!("submit({strategy})"),
                })
            }
        }

        if self.view.borrow().view == TransferState::AwaitingReceipt {
            self.await_receipt().await?;
        }

        Ok(self.view())
    }

    /// Relays the sent packet with the user's own sessions. Allowed once the
    /// receipt poller gave up on the destination contract.
    pub async fn self_relay(
        &mut self,
        backend: &dyn RelayBackend,
    ) -> Result<TransferView, TransferError> {
        let current = self.view();
        let route = match self.plan.as_ref().and_then(|plan| plan.route.clone()) {
            Some(route) if current.accepts_self_relay() => route,
            _ => {
                return Err(TransferError::InvalidTransition {
                    state: current.view.to_string(),
                    event: "self_relay".to_string(),
                })
            }
        };
        self.cancel.reset();

        let destination = self.ctx.clients.client_for(&route.destination.chain_id)?;
        info!(
            source = %route.source,
            destination = %route.destination,
            "starting self-relay"
        );

        let outcome = SelfRelayCoordinator::new(
            backend,
            destination.as_ref(),
            &route,
            &self.request.token_id,
            &self.ctx.config.self_relay,
            &self.cancel,
        )
        .start()
        .await;

        match outcome {
            RelayOutcome::Completed { contract, .. } => {
                self.transition(TransferEvent::RelayCompleted {
                    next_url: nft_url(&contract, &self.request.token_id),
                })?;
            }
            RelayOutcome::SetupFailed(description) => {
                self.transition(TransferEvent::RelaySetupFailed { description })?;
            }
            RelayOutcome::Failed(description) => {
                self.transition(TransferEvent::RelayFailed { description })?;
            }
            RelayOutcome::Cancelled => {}
        }

        Ok(self.view())
    }

    /// Starts over from a fresh setup view after a failure.
    pub fn retry(&mut self) -> Result<TransferView, TransferError> {
        self.transition(TransferEvent::Retry)?;
        self.plan = None;
        self.cancel.reset();
        Ok(self.view())
    }

    fn ensure_state(&self, expected: TransferState, event: &str) -> Result<(), TransferError> {
        let state = self.view.borrow().view;
        if state == expected {
            Ok(())
        } else {
            Err(TransferError::InvalidTransition {
                state: state.to_string(),
                event: event.to_string(),
            })
        }
    }

    fn transition(&mut self, event: TransferEvent) -> Result<(), TransferError> {
        let event_name = event.name();
        let next = self.view.borrow().apply(event)?;
        info!(
            event = event_name,
            state = %next.view,
            token_id = %self.request.token_id,
            "transfer state changed"
        );
        self.view.send_replace(next);
        Ok(())
    }

    async fn send_direct(&mut self) -> Result<(), TransferError> {
        let record = submit_txn(
            self.ctx.signer.as_ref(),
            &self.request.sender,
            &self.ctx.config,
            direct_send_txn(&self.request),
            TxnKind::Direct,
        )
        .await;

        if record.is_failed() {
            self.transition(TransferEvent::SendFailed(record))
        } else {
            let next_url = nft_url(&self.request.nft_contract, &self.request.token_id);
            self.transition(TransferEvent::SendSucceeded {
                record,
                next_url: Some(next_url),
            })
        }
    }

    async fn send_ibc(&mut self, route: &Route) -> Result<(), TransferError> {
        let prepared = ibc_send_txn(
            &self.request,
            route,
            &self.ctx.config,
            OffsetDateTime::now_utc(),
        );
        self.submit_send(prepared).await
    }

    async fn send_gated(&mut self, route: &Route) -> Result<(), TransferError> {
        let Some(proxy) = route.proxy.as_deref() else {
            return self.send_ibc(route).await;
        };

        let approval = submit_txn(
            self.ctx.signer.as_ref(),
            &self.request.sender,
            &self.ctx.config,
            approve_txn(&self.request, proxy),
            TxnKind::Approve,
        )
        .await;
        if approval.is_failed() {
            return self.transition(TransferEvent::ApproveFailed(approval));
        }
        self.transition(TransferEvent::ApproveSucceeded(approval))?;

        let prepared = proxy_send_txn(
            &self.request,
            route,
            proxy,
            &self.ctx.config,
            OffsetDateTime::now_utc(),
        );
        self.submit_send(prepared).await
    }

    async fn submit_send(
        &mut self,
        prepared: Result<PreparedTxn, ClientError>,
    ) -> Result<(), TransferError> {
        let record = submit_txn(
            self.ctx.signer.as_ref(),
            &self.request.sender,
            &self.ctx.config,
            prepared,
            TxnKind::Send,
        )
        .await;

        if record.is_failed() {
            self.transition(TransferEvent::SendFailed(record))
        } else {
            self.transition(TransferEvent::SendSucceeded {
                record,
                next_url: None,
            })
        }
    }

    async fn await_receipt(&mut self) -> Result<(), TransferError> {
        let Some(route) = self.plan.as_ref().and_then(|plan| plan.route.clone()) else {
            return Ok(());
        };
        let destination = self.ctx.clients.client_for(&route.destination.chain_id)?;

        let outcome = ReceiptConfirmationPoller::new(
            destination.as_ref(),
            &route.destination_bridge,
            &self.ctx.config.receipt,
            &self.cancel,
        )
        .confirm(&route.expected_class_id, &self.request.token_id)
        .await;

        match outcome {
            ReceiptOutcome::Confirmed { contract, .. } => {
                self.transition(TransferEvent::ReceiptConfirmed {
                    next_url: nft_url(&contract, &self.request.token_id),
                })
            }
            ReceiptOutcome::ContractNotFound { attempts } => {
                warn!(class_id = %route.expected_class_id, attempts, "destination contract not found");
                self.transition(TransferEvent::ContractNotFound {
                    class_id: route.expected_class_id.to_string(),
                })
            }
            ReceiptOutcome::OwnerNotConfirmed { contract, attempts } => {
                warn!(%contract, attempts, "destination owner not confirmed");
                self.transition(TransferEvent::OwnershipUnconfirmed {
                    contract,
                    token_id: self.request.token_id.clone(),
                })
            }
            ReceiptOutcome::Cancelled => {
                info!("receipt confirmation cancelled");
                self.plan = None;
                self.transition(TransferEvent::Dismissed)
            }
        }
    }
}
