//! Defines the transfer state machine.
//!
//! [`TransferView::apply`] is a pure transition function: it never performs
//! side effects, it only folds an event produced by the executor, the receipt
//! poller or the self-relay coordinator into the state shown to the UI.
use core::fmt::{Display, Error as FmtError, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::request::{TransferStrategy, TxnKind, TxnRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request was rejected before any transaction was submitted.
    Rejected,
    TransactionFailed,
    OwnershipUnconfirmed,
    SelfRelaySetupFailed,
    SelfRelayFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum TransferState {
    Setup,
    Approving,
    Sending,
    AwaitingReceipt,
    RequiresSelfRelay,
    Complete,
    Error(FailureKind),
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error(_))
    }
}

impl Display for TransferState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Approving => write!(f, "approving"),
            Self::Sending => write!(f, "sending"),
            Self::AwaitingReceipt => write!(f, "awaiting_receipt"),
            Self::RequiresSelfRelay => write!(f, "requires_self_relay"),
            Self::Complete => write!(f, "complete"),
            Self::Error(kind) => write!(f, "error({kind:?})"),
        }
    }
}

/// Inputs of the state machine.
#[derive(Clone, Debug, PartialEq)]
pub enum TransferEvent {
    Submit(TransferStrategy),
    /// Planning failed; nothing was submitted.
    PlanRejected {
        description: String,
    },
    ApproveSucceeded(TxnRecord),
    ApproveFailed(TxnRecord),
    SendSucceeded {
        record: TxnRecord,
        next_url: Option<String>,
    },
    SendFailed(TxnRecord),
    ReceiptConfirmed {
        next_url: String,
    },
    /// The destination contract never appeared within the poll budget.
    ContractNotFound {
        class_id: String,
    },
    OwnershipUnconfirmed {
        contract: String,
        token_id: String,
    },
    RelaySetupFailed {
        description: String,
    },
    RelayFailed {
        description: String,
    },
    RelayCompleted {
        next_url: String,
    },
    /// Receipt polling was cancelled before the outcome was known.
    Dismissed,
    Retry,
}

impl TransferEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::PlanRejected { .. } => "plan_rejected",
            Self::ApproveSucceeded(_) => "approve_succeeded",
            Self::ApproveFailed(_) => "approve_failed",
            Self::SendSucceeded { .. } => "send_succeeded",
            Self::SendFailed(_) => "send_failed",
            Self::ReceiptConfirmed { .. } => "receipt_confirmed",
            Self::ContractNotFound { .. } => "contract_not_found",
            Self::OwnershipUnconfirmed { .. } => "ownership_unconfirmed",
            Self::RelaySetupFailed { .. } => "relay_setup_failed",
            Self::RelayFailed { .. } => "relay_failed",
            Self::RelayCompleted { .. } => "relay_completed",
            Self::Dismissed => "dismissed",
            Self::Retry => "retry",
        }
    }
}

/// The state object published to the UI on every transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferView {
    pub view: TransferState,
    pub strategy: Option<TransferStrategy>,
    pub txns: Vec<TxnRecord>,
    pub errors: Vec<String>,
    pub can_self_relay: bool,
    pub next_url: Option<String>,
}

impl Default for TransferView {
    fn default() -> Self {
        Self {
            view: TransferState::Setup,
            strategy: None,
            txns: Vec::new(),
            errors: Vec::new(),
            can_self_relay: false,
            next_url: None,
        }
    }
}

impl TransferView {
    /// Returns true if a self-relay may be started from the current state.
    pub fn accepts_self_relay(&self) -> bool {
        match self.view {
            TransferState::RequiresSelfRelay => true,
            TransferState::Error(_) => self.can_self_relay,
            _ => false,
        }
    }

    pub fn txns_of(&self, kind: TxnKind) -> impl Iterator<Item = &TxnRecord> {
        self.txns.iter().filter(move |txn| txn.kind == kind)
    }

    /// Folds `event` into the view, returning the next view.
    pub fn apply(&self, event: TransferEvent) -> Result<Self, TransferError> {
        use TransferState as S;

        let mut next = self.clone();
        match (self.view, event) {
            (S::Setup, TransferEvent::Submit(strategy)) => {
                next.strategy = Some(strategy);
                next.errors.clear();
                next.view = if strategy.requires_approval() {
                    S::Approving
                } else {
                    S::Sending
                };
            }
            (S::Setup, TransferEvent::PlanRejected { description }) => {
                next.errors.push(description);
                next.view = S::Error(FailureKind::Rejected);
            }
            (S::Approving, TransferEvent::ApproveSucceeded(record)) => {
                next.txns.push(record);
                next.view = S::Sending;
            }
            (S::Approving, TransferEvent::ApproveFailed(record))
            | (S::Sending, TransferEvent::SendFailed(record)) => {
                next.errors.push(
                    TransferError::TransactionFailed {
                        kind: record.kind,
                        description: record.error.clone().unwrap_or_default(),
                    }
                    .to_string(),
                );
                next.txns.push(record);
                next.view = S::Error(FailureKind::TransactionFailed);
            }
            (S::Sending, TransferEvent::SendSucceeded { record, next_url }) => {
                next.txns.push(record);
                if self.strategy.map_or(false, |s| s.is_cross_chain()) {
                    next.view = S::AwaitingReceipt;
                } else {
                    next.next_url = next_url;
                    next.view = S::Complete;
                }
            }
            (S::AwaitingReceipt, TransferEvent::ReceiptConfirmed { next_url }) => {
                next.next_url = Some(next_url);
                next.view = S::Complete;
            }
            (S::AwaitingReceipt, TransferEvent::ContractNotFound { class_id }) => {
                next.errors
                    .push(TransferError::AmbiguousOutcome { class_id }.to_string());
                next.can_self_relay = true;
                next.view = S::RequiresSelfRelay;
            }
            (S::AwaitingReceipt, TransferEvent::OwnershipUnconfirmed { contract, token_id }) => {
                next.errors
                    .push(TransferError::OwnershipUnconfirmed { contract, token_id }.to_string());
                next.view = S::Error(FailureKind::OwnershipUnconfirmed);
            }
            // submitted txns stay on record
            (S::AwaitingReceipt, TransferEvent::Dismissed) => {
                next.view = S::Setup;
                next.strategy = None;
                next.can_self_relay = false;
                next.next_url = None;
            }
            (_, TransferEvent::RelayCompleted { next_url }) if self.accepts_self_relay() => {
                next.next_url = Some(next_url);
                next.can_self_relay = false;
                next.view = S::Complete;
            }
            (_, TransferEvent::RelaySetupFailed { description }) if self.accepts_self_relay() => {
                next.errors
                    .push(TransferError::SelfRelaySetupFailed { description }.to_string());
                next.view = S::Error(FailureKind::SelfRelaySetupFailed);
            }
            (_, TransferEvent::RelayFailed { description }) if self.accepts_self_relay() => {
                next.errors
                    .push(TransferError::SelfRelayFailed { description }.to_string());
                next.view = S::Error(FailureKind::SelfRelayFailed);
            }
            (S::Error(_), TransferEvent::Retry) => {
                next = Self::default();
            }
            (state, event) => {
                return Err(TransferError::InvalidTransition {
                    state: state.to_string(),
                    event: event.name().to_string(),
                })
            }
        }

        Ok(next)
    }
}
