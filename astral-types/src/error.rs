//! Defines the error types of the Astral transfer domain.
use displaydoc::Display;

use crate::identifiers::{ChainId, ChannelId, PortId};
use crate::request::TxnKind;

/// Errors that arise when parsing identifiers and addresses.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum IdentifierError {
    /// id `{actual}` has invalid length; must be between [`{min}`,`{max}`]
    InvalidLength { actual: String, min: u64, max: u64 },
    /// id `{0}` can only contain alphanumeric characters or `.`, `_`, `+`, `-`, `#`, - `[`, `]`, `<`, `>`
    InvalidCharacter(String),
    /// invalid prefix: `{0}`
    InvalidPrefix(String),
    /// mismatched address prefix: expected `{expected}`, actual `{actual}`
    MismatchedPrefix { expected: String, actual: String },
    /// failed to parse `{value}`: `{description}`
    FailedToParse { value: String, description: String },
}

impl std::error::Error for IdentifierError {}

/// Errors that arise when a composite class id does not parse.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum ClassIdError {
    /// empty class id
    Empty,
    /// empty segment at position `{pos}` in class id `{class_id}`
    EmptySegment { class_id: String, pos: usize },
    /// class id `{class_id}` ends with a `port/channel` pair instead of an origin address
    MissingOrigin { class_id: String },
    /// invalid port id at hop `{pos}`: `{validation_error}`
    InvalidPortId {
        pos: usize,
        validation_error: IdentifierError,
    },
    /// invalid channel id at hop `{pos}`: `{validation_error}`
    InvalidChannelId {
        pos: usize,
        validation_error: IdentifierError,
    },
    /// invalid origin `{origin}`
    InvalidOrigin { origin: String },
    /// origin hop must be the last hop, found at position `{pos}`
    MisplacedOrigin { pos: usize },
}

impl std::error::Error for ClassIdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self {
            Self::InvalidPortId {
                validation_error: e,
                ..
            }
            | Self::InvalidChannelId {
                validation_error: e,
                ..
            } => Some(e),
            _ => None,
        }
    }
}

/// The error taxonomy of a transfer attempt.
#[derive(Debug, Display)]
pub enum TransferError {
    /// invalid recipient `{address}` for chain `{chain_id}`: `{validation_error}`
    InvalidRecipient {
        address: String,
        chain_id: ChainId,
        validation_error: IdentifierError,
    },
    /// port `{port_id}` cannot be used for a contract-call send
    UnsupportedChannel { port_id: PortId },
    /// channel `{port_id}/{channel_id}` on chain `{chain_id}` is not part of any configured bridge
    UnknownChannel {
        chain_id: ChainId,
        port_id: PortId,
        channel_id: ChannelId,
    },
    /// channel `{channel_id}` does not connect `{source}` to `{destination}`
    MismatchedRoute {
        channel_id: ChannelId,
        source: ChainId,
        destination: ChainId,
    },
    /// no configured bridge connects `{source}` to `{destination}`
    NoRoute { source: ChainId, destination: ChainId },
    /// unknown chain `{0}`
    UnknownChain(ChainId),
    /// malformed class id: `{0}`
    MalformedClassId(ClassIdError),
    /// invalid identifier: `{0}`
    InvalidIdentifier(IdentifierError),
    /// `{kind}` transaction failed: `{description}`
    TransactionFailed { kind: TxnKind, description: String },
    /// no contract for class `{class_id}` appeared on the destination chain; the transfer may still have succeeded
    AmbiguousOutcome { class_id: String },
    /// contract `{contract}` never reported an owner for token `{token_id}`
    OwnershipUnconfirmed { contract: String, token_id: String },
    /// self-relay setup failed: `{description}`
    SelfRelaySetupFailed { description: String },
    /// self-relay failed: `{description}`
    SelfRelayFailed { description: String },
    /// query failed: `{description}`
    QueryFailed { description: String },
    /// invalid transition: cannot apply `{event}` in state `{state}`
    InvalidTransition { state: String, event: String },
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self {
            Self::InvalidRecipient {
                validation_error: e,
                ..
            } => Some(e),
            Self::MalformedClassId(e) => Some(e),
            Self::InvalidIdentifier(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ClassIdError> for TransferError {
    fn from(err: ClassIdError) -> Self {
        Self::MalformedClassId(err)
    }
}

impl From<IdentifierError> for TransferError {
    fn from(err: IdentifierError) -> Self {
        Self::InvalidIdentifier(err)
    }
}
