//! Errors raised by the chain and relay collaborators.
use astral_types::error::TransferError;
use astral_types::identifiers::ChainId;
use displaydoc::Display;

/// Failures reported by a [`Signer`](crate::context::Signer) or
/// [`ChainQueryClient`](crate::context::ChainQueryClient).
#[derive(Debug, Display)]
pub enum ClientError {
    /// query to `{contract}` failed: `{description}`
    QueryFailed {
        contract: String,
        description: String,
    },
    /// execution on `{contract}` failed: `{description}`
    ExecuteFailed {
        contract: String,
        description: String,
    },
    /// unexpected response from `{contract}`: `{description}`
    InvalidResponse {
        contract: String,
        description: String,
    },
    /// failed to encode message: `{description}`
    FailedToEncode { description: String },
    /// no query client configured for chain `{0}`
    MissingClient(ChainId),
}

impl std::error::Error for ClientError {}

impl From<ClientError> for TransferError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::MissingClient(chain_id) => TransferError::UnknownChain(chain_id),
            err => TransferError::QueryFailed {
                description: err.to_string(),
            },
        }
    }
}

/// Failures of the external relay library.
#[derive(Debug, Display)]
pub enum RelayError {
    /// failed to open a signing session on `{chain_id}`: `{description}`
    SessionFailed {
        chain_id: ChainId,
        description: String,
    },
    /// failed to build the relay link: `{description}`
    LinkFailed { description: String },
    /// relaying failed: `{description}`
    RelayFailed { description: String },
    /// failed to inspect pending packets: `{description}`
    QueryFailed { description: String },
}

impl std::error::Error for RelayError {}

/// Failures while loading configuration.
#[derive(Debug, Display)]
pub enum ConfigError {
    /// invalid configuration json: `{description}`
    InvalidJson { description: String },
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson {
            description: err.to_string(),
        }
    }
}
