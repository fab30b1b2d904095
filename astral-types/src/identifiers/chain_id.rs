use core::fmt::{Display, Error as FmtError, Formatter};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;
use crate::validate::validate_chain_identifier;

/// Defines the domain type for chain identifiers, e.g. `stargaze-1`.
///
/// Only the ICS-24 character set and a 1-64 length are enforced; the
/// `{chain name}-{revision number}` convention is common but not required.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    /// Creates a new `ChainId` with the given chain identifier.
    ///
    /// ```
    /// use astral_types::identifiers::ChainId;
    ///
    /// let id = ChainId::new("stargaze-1").unwrap();
    /// assert_eq!(id.as_str(), "stargaze-1");
    /// assert!(ChainId::new("").is_err());
    /// ```
    pub fn new(chain_id: &str) -> Result<Self, IdentifierError> {
        Self::from_str(chain_id)
    }

    /// Get a reference to the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChainId {
    type Err = IdentifierError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        validate_chain_identifier(id).map(|_| Self(id.to_string()))
    }
}

impl TryFrom<String> for ChainId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<ChainId> for String {
    fn from(chain_id: ChainId) -> String {
        chain_id.0
    }
}

impl Display for ChainId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ChainId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
