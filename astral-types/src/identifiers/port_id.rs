use core::fmt::{Display, Error as FmtError, Formatter};
use core::str::FromStr;

use derive_more::Into;
use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;
use crate::validate::validate_port_identifier;

/// Prefix of ports bound by a CosmWasm contract: `wasm.{contract address}`.
const WASM_PORT_PREFIX: &str = "wasm.";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Into, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortId(String);

impl PortId {
    pub fn new(id: String) -> Result<Self, IdentifierError> {
        Self::from_str(&id)
    }

    /// Builds the port bound by the contract at `address`.
    pub fn wasm(address: &str) -> Result<Self, IdentifierError> {
        Self::from_str(&format!("{WASM_PORT_PREFIX}{address}"))
    }

    /// Get this identifier as a borrowed `&str`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the port is bound by a contract and can therefore be
    /// driven with a contract-execution message.
    pub fn is_wasm(&self) -> bool {
        self.contract_address().is_some()
    }

    /// Address of the contract owning this port, for `wasm.{address}` ports.
    pub fn contract_address(&self) -> Option<&str> {
        self.0
            .strip_prefix(WASM_PORT_PREFIX)
            .filter(|address| !address.is_empty())
    }
}

/// This implementation provides a `to_string` method.
impl Display for PortId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PortId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_port_identifier(s).map(|_| Self(s.to_string()))
    }
}

impl TryFrom<String> for PortId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for PortId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
