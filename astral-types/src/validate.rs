use subtle_encoding::bech32;

use crate::error::IdentifierError as Error;
use crate::identifiers::ChannelId;

const VALID_SPECIAL_CHARS: &str = "._+-#[]<>";

/// Checks if the identifier only contains valid characters as specified in the
/// [`ICS-24`](https://github.com/cosmos/ibc/tree/main/spec/core/ics-024-host-requirements#paths-identifiers-separators)]
/// spec.
pub fn validate_identifier_chars(id: &str) -> Result<(), Error> {
    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || VALID_SPECIAL_CHARS.contains(c))
    {
        return Err(Error::InvalidCharacter(id.into()));
    }

    Ok(())
}

/// Checks if the identifier forms a valid identifier with the given min/max length.
pub fn validate_identifier_length(id: &str, min: u64, max: u64) -> Result<(), Error> {
    // Make sure min is at least one so we reject empty identifiers.
    let min = min.max(1);
    let length = id.len() as u64;
    if (min..=max).contains(&length) {
        Ok(())
    } else {
        Err(Error::InvalidLength {
            actual: id.into(),
            min,
            max,
        })
    }
}

/// Checks if the identifier is a valid named u64 index: {name}-{u64}.
/// Example: "channel-0", "channel-100".
pub fn validate_named_u64_index(id: &str, name: &str) -> Result<(), Error> {
    let number_s = id
        .strip_prefix(name)
        .ok_or_else(|| Error::InvalidPrefix(id.into()))?
        .strip_prefix('-')
        .ok_or_else(|| Error::InvalidPrefix(id.into()))?;

    if number_s.starts_with('0') && number_s.len() > 1 {
        return Err(Error::InvalidPrefix(id.into()));
    }

    _ = number_s
        .parse::<u64>()
        .map_err(|_| Error::InvalidPrefix(id.into()))?;

    Ok(())
}

/// Default validator function for Port identifiers.
///
/// A valid port identifier must be between 2-128 characters.
pub fn validate_port_identifier(id: &str) -> Result<(), Error> {
    validate_identifier_chars(id)?;
    validate_identifier_length(id, 2, 128)
}

/// Default validator function for Channel identifiers.
///
/// A valid channel identifier must be between 8-64 characters.
pub fn validate_channel_identifier(id: &str) -> Result<(), Error> {
    validate_identifier_chars(id)?;
    validate_identifier_length(id, 8, 64)?;
    validate_named_u64_index(id, ChannelId::prefix())?;
    Ok(())
}

/// Default validator function for Chain identifiers.
pub fn validate_chain_identifier(id: &str) -> Result<(), Error> {
    validate_identifier_chars(id)?;
    validate_identifier_length(id, 1, 64)
}

/// Checks that `address` is a well-formed bech32 account address whose
/// human-readable part is `prefix`.
pub fn validate_bech32_address(address: &str, prefix: &str) -> Result<(), Error> {
    let (hrp, _) = bech32::decode(address).map_err(|e| Error::FailedToParse {
        value: address.into(),
        description: e.to_string(),
    })?;

    if hrp != prefix {
        return Err(Error::MismatchedPrefix {
            expected: prefix.into(),
            actual: hrp,
        });
    }

    Ok(())
}

/// Returns the human-readable part of a bech32 address, if it decodes.
pub fn bech32_prefix(address: &str) -> Option<String> {
    bech32::decode(address).ok().map(|(hrp, _)| hrp)
}
