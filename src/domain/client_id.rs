//! Type-safe client identifier.
//!
//! [`ClientId`] is a newtype wrapper around the caller-supplied string from
//! the connect path, so client identifiers cannot be confused with message
//! text or other strings.

use std::fmt;

use serde::Serialize;

use crate::error::RelayError;

/// Longest accepted identifier, in bytes.
pub const MAX_CLIENT_ID_LEN: usize = 128;

/// Identifier of a connected client.
///
/// Supplied by the client at connect time, never generated by the relay.
/// Unique among live connections: registering the same id again replaces
/// the earlier connection in [`super::ConnectionRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Validates and wraps a raw identifier.
    ///
    /// The identifier is kept exactly as supplied; `" a"` and `"a"` are
    /// different clients.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidClientId`] if the identifier is empty or
    /// blank, longer than [`MAX_CLIENT_ID_LEN`] bytes, or contains control
    /// characters.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        if raw.trim().is_empty() {
            return Err(RelayError::InvalidClientId(
                "must not be empty".to_string(),
            ));
        }
        if raw.len() > MAX_CLIENT_ID_LEN {
            return Err(RelayError::InvalidClientId(format!(
                "must be at most {MAX_CLIENT_ID_LEN} bytes"
            )));
        }
        if raw.chars().any(char::is_control) {
            return Err(RelayError::InvalidClientId(
                "must not contain control characters".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ClientId {
    type Error = RelayError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_id_verbatim() {
        let Ok(padded) = ClientId::parse(" client_a") else {
            panic!("valid id rejected");
        };
        let Ok(plain) = ClientId::parse("client_a") else {
            panic!("valid id rejected");
        };
        assert_eq!(padded.as_str(), " client_a");
        assert_eq!(format!("{plain}"), "client_a");
        assert_ne!(padded, plain);
    }

    #[test]
    fn empty_is_rejected() {
        assert!(ClientId::parse("").is_err());
        assert!(ClientId::parse("   ").is_err());
    }

    #[test]
    fn overlong_is_rejected() {
        let raw = "x".repeat(MAX_CLIENT_ID_LEN + 1);
        assert!(ClientId::parse(&raw).is_err());
        let raw = "x".repeat(MAX_CLIENT_ID_LEN);
        assert!(ClientId::parse(&raw).is_ok());
    }

    #[test]
    fn control_characters_are_rejected() {
        assert!(ClientId::parse("a\u{0}b").is_err());
        assert!(ClientId::parse("a\nb").is_err());
    }

    #[test]
    fn equal_strings_hash_equal() {
        use std::collections::HashMap;
        let Ok(a) = ClientId::parse("same") else {
            panic!("valid id rejected");
        };
        let Ok(b) = ClientId::try_from("same") else {
            panic!("valid id rejected");
        };
        let mut map = HashMap::new();
        map.insert(a, 1);
        map.insert(b, 2);
        assert_eq!(map.len(), 1);
    }
}
