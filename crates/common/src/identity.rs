//! Identity evidence carried by an inbound request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::UserId;

/// Rejected guest token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("guest token must not be empty")]
pub struct InvalidGuestToken;

/// Opaque, caller-stable identifier for an anonymous shopper.
///
/// The HTTP adapter issues these and keeps them stable across a guest's
/// session; the core only compares them for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuestToken(String);

impl GuestToken {
    /// Creates a guest token, rejecting empty or whitespace-only values.
    pub fn new(token: impl Into<String>) -> Result<Self, InvalidGuestToken> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(InvalidGuestToken);
        }
        Ok(Self(token))
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GuestToken {
    type Error = InvalidGuestToken;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GuestToken> for String {
    fn from(token: GuestToken) -> Self {
        token.0
    }
}

impl std::fmt::Display for GuestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is asking for a cart.
///
/// Exactly one kind of evidence is ever present; the adapter decides which
/// one applies and hands it to the core explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum IdentityEvidence {
    /// A registered user authenticated upstream.
    User(UserId),
    /// An anonymous shopper identified by a guest token.
    Guest(GuestToken),
}

impl IdentityEvidence {
    /// Returns the user id for authenticated evidence.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            IdentityEvidence::User(id) => Some(*id),
            IdentityEvidence::Guest(_) => None,
        }
    }

    /// Returns true for guest evidence.
    pub fn is_guest(&self) -> bool {
        matches!(self, IdentityEvidence::Guest(_))
    }
}

impl From<UserId> for IdentityEvidence {
    fn from(id: UserId) -> Self {
        IdentityEvidence::User(id)
    }
}

impl From<GuestToken> for IdentityEvidence {
    fn from(token: GuestToken) -> Self {
        IdentityEvidence::Guest(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_token_rejects_blank_values() {
        assert_eq!(GuestToken::new(""), Err(InvalidGuestToken));
        assert_eq!(GuestToken::new("   "), Err(InvalidGuestToken));
        assert_eq!(GuestToken::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn guest_token_deserialization_validates() {
        let ok: GuestToken = serde_json::from_str("\"tok-1\"").unwrap();
        assert_eq!(ok.as_str(), "tok-1");
        assert!(serde_json::from_str::<GuestToken>("\"\"").is_err());
    }

    #[test]
    fn evidence_accessors() {
        let user = UserId::generate();
        let evidence = IdentityEvidence::from(user);
        assert_eq!(evidence.user_id(), Some(user));
        assert!(!evidence.is_guest());

        let guest = IdentityEvidence::from(GuestToken::new("g").unwrap());
        assert_eq!(guest.user_id(), None);
        assert!(guest.is_guest());
    }
}
