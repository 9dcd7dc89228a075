use common::{GuestToken, IdentityEvidence, UserId};
use serde::{Deserialize, Serialize};

/// The single identity a cart is bound to for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CartOwner {
    /// Cart of a registered user.
    User(UserId),
    /// Cart of an anonymous guest.
    Guest(GuestToken),
}

impl CartOwner {
    /// Returns the owning user, if any.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            CartOwner::User(id) => Some(*id),
            CartOwner::Guest(_) => None,
        }
    }

    /// Returns the guest token, if any.
    pub fn guest_token(&self) -> Option<&GuestToken> {
        match self {
            CartOwner::User(_) => None,
            CartOwner::Guest(token) => Some(token),
        }
    }

    /// Returns `"user"` or `"guest"`.
    pub fn kind(&self) -> &'static str {
        match self {
            CartOwner::User(_) => "user",
            CartOwner::Guest(_) => "guest",
        }
    }
}

impl From<IdentityEvidence> for CartOwner {
    fn from(evidence: IdentityEvidence) -> Self {
        match evidence {
            IdentityEvidence::User(id) => CartOwner::User(id),
            IdentityEvidence::Guest(token) => CartOwner::Guest(token),
        }
    }
}

impl From<&IdentityEvidence> for CartOwner {
    fn from(evidence: &IdentityEvidence) -> Self {
        evidence.clone().into()
    }
}

impl std::fmt::Display for CartOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartOwner::User(id) => write!(f, "user:{id}"),
            CartOwner::Guest(token) => write!(f, "guest:{token}"),
        }
    }
}
