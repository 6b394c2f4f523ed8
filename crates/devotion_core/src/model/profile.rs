//! Per-user profile record consulted for admin privilege.

use serde::{Deserialize, Serialize};

/// Role stored on a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Reader,
    /// Any other stored value; never grants admin.
    Other(String),
}

impl Role {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "admin" => Self::Admin,
            "reader" => Self::Reader,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Reader => "reader",
            Self::Other(value) => value.as_str(),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Profile row keyed by the identity provider's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub role: Role,
}
