//! Identity provider contract and login input validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when the login form is submitted with an empty field.
pub const LOGIN_MISSING_FIELDS_MESSAGE: &str = "Please enter both email and password";
/// Shown for any provider-side sign-in failure.
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid email or password. Please try again.";

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Please enter both email and password")]
    MissingCredentials,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Message for the login form; provider details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => LOGIN_MISSING_FIELDS_MESSAGE,
            Self::InvalidCredentials | Self::Unavailable(_) => LOGIN_FAILED_MESSAGE,
        }
    }
}

/// External credential service.
///
/// Implementations verify credentials and persist the provider-side session;
/// this crate only consumes the result.
pub trait IdentityProvider {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    fn sign_out(&self) -> Result<(), AuthError>;
}

/// Raw login form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Rejects empty fields before any provider round trip.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(())
    }
}
