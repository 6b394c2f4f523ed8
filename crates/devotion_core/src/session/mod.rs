//! Admin session state over an external identity provider.
//!
//! # Responsibility
//! - Define the identity provider seam (`IdentityProvider`).
//! - Own the one session value views observe, and its change feed.
//!
//! # Invariants
//! - Only `restore`, `sign_in` and `sign_out` mutate session state.
//! - A failed role lookup never grants admin.

pub mod identity;
pub mod state;

pub use identity::{AuthError, AuthUser, IdentityProvider, LoginForm};
pub use state::{Session, SessionState};
