//! Observable admin session.

use crate::feed::{ChangeFeed, Subscription};
use crate::repo::profile_repo::ProfileRepository;
use crate::session::identity::{AuthError, AuthUser, IdentityProvider, LoginForm};
use log::{error, info, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Snapshot of the session as views see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub is_admin: bool,
    /// True until the provider's initial session has been resolved.
    pub loading: bool,
}

impl SessionState {
    pub fn loading() -> Self {
        Self {
            user: None,
            is_admin: false,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            is_admin: false,
            loading: false,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

/// The one session value shared by all views.
///
/// Starts in the `loading` state; call `restore` with whatever session the
/// provider persisted, or `sign_in` directly.
pub struct Session<P: IdentityProvider, R: ProfileRepository> {
    provider: P,
    profiles: R,
    state: Mutex<SessionState>,
    feed: ChangeFeed<SessionState>,
}

impl<P: IdentityProvider, R: ProfileRepository> Session<P, R> {
    pub fn new(provider: P, profiles: R) -> Self {
        Self {
            provider,
            profiles,
            state: Mutex::new(SessionState::loading()),
            feed: ChangeFeed::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn is_admin(&self) -> bool {
        self.lock_state().is_admin
    }

    /// Receives the current state immediately, then every change.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.feed.subscribe_with_initial(&self.state(), listener)
    }

    /// Resolves the provider-persisted session (or its absence) on startup.
    pub fn restore(&self, user: Option<AuthUser>) -> SessionState {
        let is_admin = user.as_ref().is_some_and(|user| self.resolve_admin(user));
        self.replace(SessionState {
            user,
            is_admin,
            loading: false,
        })
    }

    /// Signs in through the provider, then checks the stored role.
    ///
    /// # Errors
    /// - `MissingCredentials` for empty input; the provider is not called.
    /// - Any provider error, with the session left unchanged.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<SessionState, AuthError> {
        LoginForm::new(email, password).validate()?;

        let user = match self.provider.sign_in(email, password) {
            Ok(user) => user,
            Err(err) => {
                warn!("event=sign_in module=session status=error error={err}");
                return Err(err);
            }
        };

        let is_admin = self.resolve_admin(&user);
        info!(
            "event=sign_in module=session status=ok uid={} is_admin={}",
            user.uid, is_admin
        );
        Ok(self.replace(SessionState {
            user: Some(user),
            is_admin,
            loading: false,
        }))
    }

    /// Drops admin privilege first, then ends the provider session.
    ///
    /// When the provider fails the user stays signed in without admin.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        let demoted = SessionState {
            is_admin: false,
            ..self.state()
        };
        self.replace(demoted);

        if let Err(err) = self.provider.sign_out() {
            error!("event=sign_out module=session status=error error={err}");
            return Err(err);
        }
        info!("event=sign_out module=session status=ok");
        self.replace(SessionState::signed_out());
        Ok(())
    }

    fn resolve_admin(&self, user: &AuthUser) -> bool {
        match self.profiles.role_for(&user.uid) {
            Ok(Some(role)) => role.is_admin(),
            Ok(None) => false,
            Err(err) => {
                error!(
                    "event=role_lookup module=session status=error uid={} kind={} error={}",
                    user.uid,
                    err.kind().as_str(),
                    err
                );
                false
            }
        }
    }

    fn replace(&self, next: SessionState) -> SessionState {
        let changed = {
            let mut state = self.lock_state();
            let changed = *state != next;
            *state = next.clone();
            changed
        };
        if changed {
            self.feed.publish(&next);
        }
        next
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
