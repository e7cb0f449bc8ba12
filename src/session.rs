//! Signed-in session context.
//!
//! Lifecycle: `Session::hydrate` restores the persisted session at startup,
//! `establish` records a fresh login, `logout` and `expire` clear memory and
//! the persisted copy together.

use crate::error::{Error, Result};
use crate::state::User;
use crate::storage::{SessionStore, StoredSession};

/// Receives the "go to login" signal when the server rejects the session.
pub trait Navigator {
    fn redirect_to_login(&mut self);
}

/// Navigator that only logs; used when no front end is attached.
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_login(&mut self) {
        tracing::info!("login required");
    }
}

pub struct Session {
    current: Option<StoredSession>,
    store: Box<dyn SessionStore>,
    navigator: Box<dyn Navigator>,
}

impl Session {
    /// Restore whatever the store holds.
    pub fn hydrate(store: Box<dyn SessionStore>, navigator: Box<dyn Navigator>) -> Result<Self> {
        let current = store.load()?;
        if let Some(s) = &current {
            tracing::debug!(user_id = s.user.id, "session restored");
        }
        Ok(Session {
            current,
            store,
            navigator,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// The signed-in user or `NotLoggedIn`.
    pub fn require_user(&self) -> Result<&User> {
        self.user().ok_or(Error::NotLoggedIn)
    }

    /// Record a successful login in memory and on disk.
    pub fn establish(&mut self, token: String, user: User) -> Result<()> {
        let session = StoredSession { token, user };
        self.store.save(&session)?;
        tracing::info!(user_id = session.user.id, "signed in");
        self.current = Some(session);
        Ok(())
    }

    /// Explicit sign-out.
    pub fn logout(&mut self) -> Result<()> {
        self.current = None;
        self.store.clear()
    }

    /// Server rejected the token. Clears credentials and redirects to login,
    /// but only for the first rejection: once the session is gone further
    /// 401s have nothing to clear and do not redirect again.
    ///
    /// Returns whether a redirect was issued.
    pub fn expire(&mut self) -> bool {
        if self.current.take().is_none() {
            return false;
        }
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
        tracing::warn!("session expired");
        self.navigator.redirect_to_login();
        true
    }
}
