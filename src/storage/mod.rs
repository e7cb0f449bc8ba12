pub mod file;

pub use file::FileSessionStore;

use crate::error::Result;
use crate::state::User;
use serde::{Deserialize, Serialize};

/// What survives between runs: the bearer token and who it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
}

/// Persistence for the signed-in session.
///
/// Implementations must preserve:
/// - Atomic writes (a crash never leaves a half-written session)
/// - `clear` is idempotent
pub trait SessionStore {
    /// Load the persisted session. `None` when nobody is signed in.
    fn load(&self) -> Result<Option<StoredSession>>;

    /// Persist the session, replacing any previous one.
    fn save(&mut self, session: &StoredSession) -> Result<()>;

    /// Remove the persisted session.
    fn clear(&mut self) -> Result<()>;
}

/// In-memory store, used when nothing should touch the filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Option<StoredSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        MemorySessionStore { session: None }
    }

    pub fn with_session(session: StoredSession) -> Self {
        MemorySessionStore {
            session: Some(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.session.clone())
    }

    fn save(&mut self, session: &StoredSession) -> Result<()> {
        self.session = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.session = None;
        Ok(())
    }
}
