//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionState` is the single place identity lives. The request pipeline
//! reads it before every call, the router reads it before every transition,
//! and only login/logout write it.
//!
//! DESIGN
//! ======
//! A session is either complete or absent: `Option<Session>` with four
//! required fields, so a token without a role cannot exist in memory. Writes
//! hold the lock across the persisted-mirror update so no reader sees the
//! store and memory disagree mid-swap.

pub mod store;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use self::store::CredentialStore;

// =============================================================================
// ROLE
// =============================================================================

/// Account role. Decides the home page and which course pages are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub const ALL: [Self; 2] = [Self::Student, Self::Teacher];

    /// Wire and storage form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }

    /// Landing page for a signed-in user of this role.
    #[must_use]
    pub fn home_path(self) -> &'static str {
        match self {
            Self::Student => "/student/home",
            Self::Teacher => "/teacher/home",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role `{0}` (expected `student` or `teacher`)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// An authenticated identity as issued by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token sent with every API call.
    pub token: String,
    /// Display name returned by the server.
    pub username: String,
    pub role: Role,
    /// Email the user signed in with; sent as `X-User-Email`.
    pub email: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("email", &self.email)
            .finish()
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Shared handle to the current session and its persisted mirror.
///
/// Cloning the handle is cheap; all clones observe the same session.
#[derive(Clone)]
pub struct SessionState {
    current: Arc<RwLock<Option<Session>>>,
    store: Arc<dyn CredentialStore>,
}

impl SessionState {
    /// Build the session from whatever the credential store holds.
    ///
    /// Missing, partial or unreadable entries hydrate as anonymous.
    pub fn hydrate(store: Arc<dyn CredentialStore>) -> Self {
        let current = store::load_session(store.as_ref());
        match &current {
            Some(session) => {
                tracing::info!(username = %session.username, role = %session.role, "session restored");
            }
            None => tracing::debug!("no stored session; starting anonymous"),
        }
        Self { current: Arc::new(RwLock::new(current)), store }
    }

    /// Clone of the current session, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Session> {
        self.with_session(|session| session.cloned())
    }

    /// Run `f` against the current session under the read lock.
    pub fn with_session<R>(&self, f: impl FnOnce(Option<&Session>) -> R) -> R {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.with_session(|session| session.is_some())
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.with_session(|session| session.map(|s| s.role))
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.with_session(|session| session.map(|s| s.token.clone()))
    }

    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.with_session(|session| session.map(|s| s.email.clone()))
    }

    /// Replace the whole session and persist it.
    ///
    /// A failed persist is logged; the in-memory session still takes effect
    /// and the store is left without a partial entry set.
    pub fn establish(&self, session: Session) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = store::save_session(self.store.as_ref(), &session) {
            tracing::warn!(error = %e, "failed to persist session; it will not survive a reload");
        }
        *guard = Some(session);
    }

    /// Drop the session and its persisted entries. Safe to call when anonymous.
    pub fn clear(&self) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = store::erase_session(self.store.as_ref()) {
            tracing::warn!(error = %e, "failed to erase stored session");
        }
        *guard = None;
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_session(|session| f.debug_struct("SessionState").field("current", &session).finish())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
