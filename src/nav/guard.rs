//! Navigation guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs before every route transition, including deep links and history
//! moves. It holds no state: the outcome depends only on the session and the
//! destination's access requirement.

use super::LOGIN_ROUTE;
use super::route::RouteAccess;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(&'static str),
}

/// Decide whether `session` may enter a route with `access`.
///
/// Rules apply in order and the first match wins:
/// 1. auth required and no session: go to `/login`
/// 2. role required and the session holds a different role: go to that
///    session's home page
/// 3. otherwise allow
#[must_use]
pub fn decide(session: Option<&Session>, access: RouteAccess) -> Decision {
    if access.requires_auth && session.is_none() {
        return Decision::Redirect(LOGIN_ROUTE);
    }

    if let (Some(required), Some(session)) = (access.role, session) {
        if required != session.role {
            return Decision::Redirect(session.role.home_path());
        }
    }

    Decision::Allow
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
