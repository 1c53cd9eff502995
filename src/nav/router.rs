//! Route resolution with the navigation guard applied.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Router::navigate` is the single entry point for every transition. It
//! takes one snapshot of the session, then resolves the requested path,
//! follows static redirects, and re-runs the guard on each redirect target
//! until a page admits the user.

use std::sync::Arc;

use super::guard::{Decision, decide};
use super::route::{RouteTable, RouteTarget, strip_query};
use crate::session::{Session, SessionState};

/// Upper bound on redirects followed for one transition.
pub const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("no route matches `{0}`")]
    NoRoute(String),

    #[error("redirect loop while navigating to `{requested}`")]
    RedirectLoop { requested: String },
}

/// Where a transition ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Path as requested by the caller.
    pub requested: String,
    /// Path finally rendered.
    pub path: String,
    /// Name of the route at `path`.
    pub route: &'static str,
    pub params: Vec<(&'static str, String)>,
}

impl Navigation {
    #[must_use]
    pub fn redirected(&self) -> bool {
        strip_query(&self.requested) != self.path
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RouteTable>,
    session: SessionState,
}

impl Router {
    #[must_use]
    pub fn new(table: RouteTable, session: SessionState) -> Self {
        Self { table: Arc::new(table), session }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve a transition to `path` for the current session.
    ///
    /// # Errors
    ///
    /// `NavError` only for a table that cannot place the path or that
    /// redirects in a cycle; access denials are redirects, not errors.
    pub fn navigate(&self, path: &str) -> Result<Navigation, NavError> {
        let session = self.session.snapshot();
        resolve(&self.table, session.as_ref(), path)
    }
}

/// Pure resolution of `requested` for `session` against `table`.
pub fn resolve(table: &RouteTable, session: Option<&Session>, requested: &str) -> Result<Navigation, NavError> {
    let mut current = strip_query(requested).to_owned();

    for _ in 0..=MAX_REDIRECTS {
        let matched = table
            .resolve(&current)
            .ok_or_else(|| NavError::NoRoute(current.clone()))?;

        let next = match matched.route.target {
            RouteTarget::Redirect(to) => to,
            RouteTarget::Page(access) => match decide(session, access) {
                Decision::Allow => {
                    return Ok(Navigation {
                        requested: requested.to_owned(),
                        route: matched.route.name,
                        params: matched.params,
                        path: current,
                    });
                }
                Decision::Redirect(to) => {
                    tracing::debug!(from = %current, to, route = matched.route.name, "navigation redirected");
                    to
                }
            },
        };
        current = next.to_owned();
    }

    tracing::warn!(requested, "navigation exceeded redirect limit");
    Err(NavError::RedirectLoop { requested: requested.to_owned() })
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
