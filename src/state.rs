//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is built once at startup and handed out by clone. It hydrates
//! the session from the credential store, then gives the request pipeline,
//! the auth client and the router handles to that same session, so a login
//! or logout is seen by every reader on its next call.

use std::sync::Arc;

use crate::auth::AuthClient;
use crate::error::ApiError;
use crate::nav::{RouteTable, Router};
use crate::net::config::ApiConfig;
use crate::net::http::HttpClient;
use crate::session::SessionState;
use crate::session::store::CredentialStore;

#[derive(Clone, Debug)]
pub struct AppState {
    pub session: SessionState,
    pub http: HttpClient,
    pub auth: AuthClient,
    pub router: Router,
}

impl AppState {
    /// Wire the core against the standard route table.
    ///
    /// # Errors
    ///
    /// `ApiError::HttpClientBuild` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        Self::with_routes(config, store, RouteTable::standard())
    }

    /// Same as `new` with a caller-supplied route table.
    ///
    /// # Errors
    ///
    /// `ApiError::HttpClientBuild` if the HTTP client cannot be built.
    pub fn with_routes(
        config: &ApiConfig,
        store: Arc<dyn CredentialStore>,
        routes: RouteTable,
    ) -> Result<Self, ApiError> {
        let session = SessionState::hydrate(store);
        let http = HttpClient::new(config, session.clone())?;
        let auth = AuthClient::new(http.clone(), session.clone());
        let router = Router::new(routes, session.clone());
        tracing::debug!(base_url = http.base_url(), authenticated = session.is_authenticated(), "app state ready");
        Ok(Self { session, http, auth, router })
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
