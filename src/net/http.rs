//! Credentialed request pipeline for the backend API.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every outgoing API call passes through `HttpClient::send`. Right before
//! dispatch the current session is read and, when present, turned into an
//! `Authorization: Bearer` header plus an `X-User-Email` header. Anonymous
//! requests go out untouched so login and register work without a session.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures and timeouts become `ApiError::Network`. The pipeline
//! never retries and never touches the session; status handling is left to
//! the caller or the `*_json` helpers.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, Request, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::config::ApiConfig;
use crate::error::ApiError;
use crate::session::{Session, SessionState};

/// Secondary identity header read by the backend next to the bearer token.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone, Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    session: SessionState,
}

impl HttpClient {
    pub fn new(config: &ApiConfig, session: SessionState) -> Result<Self, ApiError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout);
        let http = builder
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout,
            session,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Absolute URL for an API path. Paths are always rooted at the API base
    /// so credentials never leave for another origin.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request against an API path. Credentials are added by `send`.
    ///
    /// The request timeout is set per request as well as on the client; a
    /// browser build has no client-level timeout.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .timeout(self.request_timeout)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    /// Finish a request and stamp the current credentials onto it.
    pub fn prepare(&self, builder: RequestBuilder) -> Result<Request, ApiError> {
        let mut request = builder.build().map_err(ApiError::from_transport)?;
        self.session
            .with_session(|session| attach_credentials(request.headers_mut(), session))?;
        Ok(request)
    }

    /// Dispatch a request. Non-2xx responses are returned, not converted.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request = self.prepare(builder)?;
        tracing::debug!(method = %request.method(), path = request.url().path(), "api request");
        self.http.execute(request).await.map_err(ApiError::from_transport)
    }

    /// `GET` an API path and decode a 2xx JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.get(path)).await?;
        read_json(response).await
    }

    /// `POST` a JSON body to an API path and decode a 2xx JSON body.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.post(path).json(body)).await?;
        read_json(response).await
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Set the bearer and email headers for `session`; leave `headers` untouched
/// when anonymous. Empty values are not sent.
pub fn attach_credentials(headers: &mut HeaderMap, session: Option<&Session>) -> Result<(), ApiError> {
    let Some(session) = session else {
        return Ok(());
    };

    let bearer = match session.token.as_str() {
        "" => None,
        token => {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::InvalidRequest(format!("token is not a valid header value: {e}")))?;
            value.set_sensitive(true);
            Some(value)
        }
    };
    let email = match session.email.as_str() {
        "" => None,
        email => Some(
            HeaderValue::from_str(email)
                .map_err(|e| ApiError::InvalidRequest(format!("email is not a valid header value: {e}")))?,
        ),
    };

    if let Some(bearer) = bearer {
        headers.insert(AUTHORIZATION, bearer);
    }
    if let Some(email) = email {
        headers.insert(USER_EMAIL_HEADER, email);
    }
    Ok(())
}

/// Status code plus body text of a response, read to completion.
pub(crate) async fn read_text(response: Response) -> Result<(reqwest::StatusCode, String), ApiError> {
    let status = response.status();
    let text = response.text().await.map_err(ApiError::from_transport)?;
    Ok((status, text))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let (status, text) = read_text(response).await?;
    if !status.is_success() {
        return Err(ApiError::Status { status: status.as_u16(), body: text });
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
