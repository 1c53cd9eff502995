//! Login, registration, password reset and logout.
//!
//! SYSTEM CONTEXT
//! ==============
//! These are the only operations that talk to the auth endpoints, and
//! `login`/`logout` are the only writers of `SessionState`. Register and both
//! resets leave the session alone; after registering, the caller signs in
//! explicitly.
//!
//! ERROR HANDLING
//! ==============
//! The backend wraps replies in `{status, message, data}`. A login envelope
//! whose status is not `"success"` is a rejection whatever the HTTP code.
//! Server messages reach the caller verbatim; a generic message stands in
//! when the server sends none.

use crate::error::ApiError;
use crate::net::http::{self, HttpClient};
use crate::net::types::{Credentials, Envelope, LoginData, ResetByCode, ResetByOldPassword, ServerAck};
use crate::session::{Role, Session, SessionState};

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const RESET_BY_OLD_PASSWORD_PATH: &str = "/reset-password/old";
pub const RESET_BY_CODE_PATH: &str = "/reset-password";

const LOGIN_FAILED: &str = "login failed";
const REGISTER_FAILED: &str = "registration failed";
const RESET_FAILED: &str = "password reset failed";

#[derive(Clone, Debug)]
pub struct AuthClient {
    http: HttpClient,
    session: SessionState,
}

impl AuthClient {
    #[must_use]
    pub fn new(http: HttpClient, session: SessionState) -> Self {
        Self { http, session }
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Sign in and replace the current session.
    ///
    /// # Errors
    ///
    /// `ApiError::Auth` when the server rejects the credentials,
    /// `ApiError::Decode` when it accepts them but sends no usable token. The
    /// session is left exactly as it was on every error path.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<Session, ApiError> {
        let body = Credentials { useremail: email, password, role };
        let response = self.http.send(self.http.post(LOGIN_PATH).json(&body)).await?;
        let (status, text) = http::read_text(response).await?;

        let envelope: Envelope<LoginData> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(ApiError::Decode(e.to_string())),
            Err(_) => return Err(ApiError::Status { status: status.as_u16(), body: text }),
        };

        if !envelope.is_success() {
            tracing::warn!(%role, status = status.as_u16(), "login rejected");
            return Err(ApiError::Auth(envelope.message_or(LOGIN_FAILED)));
        }
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), body: text });
        }

        let data = envelope
            .data
            .ok_or_else(|| ApiError::Decode("login response has no `data`".to_owned()))?;
        if data.token.is_empty() {
            return Err(ApiError::Decode("login response has an empty token".to_owned()));
        }
        let session = Session {
            token: data.token,
            username: data.username,
            role: data.role,
            email: email.to_owned(),
        };
        self.session.establish(session.clone());
        tracing::info!(username = %session.username, role = %session.role, "login succeeded");
        Ok(session)
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// `ApiError::Registration` when the server refuses the account.
    pub async fn register(&self, email: &str, password: &str, role: Role) -> Result<(), ApiError> {
        let body = Credentials { useremail: email, password, role };
        let response = self.http.send(self.http.post(REGISTER_PATH).json(&body)).await?;
        expect_success(response, REGISTER_FAILED, ApiError::Registration).await?;
        tracing::info!(%role, "registration accepted");
        Ok(())
    }

    /// Change a password given the current one.
    ///
    /// # Errors
    ///
    /// `ApiError::Reset` when the server refuses the change.
    pub async fn reset_password_by_old(&self, email: &str, old_password: &str, new_password: &str) -> Result<(), ApiError> {
        let body = ResetByOldPassword { useremail: email, old_password, new_password };
        let response = self
            .http
            .send(self.http.post(RESET_BY_OLD_PASSWORD_PATH).json(&body))
            .await?;
        expect_success(response, RESET_FAILED, ApiError::Reset).await?;
        tracing::info!("password changed");
        Ok(())
    }

    /// Change a password using an emailed verification code. Returns the
    /// server payload untouched so the caller can show it.
    ///
    /// # Errors
    ///
    /// `ApiError::Reset` on a non-2xx reply.
    pub async fn reset_password_by_code(
        &self,
        email: &str,
        verify_code: &str,
        new_password: &str,
        role: Role,
    ) -> Result<ServerAck, ApiError> {
        let body = ResetByCode { email, verify_code, new_password, role };
        let response = self.http.send(self.http.post(RESET_BY_CODE_PATH).json(&body)).await?;
        let (status, text) = http::read_text(response).await?;

        if !status.is_success() {
            return Err(ApiError::Reset(rejection_message(&text, RESET_FAILED)));
        }
        if text.trim().is_empty() {
            return Ok(ServerAck::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Forget the session locally. Idempotent.
    pub fn logout(&self) {
        let was_signed_in = self.session.is_authenticated();
        self.session.clear();
        if was_signed_in {
            tracing::info!("logged out");
        }
    }
}

/// Fail with `reject(message)` on a non-2xx reply or a non-success envelope.
async fn expect_success(
    response: reqwest::Response,
    fallback: &str,
    reject: fn(String) -> ApiError,
) -> Result<(), ApiError> {
    let (status, text) = http::read_text(response).await?;
    if !status.is_success() {
        return Err(reject(rejection_message(&text, fallback)));
    }
    match serde_json::from_str::<Envelope<serde_json::Value>>(&text) {
        Ok(envelope) if envelope.status.is_some() && !envelope.is_success() => {
            Err(reject(envelope.message_or(fallback)))
        }
        _ => Ok(()),
    }
}

fn rejection_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .map_or_else(|_| fallback.to_owned(), |envelope| envelope.message_or(fallback))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
