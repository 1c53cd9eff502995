//! Wire DTOs for the auth endpoints.
//!
//! DESIGN
//! ======
//! Field names follow the backend exactly (`useremail`, `oldPassword`,
//! `verifyCode`); the server reads them by those names.

use serde::{Deserialize, Serialize};

use crate::session::Role;

/// Raw acknowledgment returned by reset-by-code, passed through for display.
pub type ServerAck = serde_json::Value;

pub const STATUS_SUCCESS: &str = "success";

/// Body of `POST /login` and `POST /register`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub useremail: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Body of `POST /reset-password/old`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetByOldPassword<'a> {
    pub useremail: &'a str,
    pub old_password: &'a str,
    pub new_password: &'a str,
}

/// Body of `POST /reset-password`.
///
/// `role` is forwarded as-is; the client attaches no meaning to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetByCode<'a> {
    pub email: &'a str,
    pub verify_code: &'a str,
    pub new_password: &'a str,
    pub role: Role,
}

/// `{status, message, data}` wrapper the backend puts around responses.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }

    /// Server message, or `fallback` when absent or blank.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_owned()
    }
}

/// `data` of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub username: String,
    pub role: Role,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
