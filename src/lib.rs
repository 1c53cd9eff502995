//! # coursegate
//!
//! Client-side session and access-control core for the course platform.
//!
//! The crate owns three views of identity and keeps them consistent:
//! the in-memory [`SessionState`], its persisted mirror in a
//! [`session::store::CredentialStore`], and the access decisions made for
//! every route transition by [`nav::Router`]. Outgoing API calls go through
//! [`net::http::HttpClient`], which attaches the current credentials.
//!
//! [`AppState`] wires these together once at startup.

pub mod auth;
pub mod error;
pub mod nav;
pub mod net;
pub mod session;
pub mod state;

pub use error::ApiError;
pub use session::{Role, Session, SessionState};
pub use state::AppState;
