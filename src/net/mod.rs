//! Networking modules for the backend API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `config` resolves where the API lives, `http` is the credentialed request
//! pipeline every call goes through, and `types` defines the wire schema.

pub mod config;
pub mod http;
pub mod types;
