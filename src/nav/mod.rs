//! Route-level access control.
//!
//! ARCHITECTURE
//! ============
//! `route` declares which paths exist and what each requires, `guard` is the
//! pure allow/redirect decision, and `router` resolves a requested path by
//! running the guard on it and on every redirect target.

pub mod guard;
pub mod route;
pub mod router;

pub use guard::{Decision, decide};
pub use route::{Route, RouteAccess, RouteTable, RouteTarget};
pub use router::{Navigation, NavError, Router};

pub const LOGIN_ROUTE: &str = "/login";
