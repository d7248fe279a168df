//! Request extractors shared by the route handlers.

pub mod client_addr;
pub mod session;

pub use client_addr::ClientAddr;
pub use session::{OAUTH_STATE_COOKIE, RequestSession, SESSION_COOKIE};
