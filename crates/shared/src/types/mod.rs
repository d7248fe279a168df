//! Common types used across the application.

pub mod id;
pub mod token;

pub use id::*;
pub use token::AccessToken;
