//! Shared types, errors, and configuration for GitReport.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - The opaque GitHub access token
//! - Application-wide error types
//! - Configuration management
//! - Signed session tokens carried in the session cookie
//! - Clients for the external services (GitHub, CAPTCHA verification)

pub mod captcha;
pub mod config;
pub mod error;
pub mod github;
pub mod session;
pub mod types;

pub use captcha::{CaptchaError, CaptchaVerifier};
pub use config::AppConfig;
pub use error::AppError;
pub use github::{GitHubClient, GitHubError};
pub use session::{SessionClaims, SessionTokenError, SessionTokenService};
