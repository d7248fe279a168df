//! HTTP layer with Axum routes and middleware.
//!
//! This crate provides:
//! - Server-rendered pages for owners and the public issue forms
//! - The session cookie extractor that feeds the access guard
//! - Error pages and the mapping from guard verdicts to responses

pub mod error;
pub mod middleware;
pub mod routes;
pub mod views;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::Router;
use axum::http::header::COOKIE;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use gitreport_core::Store;
use gitreport_shared::{CaptchaVerifier, GitHubClient, SessionTokenService};

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Users, organizations and repositories.
    pub store: Arc<dyn Store>,
    /// Signs and checks session cookies.
    pub session_tokens: Arc<SessionTokenService>,
    /// GitHub OAuth and REST client.
    pub github: Arc<GitHubClient>,
    /// CAPTCHA verification for the public forms.
    pub captcha: Arc<CaptchaVerifier>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([COOKIE]))
        .with_state(state)
}
