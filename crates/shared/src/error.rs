//! Application-wide error types.

use thiserror::Error;

use crate::{captcha::CaptchaError, github::GitHubError};

/// Application error types.
///
/// Visitor mistakes are answered with redirects and form errors; what lands
/// here is a server-side failure.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ExternalService(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the message shown to visitors.
    ///
    /// Internal details stay in the logs.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::ExternalService(_) => "GitHub could not be reached. Please try again.",
            Self::Database(_) | Self::Internal(_) => "Something went wrong on our end.",
        }
    }
}

impl From<GitHubError> for AppError {
    fn from(err: GitHubError) -> Self {
        Self::ExternalService(err.to_string())
    }
}

impl From<CaptchaError> for AppError {
    fn from(err: CaptchaError) -> Self {
        Self::ExternalService(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
