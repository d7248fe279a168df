//! Turning failures into error pages.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::context;
use tracing::error;

use gitreport_core::DirectoryError;
use gitreport_shared::{AppError, CaptchaError, GitHubError, SessionTokenError};

use crate::views;

/// Handler error, rendered as the error page.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<GitHubError> for ApiError {
    fn from(err: GitHubError) -> Self {
        Self(err.into())
    }
}

impl From<CaptchaError> for ApiError {
    fn from(err: CaptchaError) -> Self {
        Self(err.into())
    }
}

impl From<SessionTokenError> for ApiError {
    fn from(err: SessionTokenError) -> Self {
        Self(AppError::Internal(err.to_string()))
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(err: minijinja::Error) -> Self {
        Self(AppError::Internal(format!("template: {err:#}")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        error!(code = self.0.error_code(), error = %self.0, "request failed");

        let message = self.0.public_message();
        let page = views::render(
            "error.html",
            context! { status => status.as_u16(), message => message },
        );
        match page {
            Ok(html) => (status, html).into_response(),
            Err(err) => {
                error!(error = %err, "error page failed to render");
                (status, Html(status.to_string())).into_response()
            }
        }
    }
}
