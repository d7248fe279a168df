//! Route definitions.

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use minijinja::context;

use gitreport_core::Verdict;

use crate::AppState;
use crate::error::ApiError;
use crate::views;

pub mod auth;
pub mod health;
pub mod pages;
pub mod public;
pub mod repositories;

/// Creates the router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(pages::routes())
        .merge(repositories::routes())
        .merge(public::routes())
}

/// The response for a guard verdict, or `None` when the request may proceed.
pub(crate) fn halt(verdict: Verdict, signed_in: bool) -> Result<Option<Response>, ApiError> {
    match verdict {
        Verdict::Proceed => Ok(None),
        Verdict::Redirect(target) => Ok(Some(Redirect::to(target.path()).into_response())),
        Verdict::Render(template) => {
            let page = views::render(template.name(), context! { signed_in })?;
            Ok(Some((StatusCode::NOT_FOUND, page).into_response()))
        }
    }
}
