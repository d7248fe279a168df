//! Home and profile pages.

use axum::response::{Redirect, Response};
use axum::{Router, extract::State, routing::get};
use minijinja::context;

use gitreport_core::RedirectTarget;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::RequestSession;
use crate::routes::halt;
use crate::views::{self, RepositoryView};

/// Creates the page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/profile", get(profile))
}

/// GET / - Landing page.
async fn home(
    State(state): State<AppState>,
    mut visit: RequestSession,
) -> Result<Response, ApiError> {
    // Resolving the user clears a stale session.
    let signed_in = visit.guard(&*state.store).current_user().await?.is_some();
    let page = views::render("home.html", context! { signed_in => signed_in })?;
    Ok(visit.finish(page))
}

/// GET /profile - Repositories the signed-in user manages.
async fn profile(
    State(state): State<AppState>,
    mut visit: RequestSession,
) -> Result<Response, ApiError> {
    let mut guard = visit.guard(&*state.store);
    if let Some(halted) = halt(guard.require_signed_in(), false)? {
        return Ok(visit.finish(halted));
    }
    // A stale session signs the visitor out here.
    let Some(user) = guard.current_user().await? else {
        return Ok(visit.finish(Redirect::to(RedirectTarget::Login.path())));
    };

    let repositories = state.store.repositories_for_user(&user).await?;
    let listed: Vec<RepositoryView<'_>> = repositories.iter().map(RepositoryView::from).collect();
    let page = views::render(
        "profile.html",
        context! { signed_in => true, username => &user.username, repositories => listed },
    )?;
    Ok(visit.finish(page))
}
