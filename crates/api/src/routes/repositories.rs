//! Owner pages: repository status, settings, activation.

use std::ops::ControlFlow;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Router, routing::get, routing::post};
use minijinja::context;
use serde::Deserialize;
use tracing::info;

use gitreport_core::{Repository, RepositorySettings, Template, Verdict};
use gitreport_shared::types::RepositoryId;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::RequestSession;
use crate::routes::halt;
use crate::views::{self, RepositoryView};

/// Creates the repository management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/repositories/{id}", get(show).post(update))
        .route("/repositories/{id}/edit", get(edit))
        .route("/repositories/{id}/activate", post(activate))
        .route("/repositories/{id}/deactivate", post(deactivate))
}

/// Settings form as posted by the edit page.
#[derive(Debug, Default, Deserialize)]
struct SettingsForm {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    issue_name: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    followup: Option<String>,
    #[serde(default)]
    labels: Option<String>,
}

impl From<SettingsForm> for RepositorySettings {
    fn from(form: SettingsForm) -> Self {
        Self {
            display_name: form.display_name,
            issue_name: form.issue_name,
            prompt: form.prompt,
            followup: form.followup,
            labels: form.labels,
        }
        .normalized()
    }
}

/// Runs the owner check and loads the repository, or yields the response
/// that ends the request.
async fn owned_repository(
    state: &AppState,
    visit: &mut RequestSession,
    id: &str,
) -> Result<ControlFlow<Response, Repository>, ApiError> {
    let verdict = visit
        .guard(&*state.store)
        .require_own_repository(id)
        .await?;
    if let Some(halted) = halt(verdict, visit.is_signed_in())? {
        return Ok(ControlFlow::Break(halted));
    }

    let repository = match id.parse::<RepositoryId>() {
        Ok(id) => state.store.find_repository(id).await?,
        Err(_) => None,
    };
    match repository {
        Some(repository) => Ok(ControlFlow::Continue(repository)),
        // Deleted between the check and the load.
        None => Ok(ControlFlow::Break(not_found()?)),
    }
}

fn not_found() -> Result<Response, ApiError> {
    let verdict = Verdict::Render(Template::RepositoryNotFound);
    Ok(halt(verdict, true)?.unwrap_or_else(|| StatusCode::NOT_FOUND.into_response()))
}

fn show_path(repository: &Repository) -> String {
    format!("/repositories/{}", repository.id)
}

/// GET /repositories/{id} - Status and settings of a repository.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut visit: RequestSession,
) -> Result<Response, ApiError> {
    let repository = match owned_repository(&state, &mut visit, &id).await? {
        ControlFlow::Continue(repository) => repository,
        ControlFlow::Break(halted) => return Ok(visit.finish(halted)),
    };

    let page = views::render(
        "repositories/show.html",
        context! { signed_in => true, repo => RepositoryView::from(&repository) },
    )?;
    Ok(visit.finish(page))
}

/// GET /repositories/{id}/edit - Settings form.
async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut visit: RequestSession,
) -> Result<Response, ApiError> {
    let repository = match owned_repository(&state, &mut visit, &id).await? {
        ControlFlow::Continue(repository) => repository,
        ControlFlow::Break(halted) => return Ok(visit.finish(halted)),
    };

    let page = views::render(
        "repositories/edit.html",
        context! { signed_in => true, repo => RepositoryView::from(&repository) },
    )?;
    Ok(visit.finish(page))
}

/// POST /repositories/{id} - Save the settings form.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut visit: RequestSession,
    Form(form): Form<SettingsForm>,
) -> Result<Response, ApiError> {
    let repository = match owned_repository(&state, &mut visit, &id).await? {
        ControlFlow::Continue(repository) => repository,
        ControlFlow::Break(halted) => return Ok(visit.finish(halted)),
    };

    let updated = state
        .store
        .update_settings(repository.id, form.into())
        .await?;
    info!(
        repository_id = %updated.id,
        repository = %format!("{}/{}", updated.holder_name(), updated.name),
        "repository settings updated"
    );
    Ok(visit.finish(Redirect::to(&show_path(&updated))))
}

/// POST /repositories/{id}/activate - Open the public form.
async fn activate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    visit: RequestSession,
) -> Result<Response, ApiError> {
    toggle(state, id, visit, true).await
}

/// POST /repositories/{id}/deactivate - Close the public form.
async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    visit: RequestSession,
) -> Result<Response, ApiError> {
    toggle(state, id, visit, false).await
}

async fn toggle(
    state: AppState,
    id: String,
    mut visit: RequestSession,
    active: bool,
) -> Result<Response, ApiError> {
    let repository = match owned_repository(&state, &mut visit, &id).await? {
        ControlFlow::Continue(repository) => repository,
        ControlFlow::Break(halted) => return Ok(visit.finish(halted)),
    };

    let updated = state.store.set_active(repository.id, active).await?;
    info!(
        repository_id = %updated.id,
        active,
        "repository activation changed"
    );
    Ok(visit.finish(Redirect::to(&show_path(&updated))))
}
