//! The public issue form at `/{holder}/{repository}`.

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use minijinja::context;
use tracing::{error, info, warn};

use gitreport_core::{IssueReport, Repository, Template, Verdict, filing_token, find_holder};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::{ClientAddr, RequestSession};
use crate::routes::halt;
use crate::views::{self, RepositoryView};

const WRONG_CAPTCHA: &str = "Incorrect CAPTCHA; please retry!";
const NOT_FILED: &str = "Your report could not be filed right now. Please try again later.";

/// Creates the public form routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/{holder}/{repository}", get(new_issue).post(create_issue))
}

/// Runs the activity check and loads the repository, or yields the response
/// that ends the request.
async fn active_repository(
    state: &AppState,
    visit: &mut RequestSession,
    holder: &str,
    name: &str,
) -> Result<Result<Repository, Response>, ApiError> {
    let verdict = visit
        .guard(&*state.store)
        .require_repository_active(holder, name)
        .await?;
    if let Some(halted) = halt(verdict, visit.is_signed_in())? {
        return Ok(Err(halted));
    }

    let repository = match find_holder(&*state.store, holder).await? {
        Some(holder) => state.store.find_holder_repository(&holder, name).await?,
        None => None,
    };
    match repository {
        Some(repository) => Ok(Ok(repository)),
        None => {
            // Removed between the check and the load.
            let verdict = Verdict::Render(Template::NotFound);
            let halted = halt(verdict, visit.is_signed_in())?;
            Ok(Err(halted.unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())))
        }
    }
}

fn form_page(
    state: &AppState,
    visit: &RequestSession,
    repository: &Repository,
    report: &IssueReport,
    error: Option<&str>,
) -> Result<Response, ApiError> {
    let site_key = state.captcha.site_key();
    let page = views::render(
        "issues/new.html",
        context! {
            signed_in => visit.is_signed_in(),
            repo => RepositoryView::from(repository),
            report => report,
            error => error,
            site_key => (!site_key.is_empty()).then_some(site_key),
        },
    )?;
    Ok(page.into_response())
}

/// GET /{holder}/{repository} - The issue form.
async fn new_issue(
    State(state): State<AppState>,
    Path((holder, name)): Path<(String, String)>,
    mut visit: RequestSession,
) -> Result<Response, ApiError> {
    let repository = match active_repository(&state, &mut visit, &holder, &name).await? {
        Ok(repository) => repository,
        Err(halted) => return Ok(visit.finish(halted)),
    };

    let page = form_page(&state, &visit, &repository, &IssueReport::default(), None)?;
    Ok(visit.finish(page))
}

/// POST /{holder}/{repository} - File the report as a GitHub issue.
async fn create_issue(
    State(state): State<AppState>,
    Path((holder, name)): Path<(String, String)>,
    client: ClientAddr,
    mut visit: RequestSession,
    Form(report): Form<IssueReport>,
) -> Result<Response, ApiError> {
    let repository = match active_repository(&state, &mut visit, &holder, &name).await? {
        Ok(repository) => repository,
        Err(halted) => return Ok(visit.finish(halted)),
    };
    let full_name = format!("{}/{}", repository.holder_name(), repository.name);

    if let Err(invalid) = report.validate() {
        let message = capitalize(&invalid.to_string());
        let page = form_page(&state, &visit, &repository, &report, Some(&message))?;
        return Ok(visit.finish(page));
    }

    let remote_ip = client.to_remote_ip();
    if !state
        .captcha
        .verify(&report.captcha, remote_ip.as_deref())
        .await?
    {
        warn!(repository = %full_name, "issue report failed CAPTCHA");
        let page = form_page(&state, &visit, &repository, &report, Some(WRONG_CAPTCHA))?;
        return Ok(visit.finish(page));
    }

    let Some(token) = filing_token(&*state.store, &repository).await? else {
        warn!(repository = %full_name, "no stored token can file issues");
        let page = form_page(&state, &visit, &repository, &report, Some(NOT_FILED))?;
        return Ok(visit.finish(page));
    };

    let issue = report.compose(&repository);
    match state
        .github
        .create_issue(&token, repository.holder_name(), &repository.name, &issue)
        .await
    {
        Ok(created) => {
            info!(repository = %full_name, number = created.number, "issue filed");
            let page = views::render(
                "issues/thanks.html",
                context! {
                    signed_in => visit.is_signed_in(),
                    repo => RepositoryView::from(&repository),
                },
            )?;
            Ok(visit.finish(page))
        }
        Err(err) => {
            error!(repository = %full_name, error = %err, "GitHub rejected issue");
            let page = form_page(&state, &visit, &repository, &report, Some(NOT_FILED))?;
            Ok(visit.finish(page))
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
