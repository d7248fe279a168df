//! Sign-in with GitHub, and sign-out.

use axum::extract::{Query, State};
use axum::response::{Redirect, Response};
use axum::{Router, routing::get};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use gitreport_core::{AccountSnapshot, OrganizationSnapshot, sync_account};
use gitreport_shared::github::GitHubUser;
use gitreport_shared::types::AccessToken;
use gitreport_shared::{GitHubClient, GitHubError};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::{OAUTH_STATE_COOKIE, RequestSession};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/auth/github/callback", get(callback))
        .route("/logout", get(logout))
}

/// GET /login - Send the visitor to GitHub to authorize.
async fn login(
    State(state): State<AppState>,
    mut visit: RequestSession,
) -> Result<Response, ApiError> {
    let oauth_state = Uuid::new_v4().simple().to_string();
    let url = state.github.authorize_url(&oauth_state)?;
    visit.set_cookie(OAUTH_STATE_COOKIE, oauth_state);
    Ok(visit.finish(Redirect::to(url.as_str())))
}

/// Query parameters GitHub appends to the callback URL.
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// GET /auth/github/callback - Finish sign-in and sync the account.
async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    mut visit: RequestSession,
) -> Result<Response, ApiError> {
    let expected = visit
        .cookies()
        .get(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string());
    visit.remove_cookie(OAUTH_STATE_COOKIE);

    if let Some(error) = params.error {
        warn!(%error, "GitHub authorization declined");
        return Ok(visit.finish(Redirect::to("/")));
    }
    let code = match (params.code, params.state, expected) {
        (Some(code), Some(returned), Some(expected)) if returned == expected => code,
        _ => {
            warn!("OAuth callback with missing code or mismatched state");
            return Ok(visit.finish(Redirect::to("/")));
        }
    };

    let token = state.github.exchange_code(&code).await?;
    let github_user = state.github.current_user(&token).await?;
    let snapshot = discover(&state.github, github_user, token).await?;
    let user = sync_account(&*state.store, &snapshot).await?;

    visit.session_mut().sign_in(user.id);
    info!(user_id = %user.id, username = %user.username, "user signed in");
    Ok(visit.finish(Redirect::to("/profile")))
}

/// GET /logout - Sign out and return home.
async fn logout(State(state): State<AppState>, mut visit: RequestSession) -> Response {
    visit.guard(&*state.store).logout();
    visit.finish(Redirect::to("/"))
}

/// Gathers what GitHub knows about the account, unless the rate limit is spent.
async fn discover(
    github: &GitHubClient,
    user: GitHubUser,
    token: AccessToken,
) -> Result<AccountSnapshot, GitHubError> {
    let limit = github.rate_limit(&token).await?;
    if limit.remaining == 0 {
        warn!(
            username = %user.login,
            reset = limit.reset,
            "GitHub rate limit exhausted; signing in without syncing"
        );
        return Ok(AccountSnapshot::user_only(user, token));
    }

    let repositories = github.user_repositories(&token).await?;
    let mut organizations = Vec::new();
    for organization in github.user_organizations(&token).await? {
        let repositories = github
            .organization_repositories(&token, &organization.login)
            .await?;
        organizations.push(OrganizationSnapshot {
            organization,
            repositories,
        });
    }

    Ok(AccountSnapshot {
        user,
        access_token: token,
        repositories,
        organizations,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::http::header::{LOCATION, SET_COOKIE};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, ResponseTemplate};

    use gitreport_core::Directory;

    use super::*;
    use crate::middleware::SESSION_COOKIE;
    use crate::test_support::TestApp;

    async fn mount_account(app: &TestApp, remaining: u32) {
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(body_string_contains("code=good-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "gho_fresh",
                "token_type": "bearer",
                "scope": "repo,read:org"
            })))
            .mount(&app.github)
            .await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": 99, "login": "greptest" })),
            )
            .mount(&app.github)
            .await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": { "core": { "limit": 5000, "remaining": remaining, "reset": 1_700_000_000 } }
            })))
            .mount(&app.github)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "CoolCode", "owner": { "login": "greptest" } }
            ])))
            .mount(&app.github)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/orgs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "login": "greporg" }])))
            .mount(&app.github)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/greporg/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "CoolOrg", "owner": { "login": "greporg" } }
            ])))
            .mount(&app.github)
            .await;
    }

    fn session_set(response: &Response) -> bool {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&format!("{SESSION_COOKIE}=")) && !v.contains("Max-Age=0"))
    }

    #[tokio::test]
    async fn test_login_redirects_to_github_with_state_cookie() {
        let app = TestApp::new(true).await;
        let response = app.get("/login", None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[LOCATION].to_str().unwrap();
        assert!(location.starts_with(&format!("{}/login/oauth/authorize", app.github.uri())));
        assert!(location.contains("client_id=client-id"));

        let state_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(state_cookie.starts_with(&format!("{OAUTH_STATE_COOKIE}=")));
        assert!(state_cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_callback_syncs_account_and_signs_in() {
        let app = TestApp::new(true).await;
        mount_account(&app, 4999).await;

        let response = app
            .get(
                "/auth/github/callback?code=good-code&state=abc",
                Some(&format!("{OAUTH_STATE_COOKIE}=abc")),
            )
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/profile");
        assert!(session_set(&response));

        let user = app
            .directory
            .find_user_by_username("greptest")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.access_token.as_ref().unwrap().expose(), "gho_fresh");
        let owned = app.directory.repositories_for_user(&user).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|r| !r.is_active));
    }

    #[tokio::test]
    async fn test_callback_skips_sync_when_rate_limited() {
        let app = TestApp::new(true).await;
        mount_account(&app, 0).await;

        let response = app
            .get(
                "/auth/github/callback?code=good-code&state=abc",
                Some(&format!("{OAUTH_STATE_COOKIE}=abc")),
            )
            .await;

        assert_eq!(response.headers()[LOCATION], "/profile");
        let user = app
            .directory
            .find_user_by_username("greptest")
            .await
            .unwrap()
            .unwrap();
        assert!(app.directory.repositories_for_user(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_with_mismatched_state_does_not_sign_in() {
        let app = TestApp::new(true).await;
        mount_account(&app, 4999).await;

        let response = app
            .get(
                "/auth/github/callback?code=good-code&state=forged",
                Some(&format!("{OAUTH_STATE_COOKIE}=abc")),
            )
            .await;

        assert_eq!(response.headers()[LOCATION], "/");
        assert!(!session_set(&response));
        assert!(app.github.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_with_rejected_code_renders_502() {
        let app = TestApp::new(true).await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired."
            })))
            .mount(&app.github)
            .await;

        let response = app
            .get(
                "/auth/github/callback?code=stale&state=abc",
                Some(&format!("{OAUTH_STATE_COOKIE}=abc")),
            )
            .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let app = TestApp::new(true).await;
        let user = app.directory.add_user("greptest", None).await;

        let response = app
            .get("/logout", Some(&app.session_cookie(user.id)))
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
        let cleared = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cleared.starts_with(&format!("{SESSION_COOKIE}=;")));
    }
}
