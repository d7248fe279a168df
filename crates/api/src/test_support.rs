//! Router harness for handler tests: in-memory directory, fake GitHub.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::MockServer;

use gitreport_core::directory::memory::InMemoryDirectory;
use gitreport_shared::config::{CaptchaConfig, GitHubConfig, SessionConfig};
use gitreport_shared::types::UserId;
use gitreport_shared::{CaptchaVerifier, GitHubClient, SessionTokenService};

use crate::middleware::SESSION_COOKIE;
use crate::{AppState, create_router};

pub(crate) struct TestApp {
    pub state: AppState,
    pub directory: Arc<InMemoryDirectory>,
    pub github: MockServer,
}

impl TestApp {
    /// An app whose CAPTCHA check always answers `captcha_passes`.
    pub async fn new(captcha_passes: bool) -> Self {
        Self::with_captcha(CaptchaConfig {
            override_result: Some(captcha_passes),
            ..CaptchaConfig::default()
        })
        .await
    }

    pub async fn with_captcha(captcha: CaptchaConfig) -> Self {
        let github = MockServer::start().await;
        let directory = Arc::new(InMemoryDirectory::new());

        let session_tokens = SessionTokenService::new(&SessionConfig {
            secret: "api-test-secret-that-is-long-enough".to_string(),
            ttl_hours: 1,
            secure_cookie: false,
        });
        let github_client = GitHubClient::new(GitHubConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            oauth_url: github.uri(),
            api_url: github.uri(),
            ..GitHubConfig::default()
        })
        .unwrap();
        let captcha = CaptchaVerifier::new(captcha).unwrap();

        let state = AppState {
            store: directory.clone(),
            session_tokens: Arc::new(session_tokens),
            github: Arc::new(github_client),
            captcha: Arc::new(captcha),
        };

        Self {
            state,
            directory,
            github,
        }
    }

    /// `Cookie` header value signing in `user_id`.
    pub fn session_cookie(&self, user_id: UserId) -> String {
        let token = self.state.session_tokens.issue(user_id).unwrap();
        format!("{SESSION_COOKIE}={token}")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request =
            Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.to_string())).unwrap())
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        create_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }
}

pub(crate) async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
