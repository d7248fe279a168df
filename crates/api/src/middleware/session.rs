//! Session cookie handling.
//!
//! [`RequestSession`] restores the visitor's [`Session`] from the signed
//! session cookie, lends it to the access guard, and writes the cookie back
//! with the response only when the session changed.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, error};

use gitreport_core::{AccessGuard, Session, Store};
use gitreport_shared::{SessionTokenError, SessionTokenService};

use crate::AppState;
use crate::error::ApiError;

/// Cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "gitreport_session";

/// Cookie carrying the OAuth `state` between `/login` and the callback.
pub const OAUTH_STATE_COOKIE: &str = "gitreport_oauth_state";

/// The visitor's session for one request, plus the cookies to send back.
pub struct RequestSession {
    session: Session,
    jar: CookieJar,
    tokens: Arc<SessionTokenService>,
}

impl RequestSession {
    fn restore(jar: CookieJar, tokens: Arc<SessionTokenService>) -> Self {
        let session = match jar.get(SESSION_COOKIE).map(|c| tokens.validate(c.value())) {
            Some(Ok(claims)) => Session::restored(claims.user_id()),
            Some(Err(err)) => {
                debug!(error = %err, "ignoring unusable session cookie");
                Session::anonymous()
            }
            None => Session::anonymous(),
        };

        Self {
            session,
            jar,
            tokens,
        }
    }

    /// An access guard over this session.
    pub fn guard<'a>(
        &'a mut self,
        store: &'a (dyn Store + 'a),
    ) -> AccessGuard<'a, dyn Store + 'a> {
        AccessGuard::new(store, &mut self.session)
    }

    /// Whether the session names a user. Performs no lookup.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.user_id().is_some()
    }

    /// The session itself, for sign-in.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Cookies sent with the request.
    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.jar
    }

    /// Sets a short-lived, HTTP-only cookie on the response.
    pub fn set_cookie(&mut self, name: &'static str, value: String) {
        let cookie = self.cookie(name, value);
        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }

    /// Expires a cookie on the response.
    pub fn remove_cookie(&mut self, name: &'static str) {
        self.jar = std::mem::take(&mut self.jar).remove(Cookie::build(name).path("/"));
    }

    /// Attaches pending cookies, including a rewritten session cookie, to
    /// `response`.
    pub fn finish(mut self, response: impl IntoResponse) -> Response {
        match self.commit() {
            Ok(()) => (self.jar, response).into_response(),
            Err(err) => {
                error!(error = %err, "failed to issue session token");
                ApiError::from(err).into_response()
            }
        }
    }

    fn commit(&mut self) -> Result<(), SessionTokenError> {
        if !self.session.is_modified() {
            return Ok(());
        }

        match self.session.user_id() {
            Some(user_id) => {
                let token = self.tokens.issue(user_id)?;
                self.set_cookie(SESSION_COOKIE, token);
            }
            None => self.remove_cookie(SESSION_COOKIE),
        }
        Ok(())
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.tokens.secure_cookie())
            .build()
    }
}

impl FromRequestParts<AppState> for RequestSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Self::restore(jar, Arc::clone(&state.session_tokens)))
    }
}
