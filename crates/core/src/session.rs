//! Request-scoped session state.
//!
//! A `Session` is decoded from the session cookie at the start of a request,
//! handed explicitly to the access guard, and written back only if it changed.

use gitreport_shared::types::UserId;

/// Per-visitor session for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<UserId>,
    modified: bool,
}

impl Session {
    /// A session with nobody signed in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user_id: None,
            modified: false,
        }
    }

    /// A session restored from a cookie naming `user_id`.
    #[must_use]
    pub const fn restored(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            modified: false,
        }
    }

    /// The signed-in user ID, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Records a sign-in.
    pub fn sign_in(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
        self.modified = true;
    }

    /// Clears the signed-in user. Idempotent.
    pub fn clear(&mut self) {
        if self.user_id.take().is_some() {
            self.modified = true;
        }
    }

    /// Whether the session changed during this request.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }
}
