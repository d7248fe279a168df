//! Reasons a guard halts a request.

use thiserror::Error;

use gitreport_shared::types::UserId;

use crate::directory::DirectoryError;

/// Why a guard refused a request.
///
/// Every denial is answered with a redirect or a not-found page; none
/// surfaces as an error to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenial {
    /// Nobody is signed in.
    #[error("not signed in")]
    NotSignedIn,

    /// The session names a user that no longer exists.
    #[error("session references missing user {0}")]
    StaleSessionReference(UserId),

    /// No repository has the requested ID.
    #[error("repository {0} not found")]
    RepositoryNotFound(String),

    /// The signed-in user does not own the repository.
    #[error("user {0} does not own the repository")]
    NotOwner(UserId),

    /// The holder or repository is unknown, or the repository is inactive.
    #[error("repository {holder}/{name} is inactive or missing")]
    InactiveOrMissingRepository {
        /// Requested holder login.
        holder: String,
        /// Requested repository name.
        name: String,
    },
}

/// Internal result of a guard check before it is turned into a verdict.
#[derive(Debug, Error)]
pub(crate) enum GuardError {
    #[error(transparent)]
    Denied(#[from] AccessDenial),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
