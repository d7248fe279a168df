//! User, organization and repository directory.
//!
//! The access guard only reads through [`Directory`]. Sign-in sync and the
//! owner pages write through [`DirectoryWriter`]. Storage backends implement
//! both; handlers hold them as a single [`Store`].

mod model;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use model::{Holder, Organization, Repository, RepositorySettings, User};

use async_trait::async_trait;
use thiserror::Error;

use gitreport_shared::types::{AccessToken, OrganizationId, RepositoryId, UserId};

/// Errors raised by directory backends.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A write referenced a row that does not exist.
    #[error("{entity} {id} not found")]
    Missing {
        /// Kind of row (`user`, `organization`, `repository`).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The storage backend failed.
    #[error("directory backend error: {0}")]
    Backend(String),
}

impl DirectoryError {
    /// Shorthand for a missing repository.
    #[must_use]
    pub fn missing_repository(id: RepositoryId) -> Self {
        Self::Missing {
            entity: "repository",
            id: id.to_string(),
        }
    }
}

/// Read-side lookups.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Finds a user by ID.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, DirectoryError>;

    /// Finds a user by GitHub login.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError>;

    /// Finds an organization by GitHub login.
    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, DirectoryError>;

    /// Whether a repository with this ID exists.
    async fn repository_exists(&self, id: RepositoryId) -> Result<bool, DirectoryError>;

    /// Finds a repository by ID.
    async fn find_repository(&self, id: RepositoryId)
    -> Result<Option<Repository>, DirectoryError>;

    /// Finds a holder's repository by name.
    async fn find_holder_repository(
        &self,
        holder: &Holder,
        name: &str,
    ) -> Result<Option<Repository>, DirectoryError>;

    /// Repositories the user may manage, ordered by holder then name.
    async fn repositories_for_user(&self, user: &User) -> Result<Vec<Repository>, DirectoryError>;
}

/// Write-side operations.
#[async_trait]
pub trait DirectoryWriter: Send + Sync {
    /// Creates or refreshes a user keyed by GitHub ID, storing the latest token.
    async fn upsert_user(
        &self,
        github_id: i64,
        username: &str,
        access_token: &AccessToken,
    ) -> Result<User, DirectoryError>;

    /// Creates an organization if it does not exist yet.
    async fn upsert_organization(&self, name: &str) -> Result<Organization, DirectoryError>;

    /// Adds a user to an organization. Idempotent.
    async fn add_member(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<(), DirectoryError>;

    /// Creates a repository under a holder if it does not exist yet.
    ///
    /// New repositories start inactive.
    async fn upsert_repository(
        &self,
        holder: &Holder,
        name: &str,
    ) -> Result<Repository, DirectoryError>;

    /// Grants a user access to a repository. Idempotent.
    async fn grant_access(
        &self,
        repository_id: RepositoryId,
        user_id: UserId,
    ) -> Result<(), DirectoryError>;

    /// Replaces the form settings of a repository.
    async fn update_settings(
        &self,
        repository_id: RepositoryId,
        settings: RepositorySettings,
    ) -> Result<Repository, DirectoryError>;

    /// Opens or closes the public form.
    async fn set_active(
        &self,
        repository_id: RepositoryId,
        active: bool,
    ) -> Result<Repository, DirectoryError>;
}

/// Resolves a login to its holder: users first, then organizations.
pub async fn find_holder<D: Directory + ?Sized>(
    directory: &D,
    login: &str,
) -> Result<Option<Holder>, DirectoryError> {
    if let Some(user) = directory.find_user_by_username(login).await? {
        return Ok(Some(Holder::from(&user)));
    }
    Ok(directory
        .find_organization_by_name(login)
        .await?
        .map(|org| Holder::from(&org)))
}

/// A backend offering both sides.
pub trait Store: Directory + DirectoryWriter {}

impl<T: Directory + DirectoryWriter + ?Sized> Store for T {}
