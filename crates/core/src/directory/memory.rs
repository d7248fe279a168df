//! In-memory directory for tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use gitreport_shared::types::{AccessToken, OrganizationId, RepositoryId, UserId};

use super::{
    Directory, DirectoryError, DirectoryWriter, Holder, Organization, Repository,
    RepositorySettings, User,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    organizations: Vec<Organization>,
    repositories: Vec<Repository>,
}

/// Directory backed by plain vectors behind a lock.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    tables: RwLock<Tables>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user with the given login and optional token.
    pub async fn add_user(&self, username: &str, token: Option<&str>) -> User {
        let mut tables = self.tables.write().await;
        let user = User {
            id: UserId::new(),
            github_id: i64::try_from(tables.users.len()).unwrap_or(i64::MAX) + 1,
            username: username.to_string(),
            access_token: token.map(AccessToken::new),
            organization_ids: Vec::new(),
        };
        tables.users.push(user.clone());
        user
    }

    /// Adds a repository with explicit activation and permitted users.
    pub async fn add_repository(
        &self,
        holder: &Holder,
        name: &str,
        is_active: bool,
        user_ids: &[UserId],
    ) -> Repository {
        let repository = Repository {
            id: RepositoryId::new(),
            name: name.to_string(),
            holder: holder.clone(),
            is_active,
            user_ids: user_ids.to_vec(),
            settings: RepositorySettings::default(),
        };
        self.tables
            .write()
            .await
            .repositories
            .push(repository.clone());
        repository
    }

    /// Deletes a user, leaving any session that references it dangling.
    pub async fn remove_user(&self, id: UserId) {
        self.tables.write().await.users.retain(|u| u.id != id);
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.iter().find(|o| o.name == name).cloned())
    }

    async fn repository_exists(&self, id: RepositoryId) -> Result<bool, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.repositories.iter().any(|r| r.id == id))
    }

    async fn find_repository(
        &self,
        id: RepositoryId,
    ) -> Result<Option<Repository>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables.repositories.iter().find(|r| r.id == id).cloned())
    }

    async fn find_holder_repository(
        &self,
        holder: &Holder,
        name: &str,
    ) -> Result<Option<Repository>, DirectoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .repositories
            .iter()
            .find(|r| r.holder == *holder && r.name == name)
            .cloned())
    }

    async fn repositories_for_user(&self, user: &User) -> Result<Vec<Repository>, DirectoryError> {
        let tables = self.tables.read().await;
        let mut owned: Vec<Repository> = tables
            .repositories
            .iter()
            .filter(|r| r.check_owner(user))
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            (a.holder_name(), a.name.as_str()).cmp(&(b.holder_name(), b.name.as_str()))
        });
        Ok(owned)
    }
}

#[async_trait]
impl DirectoryWriter for InMemoryDirectory {
    async fn upsert_user(
        &self,
        github_id: i64,
        username: &str,
        access_token: &AccessToken,
    ) -> Result<User, DirectoryError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.iter_mut().find(|u| u.github_id == github_id) {
            user.username = username.to_string();
            user.access_token = Some(access_token.clone());
            return Ok(user.clone());
        }

        let user = User {
            id: UserId::new(),
            github_id,
            username: username.to_string(),
            access_token: Some(access_token.clone()),
            organization_ids: Vec::new(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn upsert_organization(&self, name: &str) -> Result<Organization, DirectoryError> {
        let mut tables = self.tables.write().await;
        if let Some(org) = tables.organizations.iter().find(|o| o.name == name) {
            return Ok(org.clone());
        }

        let org = Organization {
            id: OrganizationId::new(),
            name: name.to_string(),
            member_ids: Vec::new(),
        };
        tables.organizations.push(org.clone());
        Ok(org)
    }

    async fn add_member(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<(), DirectoryError> {
        let mut tables = self.tables.write().await;

        let org = tables
            .organizations
            .iter_mut()
            .find(|o| o.id == organization_id)
            .ok_or_else(|| DirectoryError::Missing {
                entity: "organization",
                id: organization_id.to_string(),
            })?;
        if !org.member_ids.contains(&user_id) {
            org.member_ids.push(user_id);
        }

        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| DirectoryError::Missing {
                entity: "user",
                id: user_id.to_string(),
            })?;
        if !user.organization_ids.contains(&organization_id) {
            user.organization_ids.push(organization_id);
        }
        Ok(())
    }

    async fn upsert_repository(
        &self,
        holder: &Holder,
        name: &str,
    ) -> Result<Repository, DirectoryError> {
        let mut tables = self.tables.write().await;
        if let Some(repo) = tables
            .repositories
            .iter()
            .find(|r| r.holder == *holder && r.name == name)
        {
            return Ok(repo.clone());
        }

        let repo = Repository {
            id: RepositoryId::new(),
            name: name.to_string(),
            holder: holder.clone(),
            is_active: false,
            user_ids: Vec::new(),
            settings: RepositorySettings::default(),
        };
        tables.repositories.push(repo.clone());
        Ok(repo)
    }

    async fn grant_access(
        &self,
        repository_id: RepositoryId,
        user_id: UserId,
    ) -> Result<(), DirectoryError> {
        let mut tables = self.tables.write().await;
        let repo = tables
            .repositories
            .iter_mut()
            .find(|r| r.id == repository_id)
            .ok_or_else(|| DirectoryError::missing_repository(repository_id))?;
        if !repo.user_ids.contains(&user_id) {
            repo.user_ids.push(user_id);
        }
        Ok(())
    }

    async fn update_settings(
        &self,
        repository_id: RepositoryId,
        settings: RepositorySettings,
    ) -> Result<Repository, DirectoryError> {
        let mut tables = self.tables.write().await;
        let repo = tables
            .repositories
            .iter_mut()
            .find(|r| r.id == repository_id)
            .ok_or_else(|| DirectoryError::missing_repository(repository_id))?;
        repo.settings = settings;
        Ok(repo.clone())
    }

    async fn set_active(
        &self,
        repository_id: RepositoryId,
        active: bool,
    ) -> Result<Repository, DirectoryError> {
        let mut tables = self.tables.write().await;
        let repo = tables
            .repositories
            .iter_mut()
            .find(|r| r.id == repository_id)
            .ok_or_else(|| DirectoryError::missing_repository(repository_id))?;
        repo.is_active = active;
        Ok(repo.clone())
    }
}
