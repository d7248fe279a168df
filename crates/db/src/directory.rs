//! Postgres-backed implementation of the core directory traits.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};
use tracing::error;
use uuid::Uuid;

use gitreport_core::{
    Directory, DirectoryError, DirectoryWriter, Holder, Organization, Repository,
    RepositorySettings, User,
};
use gitreport_shared::types::{AccessToken, OrganizationId, RepositoryId, UserId};

use crate::entities::{organizations, repositories, users};
use crate::repositories::{OrganizationRepository, RepositoryRepository, UserRepository};

fn backend(err: DbErr) -> DirectoryError {
    error!(error = %err, "directory query failed");
    DirectoryError::Backend(err.to_string())
}

fn missing(entity: &'static str, id: Uuid) -> DirectoryError {
    DirectoryError::Missing {
        entity,
        id: id.to_string(),
    }
}

pub(crate) fn user_from_model(model: users::Model, organization_ids: Vec<Uuid>) -> User {
    User {
        id: UserId::from_uuid(model.id),
        github_id: model.github_id,
        username: model.username,
        access_token: model.access_token.map(AccessToken::new),
        organization_ids: organization_ids
            .into_iter()
            .map(OrganizationId::from_uuid)
            .collect(),
    }
}

pub(crate) fn organization_from_model(
    model: organizations::Model,
    member_ids: Vec<Uuid>,
) -> Organization {
    Organization {
        id: OrganizationId::from_uuid(model.id),
        name: model.name,
        member_ids: member_ids.into_iter().map(UserId::from_uuid).collect(),
    }
}

pub(crate) fn settings_from_model(model: &repositories::Model) -> RepositorySettings {
    RepositorySettings {
        display_name: model.display_name.clone(),
        issue_name: model.issue_name.clone(),
        prompt: model.prompt.clone(),
        followup: model.followup.clone(),
        labels: model.labels.clone(),
    }
}

/// Directory reading and writing through `SeaORM`.
#[derive(Debug, Clone)]
pub struct PgDirectory {
    users: UserRepository,
    organizations: OrganizationRepository,
    repositories: RepositoryRepository,
}

impl PgDirectory {
    /// Creates a directory over a connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            organizations: OrganizationRepository::new(db.clone()),
            repositories: RepositoryRepository::new(db),
        }
    }

    async fn load_user(&self, model: users::Model) -> Result<User, DbErr> {
        let organization_ids = self.users.organization_ids(model.id).await?;
        Ok(user_from_model(model, organization_ids))
    }

    async fn load_organization(&self, model: organizations::Model) -> Result<Organization, DbErr> {
        let member_ids = self.organizations.member_ids(model.id).await?;
        Ok(organization_from_model(model, member_ids))
    }

    async fn load_holder(&self, model: &repositories::Model) -> Result<Holder, DirectoryError> {
        match (model.holder_user_id, model.holder_organization_id) {
            (Some(user_id), _) => {
                let user = self
                    .users
                    .find_by_id(user_id)
                    .await
                    .map_err(backend)?
                    .ok_or_else(|| missing("user", user_id))?;
                Ok(Holder::User {
                    id: UserId::from_uuid(user.id),
                    username: user.username,
                })
            }
            (None, Some(org_id)) => {
                let org = self
                    .organizations
                    .find_by_id(org_id)
                    .await
                    .map_err(backend)?
                    .ok_or_else(|| missing("organization", org_id))?;
                Ok(Holder::Organization {
                    id: OrganizationId::from_uuid(org.id),
                    name: org.name,
                })
            }
            (None, None) => Err(DirectoryError::Backend(format!(
                "repository {} has no holder",
                model.id
            ))),
        }
    }

    async fn load_repository(
        &self,
        model: repositories::Model,
    ) -> Result<Repository, DirectoryError> {
        let holder = self.load_holder(&model).await?;
        let user_ids = self
            .repositories
            .user_ids(model.id)
            .await
            .map_err(backend)?;
        Ok(Repository {
            id: RepositoryId::from_uuid(model.id),
            settings: settings_from_model(&model),
            name: model.name,
            holder,
            is_active: model.is_active,
            user_ids: user_ids.into_iter().map(UserId::from_uuid).collect(),
        })
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        match self.users.find_by_id(id.into_inner()).await.map_err(backend)? {
            Some(model) => Ok(Some(self.load_user(model).await.map_err(backend)?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        match self
            .users
            .find_by_username(username)
            .await
            .map_err(backend)?
        {
            Some(model) => Ok(Some(self.load_user(model).await.map_err(backend)?)),
            None => Ok(None),
        }
    }

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, DirectoryError> {
        match self
            .organizations
            .find_by_name(name)
            .await
            .map_err(backend)?
        {
            Some(model) => Ok(Some(self.load_organization(model).await.map_err(backend)?)),
            None => Ok(None),
        }
    }

    async fn repository_exists(&self, id: RepositoryId) -> Result<bool, DirectoryError> {
        self.repositories
            .exists(id.into_inner())
            .await
            .map_err(backend)
    }

    async fn find_repository(
        &self,
        id: RepositoryId,
    ) -> Result<Option<Repository>, DirectoryError> {
        match self
            .repositories
            .find_by_id(id.into_inner())
            .await
            .map_err(backend)?
        {
            Some(model) => Ok(Some(self.load_repository(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_holder_repository(
        &self,
        holder: &Holder,
        name: &str,
    ) -> Result<Option<Repository>, DirectoryError> {
        match self
            .repositories
            .find_by_holder_and_name(holder, name)
            .await
            .map_err(backend)?
        {
            Some(model) => Ok(Some(self.load_repository(model).await?)),
            None => Ok(None),
        }
    }

    async fn repositories_for_user(&self, user: &User) -> Result<Vec<Repository>, DirectoryError> {
        let organization_ids: Vec<Uuid> = user
            .organization_ids
            .iter()
            .map(|id| id.into_inner())
            .collect();
        let models = self
            .repositories
            .list_manageable(user.id.into_inner(), &organization_ids)
            .await
            .map_err(backend)?;

        let mut owned = Vec::with_capacity(models.len());
        for model in models {
            owned.push(self.load_repository(model).await?);
        }
        owned.sort_by(|a, b| {
            (a.holder_name(), a.name.as_str()).cmp(&(b.holder_name(), b.name.as_str()))
        });
        Ok(owned)
    }
}

#[async_trait]
impl DirectoryWriter for PgDirectory {
    async fn upsert_user(
        &self,
        github_id: i64,
        username: &str,
        access_token: &AccessToken,
    ) -> Result<User, DirectoryError> {
        let model = self
            .users
            .upsert(github_id, username, access_token.expose())
            .await
            .map_err(backend)?;
        self.load_user(model).await.map_err(backend)
    }

    async fn upsert_organization(&self, name: &str) -> Result<Organization, DirectoryError> {
        let model = self
            .organizations
            .find_or_create(name)
            .await
            .map_err(backend)?;
        self.load_organization(model).await.map_err(backend)
    }

    async fn add_member(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<(), DirectoryError> {
        self.organizations
            .add_member(organization_id.into_inner(), user_id.into_inner())
            .await
            .map_err(backend)
    }

    async fn upsert_repository(
        &self,
        holder: &Holder,
        name: &str,
    ) -> Result<Repository, DirectoryError> {
        let model = self
            .repositories
            .find_or_create(holder, name)
            .await
            .map_err(backend)?;
        self.load_repository(model).await
    }

    async fn grant_access(
        &self,
        repository_id: RepositoryId,
        user_id: UserId,
    ) -> Result<(), DirectoryError> {
        self.repositories
            .grant_access(repository_id.into_inner(), user_id.into_inner())
            .await
            .map_err(backend)
    }

    async fn update_settings(
        &self,
        repository_id: RepositoryId,
        settings: RepositorySettings,
    ) -> Result<Repository, DirectoryError> {
        let model = self
            .repositories
            .update_settings(repository_id.into_inner(), settings)
            .await
            .map_err(|err| not_found_or_backend(err, repository_id))?;
        self.load_repository(model).await
    }

    async fn set_active(
        &self,
        repository_id: RepositoryId,
        active: bool,
    ) -> Result<Repository, DirectoryError> {
        let model = self
            .repositories
            .set_active(repository_id.into_inner(), active)
            .await
            .map_err(|err| not_found_or_backend(err, repository_id))?;
        self.load_repository(model).await
    }
}

fn not_found_or_backend(err: DbErr, repository_id: RepositoryId) -> DirectoryError {
    match err {
        DbErr::RecordNotFound(_) => DirectoryError::missing_repository(repository_id),
        other => backend(other),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user_model(token: Option<&str>) -> users::Model {
        let now = Utc::now().into();
        users::Model {
            id: Uuid::now_v7(),
            github_id: 7,
            username: "greptest".to_string(),
            access_token: token.map(String::from),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_from_model_carries_token_and_memberships() {
        let org = Uuid::now_v7();
        let model = user_model(Some("gho_token"));
        let id = model.id;

        let user = user_from_model(model, vec![org]);
        assert_eq!(user.id, UserId::from_uuid(id));
        assert_eq!(user.access_token.unwrap().expose(), "gho_token");
        assert_eq!(user.organization_ids, vec![OrganizationId::from_uuid(org)]);
    }

    #[test]
    fn test_user_from_model_without_token() {
        let user = user_from_model(user_model(None), Vec::new());
        assert!(user.access_token.is_none());
    }

    #[test]
    fn test_settings_from_model() {
        let now = Utc::now().into();
        let model = repositories::Model {
            id: Uuid::now_v7(),
            name: "CoolCode".to_string(),
            holder_user_id: Some(Uuid::now_v7()),
            holder_organization_id: None,
            is_active: true,
            display_name: Some("The Coolest".to_string()),
            issue_name: None,
            prompt: Some("Tell us".to_string()),
            followup: None,
            labels: Some("bug".to_string()),
            created_at: now,
            updated_at: now,
        };

        let settings = settings_from_model(&model);
        assert_eq!(settings.display_name.as_deref(), Some("The Coolest"));
        assert_eq!(settings.label_list(), vec!["bug"]);
        assert!(settings.issue_name.is_none());
    }

    #[test]
    fn test_record_not_found_maps_to_missing_repository() {
        let id = RepositoryId::new();
        let err = not_found_or_backend(DbErr::RecordNotFound("gone".to_string()), id);
        assert!(matches!(err, DirectoryError::Missing { entity: "repository", .. }));
    }
}
