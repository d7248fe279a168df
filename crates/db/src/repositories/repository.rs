//! Code repository records: lookup by holder, access grants, form settings.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use gitreport_core::{Holder, RepositorySettings};

use crate::entities::{repositories, repository_users};

/// Holder foreign keys as stored: `(holder_user_id, holder_organization_id)`.
pub(crate) fn holder_columns(holder: &Holder) -> (Option<Uuid>, Option<Uuid>) {
    match holder {
        Holder::User { id, .. } => (Some(id.into_inner()), None),
        Holder::Organization { id, .. } => (None, Some(id.into_inner())),
    }
}

fn holder_condition(holder: &Holder) -> Condition {
    match holder {
        Holder::User { id, .. } => {
            Condition::all().add(repositories::Column::HolderUserId.eq(id.into_inner()))
        }
        Holder::Organization { id, .. } => {
            Condition::all().add(repositories::Column::HolderOrganizationId.eq(id.into_inner()))
        }
    }
}

/// Repository for code repository rows.
#[derive(Debug, Clone)]
pub struct RepositoryRepository {
    db: DatabaseConnection,
}

impl RepositoryRepository {
    /// Creates a new repository repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a repository by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<repositories::Model>, DbErr> {
        repositories::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks whether a repository with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn exists(&self, id: Uuid) -> Result<bool, DbErr> {
        let count = repositories::Entity::find_by_id(id).count(&self.db).await?;
        Ok(count > 0)
    }

    /// Finds a holder's repository by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_holder_and_name(
        &self,
        holder: &Holder,
        name: &str,
    ) -> Result<Option<repositories::Model>, DbErr> {
        repositories::Entity::find()
            .filter(holder_condition(holder))
            .filter(repositories::Column::Name.eq(name))
            .one(&self.db)
            .await
    }

    /// Returns the holder's repository named `name`, creating it inactive if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_or_create(
        &self,
        holder: &Holder,
        name: &str,
    ) -> Result<repositories::Model, DbErr> {
        if let Some(existing) = self.find_by_holder_and_name(holder, name).await? {
            return Ok(existing);
        }

        let (holder_user_id, holder_organization_id) = holder_columns(holder);
        let now = chrono::Utc::now().into();
        let repository = repositories::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            holder_user_id: Set(holder_user_id),
            holder_organization_id: Set(holder_organization_id),
            is_active: Set(false),
            display_name: Set(None),
            issue_name: Set(None),
            prompt: Set(None),
            followup: Set(None),
            labels: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // No conflict target: the per-holder name indexes are partial.
        repositories::Entity::insert(repository)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .do_nothing()
            .exec_without_returning(&self.db)
            .await?;

        self.find_by_holder_and_name(holder, name)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("repository {}/{name}", holder.name())))
    }

    /// Grants a user access unless already granted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn grant_access(&self, repository_id: Uuid, user_id: Uuid) -> Result<(), DbErr> {
        let grant = repository_users::ActiveModel {
            repository_id: Set(repository_id),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().into()),
        };
        repository_users::Entity::insert(grant)
            .on_conflict_do_nothing()
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// IDs of users granted access, oldest grant first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_ids(&self, repository_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
        repository_users::Entity::find()
            .select_only()
            .column(repository_users::Column::UserId)
            .filter(repository_users::Column::RepositoryId.eq(repository_id))
            .order_by_asc(repository_users::Column::CreatedAt)
            .into_tuple()
            .all(&self.db)
            .await
    }

    /// Repositories a user may manage: granted ones, personal ones, and
    /// those of the given organizations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_manageable(
        &self,
        user_id: Uuid,
        organization_ids: &[Uuid],
    ) -> Result<Vec<repositories::Model>, DbErr> {
        let granted: Vec<Uuid> = repository_users::Entity::find()
            .select_only()
            .column(repository_users::Column::RepositoryId)
            .filter(repository_users::Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut reach = Condition::any()
            .add(repositories::Column::HolderUserId.eq(user_id))
            .add(repositories::Column::Id.is_in(granted));
        if !organization_ids.is_empty() {
            reach = reach.add(
                repositories::Column::HolderOrganizationId.is_in(organization_ids.iter().copied()),
            );
        }

        repositories::Entity::find()
            .filter(reach)
            .order_by_asc(repositories::Column::Name)
            .all(&self.db)
            .await
    }

    /// Replaces the form settings.
    ///
    /// # Errors
    ///
    /// Returns `DbErr::RecordNotFound` if the repository does not exist.
    pub async fn update_settings(
        &self,
        id: Uuid,
        settings: RepositorySettings,
    ) -> Result<repositories::Model, DbErr> {
        let mut repository = self.require(id).await?;
        repository.display_name = Set(settings.display_name);
        repository.issue_name = Set(settings.issue_name);
        repository.prompt = Set(settings.prompt);
        repository.followup = Set(settings.followup);
        repository.labels = Set(settings.labels);
        repository.updated_at = Set(chrono::Utc::now().into());
        repository.update(&self.db).await
    }

    /// Opens or closes the public form.
    ///
    /// # Errors
    ///
    /// Returns `DbErr::RecordNotFound` if the repository does not exist.
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<repositories::Model, DbErr> {
        let mut repository = self.require(id).await?;
        repository.is_active = Set(active);
        repository.updated_at = Set(chrono::Utc::now().into());
        repository.update(&self.db).await
    }

    async fn require(&self, id: Uuid) -> Result<repositories::ActiveModel, DbErr> {
        self.find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| DbErr::RecordNotFound(format!("repository {id}")))
    }
}
