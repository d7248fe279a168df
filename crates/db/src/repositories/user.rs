//! User repository for database operations.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, Set};
use uuid::Uuid;

use crate::entities::{organization_users, users};

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user by GitHub login.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Finds a user by numeric GitHub ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_github_id(&self, github_id: i64) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::GithubId.eq(github_id))
            .one(&self.db)
            .await
    }

    /// Creates the user for `github_id`, or refreshes its login and token.
    ///
    /// A single `INSERT .. ON CONFLICT` statement, so concurrent sign-ins of
    /// the same account both succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn upsert(
        &self,
        github_id: i64,
        username: &str,
        access_token: &str,
    ) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            github_id: Set(github_id),
            username: Set(username.to_string()),
            access_token: Set(Some(access_token.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        users::Entity::insert(user)
            .on_conflict(
                OnConflict::column(users::Column::GithubId)
                    .update_columns([
                        users::Column::Username,
                        users::Column::AccessToken,
                        users::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.find_by_github_id(github_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user with GitHub ID {github_id}")))
    }

    /// IDs of the organizations a user belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn organization_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
        organization_users::Entity::find()
            .select_only()
            .column(organization_users::Column::OrganizationId)
            .filter(organization_users::Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.db)
            .await
    }
}
