//! Organization repository for database operations.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    Set,
};
use uuid::Uuid;

use crate::entities::{organization_users, organizations};

/// Organization repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds an organization by GitHub login.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find()
            .filter(organizations::Column::Name.eq(name))
            .one(&self.db)
            .await
    }

    /// Returns the organization named `name`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_or_create(&self, name: &str) -> Result<organizations::Model, DbErr> {
        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(existing);
        }

        let now = chrono::Utc::now().into();
        let org = organizations::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // Another sign-in may have created it since the lookup.
        organizations::Entity::insert(org)
            .on_conflict(
                OnConflict::column(organizations::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec_without_returning(&self.db)
            .await?;

        self.find_by_name(name)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("organization {name}")))
    }

    /// Adds a user to an organization unless already a member.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn add_member(&self, org_id: Uuid, user_id: Uuid) -> Result<(), DbErr> {
        let membership = organization_users::ActiveModel {
            organization_id: Set(org_id),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().into()),
        };
        organization_users::Entity::insert(membership)
            .on_conflict_do_nothing()
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// Checks if a user is a member of an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_member(&self, org_id: Uuid, user_id: Uuid) -> Result<bool, DbErr> {
        let count = organization_users::Entity::find()
            .filter(organization_users::Column::OrganizationId.eq(org_id))
            .filter(organization_users::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// IDs of an organization's members.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn member_ids(&self, org_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
        organization_users::Entity::find()
            .select_only()
            .column(organization_users::Column::UserId)
            .filter(organization_users::Column::OrganizationId.eq(org_id))
            .into_tuple()
            .all(&self.db)
            .await
    }
}
