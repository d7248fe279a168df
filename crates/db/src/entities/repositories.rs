//! `SeaORM` Entity for repositories table.
//!
//! Exactly one of `holder_user_id` and `holder_organization_id` is set; the
//! table enforces it with a check constraint.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub holder_user_id: Option<Uuid>,
    pub holder_organization_id: Option<Uuid>,
    pub is_active: bool,
    pub display_name: Option<String>,
    pub issue_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub prompt: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub followup: Option<String>,
    pub labels: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::HolderUserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    HolderUser,
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::HolderOrganizationId",
        to = "super::organizations::Column::Id",
        on_delete = "Cascade"
    )]
    HolderOrganization,
    #[sea_orm(has_many = "super::repository_users::Entity")]
    RepositoryUsers,
}

impl Related<super::repository_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RepositoryUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
