//! `SeaORM` entities, one module per table.

pub mod organization_users;
pub mod organizations;
pub mod repositories;
pub mod repository_users;
pub mod users;
