//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod organization;
pub mod repository;
pub mod user;

pub use organization::OrganizationRepository;
pub use repository::RepositoryRepository;
pub use user::UserRepository;
