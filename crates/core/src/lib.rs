//! Core logic for GitReport.
//!
//! This crate contains pure logic with ZERO web or database dependencies.
//! Handlers and storage backends plug into it through the `Directory` traits.
//!
//! # Modules
//!
//! - `session` - Request-scoped session state
//! - `access` - The access guard and the verdicts it produces
//! - `directory` - Users, organizations, repositories and the lookup traits over them
//! - `account` - Syncing a GitHub account into the directory at sign-in
//! - `issue` - Turning a visitor's report into a GitHub issue

pub mod access;
pub mod account;
pub mod directory;
pub mod issue;
pub mod session;

pub use access::{AccessDenial, AccessGuard, RedirectTarget, Template, Verdict};
pub use account::{AccountSnapshot, OrganizationSnapshot, sync_account};
pub use directory::{
    Directory, DirectoryError, DirectoryWriter, Holder, Organization, Repository,
    RepositorySettings, Store, User, find_holder,
};
pub use issue::{IssueError, IssueReport, filing_token};
pub use session::Session;
