//! Syncing a GitHub account into the directory at sign-in.
//!
//! The OAuth callback gathers an [`AccountSnapshot`] from the GitHub API and
//! hands it to [`sync_account`], which records the user, their organizations
//! and every repository they can reach.

use tracing::{debug, info};

use gitreport_shared::github::{GitHubOrganization, GitHubRepository, GitHubUser};
use gitreport_shared::types::AccessToken;

use crate::directory::{DirectoryError, DirectoryWriter, Holder, User};

/// One organization and the repositories listed under it.
#[derive(Debug, Clone)]
pub struct OrganizationSnapshot {
    /// The organization.
    pub organization: GitHubOrganization,
    /// Its repositories.
    pub repositories: Vec<GitHubRepository>,
}

/// What GitHub reported about an account at sign-in.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    /// The authenticated account.
    pub user: GitHubUser,
    /// Token from the code exchange.
    pub access_token: AccessToken,
    /// Repositories from `/user/repos`.
    pub repositories: Vec<GitHubRepository>,
    /// Organizations from `/user/orgs`, with their repositories.
    pub organizations: Vec<OrganizationSnapshot>,
}

impl AccountSnapshot {
    /// A snapshot with no repositories or organizations, used when the
    /// rate limit leaves no room for discovery.
    #[must_use]
    pub fn user_only(user: GitHubUser, access_token: AccessToken) -> Self {
        Self {
            user,
            access_token,
            repositories: Vec::new(),
            organizations: Vec::new(),
        }
    }
}

/// Records the account and everything it can reach. Returns the stored user.
///
/// Repositories listed under a login other than their holder's (forks of
/// collaborators, for instance) are skipped. Repositories seen for the first
/// time start inactive.
pub async fn sync_account<W: DirectoryWriter + ?Sized>(
    writer: &W,
    snapshot: &AccountSnapshot,
) -> Result<User, DirectoryError> {
    let mut user = writer
        .upsert_user(
            snapshot.user.id,
            &snapshot.user.login,
            &snapshot.access_token,
        )
        .await?;

    let personal = Holder::from(&user);
    let mut synced = sync_repositories(writer, &user, &personal, &snapshot.repositories).await?;

    for entry in &snapshot.organizations {
        let organization = writer.upsert_organization(&entry.organization.login).await?;
        writer.add_member(organization.id, user.id).await?;
        if !user.organization_ids.contains(&organization.id) {
            user.organization_ids.push(organization.id);
        }

        let holder = Holder::from(&organization);
        synced += sync_repositories(writer, &user, &holder, &entry.repositories).await?;
    }

    info!(
        user_id = %user.id,
        username = %user.username,
        organizations = snapshot.organizations.len(),
        repositories = synced,
        "account synced"
    );
    Ok(user)
}

async fn sync_repositories<W: DirectoryWriter + ?Sized>(
    writer: &W,
    user: &User,
    holder: &Holder,
    repositories: &[GitHubRepository],
) -> Result<usize, DirectoryError> {
    let mut synced = 0;
    for listed in repositories {
        if !listed.owner.login.eq_ignore_ascii_case(holder.name()) {
            debug!(
                repository = %listed.name,
                owner = %listed.owner.login,
                holder = %holder.name(),
                "skipping repository held elsewhere"
            );
            continue;
        }
        let repository = writer.upsert_repository(holder, &listed.name).await?;
        writer.grant_access(repository.id, user.id).await?;
        synced += 1;
    }
    Ok(synced)
}
