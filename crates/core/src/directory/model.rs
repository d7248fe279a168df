//! Users, organizations and repositories as the guard and handlers see them.

use serde::Serialize;

use gitreport_shared::types::{AccessToken, OrganizationId, RepositoryId, UserId};

/// A GitHub user who has signed in at least once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Internal ID.
    pub id: UserId,
    /// Numeric GitHub account ID.
    pub github_id: i64,
    /// GitHub login.
    pub username: String,
    /// Token stored at the last sign-in; may be absent or revoked.
    pub access_token: Option<AccessToken>,
    /// Organizations the user is a member of.
    pub organization_ids: Vec<OrganizationId>,
}

/// A GitHub organization discovered through a member's sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    /// Internal ID.
    pub id: OrganizationId,
    /// GitHub organization login.
    pub name: String,
    /// Members known to the service.
    pub member_ids: Vec<UserId>,
}

/// The account a repository lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Holder {
    /// A personal repository.
    User {
        /// Holder's user ID.
        id: UserId,
        /// Holder's login.
        username: String,
    },
    /// An organization repository.
    Organization {
        /// Holder's organization ID.
        id: OrganizationId,
        /// Organization login.
        name: String,
    },
}

impl Holder {
    /// Login of the holder, as used in public URLs and GitHub API paths.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::User { username, .. } => username,
            Self::Organization { name, .. } => name,
        }
    }
}

impl From<&User> for Holder {
    fn from(user: &User) -> Self {
        Self::User {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

impl From<&Organization> for Holder {
    fn from(org: &Organization) -> Self {
        Self::Organization {
            id: org.id,
            name: org.name.clone(),
        }
    }
}

/// Owner-editable settings of the public issue form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositorySettings {
    /// Heading shown on the public page instead of the repository name.
    pub display_name: Option<String>,
    /// Title given to filed issues.
    pub issue_name: Option<String>,
    /// Text shown above the form.
    pub prompt: Option<String>,
    /// Text shown after a successful submission.
    pub followup: Option<String>,
    /// Comma-separated labels applied to filed issues.
    pub labels: Option<String>,
}

impl RepositorySettings {
    /// Normalizes form input: trims values and turns blanks into `None`.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            display_name: clean(self.display_name),
            issue_name: clean(self.issue_name),
            prompt: clean(self.prompt),
            followup: clean(self.followup),
            labels: clean(self.labels),
        }
    }

    /// Label names parsed from the comma-separated setting.
    #[must_use]
    pub fn label_list(&self) -> Vec<String> {
        self.labels
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(String::from)
            .collect()
    }
}

/// A code repository that can expose a public issue form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Internal ID.
    pub id: RepositoryId,
    /// GitHub repository name.
    pub name: String,
    /// Account the repository lives under.
    pub holder: Holder,
    /// Whether the public form is open.
    pub is_active: bool,
    /// Users granted access through sync.
    pub user_ids: Vec<UserId>,
    /// Form settings.
    pub settings: RepositorySettings,
}

impl Repository {
    /// Whether `user` may manage this repository.
    ///
    /// True for permitted users, for the user holder, and for members of the
    /// organization holder. Evaluated fresh on every call.
    #[must_use]
    pub fn check_owner(&self, user: &User) -> bool {
        if self.user_ids.contains(&user.id) {
            return true;
        }
        match &self.holder {
            Holder::User { id, .. } => *id == user.id,
            Holder::Organization { id, .. } => user.organization_ids.contains(id),
        }
    }

    /// Login of the holder.
    #[must_use]
    pub fn holder_name(&self) -> &str {
        self.holder.name()
    }

    /// Heading for pages: the display name, falling back to the repository name.
    #[must_use]
    pub fn title(&self) -> &str {
        self.settings.display_name.as_deref().unwrap_or(&self.name)
    }
}
