//! Turning a visitor's report into a GitHub issue.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gitreport_shared::github::CreateIssue;
use gitreport_shared::types::AccessToken;

use crate::directory::{Directory, DirectoryError, Repository};

/// Why a report was turned away before reaching GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    /// A required field was left blank.
    #[error("{0} can't be blank")]
    Blank(&'static str),

    /// The email address is not plausible.
    #[error("email doesn't look like an address")]
    InvalidEmail,
}

/// A report as submitted through the public form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    /// Reporter's name.
    #[serde(default)]
    pub name: String,
    /// Reporter's email address.
    #[serde(default)]
    pub email: String,
    /// What went wrong.
    #[serde(default)]
    pub details: String,
    /// CAPTCHA answer token. The reCAPTCHA widget posts it under its own name.
    #[serde(default, alias = "g-recaptcha-response")]
    pub captcha: String,
}

impl IssueReport {
    /// Checks the required fields, in form order.
    pub fn validate(&self) -> Result<(), IssueError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("details", &self.details),
        ] {
            if value.trim().is_empty() {
                return Err(IssueError::Blank(field));
            }
        }
        if !self.email.contains('@') {
            return Err(IssueError::InvalidEmail);
        }
        Ok(())
    }

    /// Builds the issue filed against `repository`.
    #[must_use]
    pub fn compose(&self, repository: &Repository) -> CreateIssue {
        let name = self.name.trim();
        let title = repository
            .settings
            .issue_name
            .clone()
            .unwrap_or_else(|| format!("Issue report from {name}"));
        let body = format!(
            "**Reported by:** {name}\n**Email:** {email}\n\n{details}\n",
            email = self.email.trim(),
            details = self.details.trim(),
        );

        CreateIssue {
            title,
            body,
            labels: repository.settings.label_list(),
        }
    }
}

/// Token used to file issues for `repository`: that of the first permitted
/// user who has one.
pub async fn filing_token<D: Directory + ?Sized>(
    directory: &D,
    repository: &Repository,
) -> Result<Option<AccessToken>, DirectoryError> {
    for user_id in &repository.user_ids {
        if let Some(token) = directory
            .find_user(*user_id)
            .await?
            .and_then(|user| user.access_token)
        {
            return Ok(Some(token));
        }
    }
    Ok(None)
}
