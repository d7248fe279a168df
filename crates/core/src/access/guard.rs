//! The access guard.
//!
//! Each check produces exactly one [`Verdict`]. Denials are answered with a
//! redirect or a not-found page; only directory failures come back as errors.

use tracing::{debug, warn};

use gitreport_shared::types::{AccessToken, RepositoryId};

use super::error::{AccessDenial, GuardError};
use super::verdict::{RedirectTarget, Template, Verdict};
use crate::directory::{Directory, DirectoryError, User, find_holder};
use crate::session::Session;

/// Request-scoped guard over a session and a directory.
pub struct AccessGuard<'a, D: Directory + ?Sized> {
    directory: &'a D,
    session: &'a mut Session,
}

impl<'a, D: Directory + ?Sized> AccessGuard<'a, D> {
    /// Creates a guard for the current request.
    pub fn new(directory: &'a D, session: &'a mut Session) -> Self {
        Self { directory, session }
    }

    /// The session as the guard left it.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.session
    }

    /// Whether the session names a user. Performs no lookup.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.user_id().is_some()
    }

    /// The signed-in user.
    ///
    /// A session naming a user that no longer exists is treated as signed
    /// out: the session is cleared and `None` is returned.
    pub async fn current_user(&mut self) -> Result<Option<User>, DirectoryError> {
        match self.resolve_user().await {
            Ok(user) => Ok(Some(user)),
            Err(GuardError::Denied(_)) => Ok(None),
            Err(GuardError::Directory(err)) => Err(err),
        }
    }

    /// The signed-in user's stored GitHub token, unvalidated.
    pub async fn current_access_token(&mut self) -> Result<Option<AccessToken>, DirectoryError> {
        Ok(self.current_user().await?.and_then(|user| user.access_token))
    }

    /// Sends signed-out visitors to the login page.
    #[must_use]
    pub fn require_signed_in(&self) -> Verdict {
        if self.is_signed_in() {
            Verdict::Proceed
        } else {
            let verdict = Verdict::Redirect(RedirectTarget::Login);
            debug!(denial = %AccessDenial::NotSignedIn, %verdict, "access denied");
            verdict
        }
    }

    /// Lets only the owner of repository `requested_id` through.
    ///
    /// Checked in order: signed in as a known user (else root, clearing a
    /// stale session), repository exists (else repository not-found page),
    /// ownership (else profile).
    pub async fn require_own_repository(
        &mut self,
        requested_id: &str,
    ) -> Result<Verdict, DirectoryError> {
        let outcome = self.check_own_repository(requested_id).await;
        settle(outcome, |denial| match denial {
            AccessDenial::NotSignedIn | AccessDenial::StaleSessionReference(_) => {
                Verdict::Redirect(RedirectTarget::Root)
            }
            AccessDenial::RepositoryNotFound(_) => Verdict::Render(Template::RepositoryNotFound),
            AccessDenial::NotOwner(_) => Verdict::Redirect(RedirectTarget::Profile),
            AccessDenial::InactiveOrMissingRepository { .. } => {
                Verdict::Render(Template::NotFound)
            }
        })
    }

    /// Lets requests for an active repository of a known holder through.
    ///
    /// The holder login is tried as a user first, then as an organization.
    /// Every denial renders the not-found page, whoever is asking.
    pub async fn require_repository_active(
        &self,
        holder_username: &str,
        repository_name: &str,
    ) -> Result<Verdict, DirectoryError> {
        let outcome = self
            .check_repository_active(holder_username, repository_name)
            .await;
        settle(outcome, |_| Verdict::Render(Template::NotFound))
    }

    /// Signs the visitor out. Idempotent.
    pub fn logout(&mut self) {
        self.session.clear();
    }

    async fn resolve_user(&mut self) -> Result<User, GuardError> {
        let Some(user_id) = self.session.user_id() else {
            return Err(AccessDenial::NotSignedIn.into());
        };

        if let Some(user) = self.directory.find_user(user_id).await? {
            return Ok(user);
        }

        warn!(%user_id, "session references a missing user; signing out");
        self.session.clear();
        Err(AccessDenial::StaleSessionReference(user_id).into())
    }

    async fn check_own_repository(&mut self, requested_id: &str) -> Result<(), GuardError> {
        let user = self.resolve_user().await?;

        let not_found = || AccessDenial::RepositoryNotFound(requested_id.to_string());
        let Ok(id) = requested_id.parse::<RepositoryId>() else {
            return Err(not_found().into());
        };
        if !self.directory.repository_exists(id).await? {
            return Err(not_found().into());
        }
        let Some(repository) = self.directory.find_repository(id).await? else {
            return Err(not_found().into());
        };

        if repository.check_owner(&user) {
            Ok(())
        } else {
            Err(AccessDenial::NotOwner(user.id).into())
        }
    }

    async fn check_repository_active(
        &self,
        holder_username: &str,
        repository_name: &str,
    ) -> Result<(), GuardError> {
        let denial = || AccessDenial::InactiveOrMissingRepository {
            holder: holder_username.to_string(),
            name: repository_name.to_string(),
        };

        let Some(holder) = find_holder(self.directory, holder_username).await? else {
            return Err(denial().into());
        };

        match self
            .directory
            .find_holder_repository(&holder, repository_name)
            .await?
        {
            Some(repository) if repository.is_active => Ok(()),
            _ => Err(denial().into()),
        }
    }
}

fn settle(
    outcome: Result<(), GuardError>,
    verdict_for: impl FnOnce(&AccessDenial) -> Verdict,
) -> Result<Verdict, DirectoryError> {
    match outcome {
        Ok(()) => Ok(Verdict::Proceed),
        Err(GuardError::Denied(denial)) => {
            let verdict = verdict_for(&denial);
            debug!(%denial, %verdict, "access denied");
            Ok(verdict)
        }
        Err(GuardError::Directory(err)) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use gitreport_shared::types::UserId;

    use super::*;
    use crate::directory::memory::InMemoryDirectory;
    use crate::directory::{DirectoryWriter, Holder, Repository};

    struct Fixture {
        directory: InMemoryDirectory,
        user: User,
        org_user: User,
        another_user: User,
        repository: Repository,
        org_repository: Repository,
        inactive_repository: Repository,
    }

    async fn fixture() -> Fixture {
        let directory = InMemoryDirectory::new();
        let user = directory.add_user("greptest", Some("access")).await;
        let another_user = directory.add_user("another", None).await;
        let org_user = directory.add_user("org_user", None).await;

        let org = directory.upsert_organization("greporg").await.unwrap();
        directory.add_member(org.id, org_user.id).await.unwrap();
        let org_user = directory.find_user(org_user.id).await.unwrap().unwrap();

        let repository = directory
            .add_repository(&Holder::from(&user), "CoolCode", true, &[user.id])
            .await;
        let org_repository = directory
            .add_repository(&Holder::from(&org), "CoolOrg", true, &[org_user.id])
            .await;
        let inactive_repository = directory
            .add_repository(&Holder::from(&user), "CoolInactive", false, &[user.id])
            .await;

        Fixture {
            directory,
            user,
            org_user,
            another_user,
            repository,
            org_repository,
            inactive_repository,
        }
    }

    #[tokio::test]
    async fn test_signed_out_session_has_no_user_or_token() {
        let f = fixture().await;
        let mut session = Session::anonymous();
        let mut guard = AccessGuard::new(&f.directory, &mut session);

        assert!(!guard.is_signed_in());
        assert!(guard.current_user().await.unwrap().is_none());
        assert!(guard.current_access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_user_and_token_for_signed_in_session() {
        let f = fixture().await;
        let mut session = Session::restored(f.user.id);
        let mut guard = AccessGuard::new(&f.directory, &mut session);

        assert!(guard.is_signed_in());
        assert_eq!(guard.current_user().await.unwrap().unwrap().username, "greptest");
        assert_eq!(
            guard.current_access_token().await.unwrap().unwrap().expose(),
            "access"
        );
    }

    #[tokio::test]
    async fn test_current_access_token_may_be_absent() {
        let f = fixture().await;
        let mut session = Session::restored(f.another_user.id);
        let mut guard = AccessGuard::new(&f.directory, &mut session);

        assert!(guard.current_access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_require_signed_in() {
        let f = fixture().await;

        let mut anonymous = Session::anonymous();
        let guard = AccessGuard::new(&f.directory, &mut anonymous);
        assert_eq!(
            guard.require_signed_in(),
            Verdict::Redirect(RedirectTarget::Login)
        );

        let mut signed_in = Session::restored(f.user.id);
        let guard = AccessGuard::new(&f.directory, &mut signed_in);
        assert_eq!(guard.require_signed_in(), Verdict::Proceed);
    }

    #[tokio::test]
    async fn test_require_own_repository_signed_out_goes_to_root() {
        let f = fixture().await;
        let mut session = Session::anonymous();
        let mut guard = AccessGuard::new(&f.directory, &mut session);

        let existing = f.repository.id.to_string();
        assert_eq!(
            guard.require_own_repository(&existing).await.unwrap(),
            Verdict::Redirect(RedirectTarget::Root)
        );
        let missing = RepositoryId::new().to_string();
        assert_eq!(
            guard.require_own_repository(&missing).await.unwrap(),
            Verdict::Redirect(RedirectTarget::Root)
        );
    }

    #[tokio::test]
    async fn test_require_own_repository_missing_renders_repository_404() {
        let f = fixture().await;
        let mut session = Session::restored(f.user.id);
        let mut guard = AccessGuard::new(&f.directory, &mut session);

        for requested in [RepositoryId::new().to_string(), "not-a-uuid".to_string()] {
            assert_eq!(
                guard.require_own_repository(&requested).await.unwrap(),
                Verdict::Render(Template::RepositoryNotFound)
            );
        }
    }

    #[tokio::test]
    async fn test_require_own_repository_non_owner_goes_to_profile() {
        let f = fixture().await;
        let mut session = Session::restored(f.another_user.id);
        let mut guard = AccessGuard::new(&f.directory, &mut session);

        for repo in [&f.repository, &f.org_repository] {
            assert_eq!(
                guard
                    .require_own_repository(&repo.id.to_string())
                    .await
                    .unwrap(),
                Verdict::Redirect(RedirectTarget::Profile)
            );
        }
    }

    #[tokio::test]
    async fn test_require_own_repository_owner_and_org_member_proceed() {
        let f = fixture().await;

        let mut session = Session::restored(f.user.id);
        let mut guard = AccessGuard::new(&f.directory, &mut session);
        assert_eq!(
            guard
                .require_own_repository(&f.inactive_repository.id.to_string())
                .await
                .unwrap(),
            Verdict::Proceed
        );

        let mut session = Session::restored(f.org_user.id);
        let mut guard = AccessGuard::new(&f.directory, &mut session);
        assert_eq!(
            guard
                .require_own_repository(&f.org_repository.id.to_string())
                .await
                .unwrap(),
            Verdict::Proceed
        );
    }

    #[tokio::test]
    async fn test_stale_session_is_signed_out() {
        let f = fixture().await;
        f.directory.remove_user(f.another_user.id).await;

        let mut session = Session::restored(f.another_user.id);
        let mut guard = AccessGuard::new(&f.directory, &mut session);
        assert_eq!(
            guard
                .require_own_repository(&f.repository.id.to_string())
                .await
                .unwrap(),
            Verdict::Redirect(RedirectTarget::Root)
        );
        assert!(!guard.is_signed_in());
        assert!(session.is_modified());
    }

    #[tokio::test]
    async fn test_stale_session_with_unknown_repository_is_signed_out() {
        let f = fixture().await;
        f.directory.remove_user(f.another_user.id).await;

        let mut session = Session::restored(f.another_user.id);
        let mut guard = AccessGuard::new(&f.directory, &mut session);
        for requested in [RepositoryId::new().to_string(), "not-an-id".to_string()] {
            assert_eq!(
                guard.require_own_repository(&requested).await.unwrap(),
                Verdict::Redirect(RedirectTarget::Root)
            );
        }
        assert!(session.user_id().is_none());
        assert!(session.is_modified());
    }

    #[tokio::test]
    async fn test_stale_session_current_user_is_none() {
        let f = fixture().await;
        let ghost = UserId::new();
        let mut session = Session::restored(ghost);
        let mut guard = AccessGuard::new(&f.directory, &mut session);

        assert!(guard.current_user().await.unwrap().is_none());
        assert!(guard.session().user_id().is_none());
    }

    #[tokio::test]
    async fn test_require_repository_active() {
        let f = fixture().await;
        let mut session = Session::anonymous();
        let guard = AccessGuard::new(&f.directory, &mut session);

        assert_eq!(
            guard
                .require_repository_active("greptest", "CoolCode")
                .await
                .unwrap(),
            Verdict::Proceed
        );
        assert_eq!(
            guard
                .require_repository_active("greporg", "CoolOrg")
                .await
                .unwrap(),
            Verdict::Proceed
        );
        assert_eq!(
            guard
                .require_repository_active("greptest", "CoolInactive")
                .await
                .unwrap(),
            Verdict::Render(Template::NotFound)
        );
        assert_eq!(
            guard
                .require_repository_active("joe_schmoe", "CoolInactive")
                .await
                .unwrap(),
            Verdict::Render(Template::NotFound)
        );
        assert_eq!(
            guard
                .require_repository_active("greptest", "Missing")
                .await
                .unwrap(),
            Verdict::Render(Template::NotFound)
        );
    }

    #[tokio::test]
    async fn test_user_holder_wins_over_organization_of_same_name() {
        let directory = InMemoryDirectory::new();
        let user = directory.add_user("shared", None).await;
        let org = directory.upsert_organization("shared").await.unwrap();
        directory
            .add_repository(&Holder::from(&org), "OrgOnly", true, &[])
            .await;
        directory
            .add_repository(&Holder::from(&user), "UserOnly", true, &[])
            .await;

        let mut session = Session::anonymous();
        let guard = AccessGuard::new(&directory, &mut session);

        assert_eq!(
            guard
                .require_repository_active("shared", "UserOnly")
                .await
                .unwrap(),
            Verdict::Proceed
        );
        assert_eq!(
            guard
                .require_repository_active("shared", "OrgOnly")
                .await
                .unwrap(),
            Verdict::Render(Template::NotFound)
        );
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let f = fixture().await;
        let mut session = Session::restored(f.user.id);
        let mut guard = AccessGuard::new(&f.directory, &mut session);

        guard.logout();
        guard.logout();

        assert!(!guard.is_signed_in());
        assert!(session.is_modified());
    }
}
