//! Property-based tests for the access guard.
//!
//! Each case builds a fresh in-memory directory and drives the guard on a
//! single-threaded runtime.

use proptest::prelude::*;
use tokio::runtime::Runtime;

use gitreport_shared::types::{RepositoryId, UserId};

use crate::access::{AccessGuard, RedirectTarget, Template, Verdict};
use crate::directory::memory::InMemoryDirectory;
use crate::directory::{DirectoryWriter, Holder};
use crate::session::Session;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

/// GitHub-style logins.
fn arb_login() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}"
}

/// Who is asking: nobody, the owner, someone else, or a deleted user.
#[derive(Debug, Clone, Copy)]
enum Visitor {
    Anonymous,
    Owner,
    Stranger,
    Ghost,
}

fn arb_visitor() -> impl Strategy<Value = Visitor> {
    prop_oneof![
        Just(Visitor::Anonymous),
        Just(Visitor::Owner),
        Just(Visitor::Stranger),
        Just(Visitor::Ghost),
    ]
}

struct World {
    directory: InMemoryDirectory,
    owner: UserId,
    stranger: UserId,
    repository: RepositoryId,
}

async fn world(owner: &str, repository: &str, active: bool) -> World {
    let directory = InMemoryDirectory::new();
    let owner = directory.add_user(owner, Some("token")).await;
    let stranger = directory.add_user("zz-stranger-zz", None).await;
    let repository = directory
        .add_repository(&Holder::from(&owner), repository, active, &[owner.id])
        .await;
    World {
        directory,
        owner: owner.id,
        stranger: stranger.id,
        repository: repository.id,
    }
}

fn session_for(world: &World, visitor: Visitor) -> Session {
    match visitor {
        Visitor::Anonymous => Session::anonymous(),
        Visitor::Owner => Session::restored(world.owner),
        Visitor::Stranger => Session::restored(world.stranger),
        Visitor::Ghost => Session::restored(UserId::new()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A signed-out visitor has no user and no token, whatever is stored.
    #[test]
    fn prop_signed_out_has_no_user(owner in arb_login(), repo in arb_login()) {
        runtime().block_on(async {
            let world = world(&owner, &repo, true).await;
            let mut session = Session::anonymous();
            let mut guard = AccessGuard::new(&world.directory, &mut session);

            prop_assert!(!guard.is_signed_in());
            prop_assert!(guard.current_user().await.unwrap().is_none());
            prop_assert!(guard.current_access_token().await.unwrap().is_none());
            Ok(())
        })?;
    }

    /// Signed-out visitors go to root before the repository is even looked up.
    #[test]
    fn prop_signed_out_owner_check_goes_to_root(
        owner in arb_login(),
        existing in any::<bool>(),
    ) {
        runtime().block_on(async {
            let world = world(&owner, "CoolCode", true).await;
            let requested = if existing { world.repository } else { RepositoryId::new() };
            let mut session = Session::anonymous();
            let mut guard = AccessGuard::new(&world.directory, &mut session);

            prop_assert_eq!(
                guard.require_own_repository(&requested.to_string()).await.unwrap(),
                Verdict::Redirect(RedirectTarget::Root)
            );
            Ok(())
        })?;
    }

    /// Any known user asking for an unknown ID sees the repository 404.
    #[test]
    fn prop_unknown_repository_renders_repository_404(
        visitor in prop_oneof![Just(Visitor::Owner), Just(Visitor::Stranger)],
        requested in "[ -~]{0,40}",
    ) {
        runtime().block_on(async {
            let world = world("greptest", "CoolCode", true).await;
            let mut session = session_for(&world, visitor);
            let mut guard = AccessGuard::new(&world.directory, &mut session);

            prop_assert_eq!(
                guard.require_own_repository(&requested).await.unwrap(),
                Verdict::Render(Template::RepositoryNotFound)
            );
            Ok(())
        })?;
    }

    /// The owner check on an existing repository depends only on who asks.
    #[test]
    fn prop_owner_check_by_visitor(visitor in arb_visitor(), active in any::<bool>()) {
        runtime().block_on(async {
            let world = world("greptest", "CoolCode", active).await;
            let mut session = session_for(&world, visitor);
            let mut guard = AccessGuard::new(&world.directory, &mut session);

            let verdict = guard
                .require_own_repository(&world.repository.to_string())
                .await
                .unwrap();
            let expected = match visitor {
                Visitor::Anonymous | Visitor::Ghost => Verdict::Redirect(RedirectTarget::Root),
                Visitor::Owner => Verdict::Proceed,
                Visitor::Stranger => Verdict::Redirect(RedirectTarget::Profile),
            };
            prop_assert_eq!(verdict, expected);
            Ok(())
        })?;
    }

    /// An inactive repository is hidden from everyone, its owner included.
    #[test]
    fn prop_inactive_repository_is_not_found(
        owner in arb_login(),
        repo in arb_login(),
        visitor in arb_visitor(),
    ) {
        runtime().block_on(async {
            let world = world(&owner, &repo, false).await;
            let mut session = session_for(&world, visitor);
            let guard = AccessGuard::new(&world.directory, &mut session);

            prop_assert_eq!(
                guard.require_repository_active(&owner, &repo).await.unwrap(),
                Verdict::Render(Template::NotFound)
            );
            Ok(())
        })?;
    }

    /// Unknown holders are not found even when the repository name matches.
    #[test]
    fn prop_unknown_holder_is_not_found(holder in arb_login(), repo in arb_login()) {
        prop_assume!(holder != "greptest" && holder != "zz-stranger-zz");
        runtime().block_on(async {
            let world = world("greptest", &repo, true).await;
            let mut session = Session::anonymous();
            let guard = AccessGuard::new(&world.directory, &mut session);

            prop_assert_eq!(
                guard.require_repository_active(&holder, &repo).await.unwrap(),
                Verdict::Render(Template::NotFound)
            );
            Ok(())
        })?;
    }

    /// Active repositories of organization holders resolve like user holders.
    #[test]
    fn prop_active_org_repository_proceeds(org in arb_login(), repo in arb_login()) {
        prop_assume!(org != "greptest" && org != "zz-stranger-zz");
        runtime().block_on(async {
            let world = world("greptest", "CoolCode", true).await;
            let organization = world.directory.upsert_organization(&org).await.unwrap();
            world
                .directory
                .add_repository(&Holder::from(&organization), &repo, true, &[])
                .await;
            let mut session = Session::anonymous();
            let guard = AccessGuard::new(&world.directory, &mut session);

            prop_assert_eq!(
                guard.require_repository_active(&org, &repo).await.unwrap(),
                Verdict::Proceed
            );
            Ok(())
        })?;
    }

    /// Logging out always leaves the visitor signed out.
    #[test]
    fn prop_logout_signs_out(visitor in arb_visitor(), times in 1usize..4) {
        let world = runtime().block_on(world("greptest", "CoolCode", true));
        let mut session = session_for(&world, visitor);
        let mut guard = AccessGuard::new(&world.directory, &mut session);

        for _ in 0..times {
            guard.logout();
        }
        prop_assert!(!guard.is_signed_in());
        prop_assert_eq!(guard.require_signed_in(), Verdict::Redirect(RedirectTarget::Login));
    }
}
