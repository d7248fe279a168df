//! Database seeder for GitReport development and testing.
//!
//! Seeds a user `greptest` holding an active `CoolCode` and an inactive
//! `CoolInactive`, plus an organization `greporg` with `org_user` as a member
//! and an active `CoolOrg`. Every step is idempotent.
//!
//! Usage: cargo run --bin seeder
//!
//! `SEED_GITHUB_TOKEN`, when set, is stored as the token of both users so the
//! seeded forms can file real issues.

use anyhow::Context;
use gitreport_core::{DirectoryWriter, Holder, Repository, RepositorySettings, User};
use gitreport_db::PgDirectory;
use gitreport_shared::types::AccessToken;

/// GitHub IDs for the seeded users. Real accounts never get IDs this large.
const GREPTEST_GITHUB_ID: i64 = 9_000_000_001;
const ORG_USER_GITHUB_ID: i64 = 9_000_000_002;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let token = AccessToken::new(
        std::env::var("SEED_GITHUB_TOKEN").unwrap_or_else(|_| "seed-token".to_string()),
    );

    println!("Connecting to database...");
    let db = gitreport_db::connect(&database_url)
        .await
        .context("failed to connect to database")?;
    let directory = PgDirectory::new(db);

    println!("Seeding users...");
    let greptest = directory
        .upsert_user(GREPTEST_GITHUB_ID, "greptest", &token)
        .await?;
    let org_user = directory
        .upsert_user(ORG_USER_GITHUB_ID, "org_user", &token)
        .await?;

    println!("Seeding organization...");
    let greporg = directory.upsert_organization("greporg").await?;
    directory.add_member(greporg.id, org_user.id).await?;

    println!("Seeding repositories...");
    let code = seed_repository(&directory, &Holder::from(&greptest), "CoolCode", &greptest, true)
        .await?;
    directory
        .update_settings(
            code.id,
            RepositorySettings {
                display_name: Some("Cool Code".to_string()),
                prompt: Some("Tell us what went wrong.".to_string()),
                followup: Some("We'll take a look soon.".to_string()),
                labels: Some("from-users".to_string()),
                ..RepositorySettings::default()
            },
        )
        .await?;
    seed_repository(
        &directory,
        &Holder::from(&greptest),
        "CoolInactive",
        &greptest,
        false,
    )
    .await?;
    seed_repository(&directory, &Holder::from(&greporg), "CoolOrg", &org_user, true).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_repository(
    directory: &PgDirectory,
    holder: &Holder,
    name: &str,
    permitted: &User,
    active: bool,
) -> anyhow::Result<Repository> {
    let repository = directory.upsert_repository(holder, name).await?;
    directory.grant_access(repository.id, permitted.id).await?;
    let repository = directory.set_active(repository.id, active).await?;
    println!(
        "  {}/{} ({})",
        repository.holder_name(),
        repository.name,
        if active { "active" } else { "inactive" }
    );
    Ok(repository)
}
