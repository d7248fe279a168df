//! GitReport web server
//!
//! Main entry point for the GitReport service.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gitreport_api::{AppState, create_router};
use gitreport_db::{PgDirectory, connect_with};
use gitreport_shared::{AppConfig, CaptchaVerifier, GitHubClient, SessionTokenService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gitreport=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    if config.captcha.override_result.is_some() {
        warn!("CAPTCHA outcome is pinned by configuration; do not run this in production");
    }

    let state = AppState {
        store: Arc::new(PgDirectory::new(db)),
        session_tokens: Arc::new(SessionTokenService::new(&config.session)),
        github: Arc::new(GitHubClient::new(config.github.clone())?),
        captcha: Arc::new(CaptchaVerifier::new(config.captcha.clone())?),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
