use gatekeeper::{
    auth::cleanup_task::{start_cleanup_task, CleanupConfig},
    create_app, AppConfig, AppState, AuthService, CredentialHasher, CredentialStore,
    InMemoryCredentialStore, PostgresCredentialStore, TokenIssuer,
};
use sqlx::postgres::PgPoolOptions;
use std::error::Error;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gatekeeper authentication server");

    // Fail fast on missing configuration rather than on the first request
    let config = AppConfig::from_env()?;
    info!(config = ?config, "Configuration loaded");

    let store: Arc<dyn CredentialStore + Send + Sync> = match &config.database {
        Some(database) => {
            let pool = PgPoolOptions::new()
                .acquire_timeout(config.store_timeout)
                .connect(&database.url())
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!(host = %database.host, database = %database.database, "Connected to PostgreSQL");
            Arc::new(PostgresCredentialStore::new(pool))
        }
        None => {
            warn!("POSTGRES_HOST not set, using in-memory credential store");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let token_issuer = TokenIssuer::new(&config.jwt_secret)?;
    let auth_service = Arc::new(AuthService::new(
        store,
        CredentialHasher::new(),
        token_issuer,
        config.store_timeout,
    )?);

    tokio::spawn(start_cleanup_task(
        auth_service.clone(),
        CleanupConfig {
            cleanup_interval: config.cleanup_interval,
        },
    ));

    let app = create_app(AppState::new(auth_service));

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    info!(addr = %config.server_addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
