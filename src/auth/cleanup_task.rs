use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument};

use super::service::AuthService;

/// Configuration for the refresh token cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often expired refresh tokens are purged
    pub cleanup_interval: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60 * 60), // 1 hour
        }
    }
}

/// Starts the background task that periodically removes expired refresh tokens
#[instrument(skip(auth_service))]
pub async fn start_cleanup_task(auth_service: Arc<AuthService>, config: CleanupConfig) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        "Starting refresh token cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);

    loop {
        cleanup_interval.tick().await;

        match auth_service.cleanup_expired_refresh_tokens().await {
            Ok(removed) => info!(removed, "Refresh token cleanup completed"),
            Err(e) => error!(error = %e, "Refresh token cleanup failed"),
        }
    }
}
