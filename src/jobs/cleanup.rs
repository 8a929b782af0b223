//! Background job: purge expired login sessions.

use std::time::Duration;

use chrono::Utc;
use tokio::time;

use crate::auth::session::SessionStore;

/// Spawn the hourly cleanup task. Call this once at startup.
pub fn spawn(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            run_once(&sessions).await;
        }
    });
}

async fn run_once(sessions: &SessionStore) {
    match sessions.purge_expired(Utc::now()).await {
        Ok(0) => {}
        Ok(n) => tracing::info!(sessions = n, "purged expired sessions"),
        Err(e) => tracing::error!("session cleanup failed: {}", e),
    }
}
