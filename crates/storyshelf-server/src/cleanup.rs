use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use storyshelf_api::session::SessionStore;

/// Background task that prunes expired sessions.
///
/// Lookups already ignore expired tokens; this only keeps the table from
/// growing with sessions nobody logs out of.
pub async fn run_session_sweep(sessions: Arc<dyn SessionStore>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let count = sessions.purge_expired();
        if count > 0 {
            info!("Cleanup: pruned {} expired sessions", count);
        }
    }
}
