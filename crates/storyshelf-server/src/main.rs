mod cleanup;
mod config;

use std::sync::Arc;

use tracing::{info, warn};

use storyshelf_api::auth::PASSWORD_HASH_COST;
use storyshelf_api::session::{MemorySessionStore, SessionStore};
use storyshelf_api::{AppState, AppStateInner};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storyshelf_server=debug,storyshelf_api=debug,storyshelf_db=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = storyshelf_db::Database::open(&config.db_path)?;

    // Sessions live only as long as this process
    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    tokio::spawn(cleanup::run_session_sweep(
        sessions.clone(),
        config.session_sweep_secs,
    ));

    let state: AppState = Arc::new(AppStateInner {
        db,
        sessions,
        password_cost: PASSWORD_HASH_COST,
        cookie_secure: config.cookie_secure,
    });

    if !config.public_dir.is_dir() {
        warn!(
            "Static directory {} does not exist; only the API will respond",
            config.public_dir.display()
        );
    }

    let app = storyshelf_api::router(state, &config.public_dir);

    let addr = config.addr()?;
    info!("StoryShelf listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await;
        info!("Received Ctrl+C, shutting down...");
    }
}
