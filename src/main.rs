//! Aegis - scripted digital-security assistant API
//!
//! Serves keyword-driven security tips and insights, conversation sessions
//! with simulated typing, emergency contact acknowledgments, and a simple
//! account and profile store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod accounts;
mod config;
mod conversation;
mod core;
mod routes;

use crate::accounts::AccountStore;
use crate::config::Config;
use crate::core::{
    db, InMemoryProfileRepository, ProfileRepository, RandomSource, ResponseEngine,
    SeededRandom, Sessions, SqliteProfileRepository, ThreadRandom,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ResponseEngine>,
    pub sessions: Arc<Sessions>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub accounts: Arc<AccountStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aegis_assistant=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let (pool, profiles) = if config.ephemeral {
        tracing::warn!("ephemeral storage: profiles and accounts are lost on exit");
        let profiles: Arc<dyn ProfileRepository> = Arc::new(InMemoryProfileRepository::new());
        (db::connect_in_memory().await?, profiles)
    } else {
        let pool = db::connect(&config.db_path()).await?;
        let profiles: Arc<dyn ProfileRepository> =
            Arc::new(SqliteProfileRepository::new(pool.clone()).await?);
        (pool, profiles)
    };
    let accounts = Arc::new(AccountStore::new(pool, Arc::clone(&profiles)).await?);

    let random: Arc<dyn RandomSource> = match config.seed {
        Some(seed) => {
            tracing::info!(seed, "using seeded reply selection");
            Arc::new(SeededRandom::new(seed))
        }
        None => Arc::new(ThreadRandom),
    };

    let engine = Arc::new(ResponseEngine::new(Arc::clone(&profiles), random));
    let sessions = Arc::new(Sessions::new(Arc::clone(&engine), config.pacing));
    sessions.spawn_sweeper(config.expiry);

    let state = AppState {
        engine,
        sessions,
        profiles,
        accounts,
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("🛡️ Aegis API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
