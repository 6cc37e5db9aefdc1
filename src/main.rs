use std::sync::Arc;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod pvz;
mod state;

use crate::{auth::repo::PgUserStore, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::load()?;

    let pool = db::connect(&config.database).await?;
    db::migrate(&pool).await?;

    let state = AppState::new(&config, Arc::new(PgUserStore::new(pool)));
    let app = app::build_app(state);

    app::serve(app, config.addr()?).await
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "pvz_service=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}
