use anyhow::Context;
use tower_sessions_sqlx_store::PostgresStore;

mod app;
mod auth;
mod config;
mod error;
mod session;
mod state;
mod validate;
mod watchlist;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "watchbuddy=debug,axum=info,tower_http=info".to_string());
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

    let state = state::AppState::init().await?;

    sqlx::migrate!("./migrations")
        .run(&state.db)
        .await
        .context("run database migrations")?;

    let session_store = PostgresStore::new(state.db.clone());
    session_store
        .migrate()
        .await
        .context("prepare session store")?;

    let app = app::build_app(state, session_store);
    app::serve(app).await
}
