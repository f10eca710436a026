// main.rs
// Server wiring: loads configuration, connects to MongoDB (seeding an empty
// database), builds the router and serves it.
//
// Endpoints:
// - GET  /                           -> login page (email + TOTP code)
// - POST /login                      -> validates {"email","code"}, sets session cookie
// - POST /logout                     -> drops the session
// - GET  /reports                    -> report index
// - GET  /reports/{defaulters,collections,revenue,bill-status,zone-performance}
// - GET  /api/reports/defaulters     -> defaulter report as JSON

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use quickbill::{build_app, config::AppConfig, state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quickbill=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let state = Arc::new(
        state::init_state(&config)
            .await
            .context("failed to initialize MongoDB state")?,
    );
    tracing::info!(
        db = %config.mongodb_db,
        grace_days = config.policy.grace_period_days,
        "state ready"
    );

    let app = build_app(state);
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("cannot bind {}", config.addr))?;
    tracing::info!("listening on http://{}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
