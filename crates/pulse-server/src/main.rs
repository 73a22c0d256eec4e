use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use pulse_api::{AppState, AppStateInner, auth};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse=debug,tower_http=debug".into()),
        )
        .init();

    // Config — the signing secret has no default on purpose
    let jwt_secret =
        std::env::var("PULSE_JWT_SECRET").context("PULSE_JWT_SECRET must be set")?;
    let db_path = std::env::var("PULSE_DB_PATH").unwrap_or_else(|_| "pulse.db".into());
    let seed_email = std::env::var("PULSE_SEED_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@feedback.local".into());
    let seed_password =
        std::env::var("PULSE_SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "password".into());
    let host = std::env::var("PULSE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PULSE_PORT")
        .unwrap_or_else(|_| "4000".into())
        .parse()?;

    // Migrations and the admin seed complete before the listener binds
    let db = pulse_db::Database::open(&PathBuf::from(&db_path))?;
    let password_hash = auth::hash_password(&seed_password)?;
    if db.seed_admin(&seed_email, "Admin User", &password_hash)? {
        info!("Seeded admin account: {}", seed_email);
    }

    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    let app = pulse_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Pulse server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
