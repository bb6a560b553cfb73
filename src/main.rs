use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use servicebook::backend::rest::RestBackend;
use servicebook::backend::sqlite::SqliteBackend;
use servicebook::backend::Backend;
use servicebook::config::{AppConfig, BackendKind, RoleSource};
use servicebook::db;
use servicebook::handlers;
use servicebook::screen::BookingScreen;
use servicebook::services::role::{FixedRole, RoleResolver, StoredRoleResolver};
use servicebook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    let backend = match config.backend {
        BackendKind::Sqlite => {
            let conn = db::init_db(&config.database_url)?;
            tracing::info!("using SQLite backend (path: {})", config.database_url);
            Backend::from_shared(Arc::new(SqliteBackend::new(
                conn,
                config.session_user_id.clone(),
            )))
        }
        BackendKind::Rest => {
            tracing::info!("using hosted backend (url: {})", config.backend_url);
            Backend::from_shared(Arc::new(RestBackend::new(
                config.backend_url.clone(),
                config.backend_api_key.clone(),
                config.access_token.clone(),
            )))
        }
    };

    let roles: Arc<dyn RoleResolver> = match &config.role {
        RoleSource::Fixed(role) => {
            tracing::info!("using fixed role: {}", role.as_str());
            Arc::new(FixedRole(*role))
        }
        RoleSource::Stored => Arc::new(StoredRoleResolver::new(backend.data.clone())),
    };

    let screen = Arc::new(
        BookingScreen::builder(backend, roles)
            .booking_limit(config.booking_limit)
            .on_booking_made(|| tracing::info!("booking made"))
            .build(),
    );
    screen.mount().await;

    let state = Arc::new(AppState {
        screen: screen.clone(),
        config: config.clone(),
    });
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    screen.unmount();
    Ok(())
}
