mod config;
mod credentials;
mod db;
mod error;
mod models;
mod rest;
mod session;
mod tasks;

use sqlx::SqlitePool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::Config, credentials::CredentialStore, error::AppError, session::Authenticator,
    tasks::TaskRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub sessions: Authenticator,
    pub tasks: TaskRepository,
}

impl AppState {
    pub fn new(db: SqlitePool, jwt_secret: &str) -> Result<Self, AppError> {
        Ok(Self {
            credentials: CredentialStore::new(db.clone())?,
            sessions: Authenticator::new(jwt_secret),
            tasks: TaskRepository::new(db),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "taskd=debug,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let pool = db::connect(&config).await?;
    tracing::info!("connected to {}", config.database_url);

    let app_state = AppState::new(pool, &config.jwt_secret)
        .map_err(|e| format!("failed to initialise credential store: {:?}", e))?;

    let app = rest::router(app_state);
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("REST API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
