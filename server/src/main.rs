// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use axum::http::HeaderName;
use server::config::Config;
use server::handlers::AppState;
use server::{database, routes};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};

/// Connects to the configured database, if any. A failed connection is
/// logged and the server carries on without persistence.
async fn connect(config: &Config) -> Option<SqlitePool> {
    let Some(url) = config.database_url() else {
        tracing::warn!("DATABASE_URL is not set, serving without a database.");
        return None;
    };

    let pool = match database::establish_connection_pool(url).await {
        Ok(pool) => {
            tracing::info!("Database connection was made successfully.");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            return None;
        }
    };

    if config.seed_database {
        if let Err(e) = database::seed_initial_data(&pool).await {
            tracing::error!("Failed to seed the database: {:?}", e);
        }
    }
    Some(pool)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    let config = Config::from_env().context("Invalid server configuration")?;
    let pool = connect(&config).await;

    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ])
        .allow_origin(Any);

    let app = routes::create_router(AppState::new(pool)).layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    tracing::info!("The server listens on http://{}", config.bind_address);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
