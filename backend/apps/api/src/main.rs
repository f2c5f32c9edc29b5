//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::domain::repository::{SessionRepository, TokenRepository};
use auth::infra::mailer::EmailEndpoints;
use auth::infra::oauth::providers_from_env;
use auth::{AuthAppState, AuthConfig, HttpEmailSender, PgAuthRepository, auth_routes, with_sessions};
use axum::{
    Router, http,
    http::{Method, header},
};
use kernel::error::app_error::AppError;
use profile::{PgProfileRepository, ProfileAppState, profile_router};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,profile=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AuthConfig::from_env()?;

    // Database connection
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set in environment"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: errors here should not prevent server startup
    let repo = PgAuthRepository::new(pool.clone());
    match repo.cleanup_expired_sessions().await {
        Ok(deleted) => {
            tracing::info!(sessions_deleted = deleted, "Auth session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Auth session cleanup failed, continuing anyway");
        }
    }
    match repo.cleanup_expired_resets().await {
        Ok(deleted) => {
            tracing::info!(resets_deleted = deleted, "Password reset cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Password reset cleanup failed, continuing anyway");
        }
    }

    // Outbound collaborators
    let mailer = HttpEmailSender::new(EmailEndpoints::from_env(&config.public_base_url))?;
    let providers = providers_from_env(&config.public_base_url)?;

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router; one session layer serves auth and profile routes
    let auth_state = AuthAppState::new(repo, mailer, providers, config);
    let profile_state = ProfileAppState::new(PgProfileRepository::new(pool));
    let routes = Router::new()
        .merge(auth_routes(auth_state.clone()))
        .merge(profile_router(profile_state));
    let app = with_sessions(routes, auth_state)
        .fallback(|| async { AppError::not_found("Route not found") })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:31113".to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
