//! Athenaeum Server - Library Circulation System
//!
//! REST API server for borrowing, fines, reservations and payments.

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use athenaeum_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("athenaeum_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Athenaeum Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool.clone());
    let services = Services::new(repository, config.circulation.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        pool,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Books (catalog)
        .route("/books", get(api::books::list_books))
        .route("/books", post(api::books::create_book))
        .route("/books/:id", get(api::books::get_book))
        // Users
        .route("/users", post(api::users::create_user))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id/borrowings", get(api::borrowings::get_user_borrowings))
        .route("/users/:id/reservations", get(api::reservations::get_user_reservations))
        // Borrowings
        .route("/borrowings", post(api::borrowings::issue_borrowing))
        .route("/borrowings/recalculate", post(api::borrowings::recalculate_fines))
        .route("/borrowings/:id", get(api::borrowings::get_borrowing))
        .route("/borrowings/:id/return", post(api::borrowings::return_borrowing))
        .route("/borrowings/:id/payments", post(api::payments::record_payment))
        .route("/borrowings/:id/payments", get(api::payments::list_payments))
        // Reservations
        .route("/reservations", post(api::reservations::create_reservation))
        .route("/reservations/:id/cancel", post(api::reservations::cancel_reservation))
        // Settings
        .route("/settings/fine-policy", get(api::settings::get_fine_policy))
        .route("/settings/fine-policy", put(api::settings::update_fine_policy))
        // Statistics
        .route("/stats", get(api::stats::get_stats))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
