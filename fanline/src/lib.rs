//! # fanline: backend for a creator subscription and messaging platform
//!
//! Users register, subscribe to creators and message them. Creators publish time-limited
//! stories and a gallery, answer their inbox, and fulfil paid custom content requests. An admin
//! surface guarded by a shared password exposes platform statistics and read-only listings.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL (through sqlx) for all persistence.
//!
//! - The **API layer** ([`api`]) holds the route handlers and the request/response models. Every
//!   route lives under `/api`.
//! - The **authentication layer** ([`auth`]) issues and verifies JWT sessions for users and
//!   creators, hashes passwords, and provides the `CurrentUser` / `CurrentCreator` /
//!   `AdminAccess` extractors.
//! - The **database layer** ([`db`]) wraps each table in a repository that borrows a connection
//!   or transaction.
//! - **Payments** go through a `PaymentProvider` trait selected from configuration. Funds for a
//!   content request are authorized when the user accepts a price and captured on delivery.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use fanline::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = fanline::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     fanline::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run on startup unless `database.run_migrations` is off:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! fanline::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod payment_providers;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test;

use crate::{
    api::handlers::{admin, ai_doubles, auth as auth_handlers, content_requests, creators, messages, stories, subscriptions},
    config::CorsOrigin,
    openapi::ApiDoc,
    payment_providers::PaymentProvider,
};
use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::{delete, get, patch, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .payment_provider(provider)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub payment_provider: Arc<dyn PaymentProvider>,
}

impl AppState {
    /// State with the payment provider named in the configuration.
    pub fn from_config(db: PgPool, config: Config) -> Self {
        let payment_provider: Arc<dyn PaymentProvider> = payment_providers::create_provider(config.payment.clone()).into();
        Self::builder().db(db).config(config).payment_provider(payment_provider).build()
    }
}

/// Get the fanline database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect the pool and bring the schema up to date.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .max_lifetime(settings.max_lifetime)
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("Running database migrations");
        migrator().run(&pool).await?;
    }

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;
    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH, http::Method::DELETE])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            http::HeaderName::from_static(auth::current_user::ADMIN_PASSWORD_HEADER),
        ])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Routes under `/api`, without middleware.
fn api_routes() -> Router<AppState> {
    Router::new()
        // Sessions
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/auth/me", get(auth_handlers::me))
        .route("/creators/login", post(auth_handlers::login_creator))
        // Public creator pages
        .route("/creators", get(creators::list_creators))
        .route("/creators/{slug}", get(creators::get_creator))
        .route("/creators/{slug}/gallery", get(creators::get_gallery))
        // User side
        .route(
            "/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::subscribe),
        )
        .route("/subscriptions/{id}/cancel", post(subscriptions::cancel_subscription))
        .route("/messages", get(messages::get_conversation).post(messages::send_message))
        .route(
            "/content-requests",
            get(content_requests::list_user_content_requests).post(content_requests::create_content_request),
        )
        .route("/content-requests/{id}/authorize", post(content_requests::authorize_payment))
        .route("/content-requests/{id}/cancel", post(content_requests::cancel_as_user))
        .route("/stories", get(stories::list_stories))
        .route("/stories/{id}/view", post(stories::view_story))
        .route(
            "/ai-doubles",
            get(ai_doubles::list_ai_doubles).post(ai_doubles::create_ai_double),
        )
        .route(
            "/ai-doubles/{id}",
            get(ai_doubles::get_ai_double)
                .patch(ai_doubles::update_ai_double)
                .delete(ai_doubles::delete_ai_double),
        )
        .route("/ai-doubles/shared/{share_slug}", get(ai_doubles::get_shared_ai_double))
        // Creator side
        .route("/creator/profile", get(creators::get_profile).patch(creators::update_profile))
        .route("/creator/gallery", post(creators::add_gallery_photo))
        .route("/creator/gallery/{id}", delete(creators::delete_gallery_photo))
        .route("/creator/conversations", get(messages::list_conversations))
        .route(
            "/creator/messages",
            get(messages::get_creator_conversation).post(messages::send_creator_message),
        )
        .route("/creator/content-requests", get(content_requests::list_creator_content_requests))
        .route("/creator/content-requests/{id}/price", post(content_requests::set_price))
        .route("/creator/content-requests/{id}/deliver", post(content_requests::deliver))
        .route("/creator/content-requests/{id}/cancel", post(content_requests::cancel_as_creator))
        .route("/creator/stories", post(stories::create_story))
        .route(
            "/creator/stories/{id}",
            patch(stories::update_story).delete(stories::delete_story),
        )
        .route("/creator/my-stories", get(stories::my_stories))
        // Admin
        .route("/admin/stats", get(admin::get_stats))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/creators", get(admin::list_creators).post(admin::create_creator))
        .route("/admin/messages", get(admin::list_messages))
        .route("/admin/content-requests", get(admin::list_content_requests))
        .route("/admin/subscriptions", get(admin::list_subscriptions))
        .route("/admin/ai-doubles", get(admin::list_ai_doubles))
        // Documentation
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

/// Build the application router with all endpoints and middleware.
///
/// - `/api/*`: the JSON API
/// - `/api/docs`: Scalar rendering of the OpenAPI document
/// - `/healthz`: liveness probe
///
/// CORS comes from configuration and every request is traced.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes())
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns the router and the database pool.
///
/// 1. **Create**: [`Application::new`] connects to the database and runs migrations
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and the pool
///    is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting fanline with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool)
    }

    /// Create an application over an existing pool. The schema must already be migrated.
    pub fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let state = AppState::from_config(pool.clone(), config.clone());
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "fanline listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::create_test_config;
    use axum::http::StatusCode;

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz_and_docs(pool: PgPool) {
        let server = Application::new_with_pool(create_test_config(), pool).unwrap().into_test_server();

        let health = server.get("/healthz").await;
        health.assert_status_ok();
        health.assert_text("OK");

        let spec: serde_json::Value = server.get("/api/openapi.json").await.json();
        assert_eq!(spec["info"]["title"], "Fanline API");
        assert!(spec["paths"]["/messages"]["post"].is_object());

        server.get("/api/docs").await.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_route_is_not_found(pool: PgPool) {
        let server = Application::new_with_pool(create_test_config(), pool).unwrap().into_test_server();
        server.get("/api/does-not-exist").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cors_preflight_allows_configured_origin(pool: PgPool) {
        let mut config = create_test_config();
        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Url("https://app.example.com".parse().unwrap())];
        let server = Application::new_with_pool(config, pool).unwrap().into_test_server();

        let response = server
            .method(http::Method::OPTIONS, "/api/creators")
            .add_header("origin", "https://app.example.com")
            .add_header("access-control-request-method", "GET")
            .await;
        assert_eq!(
            response.header("access-control-allow-origin"),
            HeaderValue::from_static("https://app.example.com")
        );
    }
}
