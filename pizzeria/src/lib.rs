//! # pizzeria: An Order Management Backend
//!
//! `pizzeria` is a small HTTP backend for taking and tracking pizza orders.
//! It provides account registration and login with JWT bearer tokens, and a
//! REST API over an order aggregate: each order belongs to a user, carries a
//! set of line items, and moves through a simple lifecycle (`PENDING` until it
//! is either `CANCELLED` or `FINALIZED`, both terminal).
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses SQLite (via SQLx) for persistence. Requests flow
//! through three layers:
//!
//! - The **API layer** ([`api`]) holds the axum handlers and the
//!   request/response models. Handlers open one transaction per request and
//!   commit it at the end, so authorization checks, mutations and the derived
//!   order total stay consistent.
//! - The **authentication layer** ([`auth`]) issues and verifies JWT access
//!   and refresh tokens, hashes passwords with Argon2, resolves bearer tokens
//!   to users via an extractor, and enforces the self-or-admin rule.
//! - The **database layer** ([`db`]) uses the repository pattern: one
//!   repository per aggregate wrapping a SQLx connection, with models that
//!   mirror the table rows.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use pizzeria::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = pizzeria::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     pizzeria::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    auth::password,
    db::handlers::{Repository, Users},
    db::models::users::UserCreateDBRequest,
};
use axum::{
    Router,
    routing::{delete, get, post},
};
pub use config::Config;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};

pub use types::{OrderId, OrderItemId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

/// Get the pizzeria database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: if an account with the configured email already exists it is
/// left untouched. Called during startup when `admin_email` and
/// `admin_password` are both configured.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: &str, db: &SqlitePool) -> anyhow::Result<UserId> {
    let password_hash = password::hash_string(password).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_user_by_email(email).await? {
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            name: "admin".to_string(),
            email: email.to_string(),
            password_hash,
            is_active: true,
            is_admin: true,
        })
        .await?;

    tx.commit().await?;
    info!("Created initial admin user {}", created_user.id);
    Ok(created_user.id)
}

/// Setup the database connection pool, run migrations, and seed the admin user
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    migrator().run(&pool).await?;

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        create_initial_admin_user(email, password, &pool).await?;
    }

    Ok(pool)
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Authentication
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/login-form", post(api::handlers::auth::login_form))
        .route("/auth/refresh", get(api::handlers::auth::refresh))
        // Orders
        .route(
            "/orders",
            post(api::handlers::orders::create_order).get(api::handlers::orders::list_all_orders),
        )
        .route("/orders/mine", get(api::handlers::orders::list_my_orders))
        .route(
            "/orders/{order_id}",
            get(api::handlers::orders::get_order).delete(api::handlers::orders::delete_order),
        )
        .route("/orders/{order_id}/cancel", post(api::handlers::orders::cancel_order))
        .route("/orders/{order_id}/finalize", post(api::handlers::orders::finalize_order))
        .route("/orders/{order_id}/items", post(api::handlers::orders::add_item))
        .route("/orders/items/{item_id}", delete(api::handlers::orders::remove_item))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting pizzeria with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let state = AppState {
            db: pool.clone(),
            config: config.clone(),
        };
        let router = build_router(state);

        Ok(Self { router, config, pool })
    }

    /// Serve HTTP until the shutdown future resolves
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Pizzeria listening on http://{}", bind_addr);

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
