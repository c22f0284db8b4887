//! Shared helpers for tests: configuration, seeded users and a test server.

use axum_test::TestServer;
use sqlx::SqlitePool;

use crate::{
    AppState,
    auth::{password, token},
    config::{AuthConfig, Config},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    types::UserId,
};

/// Password every seeded test user logs in with.
pub const TEST_PASSWORD: &str = "password123";

pub fn create_test_config() -> Config {
    Config {
        auth: AuthConfig {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Build a test server around the full router, backed by the given pool.
pub fn create_test_server(pool: SqlitePool) -> TestServer {
    let state = AppState {
        db: pool,
        config: create_test_config(),
    };
    TestServer::new(crate::build_router(state)).unwrap()
}

/// Mint an access token accepted by servers built with [`create_test_server`].
pub fn access_token_for(user_id: UserId) -> String {
    token::issue_access(user_id, &create_test_config().auth).unwrap()
}

/// Insert a user directly, bypassing the registration endpoint.
///
/// The local part of the email becomes the display name; the password is
/// always [`TEST_PASSWORD`].
pub async fn create_test_user(pool: &SqlitePool, email: &str, is_admin: bool) -> UserDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    let name = email.split('@').next().unwrap_or("user").to_string();

    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            name,
            email: email.to_string(),
            password_hash: password::hash_string(TEST_PASSWORD).unwrap(),
            is_active: true,
            is_admin,
        })
        .await
        .unwrap()
}
