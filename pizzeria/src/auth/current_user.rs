//! Extractor resolving a bearer token to the authenticated user.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::token,
    db::{errors::DbError, handlers::{Repository, Users}},
    errors::{Error, Result},
};

/// Pull the token out of the `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Result<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(Error::Unauthenticated { message: None })?;

    let auth_str = header.to_str().map_err(|e| Error::BadRequest {
        message: format!("Invalid authorization header: {e}"),
    })?;

    auth_str.strip_prefix("Bearer ").ok_or(Error::Unauthenticated { message: None })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)?;

        // Signature + expiry check; either token kind is accepted here
        let claims = token::verify(token, &state.config.auth)?;

        // A valid-looking token referencing a nonexistent identity is an
        // authentication failure, not an authorization failure
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(DbError::from(e)))?;
        let user = Users::new(&mut conn)
            .get_by_id(claims.sub)
            .await?
            .ok_or(Error::Unauthenticated { message: None })?;

        trace!("Authenticated user {} via bearer token", user.id);

        Ok(CurrentUser {
            id: user.id,
            name: user.name,
            email: user.email,
            is_active: user.is_active,
            is_admin: user.is_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::users::CurrentUser,
        auth::token,
        test_utils::{create_test_config, create_test_user},
    };
    use axum::extract::FromRequestParts as _;
    use sqlx::SqlitePool;

    fn parts_with_bearer(token: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header("authorization", format!("Bearer {token}"))
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    #[sqlx::test]
    async fn test_valid_token_resolves_user(pool: SqlitePool) {
        let config = create_test_config();
        let user = create_test_user(&pool, "alice@example.com", false).await;
        let state = AppState {
            db: pool,
            config: config.clone(),
        };

        let access = token::issue_access(user.id, &config.auth).unwrap();
        let mut parts = parts_with_bearer(&access);

        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.email, "alice@example.com");
        assert!(!current.is_admin);
    }

    #[sqlx::test]
    async fn test_missing_header_is_unauthorized(pool: SqlitePool) {
        let state = AppState {
            db: pool,
            config: create_test_config(),
        };

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_token_for_missing_identity_is_unauthorized(pool: SqlitePool) {
        let config = create_test_config();
        let state = AppState {
            db: pool,
            config: config.clone(),
        };

        // Well-formed, correctly signed token whose subject was never created
        let access = token::issue_access(9999, &config.auth).unwrap();
        let mut parts = parts_with_bearer(&access);

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_garbage_token_is_unauthorized(pool: SqlitePool) {
        let state = AppState {
            db: pool,
            config: create_test_config(),
        };

        let mut parts = parts_with_bearer("not-a-jwt");
        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
