//! Registration, login and token refresh handlers.

use axum::{Form, Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use crate::{
    AppState,
    api::models::{
        auth::{AccessTokenResponse, LoginFormRequest, LoginRequest, RegisterRequest, TokenPairResponse},
        users::{CurrentUser, UserResponse},
    },
    auth::{password, token},
    db::{
        errors::DbError,
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    errors::{Error, Result},
};

/// Register a new account.
///
/// The email must be unused; a taken address is a conflict. The password is
/// hashed on a blocking thread before anything touches the database.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let password_hash = tokio::task::spawn_blocking({
        let password = request.password.clone();
        move || password::hash_string(&password)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("hash password: {e}"),
    })??;

    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut tx);

    if users.get_user_by_email(&request.email).await?.is_some() {
        return Err(Error::Conflict {
            message: "An account with this email address already exists".to_string(),
        });
    }

    let user = users
        .create(&UserCreateDBRequest {
            name: request.name,
            email: request.email,
            password_hash,
            is_active: request.is_active.unwrap_or(true),
            is_admin: request.is_admin.unwrap_or(false),
        })
        .await?;

    tx.commit().await.map_err(DbError::from)?;

    info!("Registered user {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Look up the account and check the password, without revealing which of
/// the two was wrong.
async fn authenticate(state: &AppState, email: &str, password_input: &str) -> Result<UserDBResponse> {
    let invalid = || Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let user = Users::new(&mut conn).get_user_by_email(email).await?.ok_or_else(invalid)?;

    let verified = tokio::task::spawn_blocking({
        let password_input = password_input.to_string();
        let hash = user.password_hash.clone();
        move || password::verify_string(&password_input, &hash)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("verify password: {e}"),
    })??;

    if !verified {
        return Err(invalid());
    }

    Ok(user)
}

fn token_pair(user_id: crate::types::UserId, state: &AppState) -> Result<TokenPairResponse> {
    Ok(TokenPairResponse {
        access_token: token::issue_access(user_id, &state.config.auth)?,
        refresh_token: token::issue_refresh(user_id, &state.config.auth)?,
        token_type: "Bearer".to_string(),
    })
}

/// Log in with a JSON body and receive an access + refresh token pair.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<TokenPairResponse>> {
    let user = authenticate(&state, &request.email, &request.password).await?;

    info!("User {} logged in", user.id);
    Ok(Json(token_pair(user.id, &state)?))
}

/// Form-encoded login. Same credential check as [`login`], but accepts the
/// OAuth2 password-flow field names (`username` carries the email) and
/// returns a bare access token, which is what interactive API docs expect.
#[instrument(skip(state, request), fields(email = %request.username))]
pub async fn login_form(
    State(state): State<AppState>,
    Form(request): Form<LoginFormRequest>,
) -> Result<Json<AccessTokenResponse>> {
    let user = authenticate(&state, &request.username, &request.password).await?;

    info!("User {} logged in via form", user.id);
    Ok(Json(AccessTokenResponse {
        access_token: token::issue_access(user.id, &state.config.auth)?,
        token_type: "Bearer".to_string(),
    }))
}

/// Mint a fresh access token for the bearer of a valid token.
#[instrument(skip(state, caller), fields(user_id = caller.id))]
pub async fn refresh(State(state): State<AppState>, caller: CurrentUser) -> Result<Json<AccessTokenResponse>> {
    Ok(Json(AccessTokenResponse {
        access_token: token::issue_access(caller.id, &state.config.auth)?,
        token_type: "Bearer".to_string(),
    }))
}
