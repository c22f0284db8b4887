//! API models for registration, login and token refresh.

use serde::{Deserialize, Serialize};

/// Request to register a new account
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to true when omitted
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Defaults to false when omitted
    #[serde(default)]
    pub is_admin: Option<bool>,
}

/// Request to log in with email and password
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Form-encoded login, OAuth2 password-flow style: `username` carries the
/// email address.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginFormRequest {
    pub username: String,
    pub password: String,
}

/// Access + refresh token pair issued on login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Single access token issued on refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
}
