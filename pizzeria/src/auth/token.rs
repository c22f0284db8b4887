//! JWT bearer token creation and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::Error, types::UserId};

/// Whether a token was issued for routine calls or for obtaining new access
/// tokens. Carried as a claim for introspection; endpoints currently accept
/// either kind, so a refresh token also authorizes ordinary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,     // Subject (user ID)
    pub kind: TokenKind, // Access or refresh
    pub exp: i64,        // Expiration time
    pub iat: i64,        // Issued at
}

fn signing_algorithm(config: &AuthConfig) -> Result<Algorithm, Error> {
    config.algorithm.parse().map_err(|_| Error::Internal {
        operation: format!("JWT: unknown algorithm '{}'", config.algorithm),
    })
}

fn secret_key(config: &AuthConfig) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT: secret_key is required".to_string(),
    })
}

/// Create a signed token for a subject, expiring after `lifetime`.
///
/// The service is lifetime-agnostic; callers choose the duration. See
/// [`issue_access`] and [`issue_refresh`] for the two call sites.
pub fn issue(subject: UserId, lifetime: Duration, kind: TokenKind, config: &AuthConfig) -> Result<String, Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: subject,
        kind,
        exp: (now + lifetime).timestamp(),
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    let header = Header::new(signing_algorithm(config)?);
    encode(&header, &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Create a short-lived access token (lifetime from configuration).
pub fn issue_access(subject: UserId, config: &AuthConfig) -> Result<String, Error> {
    let lifetime = Duration::from_std(config.access_token_expiry).map_err(|e| Error::Internal {
        operation: format!("access token lifetime out of range: {e}"),
    })?;
    issue(subject, lifetime, TokenKind::Access, config)
}

/// Create a long-lived refresh token (lifetime from configuration).
pub fn issue_refresh(subject: UserId, config: &AuthConfig) -> Result<String, Error> {
    let lifetime = Duration::from_std(config.refresh_token_expiry).map_err(|e| Error::Internal {
        operation: format!("refresh token lifetime out of range: {e}"),
    })?;
    issue(subject, lifetime, TokenKind::Refresh, config)
}

/// Verify a token's signature and expiry and decode its claims.
///
/// Any cryptographic or structural failure, and expiry, is reported as an
/// authentication error. Verification is strict: no expiry leeway.
pub fn verify(token: &str, config: &AuthConfig) -> Result<Claims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let mut validation = Validation::new(signing_algorithm(config)?);
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        // Catch-all for any future error variants (default to server error for safety)
        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let config = test_auth_config();

        let token = issue(42, Duration::hours(1), TokenKind::Access, &config).unwrap();
        assert!(!token.is_empty());

        let claims = verify(&token, &config).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_access_and_refresh_lifetimes() {
        let config = test_auth_config();

        let access = verify(&issue_access(1, &config).unwrap(), &config).unwrap();
        let refresh = verify(&issue_refresh(1, &config).unwrap(), &config).unwrap();

        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(refresh.kind, TokenKind::Refresh);
        // Refresh tokens live longer than access tokens
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_verify_invalid_token() {
        let config = test_auth_config();

        let result = verify("invalid.token.here", &config);
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = test_auth_config();

        let token = issue(7, Duration::hours(1), TokenKind::Access, &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let result = verify(&token, &config);
        assert!(result.is_err());
        // Should be Unauthenticated (InvalidSignature), not Internal error
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_expired_token() {
        let config = test_auth_config();

        // Already expired at issue time
        let token = issue(7, Duration::seconds(-1), TokenKind::Access, &config).unwrap();

        let result = verify(&token, &config);
        assert!(result.is_err());
        // Should be Unauthenticated (ExpiredSignature), not Internal error
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_malformed_token() {
        let config = test_auth_config();

        let malformed_tokens = vec!["not.a.token", "invalid", "", "too.many.parts.in.this.token"];

        for token in malformed_tokens {
            let result = verify(token, &config);
            assert!(result.is_err());
            assert!(
                matches!(result.unwrap_err(), Error::Unauthenticated { .. }),
                "Expected Unauthenticated error for token: {}",
                token
            );
        }
    }
}
