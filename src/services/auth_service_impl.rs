//! JWT + SeaORM implementation of [`AuthService`].
//!
//! Argon2 work runs on `spawn_blocking`; it would otherwise stall the
//! async runtime. Refresh tokens are opaque database rows, not JWTs, so
//! revocation is just a delete.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tokio::task;

use crate::config::{AuthConfig, SecurityConfig};
use crate::db::Store;
use crate::db::repositories::user::{hash_password, verify_password};
use crate::entities::users;

use super::auth_service::{AuthError, AuthService, Role, TokenPair, UserInfo};

const MIN_PASSWORD_LEN: usize = 8;
const REFRESH_TOKEN_BYTES: usize = 48;

/// Access-token claims.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    email: String,
    role: String,
    exp: u64,
}

pub struct JwtAuthService {
    store: Store,
    auth: AuthConfig,
    security: SecurityConfig,
}

impl JwtAuthService {
    #[must_use]
    pub const fn new(store: Store, auth: AuthConfig, security: SecurityConfig) -> Self {
        Self {
            store,
            auth,
            security,
        }
    }

    fn to_user_info(user: &users::Model) -> Result<UserInfo, AuthError> {
        let role: Role = user
            .role
            .parse()
            .map_err(|e: String| AuthError::Internal(e))?;
        Ok(UserInfo {
            id: user.id,
            email: user.email.clone(),
            role,
        })
    }

    /// Signs a fresh access token and stores a new single-use refresh row.
    async fn issue_tokens(
        &self,
        user: &users::Model,
        include_user: bool,
    ) -> Result<TokenPair, AuthError> {
        let expires_in = self.auth.access_token_minutes * 60;
        let exp = u64::try_from(Utc::now().timestamp())
            .map_err(|_| AuthError::Internal("system clock before UNIX epoch".to_string()))?
            + expires_in;

        let claims = TokenClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.clone(),
            exp,
        };
        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.auth.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to sign access token: {e}")))?;

        let refresh_token = generate_refresh_token();
        let refresh_expires_at = (Utc::now()
            + Duration::days(i64::try_from(self.auth.refresh_token_days).unwrap_or(7)))
        .to_rfc3339();
        self.store
            .insert_refresh_token(&refresh_token, user.id, &refresh_expires_at)
            .await?;

        let user_info = if include_user {
            Some(Self::to_user_info(user)?)
        } else {
            None
        };

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in,
            user: user_info,
        })
    }

    async fn hash_on_worker(&self, password: String) -> Result<String, AuthError> {
        let cfg = self.security.clone();
        task::spawn_blocking(move || hash_password(&password, Some(&cfg)))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task panicked: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn verify_on_worker(&self, password: String, hash: String) -> Result<bool, AuthError> {
        task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task panicked: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

/// Opaque random refresh token (96-char hex string)
fn generate_refresh_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rng.fill(&mut bytes[..]);

    bytes
        .iter()
        .fold(String::with_capacity(REFRESH_TOKEN_BYTES * 2), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

#[async_trait::async_trait]
impl AuthService for JwtAuthService {
    async fn register(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AuthError::Validation(
                "email must be a valid email address".to_string(),
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.store.user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_on_worker(password.to_string()).await?;
        let user = self
            .store
            .create_user(&email, &password_hash, Role::Customer.as_str())
            .await?;

        self.issue_tokens(&user, true).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.store.user_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        let valid = self
            .verify_on_worker(password.to_string(), user.password_hash.clone())
            .await?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_tokens(&user, true).await
    }

    async fn refresh(&self, token: &str) -> Result<TokenPair, AuthError> {
        let Some(stored) = self.store.refresh_token(token).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        let expired = chrono::DateTime::parse_from_rfc3339(&stored.expires_at)
            .map_or(true, |t| t.with_timezone(&Utc) < Utc::now());
        if expired {
            // Opportunistic cleanup: a stale row is useless either way.
            self.store.delete_refresh_token(stored.id).await?;
            return Err(AuthError::InvalidCredentials);
        }

        // Rotation: the presented token is consumed even before the new
        // pair is issued, so it can never be replayed.
        self.store.delete_refresh_token(stored.id).await?;

        let Some(user) = self.store.user_by_id(stored.user_id).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        self.issue_tokens(&user, false).await
    }

    async fn authenticate(&self, bearer: &str) -> Result<UserInfo, AuthError> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<TokenClaims>(
            bearer,
            &DecodingKey::from_secret(self.auth.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AuthError::InvalidCredentials)?;

        let user_id: i32 = data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidCredentials)?;

        // The token alone is not enough: a soft-deleted account must stop
        // working immediately, so the subject is re-checked.
        let Some(user) = self.store.user_by_id(user_id).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        Self::to_user_info(&user)
    }

    async fn user_info(&self, user_id: i32) -> Result<UserInfo, AuthError> {
        let Some(user) = self.store.user_by_id(user_id).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        Self::to_user_info(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_tokens_are_long_random_hex() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_eq!(a.len(), 96);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn token_claims_round_trip() {
        let secret = "test-secret";
        let claims = TokenClaims {
            sub: "42".to_string(),
            email: "user@example.com".to_string(),
            role: "CUSTOMER".to_string(),
            exp: u64::try_from(Utc::now().timestamp()).unwrap() + 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let decoded = decode::<TokenClaims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(jsonwebtoken::Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, "42");
        assert_eq!(decoded.claims.role, "CUSTOMER");

        // Wrong secret must not validate.
        assert!(
            decode::<TokenClaims>(
                &token,
                &DecodingKey::from_secret(b"other-secret"),
                &Validation::new(jsonwebtoken::Algorithm::HS256),
            )
            .is_err()
        );
    }
}
