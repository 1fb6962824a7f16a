//! Domain service for accounts and token issuance.
//!
//! Access tokens are short-lived signed JWTs; refresh tokens are opaque
//! single-use rows that rotate on every refresh.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately constant-shape: callers cannot tell a missing account
    /// from a wrong password or a stale refresh token.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Customer => "CUSTOMER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "CUSTOMER" => Ok(Self::Customer),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Public user summary (no hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

/// Issued token pair plus the access-token lifetime in seconds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a CUSTOMER account and issues a first token pair.
    ///
    /// # Errors
    ///
    /// [`AuthError::EmailTaken`] when a non-deleted account already uses the
    /// (lowercased) email.
    async fn register(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Consumes the refresh token (single-use rotation) and issues a fresh
    /// pair. Unknown and expired tokens both fail as
    /// [`AuthError::InvalidCredentials`]; expired rows are deleted on
    /// detection.
    async fn refresh(&self, token: &str) -> Result<TokenPair, AuthError>;

    /// Decodes a bearer token and re-checks the subject against the user
    /// table (soft-deleted accounts are rejected).
    async fn authenticate(&self, bearer: &str) -> Result<UserInfo, AuthError>;

    async fn user_info(&self, user_id: i32) -> Result<UserInfo, AuthError>;
}
