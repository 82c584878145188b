use crate::application_port::TokenError;
use crate::domain_model::SessionId;
use crate::domain_port::SessionStoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    ExpiredToken,
    #[error("token invalid")]
    InvalidToken,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Config(e) => AuthError::Config(e),
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::WrongKind { .. } => AuthError::InvalidToken,
            TokenError::Encoding(e) => AuthError::InternalError(e),
        }
    }
}

impl From<SessionStoreError> for AuthError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::InvalidToken => AuthError::InvalidToken,
            SessionStoreError::Store(e) => AuthError::Store(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshToken(pub String);

/// A freshly issued access/refresh pair. `session_id` is the refresh
/// token's session, the one recorded in the session store.
#[derive(Debug, Clone)]
pub struct TokenDetails {
    pub session_id: SessionId,
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// True only when the principal exists and the password matches.
    async fn login(&self, request: LoginInput) -> bool;

    /// Issues a new pair and records the refresh session. When
    /// `prev_session` is given it is consumed first; a missing record
    /// fails the call with `InvalidToken`.
    async fn create_tokens(
        &self,
        principal: &str,
        prev_session: Option<SessionId>,
    ) -> Result<TokenDetails, AuthError>;

    async fn logout(&self, principal: &str, refresh_token: &RefreshToken)
    -> Result<(), AuthError>;

    /// Removes every session of `principal`, returning how many went.
    async fn revoke(&self, principal: &str) -> Result<usize, AuthError>;
}
