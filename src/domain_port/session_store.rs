use crate::domain_model::SessionId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionStoreError {
    #[error("invalid refresh token")]
    InvalidToken,
    #[error("infra error: {0}")]
    Store(String),
}

/// Live refresh sessions, keyed `<principal>:<session id>`. A record exists
/// iff the matching refresh token may still be used.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Record a session that lives until `expires_at`.
    async fn put(
        &self,
        principal: &str,
        session_id: SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionStoreError>;

    /// Remove exactly one session. Removing nothing is `InvalidToken`.
    async fn delete_one(
        &self,
        principal: &str,
        session_id: SessionId,
    ) -> Result<(), SessionStoreError>;

    /// Best-effort sweep of every session of `principal`. Keeps going past
    /// individual failures and reports `Store` if any delete failed.
    async fn delete_all(&self, principal: &str) -> Result<usize, SessionStoreError>;

    async fn exists(
        &self,
        principal: &str,
        session_id: SessionId,
    ) -> Result<bool, SessionStoreError>;
}
