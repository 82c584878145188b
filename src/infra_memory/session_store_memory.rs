use crate::application_port::Clock;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// In-process session store with the same key layout and TTL semantics as
/// the Redis one. Expired records are treated as absent; every `put` purges
/// them.
pub struct MemorySessionStore {
    sessions: DashMap<String, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MemorySessionStore {
            sessions: DashMap::new(),
            clock,
        }
    }

    /// Number of live records across all principals.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.sessions.iter().filter(|e| *e.value() > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(
        &self,
        principal: &str,
        session_id: SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionStoreError> {
        let key = SessionKey::new(principal, session_id).to_string();
        let now = self.clock.now();
        self.sessions.retain(|_, expiry| *expiry > now);

        if expires_at <= now {
            warn!(%key, "session already expired, not stored");
            self.sessions.remove(&key);
            return Ok(());
        }
        self.sessions.insert(key, expires_at);
        Ok(())
    }

    async fn delete_one(
        &self,
        principal: &str,
        session_id: SessionId,
    ) -> Result<(), SessionStoreError> {
        let key = SessionKey::new(principal, session_id).to_string();
        let now = self.clock.now();
        match self.sessions.remove(&key) {
            Some((_, expires_at)) if expires_at > now => Ok(()),
            _ => {
                debug!(%key, "session does not exist");
                Err(SessionStoreError::InvalidToken)
            }
        }
    }

    async fn delete_all(&self, principal: &str) -> Result<usize, SessionStoreError> {
        let now = self.clock.now();

        let keys: Vec<String> = self
            .sessions
            .iter()
            .filter(|e| SessionKey::session_id_in(principal, e.key()).is_some())
            .map(|e| e.key().clone())
            .collect();

        let mut removed = 0;
        for key in keys {
            if let Some((_, expires_at)) = self.sessions.remove(&key) {
                if expires_at > now {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn exists(
        &self,
        principal: &str,
        session_id: SessionId,
    ) -> Result<bool, SessionStoreError> {
        let key = SessionKey::new(principal, session_id).to_string();
        let now = self.clock.now();
        Ok(self
            .sessions
            .get(&key)
            .map(|expires_at| *expires_at > now)
            .unwrap_or(false))
    }
}
