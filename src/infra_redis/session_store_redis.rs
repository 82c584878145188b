use crate::application_port::Clock;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct RedisSessionStore {
    conn: ConnectionManager,
    clock: Arc<dyn Clock>,
    op_timeout: Duration,
    scan_batch: usize,
}

impl RedisSessionStore {
    pub fn new(
        conn: ConnectionManager,
        clock: Arc<dyn Clock>,
        op_timeout: Duration,
        scan_batch: usize,
    ) -> Self {
        RedisSessionStore {
            conn,
            clock,
            op_timeout,
            scan_batch: scan_batch.max(1),
        }
    }

    fn key(principal: &str, session_id: SessionId) -> String {
        SessionKey::new(principal, session_id).to_string()
    }

    /// Runs one backend call under the operation deadline.
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, SessionStoreError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(SessionStoreError::Store(format!("{}: {}", op, e))),
            Err(_) => Err(SessionStoreError::Store(format!(
                "{}: timed out after {:?}",
                op, self.op_timeout
            ))),
        }
    }
}

/// Outcome of a revoke sweep. A failed delete is counted and the sweep moves
/// on to the next key; any failure makes the whole sweep a store error.
#[derive(Debug, Default)]
pub(crate) struct SweepTally {
    removed: usize,
    failures: usize,
}

impl SweepTally {
    pub(crate) async fn delete_keys<F, Fut>(&mut self, keys: Vec<String>, mut delete: F)
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<usize, SessionStoreError>>,
    {
        for key in keys {
            match delete(key.clone()).await {
                Ok(n) => self.removed += n,
                Err(e) => {
                    error!(%key, "failed to delete session: {}", e);
                    self.failures += 1;
                }
            }
        }
    }

    pub(crate) fn finish(self) -> Result<usize, SessionStoreError> {
        if self.failures > 0 {
            return Err(SessionStoreError::Store(format!(
                "{} session(s) could not be removed",
                self.failures
            )));
        }
        Ok(self.removed)
    }
}

/// Remaining lifetime in whole seconds, rounded up. `None` once the expiry
/// is not in the future.
pub(crate) fn ttl_secs(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
    let millis = (expires_at - now).num_milliseconds();
    if millis <= 0 {
        return None;
    }
    Some((millis as u64).div_ceil(1000))
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(
        &self,
        principal: &str,
        session_id: SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionStoreError> {
        let key = Self::key(principal, session_id);
        let Some(ttl) = ttl_secs(expires_at, self.clock.now()) else {
            warn!(%key, "session already expired, not stored");
            return Ok(());
        };

        let mut conn = self.conn.clone();
        let _: () = self.bounded("SET", conn.set_ex(&key, 0, ttl)).await?;
        Ok(())
    }

    async fn delete_one(
        &self,
        principal: &str,
        session_id: SessionId,
    ) -> Result<(), SessionStoreError> {
        let key = Self::key(principal, session_id);
        let mut conn = self.conn.clone();

        let removed: usize = self.bounded("DEL", conn.del(&key)).await.inspect_err(|e| {
            error!(%key, "could not delete session: {}", e);
        })?;
        // DEL reports how many keys went; none means the token is not live.
        if removed < 1 {
            debug!(%key, "session does not exist");
            return Err(SessionStoreError::InvalidToken);
        }
        Ok(())
    }

    async fn delete_all(&self, principal: &str) -> Result<usize, SessionStoreError> {
        let pattern = SessionKey::principal_pattern(principal);
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut tally = SweepTally::default();

        loop {
            let (next, keys): (u64, Vec<String>) = self
                .bounded(
                    "SCAN",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(self.scan_batch)
                        .query_async(&mut conn),
                )
                .await
                .inspect_err(|e| {
                    error!(%principal, "session sweep aborted: {}", e);
                })?;

            tally
                .delete_keys(keys, |key| {
                    let mut conn = self.conn.clone();
                    async move { self.bounded::<usize, _>("DEL", conn.del(&key)).await }
                })
                .await;

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        tally.finish()
    }

    async fn exists(
        &self,
        principal: &str,
        session_id: SessionId,
    ) -> Result<bool, SessionStoreError> {
        let key = Self::key(principal, session_id);
        let mut conn = self.conn.clone();
        self.bounded("EXISTS", conn.exists(&key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn sweep_keeps_going_past_a_failed_delete() {
        let keys: Vec<String> = (1..=4).map(|n| format!("a@x.com:{}", n)).collect();
        let mut deleted = Vec::new();

        let mut tally = SweepTally::default();
        tally
            .delete_keys(keys, |key| {
                let result = if key == "a@x.com:2" {
                    Err(SessionStoreError::Store("connection reset".to_string()))
                } else {
                    deleted.push(key);
                    Ok(1)
                };
                async move { result }
            })
            .await;

        assert_eq!(deleted, ["a@x.com:1", "a@x.com:3", "a@x.com:4"]);
        assert!(matches!(tally.finish(), Err(SessionStoreError::Store(_))));
    }

    #[tokio::test]
    async fn clean_sweep_counts_removed_keys() {
        let mut tally = SweepTally::default();
        tally
            .delete_keys(vec!["a".to_string(), "b".to_string()], |_| async { Ok(1) })
            .await;
        tally.delete_keys(vec!["c".to_string()], |_| async { Ok(0) }).await;

        assert_eq!(tally.finish(), Ok(2));
    }

    #[test]
    fn ttl_rounds_up_to_whole_seconds() {
        let now = Utc::now();
        assert_eq!(ttl_secs(now + Duration::seconds(60), now), Some(60));
        assert_eq!(ttl_secs(now + Duration::milliseconds(1), now), Some(1));
        assert_eq!(ttl_secs(now + Duration::milliseconds(1500), now), Some(2));
    }

    #[test]
    fn ttl_is_none_for_past_or_present_expiry() {
        let now = Utc::now();
        assert_eq!(ttl_secs(now, now), None);
        assert_eq!(ttl_secs(now - Duration::seconds(5), now), None);
    }
}
