use crate::application_port::*;
use crate::domain_port::*;
use dashmap::DashMap;

/// In-memory credential table keyed by email.
#[derive(Debug, Default)]
pub struct MemoryUserRepo {
    users: DashMap<String, UserRecord>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user with an already-hashed password.
    pub fn insert_user(&self, email: &str, password_hash: &str) {
        self.users.insert(
            email.to_string(),
            UserRecord {
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.users.get(email).map(|r| r.value().clone()))
    }
}
