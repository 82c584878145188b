use crate::application_port::*;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub email: String,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fetch the stored credentials of a principal (for login).
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;
}
