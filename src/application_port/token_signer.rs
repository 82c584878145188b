use crate::domain_model::{TokenKind, TokenPayload};
use std::time::Duration;

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("signer misconfigured: {0}")]
    Config(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("expected a {expected} token, got a {found} token")]
    WrongKind { expected: TokenKind, found: TokenKind },
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Creates and verifies signed token strings. Pure CPU work, no I/O.
pub trait TokenSigner: Send + Sync {
    /// Mints a fresh session id and signs a payload valid for `ttl`.
    fn sign(
        &self,
        principal: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(String, TokenPayload), TokenError>;

    /// Checks algorithm, MAC and claims, then expiry. Malformed input is
    /// `InvalidSignature`.
    fn verify(&self, token: &str) -> Result<TokenPayload, TokenError>;

    /// `verify` plus a check that the token is of the `expected` kind.
    fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<TokenPayload, TokenError> {
        let payload = self.verify(token)?;
        if payload.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                found: payload.kind,
            });
        }
        Ok(payload)
    }
}

pub fn check_secret_len(secret: &[u8]) -> Result<(), TokenError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(TokenError::Config(format!(
            "invalid key size: must be at least {} bytes, got {}",
            MIN_SECRET_LEN,
            secret.len()
        )));
    }
    Ok(())
}
