use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
}

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_signer: Arc<dyn TokenSigner>,
    session_store: Arc<dyn SessionStore>,
    ttls: TokenTtls,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_signer: Arc<dyn TokenSigner>,
        session_store: Arc<dyn SessionStore>,
        ttls: TokenTtls,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_signer,
            session_store,
            ttls,
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> bool {
        let LoginInput { email, password } = request;

        let rec = match self.user_repo.get_user_by_email(&email).await {
            Ok(Some(rec)) => rec,
            Ok(None) => {
                debug!(%email, "login for unknown principal");
                return false;
            }
            Err(e) => {
                warn!(%email, "user lookup failed: {}", e);
                return false;
            }
        };

        match self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await
        {
            Ok(ok) => ok,
            Err(e) => {
                warn!(%email, "password check failed: {}", e);
                false
            }
        }
    }

    async fn create_tokens(
        &self,
        principal: &str,
        prev_session: Option<SessionId>,
    ) -> Result<TokenDetails, AuthError> {
        // Rotation: consume the previous refresh session before minting a new one.
        if let Some(prev) = prev_session {
            self.session_store.delete_one(principal, prev).await?;
            debug!(%principal, session_id = %prev, "refresh session rotated out");
        }

        let (access_token, access) =
            self.token_signer
                .sign(principal, TokenKind::Access, self.ttls.access)?;
        let (refresh_token, refresh) =
            self.token_signer
                .sign(principal, TokenKind::Refresh, self.ttls.refresh)?;

        self.session_store
            .put(principal, refresh.session_id, refresh.expires_at)
            .await?;
        info!(%principal, session_id = %refresh.session_id, "session created");

        Ok(TokenDetails {
            session_id: refresh.session_id,
            access_token: AccessToken(access_token),
            access_token_expires_at: access.expires_at,
            refresh_token: RefreshToken(refresh_token),
            refresh_token_expires_at: refresh.expires_at,
        })
    }

    async fn logout(
        &self,
        principal: &str,
        refresh_token: &RefreshToken,
    ) -> Result<(), AuthError> {
        let payload = self
            .token_signer
            .verify_kind(&refresh_token.0, TokenKind::Refresh)?;
        if payload.principal != principal {
            warn!(%principal, "logout with a refresh token of another principal");
            return Err(AuthError::InvalidToken);
        }

        self.session_store
            .delete_one(principal, payload.session_id)
            .await?;
        info!(%principal, session_id = %payload.session_id, "session closed");
        Ok(())
    }

    async fn revoke(&self, principal: &str) -> Result<usize, AuthError> {
        let removed = self.session_store.delete_all(principal).await?;
        info!(%principal, removed, "all sessions revoked");
        Ok(removed)
    }
}
