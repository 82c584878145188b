use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use chrono::{DateTime, SubsecRound, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub signing_key: Vec<u8>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    jti: String, // session id
    sub: String, // principal
    typ: TokenKind,
    iat: i64,
    exp: i64,
    iss: String,
    aud: String,
}

/// HS256 signer. Expiry is checked against the injected clock with zero
/// leeway, after the MAC and claim checks.
pub struct JwtHs256Signer {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtHs256Signer {
    pub fn new(cfg: JwtConfig, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        check_secret_len(&cfg.signing_key)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[cfg.issuer.clone()]);
        validation.set_audience(&[cfg.audience.clone()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        Ok(JwtHs256Signer {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
            cfg,
            clock,
        })
    }

    /// Whole seconds, rounded up so any positive ttl survives.
    fn ttl_secs(ttl: Duration) -> Result<i64, TokenError> {
        let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
        if secs == 0 {
            return Err(TokenError::Config("token ttl must be positive".to_string()));
        }
        i64::try_from(secs).map_err(|_| TokenError::Config("token ttl out of range".to_string()))
    }

    fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
        DateTime::from_timestamp(secs, 0).ok_or(TokenError::InvalidSignature)
    }

    fn into_payload(claims: Claims) -> Result<TokenPayload, TokenError> {
        let session_id = claims
            .jti
            .parse::<SessionId>()
            .map_err(|_| TokenError::InvalidSignature)?;
        Ok(TokenPayload {
            session_id,
            principal: claims.sub,
            kind: claims.typ,
            issued_at: Self::timestamp(claims.iat)?,
            expires_at: Self::timestamp(claims.exp)?,
        })
    }
}

impl TokenSigner for JwtHs256Signer {
    fn sign(
        &self,
        principal: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(String, TokenPayload), TokenError> {
        check_secret_len(&self.cfg.signing_key)?;

        let ttl_secs = Self::ttl_secs(ttl)?;
        let issued_at = self.clock.now().trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(chrono::Duration::seconds(ttl_secs))
            .ok_or_else(|| TokenError::Config("token ttl out of range".to_string()))?;

        let payload = TokenPayload {
            session_id: SessionId::new_random(),
            principal: principal.to_string(),
            kind,
            issued_at,
            expires_at,
        };
        let claims = Claims {
            jti: payload.session_id.to_string(),
            sub: payload.principal.clone(),
            typ: kind,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        Ok((token, payload))
    }

    fn verify(&self, token: &str) -> Result<TokenPayload, TokenError> {
        check_secret_len(&self.cfg.signing_key)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("token rejected: {}", e);
            TokenError::InvalidSignature
        })?;
        let payload = Self::into_payload(data.claims)?;

        if payload.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }
        Ok(payload)
    }
}
