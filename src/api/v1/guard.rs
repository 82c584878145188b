use super::error::ApiErrorCode;
use crate::application_port::TokenSigner;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use warp::{Filter, Rejection, reject};

const AUTHORIZATION_TYPE_BEARER: &str = "bearer";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("authorization header is not provided")]
    MissingHeader,
    #[error("invalid authorization header format")]
    MalformedHeader,
    #[error("unsupported authorization type {0}")]
    UnsupportedScheme(String),
}

/// Identity proven by a verified access token, handed to guarded handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub principal: String,
    pub session_id: SessionId,
    pub expires_at: DateTime<Utc>,
}

impl From<TokenPayload> for AuthContext {
    fn from(payload: TokenPayload) -> Self {
        AuthContext {
            principal: payload.principal,
            session_id: payload.session_id,
            expires_at: payload.expires_at,
        }
    }
}

/// Extracts the credential from `<scheme> <token>`; the scheme must be
/// `bearer` in any case.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, HeaderError> {
    let header = header
        .filter(|h| !h.is_empty())
        .ok_or(HeaderError::MissingHeader)?;

    let mut fields = header.split_whitespace();
    let (Some(scheme), Some(token)) = (fields.next(), fields.next()) else {
        return Err(HeaderError::MalformedHeader);
    };

    if !scheme.eq_ignore_ascii_case(AUTHORIZATION_TYPE_BEARER) {
        return Err(HeaderError::UnsupportedScheme(scheme.to_ascii_lowercase()));
    }
    Ok(token)
}

/// The raw bearer credential, not verified.
pub fn bearer_token() -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(
        |header: Option<String>| async move {
            parse_bearer(header.as_deref())
                .map(str::to_string)
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)
        },
    )
}

/// Rejects unless the bearer credential is a valid, unexpired access token.
pub fn with_authorization(
    token_signer: Arc<dyn TokenSigner>,
) -> impl Filter<Extract = (AuthContext,), Error = Rejection> + Clone {
    bearer_token().and_then(move |token: String| {
        let token_signer = token_signer.clone();
        async move {
            let payload = token_signer
                .verify_kind(&token, TokenKind::Access)
                .map_err(ApiErrorCode::unauthorized)
                .map_err(reject::custom)?;
            Ok::<_, Rejection>(AuthContext::from(payload))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{JwtConfig, JwtHs256Signer};
    use crate::application_port::SystemClock;
    use std::time::Duration;

    fn signer() -> Arc<dyn TokenSigner> {
        Arc::new(
            JwtHs256Signer::new(
                JwtConfig {
                    issuer: "tokenkeeper".to_string(),
                    audience: "tokenkeeper-client".to_string(),
                    signing_key: b"0123456789abcdef0123456789abcdef".to_vec(),
                },
                Arc::new(SystemClock),
            )
            .unwrap(),
        )
    }

    #[test]
    fn header_rules() {
        assert_eq!(parse_bearer(None), Err(HeaderError::MissingHeader));
        assert_eq!(parse_bearer(Some("")), Err(HeaderError::MissingHeader));
        assert_eq!(parse_bearer(Some("Bearer")), Err(HeaderError::MalformedHeader));
        assert_eq!(parse_bearer(Some("   ")), Err(HeaderError::MalformedHeader));
        assert_eq!(
            parse_bearer(Some("Basic xyz")),
            Err(HeaderError::UnsupportedScheme("basic".to_string()))
        );
        assert_eq!(parse_bearer(Some("Bearer abc")), Ok("abc"));
        assert_eq!(parse_bearer(Some("bEaReR   abc")), Ok("abc"));
    }

    #[tokio::test]
    async fn guard_threads_the_verified_principal() {
        let signer = signer();
        let (token, payload) = signer
            .sign("a@x.com", TokenKind::Access, Duration::from_secs(60))
            .unwrap();

        let ctx = warp::test::request()
            .header("authorization", format!("Bearer {}", token))
            .filter(&with_authorization(signer))
            .await
            .unwrap();

        assert_eq!(ctx, AuthContext::from(payload));
    }

    #[tokio::test]
    async fn guard_rejects_missing_and_foreign_credentials() {
        let signer = signer();
        let guard = with_authorization(signer.clone());

        let rejection = warp::test::request().filter(&guard).await.unwrap_err();
        assert_eq!(
            rejection.find::<ApiErrorCode>(),
            Some(&ApiErrorCode::Unauthorized)
        );

        let rejection = warp::test::request()
            .header("authorization", "Basic xyz")
            .filter(&guard)
            .await
            .unwrap_err();
        assert_eq!(
            rejection.find::<ApiErrorCode>(),
            Some(&ApiErrorCode::Unauthorized)
        );

        let (refresh, _) = signer
            .sign("a@x.com", TokenKind::Refresh, Duration::from_secs(60))
            .unwrap();
        let rejection = warp::test::request()
            .header("authorization", format!("Bearer {}", refresh))
            .filter(&guard)
            .await
            .unwrap_err();
        assert_eq!(
            rejection.find::<ApiErrorCode>(),
            Some(&ApiErrorCode::Unauthorized)
        );
    }
}
