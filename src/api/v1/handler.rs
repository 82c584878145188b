use super::error::*;
use super::guard::AuthContext;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub email: String,
}

impl LoginResponse {
    fn new(tokens: TokenDetails, email: String) -> Self {
        LoginResponse {
            access_token: tokens.access_token,
            access_token_expires_at: tokens.access_token_expires_at,
            refresh_token: tokens.refresh_token,
            refresh_token_expires_at: tokens.refresh_token_expires_at,
            email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub email: String,
    pub session_id: SessionId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(reject::custom(ApiErrorCode::BadRequest));
    }

    let login_input = LoginInput {
        email: body.email.clone(),
        password: body.password,
    };
    if !auth_service.login(login_input).await {
        return Err(reject::custom(ApiErrorCode::unauthorized(
            "invalid credentials",
        )));
    }

    let tokens = auth_service
        .create_tokens(&body.email, None)
        .await
        .map_err(ApiErrorCode::internal)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&LoginResponse::new(tokens, body.email)),
        StatusCode::CREATED,
    ))
}

/// Trades an expired access token plus a live refresh token for a new pair.
/// The presented refresh token is consumed.
pub async fn refresh(
    access_token: String,
    body: RefreshTokenRequest,
    token_signer: Arc<dyn TokenSigner>,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match token_signer.verify_kind(&access_token, TokenKind::Access) {
        Err(TokenError::Expired) => {}
        Ok(_) => {
            return Err(reject::custom(ApiErrorCode::unauthorized(
                "access token has not expired",
            )));
        }
        Err(e) => return Err(reject::custom(ApiErrorCode::unauthorized(e))),
    }

    let refresh_payload = token_signer
        .verify_kind(&body.refresh_token, TokenKind::Refresh)
        .map_err(ApiErrorCode::unauthorized)
        .map_err(reject::custom)?;

    let tokens = auth_service
        .create_tokens(
            &refresh_payload.principal,
            Some(refresh_payload.session_id),
        )
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&LoginResponse::new(tokens, refresh_payload.principal)),
        StatusCode::CREATED,
    ))
}

pub async fn logout(
    ctx: AuthContext,
    body: RefreshTokenRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .logout(&ctx.principal, &RefreshToken(body.refresh_token))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn revoke(
    ctx: AuthContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let removed = auth_service
        .revoke(&ctx.principal)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    debug!(principal = %ctx.principal, removed, "revoke handled");

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn me(ctx: AuthContext) -> Result<impl warp::Reply, warp::Rejection> {
    let response = MeResponse {
        email: ctx.principal,
        session_id: ctx.session_id,
        expires_at: ctx.expires_at,
    };
    Ok(warp::reply::json(&response))
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&HealthResponse { status: "ok" }))
}
