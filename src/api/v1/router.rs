use super::guard::*;
use super::handler::{self, LoginRequest, RefreshTokenRequest};
use crate::server::*;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // Path before method, so an unknown path stays a 404 rather than a 405.
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handler::health);

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<LoginRequest>())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(bearer_token())
        .and(json_body::<RefreshTokenRequest>())
        .and(with(server.token_signer.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::path("logout")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_authorization(server.token_signer.clone()))
        .and(json_body::<RefreshTokenRequest>())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let revoke = warp::path("revoke")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_authorization(server.token_signer.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::revoke);

    let me = warp::path("secure")
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_authorization(server.token_signer.clone()))
        .and_then(handler::me);

    health.or(login).or(refresh).or(logout).or(revoke).or(me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}
