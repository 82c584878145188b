use crate::api::v1::guard::HeaderError;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use crate::logger::{debug, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

/// Client-visible failure. Messages stay generic; the real reason is only
/// logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApiErrorCode {
    #[error("Bad Request")]
    BadRequest,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Internal Server Error")]
    InternalError,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized<E: std::fmt::Display>(reason: E) -> ApiErrorCode {
        debug!("Unauthorized: {}", reason);
        ApiErrorCode::Unauthorized
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<HeaderError> for ApiErrorCode {
    fn from(error: HeaderError) -> Self {
        ApiErrorCode::unauthorized(error)
    }
}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidSignature | AuthError::ExpiredToken | AuthError::InvalidToken => {
                ApiErrorCode::unauthorized(error)
            }
            AuthError::Config(_) | AuthError::Store(_) | AuthError::InternalError(_) => {
                ApiErrorCode::internal(error)
            }
        }
    }
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, message) = if let Some(code) = err.find::<ApiErrorCode>() {
        (code.status(), code.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<reject::PayloadTooLarge>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
        || err.find::<reject::UnsupportedMediaType>().is_some()
    {
        debug!("Bad request: {:?}", err);
        (StatusCode::BAD_REQUEST, ApiErrorCode::BadRequest.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed".to_string(),
        )
    } else {
        warn!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::InternalError.to_string(),
        )
    };

    let json = warp::reply::json(&ErrorBody { message });
    Ok(warp::reply::with_status(json, status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_split_into_unauthorized_and_internal() {
        for err in [
            AuthError::InvalidSignature,
            AuthError::ExpiredToken,
            AuthError::InvalidToken,
        ] {
            assert_eq!(ApiErrorCode::from(err), ApiErrorCode::Unauthorized);
        }
        for err in [
            AuthError::Store("down".to_string()),
            AuthError::InternalError("boom".to_string()),
            AuthError::Config("short key".to_string()),
        ] {
            assert_eq!(ApiErrorCode::from(err), ApiErrorCode::InternalError);
        }
    }

    #[test]
    fn messages_are_generic() {
        assert_eq!(ApiErrorCode::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(ApiErrorCode::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiErrorCode::InternalError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
