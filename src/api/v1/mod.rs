mod error;
mod guard;
mod handler;
mod router;

pub use error::{ApiErrorCode, ErrorBody, recover_error};
pub use guard::{AuthContext, HeaderError, bearer_token, parse_bearer, with_authorization};
pub use handler::{LoginRequest, LoginResponse, MeResponse, RefreshTokenRequest};
pub use router::routes;
