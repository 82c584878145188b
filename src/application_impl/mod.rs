mod argon2_hasher;
mod auth_service_impl;
mod jwt_signer;

pub use argon2_hasher::*;
pub use auth_service_impl::*;
pub use jwt_signer::*;
