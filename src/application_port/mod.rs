mod auth_service;
mod clock;
mod token_signer;

pub use auth_service::*;
pub use clock::*;
pub use token_signer::*;
