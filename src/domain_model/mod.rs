mod session;
mod token;

pub use session::*;
pub use token::*;
