//! Process-wide `tracing` setup. Boots at `info`, then reloads from settings.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
