// Text Queue Core - Container & Storage Port
// NO I/O, NO subscriber setup: drivers own logging and configuration

pub mod domain;
pub mod error;
pub mod handle;
pub mod port;

pub use domain::{TextQueue, TextValue};
pub use error::{QueueError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
