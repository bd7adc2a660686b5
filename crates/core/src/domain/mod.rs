// Domain Layer - the container and what it holds

mod node;
pub mod queue;
pub mod value;

// Re-exports
pub use queue::{Iter, TextQueue};
pub use value::{TextValue, TERMINATOR};
