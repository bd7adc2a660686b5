// Central Error Type for the Queue

use crate::port::AllocError;
use thiserror::Error;

/// Queue-level error type
///
/// Every variant is recoverable: a failed operation leaves the queue exactly
/// as it was before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Invalid argument: no queue")]
    InvalidArgument,

    #[error("Queue is empty")]
    EmptyQueue,

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocError),
}

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;
