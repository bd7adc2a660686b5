// Port Layer - Interfaces for external dependencies

pub mod storage; // For fault-injection testing

// Re-exports
pub use storage::{
    AccountingStorage, AllocError, AllocationKind, AllocationStats, KindStats, StorageProvider,
    SystemStorage,
};
