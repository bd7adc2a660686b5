// Storage Port (for accountable allocation and fault injection)

use serde::Serialize;
use std::cell::RefCell;
use thiserror::Error;

/// What a reservation pays for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationKind {
    Queue,
    Node,
    Value,
}

impl std::fmt::Display for AllocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationKind::Queue => write!(f, "queue"),
            AllocationKind::Node => write!(f, "node"),
            AllocationKind::Value => write!(f, "value"),
        }
    }
}

/// Backing storage could not be obtained
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot allocate {bytes} bytes for {kind}")]
pub struct AllocError {
    pub kind: AllocationKind,
    pub bytes: usize,
}

impl AllocError {
    pub fn new(kind: AllocationKind, bytes: usize) -> Self {
        Self { kind, bytes }
    }
}

/// Storage provider interface (allows fault injection in tests)
///
/// The queue calls `reserve` before every allocation it makes and `release`
/// after every allocation it frees. A refused reservation is reported to the
/// caller of the queue operation and leaves the queue untouched.
pub trait StorageProvider {
    /// Ask for `bytes` of storage for an allocation of `kind`
    fn reserve(&self, kind: AllocationKind, bytes: usize) -> Result<(), AllocError>;

    /// Hand back storage previously granted by `reserve`
    fn release(&self, kind: AllocationKind, bytes: usize);
}

/// System storage provider (production)
///
/// Grants every reservation; genuine allocator refusals are still caught where
/// the queue allocates fallibly.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemStorage;

impl StorageProvider for SystemStorage {
    fn reserve(&self, _kind: AllocationKind, _bytes: usize) -> Result<(), AllocError> {
        Ok(())
    }

    fn release(&self, _kind: AllocationKind, _bytes: usize) {}
}

// ============================================================================
// Accounting implementation (drivers and fault tests)
// ============================================================================

/// Per-kind allocation counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindStats {
    pub reserved: u64,
    pub released: u64,
    pub refused: u64,
    pub live_bytes: usize,
}

impl KindStats {
    /// Reservations not yet matched by a release
    pub fn live(&self) -> u64 {
        self.reserved - self.released
    }
}

/// Snapshot of everything an `AccountingStorage` has seen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllocationStats {
    pub queue: KindStats,
    pub node: KindStats,
    pub value: KindStats,
    /// Releases that had no outstanding reservation to match
    pub double_releases: u64,
}

impl AllocationStats {
    pub fn kind(&self, kind: AllocationKind) -> &KindStats {
        match kind {
            AllocationKind::Queue => &self.queue,
            AllocationKind::Node => &self.node,
            AllocationKind::Value => &self.value,
        }
    }

    fn kind_mut(&mut self, kind: AllocationKind) -> &mut KindStats {
        match kind {
            AllocationKind::Queue => &mut self.queue,
            AllocationKind::Node => &mut self.node,
            AllocationKind::Value => &mut self.value,
        }
    }

    /// Total reservations still outstanding across all kinds
    pub fn live(&self) -> u64 {
        self.queue.live() + self.node.live() + self.value.live()
    }

    /// True when every reservation was released exactly once
    pub fn is_balanced(&self) -> bool {
        self.live() == 0
            && self.double_releases == 0
            && self.queue.live_bytes == 0
            && self.node.live_bytes == 0
            && self.value.live_bytes == 0
    }
}

#[derive(Debug, Default)]
struct AccountingState {
    stats: AllocationStats,
    fail_next: usize,
    fail_after: Option<usize>,
    fail_all: bool,
}

impl AccountingState {
    /// Decide whether the reservation being made now is refused
    fn should_refuse(&mut self) -> bool {
        if self.fail_all {
            return true;
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return true;
        }
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                true
            }
            Some(remaining) => {
                self.fail_after = Some(remaining - 1);
                false
            }
            None => false,
        }
    }
}

/// Storage provider that keeps a ledger of reservations and refuses on demand
///
/// Used by the command shell and by fault-injection tests to confirm that
/// every node and value reservation is matched by exactly one release.
///
/// # Example
/// ```text
/// let storage = Rc::new(AccountingStorage::new());
/// storage.fail_after(1); // node granted, value clone refused
/// assert!(queue.insert_tail("x").is_err());
/// ```
#[derive(Debug, Default)]
pub struct AccountingStorage {
    state: RefCell<AccountingState>,
}

impl AccountingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` reservations
    pub fn fail_next(&self, count: usize) {
        self.state.borrow_mut().fail_next = count;
    }

    /// Grant the next `granted` reservations, then refuse exactly one
    pub fn fail_after(&self, granted: usize) {
        self.state.borrow_mut().fail_after = Some(granted);
    }

    /// Refuse every reservation until turned off again
    pub fn set_fail_all(&self, fail_all: bool) {
        self.state.borrow_mut().fail_all = fail_all;
    }

    /// Drop every pending fault
    pub fn clear_faults(&self) {
        let mut state = self.state.borrow_mut();
        state.fail_next = 0;
        state.fail_after = None;
        state.fail_all = false;
    }

    pub fn stats(&self) -> AllocationStats {
        self.state.borrow().stats.clone()
    }

    pub fn is_balanced(&self) -> bool {
        self.state.borrow().stats.is_balanced()
    }
}

impl StorageProvider for AccountingStorage {
    fn reserve(&self, kind: AllocationKind, bytes: usize) -> Result<(), AllocError> {
        let mut state = self.state.borrow_mut();
        if state.should_refuse() {
            state.stats.kind_mut(kind).refused += 1;
            return Err(AllocError::new(kind, bytes));
        }

        let entry = state.stats.kind_mut(kind);
        entry.reserved += 1;
        entry.live_bytes += bytes;
        Ok(())
    }

    fn release(&self, kind: AllocationKind, bytes: usize) {
        let mut state = self.state.borrow_mut();
        if state.stats.kind(kind).live() == 0 {
            state.stats.double_releases += 1;
            return;
        }

        let entry = state.stats.kind_mut(kind);
        entry.released += 1;
        entry.live_bytes = entry.live_bytes.saturating_sub(bytes);
    }
}
