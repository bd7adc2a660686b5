// Queue Domain Model

use super::node::{Link, Node};
use super::value::TextValue;
use crate::error::{QueueError, Result};
use crate::port::{AllocError, AllocationKind, StorageProvider, SystemStorage};
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::rc::Rc;
use tracing::{debug, trace};

/// Singly-linked queue of text values
///
/// Values can be inserted at either end and removed from the head. The queue
/// owns its chain: the head slot owns the first node and every node owns its
/// successor. `tail` is a non-owning shortcut to the last node so tail
/// insertion never walks the chain.
///
/// Invariants held between calls:
/// - `len` equals the number of nodes reachable from `head`
/// - `head`, `tail` and `len == 0` are absent/true together
/// - the node behind `tail` has no successor
pub struct TextQueue {
    head: Link,
    tail: Link,
    len: usize,
    storage: Rc<dyn StorageProvider>,
    _owns: PhantomData<Box<Node>>,
}

impl TextQueue {
    /// Heap size the queue itself accounts for
    const SIZE: usize = std::mem::size_of::<TextQueue>();

    /// Create an empty queue backed by system storage
    pub fn new() -> Result<Self> {
        Self::with_storage(Rc::new(SystemStorage))
    }

    /// Create an empty queue that reserves all of its storage through `storage`
    ///
    /// # Errors
    /// `QueueError::Allocation` if the provider refuses the queue itself
    pub fn with_storage(storage: Rc<dyn StorageProvider>) -> Result<Self> {
        if let Err(err) = storage.reserve(AllocationKind::Queue, Self::SIZE) {
            debug!(error = %err, "queue creation refused");
            return Err(err.into());
        }

        Ok(Self {
            head: None,
            tail: None,
            len: 0,
            storage,
            _owns: PhantomData,
        })
    }

    /// Release every node, every value and then the queue
    ///
    /// Consumes the queue, so it cannot be used afterwards. Dropping the queue
    /// has the same effect.
    pub fn destroy(self) {
        drop(self);
    }

    /// Number of values held (O(1))
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a copy of `text` before the current head
    ///
    /// `text` is copied up to its first terminator byte; the caller keeps its
    /// argument.
    ///
    /// # Errors
    /// `QueueError::Allocation` if the node or the value copy cannot be
    /// allocated. The queue is unchanged in that case.
    pub fn insert_head(&mut self, text: impl AsRef<[u8]>) -> Result<()> {
        let node = self.allocate_node(text.as_ref(), self.head)?;

        if self.tail.is_none() {
            self.tail = Some(node);
        }
        self.head = Some(node);
        self.len += 1;

        trace!(len = self.len, "inserted at head");
        Ok(())
    }

    /// Insert a copy of `text` after the current tail
    ///
    /// Same contract as [`TextQueue::insert_head`]; runs in O(1) regardless
    /// of length.
    pub fn insert_tail(&mut self, text: impl AsRef<[u8]>) -> Result<()> {
        let node = self.allocate_node(text.as_ref(), None)?;

        match self.tail {
            // SAFETY: `tail` points at the last node of the chain this queue
            // owns, and no reference into the chain outlives `&mut self`.
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;

        trace!(len = self.len, "inserted at tail");
        Ok(())
    }

    /// Remove the head value, optionally copying it into `buf`
    ///
    /// When `buf` is given, at most `buf.len() - 1` bytes are copied followed
    /// by the terminator; longer values are truncated silently. An empty
    /// buffer receives nothing.
    ///
    /// # Errors
    /// `QueueError::EmptyQueue` if there is nothing to remove. The queue is
    /// unchanged in that case.
    pub fn remove_head(&mut self, buf: Option<&mut [u8]>) -> Result<()> {
        let node = self.unlink_head()?;

        if let Some(buf) = buf {
            node.value.copy_truncated(buf);
        }
        self.release_node(node);

        trace!(len = self.len, "removed head");
        Ok(())
    }

    /// Remove the head value and hand it to the caller
    pub fn pop_head(&mut self) -> Result<TextValue> {
        let node = self.unlink_head()?;
        let Node { value, .. } = *node;

        self.storage.release(AllocationKind::Value, value.len());
        self.storage.release(AllocationKind::Node, Node::SIZE);

        trace!(len = self.len, "popped head");
        Ok(value)
    }

    /// Flip the chain in place: the tail becomes the head and every link
    /// points the other way
    ///
    /// Relinks the existing nodes only; never allocates or frees. O(n) time,
    /// O(1) space.
    pub fn reverse(&mut self) {
        let Some(first) = self.head else {
            return;
        };

        let mut previous: Link = None;
        let mut current: Link = Some(first);
        while let Some(node) = current {
            // SAFETY: each node is owned by this queue's chain and visited
            // exactly once; `&mut self` rules out outstanding references.
            unsafe {
                let next = (*node.as_ptr()).next;
                (*node.as_ptr()).next = previous;
                previous = Some(node);
                current = next;
            }
        }

        self.head = previous;
        self.tail = Some(first);
        trace!(len = self.len, "reversed");
    }

    /// Value at the head, if any
    pub fn peek_head(&self) -> Option<&TextValue> {
        // SAFETY: the node is owned by this queue and lives as long as `&self`.
        self.head.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Value at the tail, if any
    pub fn peek_tail(&self) -> Option<&TextValue> {
        // SAFETY: as in `peek_head`.
        self.tail.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Values from head to tail
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head,
            remaining: self.len,
            _queue: PhantomData,
        }
    }

    /// Walk the chain and confirm head, tail and count agree
    ///
    /// Gives up after `len + 1` steps so a corrupted (cyclic) chain cannot
    /// hang the check.
    pub fn links_are_consistent(&self) -> bool {
        let mut seen = 0usize;
        let mut last: Link = None;
        let mut current = self.head;

        while let Some(node) = current {
            if seen > self.len {
                return false;
            }
            seen += 1;
            last = Some(node);
            // SAFETY: nodes reachable from `head` are owned by this queue.
            current = unsafe { (*node.as_ptr()).next };
        }

        seen == self.len && last == self.tail && self.head.is_none() == (self.len == 0)
    }

    /// Reserve and build a node holding a copy of `text`
    ///
    /// Releases whatever was already reserved if a later step fails.
    fn allocate_node(&self, text: &[u8], next: Link) -> Result<NonNull<Node>> {
        let text = TextValue::significant(text);

        if let Err(err) = self.storage.reserve(AllocationKind::Node, Node::SIZE) {
            debug!(error = %err, "node allocation refused");
            return Err(err.into());
        }

        if let Err(err) = self.storage.reserve(AllocationKind::Value, text.len()) {
            self.storage.release(AllocationKind::Node, Node::SIZE);
            debug!(error = %err, "value allocation refused");
            return Err(err.into());
        }

        let value = match TextValue::try_clone_from(text) {
            Ok(value) => value,
            Err(err) => {
                self.storage.release(AllocationKind::Value, text.len());
                self.storage.release(AllocationKind::Node, Node::SIZE);
                debug!(error = %err, bytes = text.len(), "value clone failed");
                return Err(AllocError::new(AllocationKind::Value, text.len()).into());
            }
        };

        Ok(Node::into_link(value, next))
    }

    /// Detach the head node and take ownership of it
    fn unlink_head(&mut self) -> Result<Box<Node>> {
        let head = self.head.ok_or(QueueError::EmptyQueue)?;

        // SAFETY: `head` is the owning link to the first node; it is replaced
        // below so nothing else reaches the reclaimed node.
        let mut node = unsafe { Node::reclaim(head) };
        self.head = node.next.take();
        if self.head.is_none() {
            self.tail = None;
        }
        self.len -= 1;

        Ok(node)
    }

    fn release_node(&self, node: Box<Node>) {
        let bytes = node.value.len();
        drop(node);
        self.storage.release(AllocationKind::Value, bytes);
        self.storage.release(AllocationKind::Node, Node::SIZE);
    }
}

impl Drop for TextQueue {
    fn drop(&mut self) {
        let released = self.len;

        // Iterative so long chains cannot overflow the stack
        while let Some(head) = self.head {
            // SAFETY: same ownership transfer as `unlink_head`.
            let mut node = unsafe { Node::reclaim(head) };
            self.head = node.next.take();
            self.release_node(node);
        }
        self.tail = None;
        self.len = 0;

        self.storage.release(AllocationKind::Queue, Self::SIZE);
        trace!(released, "queue destroyed");
    }
}

impl std::fmt::Debug for TextQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over queue values, head first
pub struct Iter<'a> {
    next: Link,
    remaining: usize,
    _queue: PhantomData<&'a TextQueue>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TextValue;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // SAFETY: the queue is borrowed for `'a`, so the chain cannot change
        // or be freed while this iterator exists.
        let node = unsafe { &*node.as_ptr() };
        self.next = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a TextQueue {
    type Item = &'a TextValue;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod queue_test;
