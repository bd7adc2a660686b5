// Node - one link in the queue chain

use super::value::TextValue;
use std::ptr::NonNull;

/// Owning link to the next node; `None` ends the chain
pub(crate) type Link = Option<NonNull<Node>>;

/// Chain element: one owned value and the link to its successor
pub(crate) struct Node {
    pub(crate) value: TextValue,
    pub(crate) next: Link,
}

impl Node {
    /// Heap size a node accounts for, value bytes excluded
    pub(crate) const SIZE: usize = std::mem::size_of::<Node>();

    /// Move a node onto the heap and hand back the owning raw link
    pub(crate) fn into_link(value: TextValue, next: Link) -> NonNull<Node> {
        NonNull::from(Box::leak(Box::new(Node { value, next })))
    }

    /// Take back ownership of a node produced by [`Node::into_link`]
    ///
    /// # Safety
    /// `link` must come from `into_link`, must not have been reclaimed before,
    /// and no other link may be used to reach it afterwards.
    pub(crate) unsafe fn reclaim(link: NonNull<Node>) -> Box<Node> {
        Box::from_raw(link.as_ptr())
    }
}
