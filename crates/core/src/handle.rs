// Handle API - operations that tolerate an absent queue
//
// Drivers that keep `Option<TextQueue>` (e.g. a command interpreter that can
// free its queue and keep running) call these instead of the methods, so an
// absent queue is an `InvalidArgument` rather than a special case.

use crate::domain::TextQueue;
use crate::error::{QueueError, Result};
use crate::port::StorageProvider;
use std::rc::Rc;

/// Create an empty queue reserving through `storage`
pub fn create(storage: Rc<dyn StorageProvider>) -> Result<TextQueue> {
    TextQueue::with_storage(storage)
}

/// Tear down `queue` if there is one
pub fn destroy(queue: Option<TextQueue>) {
    if let Some(queue) = queue {
        queue.destroy();
    }
}

pub fn insert_head(queue: Option<&mut TextQueue>, text: &[u8]) -> Result<()> {
    queue.ok_or(QueueError::InvalidArgument)?.insert_head(text)
}

pub fn insert_tail(queue: Option<&mut TextQueue>, text: &[u8]) -> Result<()> {
    queue.ok_or(QueueError::InvalidArgument)?.insert_tail(text)
}

/// Remove the head value, copying a truncated, terminated version into `buf`
pub fn remove_head(queue: Option<&mut TextQueue>, buf: Option<&mut [u8]>) -> Result<()> {
    queue.ok_or(QueueError::InvalidArgument)?.remove_head(buf)
}

/// Element count; 0 for an absent queue
pub fn size(queue: Option<&TextQueue>) -> usize {
    queue.map_or(0, TextQueue::len)
}

/// Reverse in place; no-op for an absent queue
pub fn reverse(queue: Option<&mut TextQueue>) {
    if let Some(queue) = queue {
        queue.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{AccountingStorage, SystemStorage};

    #[test]
    fn test_absent_queue_is_invalid_argument() {
        let mut buf = [0u8; 8];
        assert_eq!(insert_head(None, b"a"), Err(QueueError::InvalidArgument));
        assert_eq!(insert_tail(None, b"a"), Err(QueueError::InvalidArgument));
        assert_eq!(
            remove_head(None, Some(&mut buf[..])),
            Err(QueueError::InvalidArgument)
        );
        assert_eq!(size(None), 0);
        reverse(None);
        destroy(None);
    }

    #[test]
    fn test_present_queue_round_trip() {
        let mut queue = Some(create(Rc::new(SystemStorage)).unwrap());

        insert_tail(queue.as_mut(), b"a").unwrap();
        insert_tail(queue.as_mut(), b"b").unwrap();
        insert_head(queue.as_mut(), b"z").unwrap();
        assert_eq!(size(queue.as_ref()), 3);

        reverse(queue.as_mut());

        let mut buf = [0u8; 8];
        remove_head(queue.as_mut(), Some(&mut buf[..])).unwrap();
        assert_eq!(&buf[..2], b"b\0");

        destroy(queue.take());
        assert_eq!(size(queue.as_ref()), 0);
    }

    #[test]
    fn test_destroy_returns_all_storage() {
        let storage = Rc::new(AccountingStorage::new());
        let mut queue = Some(create(storage.clone()).unwrap());
        insert_head(queue.as_mut(), b"one").unwrap();
        insert_tail(queue.as_mut(), b"two").unwrap();

        destroy(queue.take());
        assert!(storage.is_balanced());
    }
}
