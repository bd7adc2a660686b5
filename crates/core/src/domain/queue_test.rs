//! Unit tests for the queue container

use super::TextQueue;
use crate::domain::node::Node;
use crate::domain::TextValue;
use crate::error::QueueError;
use crate::port::{AccountingStorage, AllocError, AllocationKind, StorageProvider};
use mockall::mock;
use mockall::predicate::eq;
use std::rc::Rc;

mock! {
    Storage {}
    impl StorageProvider for Storage {
        fn reserve(&self, kind: AllocationKind, bytes: usize) -> std::result::Result<(), AllocError>;
        fn release(&self, kind: AllocationKind, bytes: usize);
    }
}

fn drain(queue: &mut TextQueue) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(value) = queue.pop_head() {
        out.push(value.to_string());
    }
    out
}

fn accounted() -> (Rc<AccountingStorage>, TextQueue) {
    let storage = Rc::new(AccountingStorage::new());
    let queue = TextQueue::with_storage(storage.clone()).unwrap();
    (storage, queue)
}

#[test]
fn test_new_queue_is_empty() {
    let queue = TextQueue::new().unwrap();
    assert_eq!(queue.len(), 0);
    assert!(queue.is_empty());
    assert!(queue.peek_head().is_none());
    assert!(queue.peek_tail().is_none());
    assert!(queue.links_are_consistent());
}

#[test]
fn test_insert_head_is_lifo() {
    let mut queue = TextQueue::new().unwrap();
    for text in ["a", "b", "c"] {
        queue.insert_head(text).unwrap();
    }

    assert_eq!(queue.len(), 3);
    assert_eq!(queue.peek_head().unwrap().as_bytes(), b"c");
    assert_eq!(queue.peek_tail().unwrap().as_bytes(), b"a");
    assert_eq!(drain(&mut queue), ["c", "b", "a"]);
}

#[test]
fn test_insert_tail_is_fifo() {
    let mut queue = TextQueue::new().unwrap();
    for text in ["a", "b", "c"] {
        queue.insert_tail(text).unwrap();
    }

    assert_eq!(queue.peek_head().unwrap().as_bytes(), b"a");
    assert_eq!(queue.peek_tail().unwrap().as_bytes(), b"c");
    assert_eq!(drain(&mut queue), ["a", "b", "c"]);
}

#[test]
fn test_interleaved_inserts_keep_chain_order() {
    let mut queue = TextQueue::new().unwrap();
    queue.insert_tail("2").unwrap();
    queue.insert_head("1").unwrap();
    queue.insert_tail("3").unwrap();
    queue.insert_head("0").unwrap();

    assert!(queue.links_are_consistent());
    assert_eq!(format!("{:?}", queue), r#"["0", "1", "2", "3"]"#);
    assert_eq!(drain(&mut queue), ["0", "1", "2", "3"]);
}

#[test]
fn test_single_element_is_head_and_tail() {
    let mut queue = TextQueue::new().unwrap();
    queue.insert_head("only").unwrap();

    let head = queue.peek_head().unwrap() as *const TextValue;
    let tail = queue.peek_tail().unwrap() as *const TextValue;
    assert_eq!(head, tail, "head and tail must be the same node");
}

#[test]
fn test_insert_copies_callers_value() {
    let mut queue = TextQueue::new().unwrap();
    let mut text = String::from("original");
    queue.insert_tail(&text).unwrap();

    text.clear();
    text.push_str("changed");
    assert_eq!(queue.peek_head().unwrap().as_bytes(), b"original");
}

#[test]
fn test_insert_stops_at_terminator() {
    let mut queue = TextQueue::new().unwrap();
    queue.insert_tail(b"abc\0hidden").unwrap();
    assert_eq!(queue.pop_head().unwrap().as_bytes(), b"abc");
}

#[test]
fn test_remove_head_truncates_into_buffer() {
    let mut queue = TextQueue::new().unwrap();
    queue.insert_head("hello").unwrap();

    let mut buf = [0xffu8; 3];
    queue.remove_head(Some(&mut buf[..])).unwrap();
    assert_eq!(&buf, b"he\0");
    assert!(queue.is_empty());
}

#[test]
fn test_remove_head_without_buffer() {
    let mut queue = TextQueue::new().unwrap();
    queue.insert_tail("x").unwrap();
    queue.insert_tail("y").unwrap();

    queue.remove_head(None).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.peek_head().unwrap().as_bytes(), b"y");
}

#[test]
fn test_remove_head_zero_capacity_writes_nothing() {
    let mut queue = TextQueue::new().unwrap();
    queue.insert_tail("x").unwrap();

    let mut buf: [u8; 0] = [];
    queue.remove_head(Some(&mut buf[..])).unwrap();
    assert!(queue.is_empty());
}

#[test]
fn test_remove_from_empty_fails_without_change() {
    let mut queue = TextQueue::new().unwrap();
    let mut buf = [0xffu8; 4];

    assert_eq!(queue.remove_head(Some(&mut buf[..])), Err(QueueError::EmptyQueue));
    assert_eq!(buf, [0xff; 4], "buffer must not be written on failure");
    assert_eq!(queue.len(), 0);
    assert_eq!(queue.pop_head().unwrap_err(), QueueError::EmptyQueue);
}

#[test]
fn test_removing_last_clears_tail() {
    let mut queue = TextQueue::new().unwrap();
    queue.insert_tail("a").unwrap();
    queue.remove_head(None).unwrap();

    assert!(queue.peek_tail().is_none());
    assert!(queue.links_are_consistent());

    // A stale tail would make this write into a freed node
    queue.insert_tail("b").unwrap();
    assert_eq!(queue.peek_head().unwrap().as_bytes(), b"b");
    assert_eq!(queue.peek_tail().unwrap().as_bytes(), b"b");
}

#[test]
fn test_reverse_flips_order() {
    let mut queue = TextQueue::new().unwrap();
    for text in ["a", "b", "c"] {
        queue.insert_tail(text).unwrap();
    }

    queue.reverse();
    assert_eq!(queue.len(), 3);
    assert!(queue.links_are_consistent());
    assert_eq!(queue.peek_tail().unwrap().as_bytes(), b"a");

    // Tail must be usable after reversal
    queue.insert_tail("z").unwrap();
    assert_eq!(drain(&mut queue), ["c", "b", "a", "z"]);
}

#[test]
fn test_reverse_empty_and_single() {
    let mut queue = TextQueue::new().unwrap();
    queue.reverse();
    assert!(queue.is_empty());
    assert!(queue.links_are_consistent());

    queue.insert_head("solo").unwrap();
    queue.reverse();
    assert_eq!(queue.len(), 1);
    assert!(queue.links_are_consistent());
    assert_eq!(queue.peek_tail().unwrap().as_bytes(), b"solo");
}

#[test]
fn test_reverse_twice_restores_order() {
    let mut queue = TextQueue::new().unwrap();
    for text in ["1", "2", "3", "4", "5"] {
        queue.insert_tail(text).unwrap();
    }

    queue.reverse();
    queue.reverse();
    assert_eq!(drain(&mut queue), ["1", "2", "3", "4", "5"]);
}

#[test]
fn test_reverse_never_touches_storage() {
    let mut mock = MockStorage::new();
    mock.expect_reserve()
        .with(eq(AllocationKind::Queue), eq(TextQueue::SIZE))
        .times(1)
        .returning(|_, _| Ok(()));
    mock.expect_reserve()
        .with(eq(AllocationKind::Node), eq(Node::SIZE))
        .times(3)
        .returning(|_, _| Ok(()));
    mock.expect_reserve()
        .withf(|kind, _| *kind == AllocationKind::Value)
        .times(3)
        .returning(|_, _| Ok(()));
    mock.expect_release()
        .withf(|kind, _| *kind == AllocationKind::Node)
        .times(3)
        .return_const(());
    mock.expect_release()
        .withf(|kind, _| *kind == AllocationKind::Value)
        .times(3)
        .return_const(());
    mock.expect_release()
        .with(eq(AllocationKind::Queue), eq(TextQueue::SIZE))
        .times(1)
        .return_const(());

    let mut queue = TextQueue::with_storage(Rc::new(mock)).unwrap();
    for text in ["a", "b", "c"] {
        queue.insert_tail(text).unwrap();
    }
    for _ in 0..4 {
        queue.reverse();
    }
    queue.destroy();
}

#[test]
fn test_value_refusal_releases_reserved_node() {
    let mut mock = MockStorage::new();
    mock.expect_reserve()
        .with(eq(AllocationKind::Queue), eq(TextQueue::SIZE))
        .times(1)
        .returning(|_, _| Ok(()));
    mock.expect_reserve()
        .with(eq(AllocationKind::Node), eq(Node::SIZE))
        .times(1)
        .returning(|_, _| Ok(()));
    mock.expect_reserve()
        .with(eq(AllocationKind::Value), eq(5))
        .times(1)
        .returning(|kind, bytes| Err(AllocError::new(kind, bytes)));
    mock.expect_release()
        .with(eq(AllocationKind::Node), eq(Node::SIZE))
        .times(1)
        .return_const(());
    mock.expect_release()
        .with(eq(AllocationKind::Queue), eq(TextQueue::SIZE))
        .times(1)
        .return_const(());

    let mut queue = TextQueue::with_storage(Rc::new(mock)).unwrap();
    let err = queue.insert_head("hello").unwrap_err();
    assert_eq!(
        err,
        QueueError::Allocation(AllocError::new(AllocationKind::Value, 5))
    );
    assert!(queue.is_empty());
}

#[test]
fn test_refused_queue_creation() {
    let storage = Rc::new(AccountingStorage::new());
    storage.fail_next(1);

    let err = TextQueue::with_storage(storage.clone()).unwrap_err();
    assert!(matches!(err, QueueError::Allocation(AllocError { kind: AllocationKind::Queue, .. })));
    assert!(storage.is_balanced(), "nothing may be left behind");
}

#[test]
fn test_failed_insert_leaves_queue_unchanged() {
    let (storage, mut queue) = accounted();
    queue.insert_tail("a").unwrap();
    queue.insert_tail("b").unwrap();

    for granted in 0..2 {
        storage.fail_after(granted);
        assert!(queue.insert_tail("c").is_err());
        storage.fail_after(granted);
        assert!(queue.insert_head("c").is_err());

        assert_eq!(queue.len(), 2);
        assert!(queue.links_are_consistent());
        assert_eq!(queue.peek_head().unwrap().as_bytes(), b"a");
        assert_eq!(queue.peek_tail().unwrap().as_bytes(), b"b");
    }

    assert_eq!(storage.stats().node.live(), 2);
    assert_eq!(storage.stats().value.live(), 2);
}

#[test]
fn test_destroy_releases_everything() {
    let (storage, mut queue) = accounted();
    for i in 0..100 {
        queue.insert_tail(format!("value-{i}")).unwrap();
    }
    queue.remove_head(None).unwrap();
    let _ = queue.pop_head().unwrap();

    let stats = storage.stats();
    assert_eq!(stats.node.live(), 98);
    assert_eq!(stats.queue.live(), 1);

    queue.destroy();
    assert!(storage.is_balanced(), "leak or double release: {:?}", storage.stats());
}

#[test]
fn test_destroy_long_chain_does_not_recurse() {
    let mut queue = TextQueue::new().unwrap();
    for _ in 0..200_000 {
        queue.insert_head("").unwrap();
    }
    queue.destroy();
}

#[test]
fn test_iter_matches_removal_order() {
    let mut queue = TextQueue::new().unwrap();
    for text in ["x", "y", "z"] {
        queue.insert_tail(text).unwrap();
    }

    let iter = queue.iter();
    assert_eq!(iter.len(), 3);
    let seen: Vec<String> = iter.map(|v| v.to_string()).collect();
    assert_eq!(seen, drain(&mut queue));
}
