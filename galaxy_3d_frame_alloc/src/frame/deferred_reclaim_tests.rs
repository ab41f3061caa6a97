use super::*;
use crate::frame::FrameRing;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    let make = move || {
        let handle = Arc::clone(&handle);
        Box::new(move || {
            handle.fetch_add(1, Ordering::SeqCst);
        }) as Box<dyn FnOnce() + Send>
    };
    (count, make)
}

#[test]
fn test_push_does_not_run_immediately() {
    let mut queue = DeferredReclaimQueue::new(2);
    let (count, make) = counter();
    queue.push(0, make());
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(queue.pending(0), 1);
    assert_eq!(queue.pending(1), 0);
    assert_eq!(queue.total_pending(), 1);
}

#[test]
fn test_action_runs_after_full_rotation() {
    let mut ring = FrameRing::new(2, |_| ());
    let mut queue = DeferredReclaimQueue::new(2);
    let (count, make) = counter();

    // Queued during frame 0 (generation 0)
    queue.push(ring.current(), make());

    ring.advance(); // frame 1, generation 1
    assert_eq!(queue.flush(ring.current()), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    ring.advance(); // frame 2, generation 0 comes due
    assert_eq!(queue.flush(ring.current()), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // Executed exactly once
    for _ in 0..4 {
        ring.advance();
        queue.flush(ring.current());
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(queue.is_empty());
}

#[test]
fn test_push_after_flush_waits_next_rotation() {
    let mut queue = DeferredReclaimQueue::new(2);
    let (count, make) = counter();

    queue.flush(0);
    queue.push(0, make()); // queued in the same visit
    assert_eq!(queue.flush(1), 0);
    assert_eq!(queue.flush(0), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_never_runs_before_n_advances() {
    for n in 1..=4u32 {
        let mut ring = FrameRing::new(n, |_| ());
        let mut queue = DeferredReclaimQueue::new(n);
        let (count, make) = counter();

        // Warm up a few frames so the queue is mid-rotation
        for _ in 0..(n + 1) {
            ring.advance();
            queue.flush(ring.current());
        }

        queue.push(ring.current(), make());
        for advances in 1..=n {
            ring.advance();
            queue.flush(ring.current());
            let expected = if advances == n { 1 } else { 0 };
            assert_eq!(count.load(Ordering::SeqCst), expected, "n={} advances={}", n, advances);
        }
    }
}

#[test]
fn test_actions_run_in_push_order() {
    let mut queue = DeferredReclaimQueue::new(2);
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    for i in 0..3 {
        let order = Arc::clone(&order);
        queue.push(1, move || order.lock().unwrap().push(i));
    }
    assert!(order.lock().unwrap().is_empty());
    assert_eq!(queue.flush(1), 3);
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn test_flush_all_runs_everything() {
    let mut queue = DeferredReclaimQueue::new(3);
    let (count, make) = counter();
    queue.push(0, make());
    queue.push(1, make());
    queue.push(2, make());
    assert_eq!(queue.flush_all(), 3);
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert!(queue.is_empty());
}

#[test]
fn test_drop_runs_pending_actions() {
    let (count, make) = counter();
    {
        let mut queue = DeferredReclaimQueue::new(2);
        queue.push(0, make());
        queue.push(1, make());
    }
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_generation_index_wraps() {
    let mut queue = DeferredReclaimQueue::new(2);
    let (count, make) = counter();
    queue.push(3, make()); // same slot as generation 1
    assert_eq!(queue.pending(1), 1);
    queue.flush(1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
