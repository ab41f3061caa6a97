use super::*;
use std::collections::HashSet;

// ============================================================================
// Basic allocation tests
// ============================================================================

#[test]
fn test_sequential_allocate() {
    let mut pool = SlotPool::new(4, 4);
    assert_eq!(pool.allocate().unwrap(), 0);
    assert_eq!(pool.allocate().unwrap(), 1);
    assert_eq!(pool.allocate().unwrap(), 2);
    assert_eq!(pool.len(), 3);
    assert_eq!(pool.free_count(), 1);
}

#[test]
fn test_new_is_empty() {
    let pool = SlotPool::new(8, 8);
    assert!(pool.is_empty());
    assert_eq!(pool.capacity(), 8);
    assert_eq!(pool.free_count(), 8);
    assert_eq!(pool.allocated().count(), 0);
}

#[test]
fn test_zero_growth_chunk_is_clamped() {
    let mut pool = SlotPool::new(0, 0);
    assert_eq!(pool.growth_chunk(), 1);
    assert_eq!(pool.allocate().unwrap(), 0);
    assert_eq!(pool.capacity(), 1);
}

// ============================================================================
// Release and recycle tests
// ============================================================================

#[test]
fn test_release_and_recycle_lowest_first() {
    let mut pool = SlotPool::new(4, 4);
    for _ in 0..4 {
        pool.allocate().unwrap();
    }
    pool.release(2).unwrap();
    pool.release(0).unwrap();

    assert_eq!(pool.allocate().unwrap(), 0);
    assert_eq!(pool.allocate().unwrap(), 2);
}

#[test]
fn test_double_release_is_reported() {
    let mut pool = SlotPool::new(4, 4);
    let a = pool.allocate().unwrap();
    pool.release(a).unwrap();
    assert_eq!(pool.release(a), Err(Error::DoubleRelease(a)));
}

#[test]
fn test_release_never_allocated_is_double_release() {
    let mut pool = SlotPool::new(4, 4);
    assert_eq!(pool.release(3), Err(Error::DoubleRelease(3)));
}

#[test]
fn test_release_out_of_range() {
    let mut pool = SlotPool::new(4, 4);
    assert_eq!(pool.release(4), Err(Error::SlotOutOfRange { index: 4, capacity: 4 }));
}

// ============================================================================
// Growth tests
// ============================================================================

#[test]
fn test_allocate_past_capacity_grows() {
    // Scenario A: capacity 10, the 11th allocation grows the pool
    let mut pool = SlotPool::new(10, 10);
    let first: Vec<u32> = (0..10).map(|_| pool.allocate().unwrap()).collect();
    assert_eq!(first, (0..10).collect::<Vec<_>>());

    let eleventh = pool.allocate().unwrap();
    assert!(pool.capacity() >= 11);
    assert!(eleventh >= 10 && eleventh < pool.capacity());
    for index in first {
        assert!(pool.is_allocated(index));
    }
    assert_eq!(pool.len(), 11);
}

#[test]
fn test_grow_appends_free_indices() {
    let mut pool = SlotPool::new(2, 2);
    pool.allocate().unwrap();
    pool.grow(3).unwrap();
    assert_eq!(pool.capacity(), 5);
    assert_eq!(pool.free_count(), 4);
    assert!(pool.is_allocated(0));
    assert!(!pool.is_allocated(4));
}

#[test]
fn test_capped_pool_grows_to_ceiling_then_fails() {
    let mut pool = SlotPool::new(4, 10).with_max_capacity(6);
    for _ in 0..6 {
        pool.allocate().unwrap();
    }
    assert_eq!(pool.capacity(), 6);
    assert_eq!(pool.allocate(), Err(Error::OutOfCapacity(6)));
    assert_eq!(pool.len(), 6);
}

// ============================================================================
// Reserve tests
// ============================================================================

#[test]
fn test_reserve_specific_index() {
    let mut pool = SlotPool::new(8, 8);
    assert_eq!(pool.reserve(5), Ok(true));
    assert!(pool.is_allocated(5));
    assert_eq!(pool.reserve(5), Ok(false));

    // Reserved index is skipped by automatic allocation
    let allocated: Vec<u32> = (0..7).map(|_| pool.allocate().unwrap()).collect();
    assert!(!allocated.contains(&5));
}

#[test]
fn test_reserve_out_of_range() {
    let mut pool = SlotPool::new(8, 8);
    assert_eq!(pool.reserve(8), Err(Error::SlotOutOfRange { index: 8, capacity: 8 }));
}

// ============================================================================
// Uniqueness property
// ============================================================================

#[test]
fn test_live_indices_are_unique_under_churn() {
    let mut pool = SlotPool::new(3, 2);
    let mut live: Vec<u32> = Vec::new();

    // Deterministic allocate/release mix
    for step in 0u32..200 {
        if step % 3 == 2 && !live.is_empty() {
            let victim = live.remove((step as usize * 7) % live.len());
            pool.release(victim).unwrap();
        } else {
            live.push(pool.allocate().unwrap());
        }

        let unique: HashSet<u32> = live.iter().copied().collect();
        assert_eq!(unique.len(), live.len(), "duplicate live index at step {}", step);
        assert_eq!(pool.len() as usize, live.len());
    }

    let mut allocated: Vec<u32> = pool.allocated().collect();
    live.sort_unstable();
    allocated.sort_unstable();
    assert_eq!(allocated, live);
}
