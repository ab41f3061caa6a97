use super::*;
use crate::device::HostDevice;

// ============================================================================
// Generation index tests
// ============================================================================

#[test]
fn test_current_and_previous_with_two_frames() {
    let mut ring = FrameRing::new(2, |g| g);
    assert_eq!(ring.frame(), 0);
    assert_eq!(ring.current(), 0);
    assert_eq!(ring.previous(), 1);

    ring.advance();
    assert_eq!(ring.current(), 1);
    assert_eq!(ring.previous(), 0);

    ring.advance();
    assert_eq!(ring.current(), 0);
    assert_eq!(ring.previous(), 1);
    assert_eq!(ring.frame(), 2);
}

#[test]
fn test_three_frames_rotation() {
    let mut ring = FrameRing::new(3, |g| g * 10);
    let mut seen = Vec::new();
    for _ in 0..6 {
        seen.push((ring.current(), ring.previous()));
        ring.advance();
    }
    assert_eq!(seen, vec![(0, 2), (1, 0), (2, 1), (0, 2), (1, 0), (2, 1)]);
}

#[test]
fn test_single_generation_ring() {
    let mut ring = FrameRing::new(1, |_| ());
    assert_eq!(ring.current(), 0);
    assert_eq!(ring.previous(), 0);
    ring.advance();
    assert_eq!(ring.current(), 0);
}

#[test]
fn test_zero_frames_is_clamped_to_one() {
    let ring = FrameRing::new(0, |g| g);
    assert_eq!(ring.frames_in_flight(), 1);
}

#[test]
fn test_value_accessors() {
    let mut ring = FrameRing::new(2, |g| vec![g]);
    ring.current_value_mut().push(100);
    assert_eq!(ring.current_value(), &vec![0, 100]);
    assert_eq!(ring.previous_value(), &vec![1]);
    assert_eq!(ring.get(1), Some(&vec![1]));
    assert!(ring.get(2).is_none());
    assert_eq!(ring.iter().count(), 2);
}

#[test]
fn test_from_generations() {
    assert!(FrameRing::<u32>::from_generations(Vec::new()).is_none());
    let ring = FrameRing::from_generations(vec!['a', 'b', 'c']).unwrap();
    assert_eq!(ring.frames_in_flight(), 3);
    assert_eq!(ring.previous_value(), &'c');
}

// ============================================================================
// Resize tests
// ============================================================================

fn region_ring(device: &HostDevice, n: u32, size: u64) -> FrameRing<MemoryRegion> {
    let regions = (0..n)
        .map(|_| device.allocate(size, "ring").unwrap())
        .collect();
    FrameRing::from_generations(regions).unwrap()
}

#[test]
fn test_resize_copies_from_previous_generation() {
    let device = HostDevice::new();
    let mut ring = region_ring(&device, 2, 8);
    ring.advance(); // current = 1, previous = 0

    ring.get_mut(0).unwrap().write(0, &[0xAA; 8]).unwrap(); // last fully written copy
    ring.get_mut(1).unwrap().write(0, &[0x11; 8]).unwrap(); // stale

    let displaced = ring.resize(4, 4, &device).unwrap();
    assert_eq!(displaced.len(), 2);

    let current = ring.current_value();
    assert_eq!(current.len(), 16);
    assert_eq!(current.read(0, 8).unwrap(), &[0xAA; 8]);
    assert_eq!(current.read(8, 8).unwrap(), &[0; 8]);

    // Every generation ends up seeded from the previous generation's data
    assert_eq!(ring.previous_value().read(0, 8).unwrap(), &[0xAA; 8]);
}

#[test]
fn test_resize_preserves_live_records_three_generations() {
    let device = HostDevice::new();
    let mut ring = region_ring(&device, 3, 12);
    ring.advance();
    ring.advance(); // current = 2, previous = 1

    let records: [[u8; 4]; 3] = [[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12]];
    for (i, record) in records.iter().enumerate() {
        ring.get_mut(1).unwrap().write(i as u64 * 4, record).unwrap();
    }

    ring.resize(6, 4, &device).unwrap();

    for generation in 0..3 {
        let region = ring.get(generation).unwrap();
        assert_eq!(region.len(), 24);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(region.read(i as u64 * 4, 4).unwrap(), record);
        }
    }
}

#[test]
fn test_resize_to_same_size_is_noop() {
    let device = HostDevice::new();
    let mut ring = region_ring(&device, 2, 16);
    let addresses: Vec<u64> = ring.iter().map(|r| r.base_address()).collect();

    let displaced = ring.resize(4, 4, &device).unwrap();
    assert!(displaced.is_empty());
    let after: Vec<u64> = ring.iter().map(|r| r.base_address()).collect();
    assert_eq!(addresses, after);
}

#[test]
fn test_resize_from_undersized_previous_copies_min() {
    let device = HostDevice::new();
    let regions = vec![
        device.allocate(4, "ring").unwrap(),
        device.allocate(0, "ring").unwrap(),
    ];
    let mut ring = FrameRing::from_generations(regions).unwrap();
    ring.get_mut(0).unwrap().write(0, &[3; 4]).unwrap();

    ring.resize(2, 4, &device).unwrap();

    // Current (0) copied from previous (1) which was empty
    assert_eq!(ring.get(0).unwrap().read(0, 8).unwrap(), &[0; 8]);
}

#[test]
fn test_displaced_regions_stay_alive_until_dropped() {
    let device = HostDevice::new();
    let mut ring = region_ring(&device, 2, 8);

    let displaced = ring.resize(4, 8, &device).unwrap();
    assert_eq!(device.live_regions(), 4);

    drop(displaced);
    assert_eq!(device.live_regions(), 2);
}
