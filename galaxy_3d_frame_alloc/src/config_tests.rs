use super::*;

#[test]
fn test_default_values() {
    let config = Config::default();
    assert_eq!(config.frames_in_flight, 2);
    assert_eq!(config.initial_instance_capacity, 10);
    assert_eq!(config.instance_growth_chunk, 10);
    assert_eq!(config.initial_primitive_capacity, 50);
    assert_eq!(config.primitive_growth_chunk, 50);
    assert_eq!(config.descriptor_growth_chunk, 16);
    assert_eq!(config.max_slots, None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_frames_in_flight_rejected() {
    let config = Config { frames_in_flight: 0, ..Config::default() };
    match config.validate() {
        Err(Error::InitializationFailed(msg)) => assert!(msg.contains("frames_in_flight")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_zero_growth_chunk_rejected() {
    let config = Config { primitive_growth_chunk: 0, ..Config::default() };
    match config.validate() {
        Err(Error::InitializationFailed(msg)) => assert!(msg.contains("primitive_growth_chunk")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_max_slots_below_initial_capacity_rejected() {
    let config = Config { max_slots: Some(20), ..Config::default() };
    assert!(config.validate().is_err());

    let config = Config { max_slots: Some(50), ..Config::default() };
    assert!(config.validate().is_ok());
}

#[test]
fn test_single_frame_in_flight_is_valid() {
    let config = Config { frames_in_flight: 1, ..Config::default() };
    assert!(config.validate().is_ok());
}
