//! End-to-end: sweep through a Firmata board backed by a byte buffer

use crate::common::sweep_config;
use coil_bridge::firmata::command_to_duty;
use coil_bridge::record::SweepRecord;
use coil_bridge::{
    convert, ActuatorSink, Axis, CalibrationSet, CancelToken, FieldVector, FirmataBoard,
    ManualClock, PinMap, RangePolicy, Sequencer, SweepState,
};

/// Split an analog-message stream into (pin, value) pairs.
fn decode_analog(bytes: &[u8]) -> Vec<(u8, u16)> {
    bytes
        .chunks(3)
        .filter(|c| c[0] & 0xF0 == 0xE0)
        .map(|c| (c[0] & 0x0F, c[1] as u16 | ((c[2] as u16) << 7)))
        .collect()
}

#[test]
fn test_static_write() {
    let field = FieldVector::from_degrees(1.5, 30.0, 0.4);
    let command = convert(&field, &CalibrationSet::LAB).unwrap();
    assert!(command.range_warnings().is_empty());

    let mut board = FirmataBoard::attach(Vec::new(), PinMap::default()).unwrap();
    board.apply(&command).unwrap();

    let writes = decode_analog(&board.into_inner());
    assert_eq!(
        writes,
        vec![
            (5, command_to_duty(Axis::X, command.x).unwrap()),
            (3, command_to_duty(Axis::Y, command.y).unwrap()),
            (6, command_to_duty(Axis::Z, command.z).unwrap()),
        ]
    );
}

#[test]
fn test_sweep_stream() {
    let mut board = FirmataBoard::attach(Vec::new(), PinMap::default()).unwrap();
    let mut clock = ManualClock::new();
    let mut sequencer = Sequencer::new(CalibrationSet::LAB, RangePolicy::Clamp);

    let config = sweep_config(2.0, 30.0, 0.25);
    let result = sequencer
        .run(&config, &mut board, &mut clock, &CancelToken::new())
        .unwrap();
    assert_eq!(sequencer.state(), SweepState::Done);

    let writes = decode_analog(&board.into_inner());
    assert_eq!(writes.len(), 12);

    // pins cycle X, Y, Z
    let pins: Vec<u8> = writes.iter().map(|&(pin, _)| pin).collect();
    assert_eq!(pins, [5u8, 3, 6].repeat(4));

    for (step, chunk) in result.steps.iter().zip(writes.chunks(3)) {
        assert_eq!(chunk[0].1, command_to_duty(Axis::X, step.command.x).unwrap());
        assert_eq!(chunk[1].1, command_to_duty(Axis::Y, step.command.y).unwrap());
        assert!(chunk.iter().all(|&(_, duty)| duty <= 255));
    }

    let record = SweepRecord::from(&result);
    assert_eq!(record.iteration_count, 4);
    assert_eq!(record.expected_runtime, 1.0);
    assert!((record.actual_runtime - 0.75).abs() < 1e-9);
    assert!(!record.cancelled);
}
