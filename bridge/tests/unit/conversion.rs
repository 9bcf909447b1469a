//! Unit tests for the field to command conversion

use crate::common::assert_close;
use coil_bridge::convert::convert_axis;
use coil_bridge::{convert, Axis, AxisCalibration, CalibrationSet, FieldVector, RangePolicy};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

const LAB: CalibrationSet = CalibrationSet::LAB;

#[test]
fn test_non_positive_field_gives_zero_command() {
    for axis in Axis::ALL {
        for b in [0.0, -0.0, -1e-9, -0.5, -12.0, -1e6] {
            assert_eq!(convert_axis(axis, b, &LAB).unwrap(), 0.0, "{} at {}", axis, b);
        }
    }
}

#[test]
fn test_command_is_monotonic_in_field() {
    for axis in Axis::ALL {
        let mut previous = 0.0;
        for k in 1..=4000 {
            let b = k as f64 * 0.005;
            let command = convert_axis(axis, b, &LAB).unwrap();
            assert!(
                command >= previous,
                "{} axis decreased at {} G: {} < {}",
                axis,
                b,
                command,
                previous
            );
            previous = command;
        }
    }
}

#[test]
fn test_zero_field_gives_zero_triple() {
    let cmd = convert(&FieldVector::new(0.0, 0.0, 0.0), &LAB).unwrap();
    assert_eq!((cmd.x, cmd.y, cmd.z), (0.0, 0.0, 0.0));
}

#[test]
fn test_reference_conversion() {
    let cmd = convert(&FieldVector::new(5.0, FRAC_PI_4, 0.1), &LAB).unwrap();
    assert_close(cmd.x, 1.2223624911400504, 1e-12);
    assert_close(cmd.y, 0.6564877330617868, 1e-12);
    assert_close(cmd.z, 0.04709246023833093, 1e-12);

    // x exceeds full scale and must be reported, not clamped
    let warnings = cmd.range_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].axis, Axis::X);
    assert_eq!(warnings[0].value, cmd.x);
}

#[test]
fn test_axes_follow_direction() {
    // pure Y field leaves X undriven
    let cmd = convert(&FieldVector::new(2.0, FRAC_PI_2, 0.0), &LAB).unwrap();
    assert_eq!(cmd.x, 0.0);
    assert!(cmd.y > 0.0);
    assert_eq!(cmd.z, 0.0);

    // opposite direction drives nothing in plane
    let cmd = convert(&FieldVector::new(2.0, PI + FRAC_PI_4, 0.0), &LAB).unwrap();
    assert_eq!((cmd.x, cmd.y), (0.0, 0.0));
}

#[test]
fn test_field_below_fit_intercept_is_undriven() {
    // 0 < Bx < offset gives a negative current, which is not driven
    let cmd = convert(&FieldVector::new(0.2, 0.0, 0.05), &LAB).unwrap();
    assert_eq!(cmd.x, 0.0);
    assert_eq!(cmd.z, 0.0);
}

#[test]
fn test_domain_error_reports_axis() {
    let broken = CalibrationSet {
        z: AxisCalibration { c: -0.5, ..LAB.z },
        ..LAB
    };
    let err = convert(&FieldVector::new(0.0, 0.0, 5.0), &broken).unwrap_err();
    assert_eq!(err.axis, Axis::Z);
    assert!(err.current > 0.0);
    assert!(err.to_string().contains("z axis"));
}

#[test]
fn test_clamp_policy_keeps_in_range_axes() {
    let cmd = convert(&FieldVector::new(5.0, FRAC_PI_4, 0.1), &LAB).unwrap();
    let clamped = RangePolicy::Clamp.apply(&cmd).unwrap();
    assert_eq!(clamped.x, 1.0);
    assert_eq!(clamped.y, cmd.y);
    assert_eq!(clamped.z, cmd.z);
}
