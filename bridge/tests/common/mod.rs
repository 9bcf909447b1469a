//! Common test utilities and mock implementations

pub mod mock_sink;

pub use mock_sink::{MockSink, Operation};

use coil_bridge::SweepConfig;

pub fn sweep_config(magnitude: f64, angle_step_degrees: f64, wait_seconds: f64) -> SweepConfig {
    SweepConfig {
        magnitude,
        angle_step_degrees,
        wait_seconds,
        z_offset: 0.0,
    }
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {} of {}",
        actual,
        tolerance,
        expected
    );
}
