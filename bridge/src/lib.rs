//! Drive a three-coil electromagnet from a requested magnetic field.
//!
//! A field vector is turned into per-coil PWM commands using the bench
//! calibration ([`convert`]), then written to a StandardFirmata board
//! ([`firmata`]) either once or as an angle sweep ([`sweep`]).

pub mod calibration;
pub mod clock;
pub mod convert;
pub mod error;
pub mod field;
pub mod firmata;
pub mod logging;
pub mod record;
pub mod sink;
pub mod sweep;

pub use calibration::{Axis, AxisCalibration, CalibrationSet, SUPPLY_REFERENCE_VOLTS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use convert::{convert, convert_axes, CommandTriple, RangePolicy, RangeWarning};
pub use error::{BridgeError, BridgeResult, ConfigError, DomainError};
pub use field::FieldVector;
pub use firmata::{FirmataBoard, PinMap};
pub use sink::{ActuatorSink, LogSink};
pub use sweep::{run_sweep, CancelToken, Sequencer, SweepConfig, SweepResult, SweepState, SweepStep};
