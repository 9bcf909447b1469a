//! Field to PWM command conversion.
//!
//! Per axis: field component (G) -> drive current (A) -> driver voltage (V)
//! -> duty command, where 1.0 is [`SUPPLY_REFERENCE_VOLTS`]. Commands are
//! never clamped here; see [`CommandTriple::range_warnings`] and
//! [`RangePolicy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::calibration::{Axis, CalibrationSet, SUPPLY_REFERENCE_VOLTS};
use crate::error::{BridgeError, BridgeResult, DomainError};
use crate::field::FieldVector;

/// Dimensionless duty commands, nominally in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandTriple {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CommandTriple {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// One warning per axis outside [0, 1].
    pub fn range_warnings(&self) -> Vec<RangeWarning> {
        Axis::ALL
            .iter()
            .map(|&axis| (axis, self.get(axis)))
            .filter(|&(_, value)| !(0.0..=1.0).contains(&value))
            .map(|(axis, value)| RangeWarning { axis, value })
            .collect()
    }

    pub fn clamped(&self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
            z: self.z.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for CommandTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={:.2} y={:.2} z={:.2}", self.x, self.y, self.z)
    }
}

/// A command the board cannot reproduce faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeWarning {
    pub axis: Axis,
    pub value: f64,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} command {:.4} out of range [0, 1]", self.axis, self.value)
    }
}

/// What to do with out-of-range commands before they reach the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RangePolicy {
    /// Send unchanged, only warn
    #[default]
    Transmit,
    /// Clamp each axis into [0, 1]
    Clamp,
    /// Fail before anything is written
    Refuse,
}

impl RangePolicy {
    pub fn apply(&self, command: &CommandTriple) -> BridgeResult<CommandTriple> {
        let warnings = command.range_warnings();
        for warning in &warnings {
            warn!(axis = %warning.axis, value = warning.value, policy = ?self, "command out of device range");
        }
        match self {
            RangePolicy::Transmit => Ok(*command),
            RangePolicy::Clamp => Ok(command.clamped()),
            RangePolicy::Refuse => match warnings.first() {
                Some(w) => Err(BridgeError::OutOfRange {
                    axis: w.axis,
                    value: w.value,
                }),
                None => Ok(*command),
            },
        }
    }
}

/// Command for a single axis given its field component.
pub fn convert_axis(
    axis: Axis,
    field_component: f64,
    calibration: &CalibrationSet,
) -> Result<f64, DomainError> {
    let cal = calibration.axis(axis);
    let current = cal.current(field_component);
    let volts = cal.voltage(axis, current)?;
    Ok(volts / SUPPLY_REFERENCE_VOLTS)
}

/// Per-axis results; a failure on one axis does not affect the others.
pub fn convert_axes(
    field: &FieldVector,
    calibration: &CalibrationSet,
) -> [Result<f64, DomainError>; 3] {
    [
        convert_axis(Axis::X, field.bx(), calibration),
        convert_axis(Axis::Y, field.by(), calibration),
        convert_axis(Axis::Z, field.bz(), calibration),
    ]
}

/// Convert a field vector into a command triple.
///
/// Fails with the first axis (in X, Y, Z order) whose calibration math is
/// undefined.
pub fn convert(field: &FieldVector, calibration: &CalibrationSet) -> Result<CommandTriple, DomainError> {
    let [x, y, z] = convert_axes(field, calibration);
    Ok(CommandTriple {
        x: x?,
        y: y?,
        z: z?,
    })
}
