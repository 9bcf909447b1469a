//! Coil calibration curves.
//!
//! Each coil was characterised on the bench: field against drive current is
//! a linear fit, drive current against driver voltage is a logarithmic fit.
//! The fitted coefficients are compiled in; there is no runtime editing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Voltage that corresponds to a full-scale (1.0) PWM command.
pub const SUPPLY_REFERENCE_VOLTS: f64 = 4.911;

/// One of the three coil windings.
///
/// Lab wiring: X is the black coil, Y the yellow coil, Z the red coil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Emission order used by every sink.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// Fitted curves for one coil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisCalibration {
    /// Field intercept of the current fit (G)
    pub offset_b: f64,
    /// Field per amp (G/A)
    pub slope_b: f64,
    /// Voltage fit `a * ln(b * (I + c))`
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl AxisCalibration {
    /// Drive current (A) needed for field `field` (G). Zero for `field <= 0`.
    pub fn current(&self, field: f64) -> f64 {
        if field <= 0.0 {
            return 0.0;
        }
        (field - self.offset_b) / self.slope_b
    }

    /// Driver voltage (V) for drive current `current` (A). Zero for `current <= 0`.
    pub fn voltage(&self, axis: Axis, current: f64) -> Result<f64, DomainError> {
        if current <= 0.0 {
            return Ok(0.0);
        }
        let argument = self.b * (current + self.c);
        // also catches NaN
        if !(argument > 0.0) || !argument.is_finite() {
            return Err(DomainError {
                axis,
                current,
                argument,
            });
        }
        Ok(self.a * argument.ln())
    }
}

/// Calibration for all three coils.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationSet {
    pub x: AxisCalibration,
    pub y: AxisCalibration,
    pub z: AxisCalibration,
}

impl CalibrationSet {
    /// Bench fit of the lab electromagnet.
    pub const LAB: CalibrationSet = CalibrationSet {
        x: AxisCalibration {
            offset_b: 0.2829644135733139,
            slope_b: 2.9485607589731986,
            a: 3.25,
            b: 4.8,
            c: 0.218,
        },
        y: AxisCalibration {
            offset_b: 0.012218694814285891,
            slope_b: 3.137805514887857,
            a: 1.759,
            b: 4.628,
            c: 0.228,
        },
        z: AxisCalibration {
            offset_b: 0.07240858035683723,
            slope_b: 16.422404523051785,
            a: 1.966,
            b: 39.22,
            c: 0.027,
        },
    };

    pub fn axis(&self, axis: Axis) -> &AxisCalibration {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl Default for CalibrationSet {
    fn default() -> Self {
        Self::LAB
    }
}
