//! Error types for the coil bridge.

use std::io;
use thiserror::Error;

use crate::calibration::Axis;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Calibration math has no real result for this axis.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("{axis} axis: log argument {argument} is not positive (current {current} A)")]
pub struct DomainError {
    pub axis: Axis,
    pub current: f64,
    pub argument: f64,
}

/// Rejected sweep configuration
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("angle step must be positive, got {0} degrees")]
    NonPositiveAngleStep(f64),

    #[error("angle step must be at least 0.001 degrees, got {0}")]
    AngleStepTooSmall(f64),

    #[error("wait time must not be negative, got {0} s")]
    NegativeWait(f64),

    #[error("wait time {0} s is too long")]
    WaitTooLong(f64),

    #[error("field magnitude must not be negative, got {0} G")]
    NegativeMagnitude(f64),

    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("invalid sweep configuration: {0}")]
    Config(#[from] ConfigError),

    /// Raised only when the range policy refuses to transmit
    #[error("{axis} command {value:.4} is outside the device range [0, 1]")]
    OutOfRange { axis: Axis, value: f64 },

    #[error("cannot send command {value} to {axis} axis")]
    InvalidCommand { axis: Axis, value: f64 },

    #[error("serial port: {0}")]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
