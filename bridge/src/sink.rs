use tracing::info;

use crate::calibration::Axis;
use crate::convert::CommandTriple;
use crate::error::BridgeResult;

/// Something that can drive the three coil channels.
///
/// The sink owns its connection; callers never open or close it.
pub trait ActuatorSink {
    fn set_command(&mut self, axis: Axis, value: f64) -> BridgeResult<()>;

    /// Write all three axes in X, Y, Z order, stopping at the first failure.
    fn apply(&mut self, command: &CommandTriple) -> BridgeResult<()> {
        for axis in Axis::ALL {
            self.set_command(axis, command.get(axis))?;
        }
        Ok(())
    }
}

/// Dry-run sink that only logs.
#[derive(Debug, Default)]
pub struct LogSink {
    writes: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ActuatorSink for LogSink {
    fn set_command(&mut self, axis: Axis, value: f64) -> BridgeResult<()> {
        self.writes += 1;
        info!(%axis, value, "dry run: command not sent");
        Ok(())
    }
}
