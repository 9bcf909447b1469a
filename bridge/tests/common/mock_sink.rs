//! Recording actuator sink for sequencing tests

use coil_bridge::{ActuatorSink, Axis, BridgeError, BridgeResult};
use std::io;

/// Records operations performed on the mock sink
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    SetCommand { axis: Axis, value: f64 },
}

#[derive(Debug, Default)]
pub struct MockSink {
    operations: Vec<Operation>,
    /// Fail the call with this zero-based index
    fail_at: Option<usize>,
    calls: usize,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `call`-th `set_command` (zero-based) fail with an I/O error.
    pub fn fail_at_call(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::default()
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn call_count(&self) -> usize {
        self.calls
    }

    pub fn values_for(&self, wanted: Axis) -> Vec<f64> {
        self.operations
            .iter()
            .filter_map(|op| match *op {
                Operation::SetCommand { axis, value } if axis == wanted => Some(value),
                _ => None,
            })
            .collect()
    }
}

impl ActuatorSink for MockSink {
    fn set_command(&mut self, axis: Axis, value: f64) -> BridgeResult<()> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_at == Some(call) {
            return Err(BridgeError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "board unplugged",
            )));
        }
        self.operations.push(Operation::SetCommand { axis, value });
        Ok(())
    }
}
