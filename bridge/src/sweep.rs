//! Angle sweep ("dynamic mode").
//!
//! Steps the in-plane field direction from 0° to 90° inclusive, writing each
//! command triple to the sink and waiting between steps:
//!
//! ```text
//! Idle -> Stepping -> Done
//! ```
//!
//! The sink and clock are borrowed for the duration of one run, so tests can
//! substitute recorders and a [`ManualClock`](crate::clock::ManualClock).

use serde::Serialize;
use std::f64::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::calibration::CalibrationSet;
use crate::clock::Clock;
use crate::convert::{convert, CommandTriple, RangePolicy};
use crate::error::{BridgeResult, ConfigError};
use crate::field::FieldVector;
use crate::sink::ActuatorSink;

/// Slack on the 90° end point so that steps like 0.9° or 3.6° still land on it.
const END_ANGLE_TOLERANCE: f64 = 1e-9;

/// Smallest accepted angle step; 90° then takes at most 90 001 steps.
pub const MIN_ANGLE_STEP_DEGREES: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepConfig {
    /// Gauss
    pub magnitude: f64,
    pub angle_step_degrees: f64,
    pub wait_seconds: f64,
    /// Gauss
    pub z_offset: f64,
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("magnitude", self.magnitude),
            ("angle step", self.angle_step_degrees),
            ("wait time", self.wait_seconds),
            ("z offset", self.z_offset),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }
        if self.angle_step_degrees <= 0.0 {
            return Err(ConfigError::NonPositiveAngleStep(self.angle_step_degrees));
        }
        if self.angle_step_degrees < MIN_ANGLE_STEP_DEGREES {
            return Err(ConfigError::AngleStepTooSmall(self.angle_step_degrees));
        }
        if self.wait_seconds < 0.0 {
            return Err(ConfigError::NegativeWait(self.wait_seconds));
        }
        self.wait()?;
        if self.magnitude < 0.0 {
            return Err(ConfigError::NegativeMagnitude(self.magnitude));
        }
        Ok(())
    }

    pub fn angle_step(&self) -> f64 {
        self.angle_step_degrees.to_radians()
    }

    pub fn wait(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.wait_seconds)
            .map_err(|_| ConfigError::WaitTooLong(self.wait_seconds))
    }

    fn in_range(&self, index: usize) -> bool {
        index as f64 * self.angle_step() <= FRAC_PI_2 + END_ANGLE_TOLERANCE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepStep {
    /// Radians
    pub angle: f64,
    /// As sent to the sink, after the range policy
    pub command: CommandTriple,
    pub measured_magnitude: f64,
}

impl SweepStep {
    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepSummary {
    pub iteration_count: usize,
    /// `wait_seconds * iteration_count`
    pub expected_runtime: f64,
    pub actual_runtime: f64,
    pub average_measured_magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub config: SweepConfig,
    pub steps: Vec<SweepStep>,
    pub summary: SweepSummary,
    /// Stopped early through a [`CancelToken`]
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Stepping,
    Done,
}

/// Requests that a running sweep stop before its next step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs sweeps with a fixed calibration and range policy.
#[derive(Debug)]
pub struct Sequencer {
    calibration: CalibrationSet,
    policy: RangePolicy,
    state: SweepState,
}

impl Sequencer {
    pub fn new(calibration: CalibrationSet, policy: RangePolicy) -> Self {
        Self {
            calibration,
            policy,
            state: SweepState::Idle,
        }
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Run one sweep. Can be called again after it returns.
    ///
    /// The configuration is checked before the sink is touched. Conversion,
    /// range-policy and sink errors abort the sweep and are returned as-is.
    pub fn run(
        &mut self,
        config: &SweepConfig,
        sink: &mut dyn ActuatorSink,
        clock: &mut dyn Clock,
        cancel: &CancelToken,
    ) -> BridgeResult<SweepResult> {
        self.state = SweepState::Idle;
        config.validate()?;

        let result = self.step_all(config, sink, clock, cancel);
        self.state = match result {
            Ok(_) => SweepState::Done,
            Err(_) => SweepState::Idle,
        };
        result
    }

    fn step_all(
        &mut self,
        config: &SweepConfig,
        sink: &mut dyn ActuatorSink,
        clock: &mut dyn Clock,
        cancel: &CancelToken,
    ) -> BridgeResult<SweepResult> {
        self.state = SweepState::Stepping;
        let step = config.angle_step();
        let wait = config.wait()?;
        let start = clock.elapsed();

        info!(
            magnitude = config.magnitude,
            angle_step = config.angle_step_degrees,
            wait = config.wait_seconds,
            z_offset = config.z_offset,
            "sweep started"
        );

        let mut steps = Vec::new();
        let mut cancelled = false;
        let mut i = 0usize;

        while config.in_range(i) {
            if cancel.is_cancelled() {
                warn!(completed = steps.len(), "sweep cancelled");
                cancelled = true;
                break;
            }

            let angle = i as f64 * step;
            let field = FieldVector::new(config.magnitude, angle, config.z_offset);
            let command = self.policy.apply(&convert(&field, &self.calibration)?)?;
            let measured_magnitude = field.planar_magnitude();

            sink.apply(&command)?;
            info!(
                angle = angle.to_degrees(),
                magnitude = measured_magnitude,
                %command,
                "step"
            );
            steps.push(SweepStep {
                angle,
                command,
                measured_magnitude,
            });

            i += 1;
            if config.in_range(i) {
                clock.sleep(wait);
            }
        }

        let actual = clock.elapsed().saturating_sub(start);
        let summary = summarize(config, &steps, actual);
        debug!(?summary, cancelled, "sweep done");

        Ok(SweepResult {
            config: *config,
            steps,
            summary,
            cancelled,
        })
    }
}

fn summarize(config: &SweepConfig, steps: &[SweepStep], actual: Duration) -> SweepSummary {
    let iteration_count = steps.len();
    let average_measured_magnitude = if steps.is_empty() {
        0.0
    } else {
        steps.iter().map(|s| s.measured_magnitude).sum::<f64>() / iteration_count as f64
    };
    SweepSummary {
        iteration_count,
        expected_runtime: config.wait_seconds * iteration_count as f64,
        actual_runtime: actual.as_secs_f64(),
        average_measured_magnitude,
    }
}

/// Run a single sweep with a fresh [`Sequencer`].
pub fn run_sweep(
    config: &SweepConfig,
    calibration: &CalibrationSet,
    policy: RangePolicy,
    sink: &mut dyn ActuatorSink,
    clock: &mut dyn Clock,
    cancel: &CancelToken,
) -> BridgeResult<SweepResult> {
    Sequencer::new(*calibration, policy).run(config, sink, clock, cancel)
}
