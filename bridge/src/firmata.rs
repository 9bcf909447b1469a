//! PWM output through a board running StandardFirmata.
//!
//! Only the two messages needed to drive PWM pins are implemented:
//!
//! - `SET_PIN_MODE`: `0xF4, pin, mode`
//! - analog message: `0xE0 | pin, value & 0x7F, (value >> 7) & 0x7F`
//!
//! Duty is 8 bit (`round(command * 255)`), as the stock sketch passes it
//! straight to `analogWrite`.

use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use crate::calibration::Axis;
use crate::error::{BridgeError, BridgeResult};
use crate::sink::ActuatorSink;

pub const DEFAULT_BAUD: u32 = 57_600;

const SET_PIN_MODE: u8 = 0xF4;
const ANALOG_MESSAGE: u8 = 0xE0;
const PIN_MODE_PWM: u8 = 0x03;

const PWM_FULL_SCALE: f64 = 255.0;
/// Largest value an analog message can carry (two 7-bit bytes)
const MAX_ANALOG_VALUE: u16 = 0x3FFF;
/// Analog messages address pins 0-15 only
pub const MAX_ANALOG_PIN: u8 = 15;

/// Digital pin for each coil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self { x: 5, y: 3, z: 6 }
    }
}

impl PinMap {
    pub fn pin(&self, axis: Axis) -> u8 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.x == self.y || self.x == self.z || self.y == self.z {
            return Err("Coil pins must be different");
        }
        if Axis::ALL.iter().any(|&a| self.pin(a) > MAX_ANALOG_PIN) {
            return Err("Coil pins must be in 0..=15 for Firmata analog messages");
        }
        Ok(())
    }
}

pub fn set_pin_mode_message(pin: u8, mode: u8) -> [u8; 3] {
    [SET_PIN_MODE, pin, mode]
}

pub fn analog_message(pin: u8, value: u16) -> [u8; 3] {
    [
        ANALOG_MESSAGE | (pin & 0x0F),
        (value & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
    ]
}

/// Duty value for a command. Values above 1 are passed on; the board saturates.
pub fn command_to_duty(axis: Axis, value: f64) -> BridgeResult<u16> {
    if !value.is_finite() || value < 0.0 {
        return Err(BridgeError::InvalidCommand { axis, value });
    }
    let duty = (value * PWM_FULL_SCALE).round();
    if duty > MAX_ANALOG_VALUE as f64 {
        return Err(BridgeError::InvalidCommand { axis, value });
    }
    Ok(duty as u16)
}

/// Firmata board with its three coil pins in PWM mode.
pub struct FirmataBoard<W: Write> {
    port: W,
    pins: PinMap,
}

impl<W: Write> FirmataBoard<W> {
    /// Put each coil pin into PWM mode.
    pub fn attach(mut port: W, pins: PinMap) -> BridgeResult<Self> {
        for axis in Axis::ALL {
            port.write_all(&set_pin_mode_message(pins.pin(axis), PIN_MODE_PWM))?;
        }
        port.flush()?;
        debug!(?pins, "coil pins set to PWM");
        Ok(Self { port, pins })
    }

    pub fn pins(&self) -> PinMap {
        self.pins
    }

    pub fn into_inner(self) -> W {
        self.port
    }
}

impl<W: Write> ActuatorSink for FirmataBoard<W> {
    fn set_command(&mut self, axis: Axis, value: f64) -> BridgeResult<()> {
        let duty = command_to_duty(axis, value)?;
        let pin = self.pins.pin(axis);
        self.port.write_all(&analog_message(pin, duty))?;
        self.port.flush()?;
        debug!(%axis, pin, duty, "pwm write");
        Ok(())
    }
}

/// Open the serial port and wait for the board to come out of reset.
pub fn open_serial(
    path: &str,
    baud: u32,
    settle: Duration,
) -> BridgeResult<Box<dyn serialport::SerialPort>> {
    let port = serialport::new(path, baud)
        .timeout(Duration::from_millis(100))
        .open()?;

    // opening the port resets the board
    std::thread::sleep(settle);
    info!(port = path, baud, "connected to board");
    Ok(port)
}
