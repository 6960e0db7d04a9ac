use std::io;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::AppError;
use crate::gpio::{Direction, GpioBackend, PinValue};

/// In-memory stand-in for the kernel side of the sysfs GPIO interface.
///
/// Exporting creates an input pin reading low, values can only be written to
/// outputs, and every per-pin access fails on a pin that is not exported.
pub struct MockGpioBackend {
    driver_loaded: bool,
    pins: RwLock<FxHashMap<u32, MockPinState>>, // keyed by pin number
}

#[derive(Debug, Clone, Copy)]
struct MockPinState {
    direction: Direction,
    value: PinValue,
}

impl Default for MockGpioBackend {
    fn default() -> Self {
        Self {
            driver_loaded: true,
            pins: RwLock::new(FxHashMap::default()),
        }
    }
}

impl MockGpioBackend {
    /// A backend whose `export` control file is missing.
    pub fn without_driver() -> Self {
        Self {
            driver_loaded: false,
            ..Self::default()
        }
    }

    /// Marks a pin as already exported, e.g. by another process.
    pub fn insert_exported(&self, pin: u32, direction: Direction, value: PinValue) {
        self.pins
            .write()
            .insert(pin, MockPinState { direction, value });
    }

    pub fn direction(&self, pin: u32) -> Option<Direction> {
        self.pins.read().get(&pin).map(|p| p.direction)
    }

    pub fn value(&self, pin: u32) -> Option<PinValue> {
        self.pins.read().get(&pin).map(|p| p.value)
    }

    fn not_exported(pin: u32, file: &str) -> AppError {
        AppError::gpio(
            format!("gpio{pin}/{file}"),
            io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
        )
    }
}

impl GpioBackend for MockGpioBackend {
    fn is_exported(&self, pin: u32) -> bool {
        self.pins.read().contains_key(&pin)
    }

    fn export(&self, pin: u32) -> Result<(), AppError> {
        if !self.driver_loaded {
            return Err(AppError::gpio(
                "export",
                io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            ));
        }
        let mut pins = self.pins.write();
        if pins.contains_key(&pin) {
            return Err(AppError::gpio(
                "export",
                io::Error::other("device or resource busy"),
            ));
        }
        pins.insert(
            pin,
            MockPinState {
                direction: Direction::In,
                value: PinValue::Low,
            },
        );
        Ok(())
    }

    fn unexport(&self, pin: u32) -> Result<(), AppError> {
        match self.pins.write().remove(&pin) {
            Some(_) => Ok(()),
            None => Err(AppError::gpio(
                "unexport",
                io::Error::new(io::ErrorKind::InvalidInput, "invalid argument"),
            )),
        }
    }

    fn set_direction(&self, pin: u32, direction: Direction) -> Result<(), AppError> {
        let mut pins = self.pins.write();
        let state = pins
            .get_mut(&pin)
            .ok_or_else(|| Self::not_exported(pin, "direction"))?;
        state.direction = direction;
        if direction == Direction::Out {
            state.value = PinValue::Low;
        }
        Ok(())
    }

    fn read_value(&self, pin: u32) -> Result<String, AppError> {
        let pins = self.pins.read();
        let state = pins
            .get(&pin)
            .ok_or_else(|| Self::not_exported(pin, "value"))?;
        Ok(format!("{}\n", state.value))
    }

    fn write_value(&self, pin: u32, value: PinValue) -> Result<(), AppError> {
        let mut pins = self.pins.write();
        let state = pins
            .get_mut(&pin)
            .ok_or_else(|| Self::not_exported(pin, "value"))?;
        if state.direction != Direction::Out {
            return Err(AppError::gpio(
                format!("gpio{pin}/value"),
                io::Error::new(io::ErrorKind::PermissionDenied, "operation not permitted"),
            ));
        }
        state.value = value;
        Ok(())
    }
}
