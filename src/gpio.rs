use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::config::{ControlConfig, ControlType};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinValue {
    Low,
    High,
}

impl PinValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinValue::Low => "0",
            PinValue::High => "1",
        }
    }
}

impl fmt::Display for PinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to the kernel's per-pin GPIO controls.
pub trait GpioBackend: Send + Sync {
    fn is_exported(&self, pin: u32) -> bool;
    fn export(&self, pin: u32) -> Result<(), AppError>;
    fn unexport(&self, pin: u32) -> Result<(), AppError>;
    fn set_direction(&self, pin: u32, direction: Direction) -> Result<(), AppError>;
    /// Raw content of the value file, trailing newline included.
    fn read_value(&self, pin: u32) -> Result<String, AppError>;
    fn write_value(&self, pin: u32, value: PinValue) -> Result<(), AppError>;
}

/// Drives a single pin according to a [`ControlConfig`].
pub struct PinController<B: GpioBackend> {
    config: ControlConfig,
    backend: Arc<B>,
}

impl<B: GpioBackend + 'static> PinController<B> {
    pub fn new(config: ControlConfig, backend: Arc<B>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Runs the configured control once.
    ///
    /// In timer mode the pin is driven high and a detached task drives it low
    /// again once the delay elapses. Its handle is returned so a caller can wait
    /// for the pulse to finish; dropping it leaves the task running. Failures of
    /// that delayed write are only logged.
    pub async fn run(&self) -> Result<Option<JoinHandle<()>>, AppError> {
        match self.config.control_type() {
            ControlType::Timer => self.start_timer().map(Some),
            ControlType::Toggle => self.toggle().map(|()| None),
        }
    }

    /// Exports the pin and makes it an output, unless it is already exported.
    ///
    /// An already exported pin is left untouched, including its direction.
    pub fn enable_pin(&self) -> Result<(), AppError> {
        let pin = self.config.pin();
        if self.backend.is_exported(pin) {
            debug!("pin {pin} already exported");
            return Ok(());
        }
        self.backend.export(pin)?;
        self.backend.set_direction(pin, Direction::Out)?;
        info!("exported pin {pin} as output");
        Ok(())
    }

    /// Unexports the pin if it is exported. Failures are logged, not returned.
    pub fn disable_pin(&self) {
        let pin = self.config.pin();
        if !self.backend.is_exported(pin) {
            return;
        }
        match self.backend.unexport(pin) {
            Ok(()) => info!("unexported pin {pin}"),
            Err(e) => warn!("can't disable pin {pin}: {e}"),
        }
    }

    fn start_timer(&self) -> Result<JoinHandle<()>, AppError> {
        let pin = self.config.pin();
        if let Err(e) = self.enable_pin() {
            warn!("couldn't enable pin {pin}: {e}");
            return Err(e);
        }
        self.backend.write_value(pin, PinValue::High)?;

        let delay = self.config.delay();
        info!("pin {pin} high, releasing in {delay:?}");

        let backend = Arc::clone(&self.backend);
        Ok(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match backend.write_value(pin, PinValue::Low) {
                Ok(()) => info!("pin {pin} low"),
                Err(e) => warn!("couldn't release pin {pin}: {e}"),
            }
        }))
    }

    fn toggle(&self) -> Result<(), AppError> {
        let pin = self.config.pin();
        if let Err(e) = self.enable_pin() {
            warn!("couldn't enable pin {pin}: {e}");
        }

        let current = self.backend.read_value(pin).unwrap_or_else(|e| {
            warn!("can't read the state of pin {pin}: {e}");
            String::new()
        });

        // anything but a clean high reading counts as low
        let next = if current == "1\n" {
            PinValue::Low
        } else {
            PinValue::High
        };
        self.backend.write_value(pin, next)?;
        info!("pin {pin} toggled to {next}");
        Ok(())
    }
}
