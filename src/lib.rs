mod backend;
mod config;
mod error;
mod gpio;

pub use config::{
    ControlConfig, ControlOptions, ControlType, DEFAULT_DELAY, DEFAULT_PIN, DEFAULT_SYSFS_ROOT,
    GPIO_PINS, parse_control_type, parse_delay, parse_duration, parse_pin,
};
pub use error::{AppError, ParseDurationError};
pub use gpio::{Direction, GpioBackend, PinController, PinValue};

pub use backend::MockGpioBackend;
#[cfg(feature = "sysfs-gpio")]
pub use backend::SysfsBackend;
