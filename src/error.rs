use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid control type: {0}")]
    InvalidControlType(String),
    #[error("Invalid GPIO pin number: {pin}, choose one of: {valid:?}")]
    InvalidPin { pin: String, valid: Vec<u32> },
    #[error("Invalid time delay format: {input} (use 1ms, 1s, 1m, 1h)")]
    InvalidDelay {
        input: String,
        #[source]
        source: ParseDurationError,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("GPIO error on {}: {source}", path.display())]
    Gpio {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    pub fn gpio(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AppError::Gpio {
            path: path.into(),
            source,
        }
    }

    /// Kind of the underlying I/O error, if this is a GPIO error.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            AppError::Gpio { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Error)]
pub enum ParseDurationError {
    #[error("'{0}' must start with a digit")]
    NoDigits(String),
    #[error("'{0}' unknown units - use 'ns', 'us', 'ms', 's', 'm' or 'h'")]
    Units(String),
    #[error("'{0}' missing units")]
    MissingUnits(String),
    #[error("'{0}' malformed number")]
    Malformed(String),
    #[error("'{0}' is too long")]
    Overflow(String),
}
