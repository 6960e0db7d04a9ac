use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_SYSFS_ROOT;
use crate::error::AppError;
use crate::gpio::{Direction, GpioBackend, PinValue};

const SYSFS_FILE_MODE: u32 = 0o644;

/// GPIO access through the legacy sysfs interface.
///
/// The root is normally `/sys/class/gpio`, holding the `export` and `unexport`
/// control files and one `gpio<N>` directory per exported pin.
pub struct SysfsBackend {
    root: PathBuf,
}

impl Default for SysfsBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

impl SysfsBackend {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{pin}"))
    }

    fn write_file(path: &Path, contents: &str) -> Result<(), AppError> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(SYSFS_FILE_MODE)
            .open(path)
            .and_then(|mut f| f.write_all(contents.as_bytes()))
            .map_err(|e| AppError::gpio(path, e))
    }
}

impl GpioBackend for SysfsBackend {
    fn is_exported(&self, pin: u32) -> bool {
        !matches!(
            fs::metadata(self.pin_dir(pin)),
            Err(e) if e.kind() == io::ErrorKind::NotFound
        )
    }

    fn export(&self, pin: u32) -> Result<(), AppError> {
        let export = self.root.join("export");
        // writing would create a plain file if the driver isn't there
        if let Err(e) = fs::metadata(&export)
            && e.kind() == io::ErrorKind::NotFound
        {
            return Err(AppError::gpio(export, e));
        }
        Self::write_file(&export, &pin.to_string())
    }

    fn unexport(&self, pin: u32) -> Result<(), AppError> {
        Self::write_file(&self.root.join("unexport"), &pin.to_string())
    }

    fn set_direction(&self, pin: u32, direction: Direction) -> Result<(), AppError> {
        Self::write_file(&self.pin_dir(pin).join("direction"), direction.as_str())
    }

    fn read_value(&self, pin: u32) -> Result<String, AppError> {
        let path = self.pin_dir(pin).join("value");
        fs::read_to_string(&path).map_err(|e| AppError::gpio(path, e))
    }

    fn write_value(&self, pin: u32, value: PinValue) -> Result<(), AppError> {
        Self::write_file(&self.pin_dir(pin).join("value"), value.as_str())
    }
}
