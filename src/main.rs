use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use gpulse::{AppError, ControlOptions, DEFAULT_SYSFS_ROOT, PinController};

#[cfg(not(feature = "sysfs-gpio"))]
use gpulse::MockGpioBackend;
#[cfg(feature = "sysfs-gpio")]
use gpulse::SysfsBackend;

/// Positional argument, then environment variable, then the options file.
fn pick(arg: Option<String>, var: &str, fallback: String) -> String {
    arg.or_else(|| std::env::var(var).ok()).unwrap_or(fallback)
}

fn load_options() -> Result<ControlOptions, AppError> {
    let file = match std::env::var("GPULSE_CONFIG") {
        Ok(path) => ControlOptions::load_from_file(&path)?,
        Err(_) => ControlOptions::default(),
    };
    let mut args = std::env::args().skip(1);
    let sysfs_root = std::env::var("GPULSE_SYSFS_ROOT")
        .ok()
        .map(PathBuf::from)
        .or(file.sysfs_root.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SYSFS_ROOT));

    Ok(ControlOptions::default()
        .control_type(pick(args.next(), "GPULSE_TYPE", file.control_type))
        .pin(pick(args.next(), "GPULSE_PIN", file.pin))
        .delay(pick(args.next(), "GPULSE_DELAY", file.delay))
        .sysfs_root(sysfs_root))
}

async fn run() -> Result<(), AppError> {
    let options = load_options()?;
    let config = options.build()?;

    let backend = {
        #[cfg(feature = "sysfs-gpio")]
        {
            Arc::new(SysfsBackend::new(
                options.sysfs_root.clone().unwrap_or_default(),
            ))
        }
        #[cfg(not(feature = "sysfs-gpio"))]
        {
            Arc::new(MockGpioBackend::default())
        }
    };

    info!(
        "running {} on pin {} (delay {:?})",
        config.control_type(),
        config.pin(),
        config.delay()
    );
    let controller = PinController::new(config, backend);

    // keep the process alive until the pulse has been released
    if let Some(pulse) = controller.run().await?
        && let Err(e) = pulse.await
    {
        error!("pulse task failed: {e}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
