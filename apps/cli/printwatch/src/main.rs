use printwatch::error::PrintwatchError;
use printwatch::logger::initialize as LoggerInitialize;
use printwatch::monitor::{ExitReason, run};

use moonraker_core::config::{CONFIG_FILE_NAME, MonitorConfig};
use moonraker_core::error::CoreError;
use moonraker_core::session::{MoonrakerSession, SessionOptions};

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    // Logger FIRST, next to the working directory
    if let Err(e) = LoggerInitialize(Path::new(".")) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match start(&config_path).await {
        Ok(ExitReason::Interrupted) => ExitCode::SUCCESS,
        Ok(ExitReason::ConnectionClosed) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn start(config_path: &Path) -> Result<ExitReason, PrintwatchError> {
    info!("printwatch {} starting", env!("CARGO_PKG_VERSION"));

    let config = MonitorConfig::load(config_path).map_err(CoreError::from)?;
    let session = MoonrakerSession::start(&config.server, SessionOptions::default()).await?;

    run(session).await
}
