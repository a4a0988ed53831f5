//! Command implementations.

mod info;
mod run;
mod validate;
mod watch;

pub use info::run_info;
pub use run::run_service;
pub use validate::run_validate;
pub use watch::run_watch;

use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::MuxConfig;
use multiplexer::{MultiplexerBuilder, MultiplexerHandle};
use tokio::task::JoinHandle;
use tracing::info;
use upstream::MockConnector;

use crate::cli::ServiceArgs;
use crate::error::{CliError, Result};

/// Load the configuration file (or defaults) and apply CLI overrides
pub(crate) fn load_config(args: &ServiceArgs) -> Result<MuxConfig> {
    let mut config = match &args.config {
        Some(path) if !path.exists() => {
            return Err(CliError::config_not_found(path.display().to_string()))
        }
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)?
        }
        None => {
            info!("No configuration file given, using defaults");
            MuxConfig::default()
        }
    };

    if let Some(mode) = args.mode {
        info!(mode = ?mode, "Overriding runtime mode from CLI");
        config.upstream.mode = mode.into();
    }
    if let Some(dev_origin) = &args.dev_origin {
        info!(dev_origin = %dev_origin, "Overriding development origin from CLI");
        config.upstream.dev_origin = dev_origin.clone();
    }
    if let Some(origin) = &args.origin {
        info!(origin = %origin, "Overriding origin from CLI");
        config.upstream.origin = Some(origin.clone());
    }

    ConfigLoader::validate(&config)?;
    Ok(config)
}

/// Build and spawn the multiplexer, with the synthetic source when `--mock` is set
pub(crate) fn start_service(
    args: &ServiceArgs,
    config: MuxConfig,
) -> Result<(MultiplexerHandle, JoinHandle<()>)> {
    let builder = MultiplexerBuilder::new(config);
    let builder = if args.mock {
        let interval = Duration::from_millis(args.mock_interval_ms.max(1));
        info!(interval_ms = interval.as_millis() as u64, "Using synthetic telemetry source");
        builder.connector(MockConnector::synthetic(interval))
    } else {
        builder
    };

    let (service, handle) = builder.build()?;
    Ok((handle, service.spawn()))
}
