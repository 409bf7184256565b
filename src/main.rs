// retro-host - Main Entry Point
//
// Usage: retro-host <core> <content>
// Optional settings are read from retro-host.toml in the working directory.

use clap::Parser;
use log::{error, info};
use retro_host::config::{HostConfig, CONFIG_FILE};
use retro_host::logging::{init_logging, LoggingConfig};
use retro_host::runloop::{run_host, HostLaunch};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "retro-host")]
#[command(version, about = "Minimal frontend for libretro cores")]
struct Cli {
    /// Path to the core module (.so / .dll / .dylib)
    core: PathBuf,

    /// Path to the content file
    content: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = HostConfig::load_or_default(CONFIG_FILE);
    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..LoggingConfig::default()
    });

    info!("retro-host v{}", env!("CARGO_PKG_VERSION"));
    info!("Core: {}", cli.core.display());
    info!("Content: {}", cli.content.display());

    let launch = HostLaunch {
        core_path: cli.core,
        content_path: cli.content,
        config,
    };

    match run_host(launch) {
        Ok(()) => {
            info!("Exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
