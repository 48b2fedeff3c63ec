mod config;
mod overlay;
mod runtime;

use clap::Parser;
use scanline_engine::logging::{init_logging, LoggingConfig};

use crate::config::Cli;
use crate::runtime::Runtime;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = Cli::parse().into_config();
    log::info!(
        "scanline demo: background {}, opacity {}%",
        config.background.display(),
        config.opacity.get()
    );

    Runtime::run(config)
}
