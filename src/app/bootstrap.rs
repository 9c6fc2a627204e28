use log::debug;

use crate::app::controller::AppController;
use crate::cli::Cli;
use crate::config::{load_config, ConfigOverrides};
use crate::error::Result;

/// Entry point used by `main`: resolve configuration, then run the one
/// requested command and return its output.
pub async fn run(cli: Cli) -> Result<String> {
    let overrides = ConfigOverrides {
        api_key: cli.api_key,
        output_size: cli.output_size,
    };
    let config = load_config(cli.config.as_deref(), &overrides)?;
    debug!(
        "using {} ({}, {}), cache ttl {:?}",
        config.provider.base_url,
        config.provider.function,
        config.provider.output_size.as_str(),
        config.cache.ttl
    );

    let controller = AppController::new(&config)?;
    controller.execute(cli.command).await
}
