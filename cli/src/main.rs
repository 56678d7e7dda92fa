//! `enroll`: command line client for the enrollment backend
//!
//! Runs the email OTP flows (verification, sign-in, password reset) with a
//! live countdown, and exposes the administrative endpoints.

mod args;
mod commands;
mod logging;
mod render;

use clap::Parser;
use tracing::{debug, info};

use args::Cli;
use commands::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = enroll_infra::load_config(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.backend.base_url = url;
        config.validate()?;
    }

    logging::init(&config.logging)?;
    info!(
        environment = %config.environment,
        backend = %config.backend.normalized_base_url(),
        "Starting enrollment client"
    );

    let ctx = Context::build(&config, cli.json).await?;
    let result = commands::run(cli.command, &ctx).await;
    debug!(ok = result.is_ok(), "Command finished");
    result
}
