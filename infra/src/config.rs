//! Configuration loading for the enrollment client

use std::path::Path;

use enroll_shared::{AppConfig, Environment};
use tracing::{debug, info};

use crate::InfrastructureError;

/// Load and validate the client configuration
///
/// Reads `.env` first. An explicit `path` wins; otherwise the per-environment
/// file (`enroll.<environment>.toml`) is used when it exists in the working
/// directory, and plain environment variables when it does not.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok(); // Load .env file if present

    let config = match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration file");
            AppConfig::from_file(path)?
        }
        None => {
            let env_file = Environment::from_env().config_file().to_string();
            if Path::new(&env_file).exists() {
                info!(path = %env_file, "Loading environment configuration file");
                AppConfig::from_file(&env_file)?
            } else {
                debug!("No configuration file found, using environment variables");
                AppConfig::from_env()
            }
        }
    };

    config.validate()?;
    Ok(config)
}
