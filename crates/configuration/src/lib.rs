use std::path::Path;

use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{CalendarSettings, Config, LogFormat, LoggingSettings, SparklineSettings};

/// Prefix of the environment variables that override file settings,
/// e.g. `TRADELENS__CALENDAR__WEEKS=6`.
pub const ENV_PREFIX: &str = "TRADELENS";

/// Loads the application configuration.
///
/// Sources are layered: built-in defaults, then the TOML file (the given path,
/// or an optional `tradelens.toml` in the working directory), then environment
/// variables. The merged result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("tradelens").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}
