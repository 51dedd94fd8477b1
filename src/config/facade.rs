//! Config loader: assembles sources in precedence order and deserializes them.

use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};

use super::merge;
use super::sources::{app_file, global_file};
use super::ClientConfig;

/// Environment variable prefix: `SIGNALDECK_APP_ID`, `SIGNALDECK_LOGGING__LEVEL`, ...
pub const ENV_PREFIX: &str = "SIGNALDECK";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for an application rooted at `dir`
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables (`SIGNALDECK_*`, `__` separates nested keys)
    /// 2. `dir/signaldeck.{SIGNALDECK_ENV}.toml`
    /// 3. `dir/signaldeck.toml`
    /// 4. Global config file
    /// 5. Defaults
    pub fn load(dir: &Path) -> Result<ClientConfig, ConfigError> {
        let builder = merge::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = app_file::add_to_builder(builder, dir)?;
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a single file, on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<ClientConfig, ConfigError> {
        merge::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
