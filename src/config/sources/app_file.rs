//! Application config file source: signaldeck.toml and signaldeck.{env}.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

/// Add application config files found in `dir` to builder.
/// Precedence: signaldeck.toml (base) then signaldeck.{SIGNALDECK_ENV}.toml (env-specific).
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    dir: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let env_name = std::env::var("SIGNALDECK_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = builder;

    let base_config_path = dir.join("signaldeck.toml");
    if base_config_path.exists() {
        builder = builder.add_source(File::from(base_config_path.as_path()).required(false));
    }

    let env_config_path = dir.join(format!("signaldeck.{}.toml", env_name));
    if env_config_path.exists() {
        builder = builder.add_source(File::from(env_config_path.as_path()).required(false));
    }

    Ok(builder)
}
