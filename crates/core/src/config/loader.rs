use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::io::ErrorKind;
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides, e.g. `BATCHFETCH_DOWNLOADER__WORKERS=8`.
const ENV_PREFIX: &str = "BATCHFETCH_";

/// Load configuration from file with environment variable overrides.
///
/// Sections are separated by `__` in variable names. The file must exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.display().to_string()),
        _ => ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        },
    })?;

    Figment::from(Toml::string(&contents))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
