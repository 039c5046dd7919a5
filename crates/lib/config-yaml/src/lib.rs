//! YAML configuration loading for mailmirror.

use std::path::{Path, PathBuf};

use config_core::Config;

/// The environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MAILMIRROR_CONFIG";

/// A convenience type-alias for the YAML parser error type.
pub type YamlError = serde_yaml_bw::Error;

/// Errors returned while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The config path env var is set but unusable.
    #[error("config path env var read: {0}")]
    Env(#[source] envfury::Error<envfury::ValueError<<PathBuf as std::str::FromStr>::Err>>),

    /// Locating, reading or parsing the file failed.
    #[error(transparent)]
    Locate(#[from] config_locate::LoadError<YamlError>),
}

/// Parse configuration directly from a YAML string.
pub fn parse_str(contents: &str) -> Result<Config, YamlError> {
    serde_yaml_bw::from_str(contents)
}

/// Load configuration from a YAML file on disk.
pub async fn load_from_path(
    path: impl AsRef<Path>,
) -> Result<config_locate::Located<Config>, config_locate::LoadError<YamlError>> {
    config_locate::load(&[path], parse_str).await
}

/// Load configuration from `env_path` if given, or from the first existing
/// default location.
pub async fn load(
    env_path: Option<PathBuf>,
) -> Result<config_locate::Located<Config>, config_locate::LoadError<YamlError>> {
    let paths: Vec<PathBuf> = config_paths::resolve(env_path).collect();
    config_locate::load(&paths, parse_str).await
}

/// Load configuration honoring [`CONFIG_ENV_VAR`].
pub async fn load_with_default_env_var() -> Result<config_locate::Located<Config>, LoadError> {
    let env_path = envfury::maybe(CONFIG_ENV_VAR).map_err(LoadError::Env)?;
    Ok(load(env_path).await?)
}
