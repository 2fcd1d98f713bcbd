use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

/// Environment variable prefix; nested keys are separated by `__`,
/// e.g. `WAGER_CAPITAL__DAILY_LOSS_LIMIT=0.03`.
pub const ENV_PREFIX: &str = "WAGER_";

/// Default location of the TOML config file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering built-in defaults, the TOML file,
    /// environment variables, and finally a sibling JSON file for any keys
    /// still unset.
    ///
    /// Missing files are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed or a value has the wrong type.
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let config: AppConfig = Self::base(path)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file(path.with_extension("json")))
            .extract()?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Loads configuration with a profile overlay: `Config.toml` is followed by
    /// `Config.<profile>.toml` from the same directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed or a value has the wrong type.
    pub fn load_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<AppConfig> {
        let path = path.as_ref();
        let config: AppConfig = Self::base(path)
            .merge(Toml::file(Self::profile_path(path, profile)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file(path.with_extension("json")))
            .extract()?;

        tracing::debug!(path = %path.display(), profile, "configuration loaded");
        Ok(config)
    }

    fn base(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(path))
    }

    fn profile_path(path: &Path, profile: &str) -> PathBuf {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Config");
        path.with_file_name(format!("{stem}.{profile}.toml"))
    }
}
