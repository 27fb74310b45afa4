use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Default location of the TOML config file.
    pub const DEFAULT_PATH: &'static str = "config/Config.toml";

    /// Loads application configuration by merging built-in defaults, an optional
    /// TOML file, and `APP_`-prefixed environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `APP_REPORT__LOT_SIZE=50`.
    /// A missing TOML file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
        }

        let config: AppConfig = Self::figment(path).extract()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("APP_").split("__"))
    }
}
