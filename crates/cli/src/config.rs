use lectern_models::Config as ModelConfig;
use lectern_util::SingleInit;
use failure::Fail;
use log::LevelFilter;
use serde::Deserialize;
use std::{collections::HashMap, fs};

use crate::Result;

static CONFIG: SingleInit<Config> = SingleInit::uninit();

pub fn load() -> Result<&'static Config> {
    CONFIG.get_or_try_init(|| {
        let data = fs::read("config.toml").map_err(ReadConfigurationError)?;
        parse(&data)
    })
}

fn parse(data: &[u8]) -> Result<Config> {
    toml::from_slice(data).map_err(|e| ConfigurationError(e).into())
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub server: lectern_rest_api::Config,
    #[serde(default)]
    pub logging: Logging,
    pub sentry: Option<Sentry>,
    #[serde(flatten)]
    pub model: ModelConfig,
}

impl Config {
    /// Validate configuration correctness.
    pub fn validate(&self) -> Result<(), failure::Error> {
        self.model.validate()?;

        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Logging {
    /// Default logging level.
    #[serde(default = "default_level_filter")]
    pub level: LevelFilter,
    /// Actix-web logging level.
    pub network: Option<LevelFilter>,
    /// Custom filters.
    #[serde(default)]
    pub filters: HashMap<String, LevelFilter>,
}

/// Sentry.io configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Sentry {
    /// Client key.
    pub dsn: String,
}

#[derive(Debug, Fail)]
#[fail(display = "Cannot read configuration file")]
pub struct ReadConfigurationError(#[fail(cause)] std::io::Error);

#[derive(Debug, Fail)]
#[fail(display = "Invalid configuration: {}", _0)]
pub struct ConfigurationError(#[fail(cause)] toml::de::Error);

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: default_level_filter(),
            network: None,
            filters: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_models::Role;

    const EXAMPLE: &str = r#"
        [server]
        address = "127.0.0.1:8080"
        domain = "lectern.local"

        [storage]
        path = "/var/lib/lectern/blobs"
        base-url = "https://lectern.local/blobs"

        [documents]
        locales = ["en", "pl", "es"]

        [logging]
        level = "debug"
        network = "warn"

        [directory]
        lessons = ["5f0c7b52-8f0e-4c5e-9a43-5d1b2b0c6a10"]
        users = [{ id = 1, role = "admin" }, { id = 2, role = "owner" }]
    "#;

    #[test]
    fn parses_example_configuration() {
        let config = parse(EXAMPLE.as_bytes()).unwrap();

        assert_eq!(config.server.domain, "lectern.local");
        assert_eq!(config.server.address.port(), 8080);
        assert!(config.model.database.is_none());
        assert_eq!(config.model.storage.base_url, "https://lectern.local/blobs");
        assert_eq!(config.model.documents.locales.len(), 3);
        assert_eq!(config.model.documents.max_file_size, 100 * 1024 * 1024);
        assert_eq!(config.model.directory.users[0].role, Role::Admin);
        assert_eq!(config.logging.level, LevelFilter::Debug);
        assert_eq!(config.logging.network, Some(LevelFilter::Warn));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_configuration_without_locales() {
        let data = EXAMPLE.replace(r#"locales = ["en", "pl", "es"]"#, "locales = []");
        let config = parse(data.as_bytes()).unwrap();

        assert!(config.validate().is_err());
    }
}
