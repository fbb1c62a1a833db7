use failure::Fail;
use lectern_i18n::LanguageTag;
use serde::Deserialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::{
    db::{Config as DbConfig, types::Role},
    document::UserId,
    validation::MAX_FILE_SIZE,
};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database: Option<DbConfig>,
    pub storage: Storage,
    pub documents: Documents,
    /// Lessons and users known when running without a database.
    #[serde(default)]
    pub directory: Directory,
}

/// File storage configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Storage {
    /// Path to a directory in which user-uploaded files will be kept.
    pub path: PathBuf,
    /// URL under which contents of [`Storage::path`] are served.
    pub base_url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Documents {
    /// Locales every document must be translated into.
    pub locales: Vec<LanguageTag>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub lessons: Vec<Uuid>,
    #[serde(default)]
    pub users: Vec<DirectoryUser>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct DirectoryUser {
    pub id: UserId,
    pub role: Role,
}

impl Config {
    /// Check values which deserialization alone can't verify.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.documents.locales.is_empty() {
            return Err(ConfigError::NoLocales);
        }

        let size = self.documents.max_file_size;
        if size == 0 || size > MAX_FILE_SIZE {
            return Err(ConfigError::MaxFileSize(size));
        }

        Ok(())
    }
}

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "documents.locales must name at least one locale")]
    NoLocales,
    #[fail(display = "documents.max-file-size must be between 1 and {} bytes, not {}",
        MAX_FILE_SIZE, _0)]
    MaxFileSize(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documents(locales: &[&str], max_file_size: u64) -> Config {
        Config {
            database: None,
            storage: Storage {
                path: "/tmp/lectern".into(),
                base_url: "http://localhost/blobs".into(),
            },
            documents: Documents {
                locales: locales.iter().map(|l| l.parse().unwrap()).collect(),
                max_file_size,
            },
            directory: Directory::default(),
        }
    }

    #[test]
    fn validation() {
        assert!(documents(&["en"], MAX_FILE_SIZE).validate().is_ok());
        assert!(matches!(
            documents(&[], MAX_FILE_SIZE).validate(),
            Err(ConfigError::NoLocales),
        ));
        assert!(matches!(
            documents(&["en"], 0).validate(),
            Err(ConfigError::MaxFileSize(0)),
        ));
        assert!(matches!(
            documents(&["en"], MAX_FILE_SIZE + 1).validate(),
            Err(ConfigError::MaxFileSize(_)),
        ));
    }
}
