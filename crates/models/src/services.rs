use failure::Fail;
use lectern_macros::From;
use log::{info, warn};
use std::sync::Arc;

use crate::{
    config::Config,
    db::{self, ConnectionError, GetDatabaseUrlError, PgBackend},
    directory::{IdentityDirectory, LessonDirectory},
    memory::MemoryBackend,
    repository::DocumentRepository,
    storage::{FsStorage, StorageGateway},
    validation::Policy,
};

/// Collaborators and limits shared by all document operations.
#[derive(Clone)]
pub struct Services {
    pub lessons: Arc<dyn LessonDirectory>,
    pub identities: Arc<dyn IdentityDirectory>,
    pub storage: Arc<dyn StorageGateway>,
    pub documents: Arc<dyn DocumentRepository>,
    pub policy: Arc<Policy>,
}

impl Services {
    /// Assemble services described by configuration.
    ///
    /// Documents are kept in PostgreSQL when a database is configured, and in
    /// memory otherwise. Files are always kept in [`FsStorage`].
    pub fn configure(config: &Config) -> Result<Services, ConfigureError> {
        let policy = Policy::new(config.documents.locales.iter().cloned())
            .with_max_file_size(config.documents.max_file_size);
        let storage = Arc::new(FsStorage::new(
            config.storage.path.clone(), &config.storage.base_url));

        match db::database_url(config.database.as_ref()) {
            Ok(url) => {
                let backend = Arc::new(PgBackend::new(db::configure_pool(&url)?));

                info!("Keeping documents in PostgreSQL");

                Ok(Services {
                    lessons: backend.clone(),
                    identities: backend.clone(),
                    storage,
                    documents: backend,
                    policy: Arc::new(policy),
                })
            }
            Err(GetDatabaseUrlError::NotConfigured) => {
                warn!("No database configured; documents will be kept in memory \
                    and lost on exit");

                let backend = MemoryBackend::new();

                for lesson in &config.directory.lessons {
                    backend.directory.add_lesson(*lesson);
                }

                for user in &config.directory.users {
                    backend.directory.add_user(user.id, user.role);
                }

                Ok(Services {
                    storage,
                    ..backend.services(policy)
                })
            }
            Err(err) => Err(ConnectionError::from(err).into()),
        }
    }
}

#[derive(Debug, Fail, From)]
pub enum ConfigureError {
    #[fail(display = "Cannot connect to database: {}", _0)]
    Database(#[cause] #[from] ConnectionError),
}
