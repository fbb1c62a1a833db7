//! Collaborators keeping everything in process memory.
//!
//! These back the server when no database is configured, and tests. Each of
//! them can be told to fail, to exercise error paths of the code using them.

use chrono::Utc;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use uuid::Uuid;

use crate::{
    db::types::{ReviewStatus, Role},
    directory::{DirectoryError, IdentityDirectory, LessonDirectory},
    document::{BlobPath, DocumentRecord, NewDocument, StatusUpdate, UserId},
    repository::{DocumentRepository, RepositoryError},
    services::Services,
    storage::{StorageError, StorageGateway},
    validation::Policy,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    // Every mutation below replaces whole values, so a panic while holding
    // the lock can't leave partially updated state behind.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A switch making an operation fail while it is on.
#[derive(Debug, Default)]
pub struct Fault(AtomicBool);

impl Fault {
    pub fn set(&self, fail: bool) {
        self.0.store(fail, Ordering::SeqCst)
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<BTreeMap<BlobPath, Vec<u8>>>,
    deletes: AtomicUsize,
    pub fail_put: Fault,
    pub fail_delete: Fault,
}

impl MemoryStorage {
    pub fn contains(&self, path: &BlobPath) -> bool {
        lock(&self.blobs).contains_key(path)
    }

    pub fn get(&self, path: &BlobPath) -> Option<Vec<u8>> {
        lock(&self.blobs).get(path).cloned()
    }

    pub fn paths(&self) -> Vec<BlobPath> {
        lock(&self.blobs).keys().cloned().collect()
    }

    /// Number of delete attempts made so far, including failed ones.
    pub fn delete_attempts(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl StorageGateway for MemoryStorage {
    fn put(&self, path: &BlobPath, data: &[u8]) -> Result<String, StorageError> {
        if self.fail_put.is_set() {
            return Err(StorageError::Unavailable("storage is switched off".into()));
        }

        lock(&self.blobs).insert(path.clone(), data.to_vec());

        Ok(format!("memory:///{}", path))
    }

    fn delete(&self, path: &BlobPath) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);

        if self.fail_delete.is_set() {
            return Err(StorageError::Unavailable("storage is switched off".into()));
        }

        match lock(&self.blobs).remove(path) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(path.clone())),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    documents: Mutex<BTreeMap<Uuid, DocumentRecord>>,
    pub fail_create: Fault,
    pub fail_get: Fault,
    pub fail_update: Fault,
    pub fail_delete: Fault,
}

impl MemoryRepository {
    pub fn len(&self) -> usize {
        lock(&self.documents).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.documents).is_empty()
    }

    /// Move a document into another status behind its reviewers' backs.
    pub fn force_status(&self, id: Uuid, status: ReviewStatus) {
        if let Some(record) = lock(&self.documents).get_mut(&id) {
            record.review_status = status;
        }
    }
}

fn switched_off() -> RepositoryError {
    RepositoryError::Unavailable("repository is switched off".into())
}

impl DocumentRepository for MemoryRepository {
    fn create(&self, document: NewDocument) -> Result<DocumentRecord, RepositoryError> {
        if self.fail_create.is_set() {
            return Err(switched_off());
        }

        let now = Utc::now();
        let record = DocumentRecord {
            id: Uuid::new_v4(),
            owner: document.owner,
            lesson: document.lesson,
            original_file_name: document.original_file_name,
            stored_file_name: document.stored_file_name,
            storage_path: document.storage_path,
            file_url: document.file_url,
            file_size: document.file_size,
            mime_type: document.mime_type,
            document_type: document.document_type,
            protection_level: document.protection_level,
            translations: document.translations,
            review_status: ReviewStatus::PendingReview,
            rejection_reason: None,
            review_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };

        lock(&self.documents).insert(record.id, record.clone());

        Ok(record)
    }

    fn get(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepositoryError> {
        if self.fail_get.is_set() {
            return Err(switched_off());
        }

        Ok(lock(&self.documents).get(&id).cloned())
    }

    fn update_review_status(&self, id: Uuid, update: &StatusUpdate)
    -> Result<DocumentRecord, RepositoryError> {
        if self.fail_update.is_set() {
            return Err(switched_off());
        }

        let mut documents = lock(&self.documents);
        let record = documents.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        if record.review_status != update.expected {
            return Err(RepositoryError::StatusChanged(record.review_status));
        }

        *record = update.apply_to(record);

        Ok(record.clone())
    }

    fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        if self.fail_delete.is_set() {
            return Err(switched_off());
        }

        match lock(&self.documents).remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    lessons: Mutex<HashSet<Uuid>>,
    users: Mutex<HashMap<UserId, Role>>,
    pub fail_lookup: Fault,
}

impl MemoryDirectory {
    pub fn add_lesson(&self, lesson: Uuid) {
        lock(&self.lessons).insert(lesson);
    }

    pub fn add_user(&self, user: UserId, role: Role) {
        lock(&self.users).insert(user, role);
    }
}

impl LessonDirectory for MemoryDirectory {
    fn lesson_exists(&self, lesson: Uuid) -> Result<bool, DirectoryError> {
        if self.fail_lookup.is_set() {
            return Err(DirectoryError::Unavailable("directory is switched off".into()));
        }

        Ok(lock(&self.lessons).contains(&lesson))
    }
}

impl IdentityDirectory for MemoryDirectory {
    fn role(&self, user: UserId) -> Result<Option<Role>, DirectoryError> {
        if self.fail_lookup.is_set() {
            return Err(DirectoryError::Unavailable("directory is switched off".into()));
        }

        Ok(lock(&self.users).get(&user).copied())
    }
}

/// A complete set of in-memory collaborators.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    pub storage: Arc<MemoryStorage>,
    pub documents: Arc<MemoryRepository>,
    pub directory: Arc<MemoryDirectory>,
}

impl MemoryBackend {
    pub fn new() -> MemoryBackend {
        MemoryBackend::default()
    }

    pub fn services(&self, policy: Policy) -> Services {
        Services {
            lessons: self.directory.clone(),
            identities: self.directory.clone(),
            storage: self.storage.clone(),
            documents: self.documents.clone(),
            policy: Arc::new(policy),
        }
    }
}
