use failure::Fail;
use lectern_error::ApiError;
use log::{debug, error, info};
use uuid::Uuid;

use crate::{
    document::DocumentRecord,
    repository::RepositoryError,
    services::Services,
    storage::StorageError,
};

#[derive(ApiError, Debug, Fail)]
pub enum DeleteError {
    #[fail(display = "No such document: {}", _0)]
    #[api(code = "document:not-found", status = "NOT_FOUND")]
    NotFound(Uuid),
    #[fail(display = "Document can't be loaded right now")]
    #[api(code = "document:unavailable", status = "SERVICE_UNAVAILABLE")]
    LoadFailed(#[cause] RepositoryError),
    #[fail(display = "File could not be removed")]
    #[api(code = "document:delete:storage-failed", status = "SERVICE_UNAVAILABLE")]
    StorageFailed(#[cause] StorageError),
    #[fail(display = "Document could not be removed")]
    #[api(code = "document:delete:persist-failed", status = "SERVICE_UNAVAILABLE")]
    PersistFailed(#[cause] RepositoryError),
}

/// Remove a document together with its file.
///
/// The file is removed before the record. A file which is already gone counts
/// as removed, so retrying after a failed record deletion converges.
pub fn delete_document(services: &Services, id: Uuid) -> Result<DocumentRecord, DeleteError> {
    let record = match services.documents.get(id) {
        Ok(Some(record)) => record,
        Ok(None) => return Err(DeleteError::NotFound(id)),
        Err(err) => {
            error!("Could not load document {}: {}", id, err);
            return Err(DeleteError::LoadFailed(err));
        }
    };

    match services.storage.delete(&record.storage_path) {
        Ok(()) => (),
        Err(StorageError::NotFound(path)) =>
            debug!("File {} of document {} was already gone", path, id),
        Err(err) => {
            error!("Could not remove file {} of document {}: {}",
                record.storage_path, id, err);
            return Err(DeleteError::StorageFailed(err));
        }
    }

    match services.documents.delete(id) {
        Ok(()) => {
            info!("Deleted document {}", id);
            Ok(record)
        }
        Err(RepositoryError::NotFound) => Err(DeleteError::NotFound(id)),
        Err(err) => {
            error!("Removed file {} but could not delete document {}: {}",
                record.storage_path, id, err);
            Err(DeleteError::PersistFailed(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::types::{DocumentType, ProtectionLevel},
        document::{BlobPath, NewDocument, Translations},
        memory::MemoryBackend,
        repository::DocumentRepository,
        storage::StorageGateway,
        validation::Policy,
    };

    fn setup() -> (MemoryBackend, Services, DocumentRecord) {
        let backend = MemoryBackend::new();
        let lesson = Uuid::new_v4();
        let path = BlobPath::for_document(1, lesson, "x.txt");
        let file_url = backend.storage.put(&path, b"hello").unwrap();

        let record = backend.documents.create(NewDocument {
            owner: 1,
            lesson,
            original_file_name: "hello.txt".into(),
            stored_file_name: "x.txt".into(),
            storage_path: path,
            file_url,
            file_size: 5,
            mime_type: "text/plain".into(),
            document_type: DocumentType::Other,
            protection_level: ProtectionLevel::None,
            translations: Translations::default(),
        }).unwrap();

        let services = backend.services(Policy::new(None));
        (backend, services, record)
    }

    #[test]
    fn deletes_file_and_record() {
        let (backend, services, record) = setup();

        delete_document(&services, record.id).unwrap();

        assert!(!backend.storage.contains(&record.storage_path));
        assert!(backend.documents.is_empty());
        assert!(matches!(
            delete_document(&services, record.id),
            Err(DeleteError::NotFound(_)),
        ));
    }

    #[test]
    fn storage_failure_changes_nothing() {
        let (backend, services, record) = setup();
        backend.storage.fail_delete.set(true);

        assert!(matches!(
            delete_document(&services, record.id),
            Err(DeleteError::StorageFailed(_)),
        ));
        assert!(backend.storage.contains(&record.storage_path));
        assert_eq!(backend.documents.len(), 1);
    }

    #[test]
    fn retry_after_repository_failure_converges() {
        let (backend, services, record) = setup();
        backend.documents.fail_delete.set(true);

        assert!(matches!(
            delete_document(&services, record.id),
            Err(DeleteError::PersistFailed(_)),
        ));
        assert!(!backend.storage.contains(&record.storage_path));

        backend.documents.fail_delete.set(false);
        delete_document(&services, record.id).unwrap();
        assert!(backend.documents.is_empty());
    }
}
