//! Ingestion of new documents.
//!
//! Ingestion validates everything it can without side effects, then uploads
//! the file and persists the record. A file uploaded for a record which
//! didn't get persisted is deleted again before [`ingest`] returns.

use failure::Fail;
use lectern_error::ApiError;
use lectern_i18n::LanguageTag;
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    db::types::ProtectionLevel,
    directory::DirectoryError,
    document::{BlobPath, DocumentRecord, NewDocument, UserId},
    repository::RepositoryError,
    services::Services,
    storage::{StorageError, StorageGateway},
    validation::{
        FileError,
        TranslationError,
        TranslationInput,
        Upload,
        validate_file,
        validate_translations,
    },
};

#[derive(ApiError, Debug, Fail)]
pub enum IngestError {
    #[fail(display = "No such lesson: {}", _0)]
    #[api(code = "document:ingest:lesson-not-found", status = "NOT_FOUND")]
    LessonNotFound(Uuid),
    #[fail(display = "File is too large ({} bytes, at most {} allowed)", size, limit)]
    #[api(code = "document:ingest:file-too-large", status = "PAYLOAD_TOO_LARGE")]
    FileTooLarge {
        size: u64,
        limit: u64,
    },
    #[fail(display = "File is empty")]
    #[api(code = "document:ingest:empty-file", status = "BAD_REQUEST")]
    EmptyFile,
    #[fail(display = "Files of type {} can't be uploaded with protection level {}",
        mime, protection)]
    #[api(code = "document:ingest:unsupported-type", status = "UNSUPPORTED_MEDIA_TYPE")]
    UnsupportedTypeForProtection {
        mime: String,
        protection: ProtectionLevel,
    },
    #[fail(display = "Translation into {} is missing", _0)]
    #[api(code = "document:ingest:missing-translation", status = "BAD_REQUEST")]
    MissingTranslation(LanguageTag),
    #[fail(display = "{:?} is not one of the configured locales", _0)]
    #[api(code = "document:ingest:unknown-locale", status = "BAD_REQUEST")]
    UnknownLocale(String),
    #[fail(display = "Translation into {} was given more than once", _0)]
    #[api(code = "document:ingest:duplicate-translation", status = "BAD_REQUEST")]
    DuplicateTranslation(LanguageTag),
    #[fail(display = "Invalid title in {}", _0)]
    #[api(code = "document:ingest:title-invalid", status = "BAD_REQUEST")]
    TitleInvalid(LanguageTag),
    #[fail(display = "Invalid description in {}", _0)]
    #[api(code = "document:ingest:description-invalid", status = "BAD_REQUEST")]
    DescriptionInvalid(LanguageTag),
    #[fail(display = "Lessons can't be looked up right now")]
    #[api(code = "document:ingest:lesson-lookup-failed", status = "SERVICE_UNAVAILABLE")]
    LessonLookupFailed(#[cause] DirectoryError),
    #[fail(display = "File could not be stored")]
    #[api(code = "document:ingest:upload-failed", status = "SERVICE_UNAVAILABLE")]
    UploadFailed(#[cause] StorageError),
    #[fail(display = "Document could not be saved")]
    #[api(code = "document:ingest:persist-failed", status = "SERVICE_UNAVAILABLE")]
    PersistFailed(#[cause] RepositoryError),
}

impl From<FileError> for IngestError {
    fn from(err: FileError) -> IngestError {
        match err {
            FileError::TooLarge { size, limit } => IngestError::FileTooLarge { size, limit },
            FileError::Empty => IngestError::EmptyFile,
            FileError::UnsupportedType { mime, protection } =>
                IngestError::UnsupportedTypeForProtection { mime, protection },
        }
    }
}

impl From<TranslationError> for IngestError {
    fn from(err: TranslationError) -> IngestError {
        match err {
            TranslationError::Missing(locale) => IngestError::MissingTranslation(locale),
            TranslationError::UnknownLocale(locale) => IngestError::UnknownLocale(locale),
            TranslationError::Duplicate(locale) => IngestError::DuplicateTranslation(locale),
            TranslationError::TitleInvalid(locale) => IngestError::TitleInvalid(locale),
            TranslationError::DescriptionInvalid(locale) =>
                IngestError::DescriptionInvalid(locale),
        }
    }
}

/// Ingest a new document owned by `owner` into `lesson`.
///
/// On success the returned record is in review status `PENDING_REVIEW`. On
/// failure no record exists, and the file is not left in storage.
pub fn ingest(
    services: &Services,
    file: Upload,
    protection: ProtectionLevel,
    translations: &[TranslationInput],
    lesson: Uuid,
    owner: UserId,
) -> Result<DocumentRecord, IngestError> {
    let validated = validate_file(&services.policy, &file, protection)
        .map_err(|err| {
            debug!("Rejected file {:?} from user {}: {}", file.name, owner, err);
            err
        })?;

    let translations = validate_translations(&services.policy, translations)
        .map_err(|err| {
            debug!("Rejected translations from user {}: {}", owner, err);
            err
        })?;

    let exists = services.lessons.lesson_exists(lesson)
        .map_err(|err| {
            error!("Ingestion step lesson-lookup failed for lesson {}: {}", lesson, err);
            IngestError::LessonLookupFailed(err)
        })?;

    if !exists {
        return Err(IngestError::LessonNotFound(lesson));
    }

    let stored_file_name = format!("{}.{}", Uuid::new_v4(), validated.extension);
    let path = BlobPath::for_document(owner, lesson, &stored_file_name);

    let file_url = services.storage.put(&path, &file.content)
        .map_err(|err| {
            error!("Ingestion step upload failed for {}: {}", path, err);
            IngestError::UploadFailed(err)
        })?;

    let blob = Uploaded::new(&*services.storage, path.clone());

    let document = NewDocument {
        owner,
        lesson,
        original_file_name: validated.name,
        stored_file_name,
        storage_path: path,
        file_url,
        file_size: validated.size,
        mime_type: validated.mime,
        document_type: validated.document_type,
        protection_level: protection,
        translations,
    };

    match services.documents.create(document) {
        Ok(record) => {
            blob.keep();
            info!("Ingested document {} into lesson {} for user {}",
                record.id, lesson, owner);
            Ok(record)
        }
        Err(err) => {
            error!("Ingestion step persist failed for blob {}: {}", blob.path(), err);
            blob.compensate();
            Err(IngestError::PersistFailed(err))
        }
    }
}

/// A blob written during ingestion, deleted again unless kept.
///
/// Dropping this guard without calling [`Uploaded::keep`], also while
/// unwinding, deletes the blob.
struct Uploaded<'a> {
    storage: &'a dyn StorageGateway,
    path: Option<BlobPath>,
}

impl<'a> Uploaded<'a> {
    fn new(storage: &'a dyn StorageGateway, path: BlobPath) -> Self {
        Uploaded { storage, path: Some(path) }
    }

    fn path(&self) -> &str {
        self.path.as_ref().map_or("", BlobPath::as_str)
    }

    /// The blob now belongs to a persisted record.
    fn keep(mut self) {
        self.path = None;
    }

    fn compensate(mut self) {
        if let Some(path) = self.path.take() {
            remove_blob(self.storage, &path);
        }
    }
}

impl<'a> Drop for Uploaded<'a> {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            warn!("Ingestion abandoned after upload of {}", path);
            remove_blob(self.storage, &path);
        }
    }
}

/// Delete a blob which no record refers to, returning whether it's gone.
fn remove_blob(storage: &dyn StorageGateway, path: &BlobPath) -> bool {
    match storage.delete(path) {
        Ok(()) | Err(StorageError::NotFound(_)) => {
            info!("Compensation succeeded: removed blob {}", path);
            true
        }
        Err(err) => {
            error!("Compensation failed: blob {} is orphaned: {}", path, err);
            false
        }
    }
}
