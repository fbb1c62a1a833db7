use failure::Fail;
use lectern_macros::From;
use uuid::Uuid;

use crate::{
    db::types::ReviewStatus,
    document::{DocumentRecord, NewDocument, StatusUpdate},
};

/// Durable store of document records.
///
/// Every method is atomic: a record is either fully created, updated, or
/// deleted, or left untouched.
pub trait DocumentRepository: Send + Sync {
    /// Persist a new document in [`ReviewStatus::PendingReview`].
    fn create(&self, document: NewDocument) -> Result<DocumentRecord, RepositoryError>;

    fn get(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepositoryError>;

    /// Change review status of a document, provided it is still in
    /// `update.expected`.
    ///
    /// When the document is in any other status nothing is written and
    /// [`RepositoryError::StatusChanged`] is returned with the actual status.
    fn update_review_status(&self, id: Uuid, update: &StatusUpdate)
    -> Result<DocumentRecord, RepositoryError>;

    fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

#[derive(Debug, Fail, From)]
pub enum RepositoryError {
    #[fail(display = "No such document")]
    NotFound,
    #[fail(display = "Document is now in status {}", _0)]
    StatusChanged(ReviewStatus),
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] #[from] diesel::result::Error),
    #[fail(display = "Cannot obtain database connection: {}", _0)]
    Pool(#[cause] #[from] r2d2::Error),
    /// Stored data could not be interpreted.
    #[fail(display = "Corrupt document data: {}", _0)]
    Corrupt(String),
    #[fail(display = "Document repository unavailable: {}", _0)]
    Unavailable(String),
}
