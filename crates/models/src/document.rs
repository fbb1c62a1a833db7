use chrono::{DateTime, Utc};
use lectern_i18n::LanguageTag;
use serde::Serialize;
use std::{collections::{BTreeMap, btree_map}, fmt};
use uuid::Uuid;

use crate::db::types::{DocumentType, ProtectionLevel, ReviewStatus};

/// Identifier of a user, as issued by the identity directory.
pub type UserId = i32;

/// Title and description of a document in one locale.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Translation {
    pub title: String,
    pub description: String,
}

/// Per-locale metadata of a document, ordered by locale.
///
/// Values of this type are only constructed from translations which passed
/// validation, or which were loaded back from a repository.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Translations(BTreeMap<LanguageTag, Translation>);

impl Translations {
    pub fn get(&self, locale: &LanguageTag) -> Option<&Translation> {
        self.0.get(locale)
    }

    pub fn iter(&self) -> btree_map::Iter<LanguageTag, Translation> {
        self.0.iter()
    }

    pub fn locales(&self) -> impl Iterator<Item = &LanguageTag> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert a translation, returning `false` if one already existed for
    /// `locale`. Existing translations are never replaced.
    pub(crate) fn insert(&mut self, locale: LanguageTag, translation: Translation)
    -> bool {
        match self.0.entry(locale) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(entry) => {
                entry.insert(translation);
                true
            }
        }
    }
}

impl<'a> IntoIterator for &'a Translations {
    type Item = (&'a LanguageTag, &'a Translation);
    type IntoIter = btree_map::Iter<'a, LanguageTag, Translation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Location of a document's file within storage.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct BlobPath(String);

impl BlobPath {
    /// Path under which a freshly ingested document's file is kept.
    pub fn for_document(owner: UserId, lesson: Uuid, stored_file_name: &str)
    -> BlobPath {
        BlobPath(format!("documents/{}/{}/{}", owner, lesson, stored_file_name))
    }

    /// Restore a path previously obtained from [`BlobPath::as_str`].
    pub(crate) fn from_stored(path: String) -> BlobPath {
        BlobPath(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// A document as held by a repository.
///
/// Everything except the review fields (`review_status` through
/// `reviewed_at`, and `updated_at`) is set once during ingestion and never
/// changes afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub owner: UserId,
    pub lesson: Uuid,
    /// Name of the file as uploaded by its owner.
    pub original_file_name: String,
    /// Collision-free name under which the file is stored.
    pub stored_file_name: String,
    pub storage_path: BlobPath,
    pub file_url: String,
    pub file_size: u64,
    pub mime_type: String,
    pub document_type: DocumentType,
    pub protection_level: ProtectionLevel,
    pub translations: Translations,
    pub review_status: ReviewStatus,
    /// Present only while `review_status` requires a reason.
    pub rejection_reason: Option<String>,
    /// Reviewer-only notes.
    pub review_notes: Option<String>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A document about to be persisted for the first time. Repositories assign
/// its ID and timestamps, and always start it in
/// [`ReviewStatus::PendingReview`].
#[derive(Clone, Debug)]
pub struct NewDocument {
    pub owner: UserId,
    pub lesson: Uuid,
    pub original_file_name: String,
    pub stored_file_name: String,
    pub storage_path: BlobPath,
    pub file_url: String,
    pub file_size: u64,
    pub mime_type: String,
    pub document_type: DocumentType,
    pub protection_level: ProtectionLevel,
    pub translations: Translations,
}

/// A change of review status, applied only if the document is still in
/// status `expected`.
#[derive(Clone, Debug)]
pub struct StatusUpdate {
    pub expected: ReviewStatus,
    pub status: ReviewStatus,
    pub rejection_reason: Option<String>,
    /// New review notes; `None` keeps the existing ones.
    pub review_notes: Option<String>,
    pub reviewed_by: UserId,
    pub reviewed_at: DateTime<Utc>,
}

impl StatusUpdate {
    /// Apply this update to a record, without checking `expected`.
    pub(crate) fn apply_to(&self, record: &DocumentRecord) -> DocumentRecord {
        DocumentRecord {
            review_status: self.status,
            rejection_reason: self.rejection_reason.clone(),
            review_notes: self.review_notes.clone()
                .or_else(|| record.review_notes.clone()),
            reviewed_by: Some(self.reviewed_by),
            reviewed_at: Some(self.reviewed_at),
            updated_at: self.reviewed_at,
            ..record.clone()
        }
    }
}
