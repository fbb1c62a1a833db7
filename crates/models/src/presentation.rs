//! Rendering documents for the people looking at them.
//!
//! What a document looks like depends on who's asking: its owner is told
//! whether and why a decision was made, while reviewers also see their own
//! notes and who made the decision.

use chrono::{DateTime, Utc};
use failure::Fail;
use lectern_error::ApiError;
use log::error;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::types::{DocumentType, ProtectionLevel, ReviewStatus, Role},
    directory::DirectoryError,
    document::{DocumentRecord, Translations, UserId},
    repository::RepositoryError,
    services::Services,
};

/// Who a document is presented to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Owner,
    Reviewer,
    Admin,
}

impl From<Role> for Audience {
    fn from(role: Role) -> Audience {
        match role {
            Role::Owner => Audience::Owner,
            Role::Reviewer => Audience::Reviewer,
            Role::Admin => Audience::Admin,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Progress,
    Success,
    Warning,
    Danger,
}

/// How a review status is displayed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Badge {
    pub status: ReviewStatus,
    pub label: &'static str,
    pub severity: Severity,
}

/// Describe `status` to `audience`.
pub fn badge(status: ReviewStatus, audience: Audience) -> Badge {
    let (owner, reviewer, severity) = match status {
        ReviewStatus::PendingReview =>
            ("Waiting for review", "Awaiting review", Severity::Info),
        ReviewStatus::UnderReview =>
            ("Being reviewed", "In review", Severity::Progress),
        ReviewStatus::Approved =>
            ("Approved", "Approved", Severity::Success),
        ReviewStatus::Rejected =>
            ("Rejected", "Rejected", Severity::Danger),
        ReviewStatus::NeedsReplacement =>
            ("Please upload a new file", "Replacement requested", Severity::Warning),
        ReviewStatus::NeedsAdditionalInfo =>
            ("Changes requested", "Information requested", Severity::Warning),
    };

    Badge {
        status,
        label: match audience {
            Audience::Owner => owner,
            Audience::Reviewer | Audience::Admin => reviewer,
        },
        severity,
    }
}

/// Fields of a document visible to everyone allowed to see it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub id: Uuid,
    pub lesson: Uuid,
    pub original_file_name: String,
    pub file_url: String,
    pub file_size_bytes: u64,
    pub mime_type: String,
    pub document_type: DocumentType,
    pub protection_level: ProtectionLevel,
    pub translations: Translations,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Summary {
    fn of(record: &DocumentRecord) -> Summary {
        Summary {
            id: record.id,
            lesson: record.lesson,
            original_file_name: record.original_file_name.clone(),
            file_url: record.file_url.clone(),
            file_size_bytes: record.file_size,
            mime_type: record.mime_type.clone(),
            document_type: record.document_type,
            protection_level: record.protection_level,
            translations: record.translations.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// A document as shown to its owner.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerView {
    #[serde(flatten)]
    pub document: Summary,
    pub review_status: Badge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

/// A document as shown to reviewers and administrators.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerView {
    #[serde(flatten)]
    pub document: Summary,
    pub owner: UserId,
    pub stored_file_name: String,
    pub review_status: Badge,
    pub rejection_reason: Option<String>,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum View {
    Owner(OwnerView),
    Reviewer(ReviewerView),
}

impl View {
    pub fn id(&self) -> Uuid {
        match self {
            View::Owner(view) => view.document.id,
            View::Reviewer(view) => view.document.id,
        }
    }
}

/// Render a document for an audience.
pub fn present(record: &DocumentRecord, audience: Audience) -> View {
    let review_status = badge(record.review_status, audience);

    match audience {
        Audience::Owner => View::Owner(OwnerView {
            document: Summary::of(record),
            review_status,
            rejection_reason: record.rejection_reason.clone(),
        }),
        Audience::Reviewer | Audience::Admin => View::Reviewer(ReviewerView {
            document: Summary::of(record),
            owner: record.owner,
            stored_file_name: record.stored_file_name.clone(),
            review_status,
            rejection_reason: record.rejection_reason.clone(),
            review_notes: record.review_notes.clone(),
            reviewed_by: record.reviewed_by,
            reviewed_at: record.reviewed_at,
        }),
    }
}

#[derive(ApiError, Debug, Fail)]
pub enum ViewError {
    #[fail(display = "No such document: {}", _0)]
    #[api(code = "document:not-found", status = "NOT_FOUND")]
    NotFound(Uuid),
    #[fail(display = "Unknown user {}", _0)]
    #[api(code = "user:unknown", status = "FORBIDDEN")]
    UnknownActor(UserId),
    #[fail(display = "Users can't be looked up right now")]
    #[api(code = "user:lookup-failed", status = "SERVICE_UNAVAILABLE")]
    LookupFailed(#[cause] DirectoryError),
    #[fail(display = "Document can't be loaded right now")]
    #[api(code = "document:unavailable", status = "SERVICE_UNAVAILABLE")]
    LoadFailed(#[cause] RepositoryError),
}

/// Determine the audience `actor` belongs to.
pub fn audience_of(services: &Services, actor: UserId) -> Result<Audience, ViewError> {
    match services.identities.role(actor) {
        Ok(Some(role)) => Ok(role.into()),
        Ok(None) => Err(ViewError::UnknownActor(actor)),
        Err(err) => {
            error!("Could not look up role of user {}: {}", actor, err);
            Err(ViewError::LookupFailed(err))
        }
    }
}

/// Render `record` for `actor`.
///
/// Users who can't review only see their own documents. Anyone else's
/// documents are reported as not existing.
pub fn present_to(services: &Services, record: &DocumentRecord, actor: UserId)
-> Result<View, ViewError> {
    let audience = audience_of(services, actor)?;

    if audience == Audience::Owner && record.owner != actor {
        return Err(ViewError::NotFound(record.id));
    }

    Ok(present(record, audience))
}

/// Load document `id` and render it for `actor`.
pub fn view_document(services: &Services, id: Uuid, actor: UserId)
-> Result<View, ViewError> {
    let record = match services.documents.get(id) {
        Ok(Some(record)) => record,
        Ok(None) => return Err(ViewError::NotFound(id)),
        Err(err) => {
            error!("Could not load document {}: {}", id, err);
            return Err(ViewError::LoadFailed(err));
        }
    };

    present_to(services, &record, actor)
}
