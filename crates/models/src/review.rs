//! Review decisions on documents.

use chrono::Utc;
use failure::Fail;
use lectern_error::ApiError;
use lectern_util::{char_len, non_blank};
use log::{debug, error, info};
use uuid::Uuid;

use crate::{
    db::types::ReviewStatus,
    document::{DocumentRecord, StatusUpdate, UserId},
    repository::RepositoryError,
    services::Services,
};

/// Longest allowed reason, in characters.
pub const REASON_MAX: usize = 1000;

/// Longest allowed review notes, in characters.
pub const NOTES_MAX: usize = 2000;

#[derive(ApiError, Debug, Fail)]
pub enum TransitionError {
    #[fail(display = "No such document: {}", _0)]
    #[api(code = "document:not-found", status = "NOT_FOUND")]
    NotFound(Uuid),
    #[fail(display = "A document can't go from {} to {}", from, to)]
    #[api(code = "document:review:invalid-transition", status = "CONFLICT")]
    InvalidTransition {
        from: ReviewStatus,
        to: ReviewStatus,
    },
    #[fail(display = "A reason is required to move a document to {}", _0)]
    #[api(code = "document:review:reason-required", status = "BAD_REQUEST")]
    ReasonRequired(ReviewStatus),
    #[fail(display = "Reason can be at most {} characters long", REASON_MAX)]
    #[api(code = "document:review:reason-too-long", status = "BAD_REQUEST")]
    ReasonTooLong,
    #[fail(display = "Notes can be at most {} characters long", NOTES_MAX)]
    #[api(code = "document:review:notes-too-long", status = "BAD_REQUEST")]
    NotesTooLong,
    #[fail(display = "Document can't be loaded right now")]
    #[api(code = "document:unavailable", status = "SERVICE_UNAVAILABLE")]
    LoadFailed(#[cause] RepositoryError),
    #[fail(display = "Review decision could not be saved")]
    #[api(code = "document:review:persist-failed", status = "SERVICE_UNAVAILABLE")]
    PersistFailed(#[cause] RepositoryError),
}

/// Result of a successful [`transition`].
#[derive(Clone, Debug)]
pub struct Transition {
    /// Document as it is after the transition.
    pub record: DocumentRecord,
    /// Whether anything was written. Moving a document into the status it's
    /// already in changes nothing.
    pub changed: bool,
}

/// The review fields a transition will write.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Decision {
    rejection_reason: Option<String>,
    review_notes: Option<String>,
}

/// Check whether a document in status `from` can be moved to `to` with the
/// given reason and notes.
fn decide(from: ReviewStatus, to: ReviewStatus, reason: Option<&str>, notes: Option<&str>)
-> Result<Decision, TransitionError> {
    if !from.can_become(to) {
        return Err(TransitionError::InvalidTransition { from, to });
    }

    let rejection_reason = if to.requires_reason() {
        let reason = reason.and_then(non_blank)
            .ok_or(TransitionError::ReasonRequired(to))?;

        if char_len(reason) > REASON_MAX {
            return Err(TransitionError::ReasonTooLong);
        }

        Some(reason.to_string())
    } else {
        None
    };

    let review_notes = match notes.and_then(non_blank) {
        Some(notes) if char_len(notes) > NOTES_MAX =>
            return Err(TransitionError::NotesTooLong),
        notes => notes.map(str::to_string),
    };

    Ok(Decision { rejection_reason, review_notes })
}

/// Move document `id` into review status `target`, on behalf of `reviewer`.
///
/// Statuses requiring a reason (`REJECTED`, `NEEDS_REPLACEMENT`, and
/// `NEEDS_ADDITIONAL_INFO`) fail without a non-blank `reason`; for other
/// statuses the reason is ignored and any stored reason is cleared. Notes
/// replace stored notes when given, and are kept otherwise.
///
/// Moving a document into the status it's already in succeeds without
/// writing anything.
pub fn transition(
    services: &Services,
    id: Uuid,
    target: ReviewStatus,
    reason: Option<&str>,
    notes: Option<&str>,
    reviewer: UserId,
) -> Result<Transition, TransitionError> {
    let record = load(services, id)?;
    let current = record.review_status;

    if current == target {
        debug!("Document {} is already {}", id, target);
        return Ok(Transition { record, changed: false });
    }

    let decision = decide(current, target, reason, notes)?;

    let update = StatusUpdate {
        expected: current,
        status: target,
        rejection_reason: decision.rejection_reason,
        review_notes: decision.review_notes,
        reviewed_by: reviewer,
        reviewed_at: Utc::now(),
    };

    match services.documents.update_review_status(id, &update) {
        Ok(record) => {
            info!("User {} moved document {} from {} to {}",
                reviewer, id, current, target);
            Ok(Transition { record, changed: true })
        }
        Err(RepositoryError::StatusChanged(now)) => {
            debug!("Document {} moved from {} to {} concurrently", id, current, now);

            // Someone else made a decision first. Only an identical decision
            // can be reported as a success.
            let record = load(services, id)?;

            if record.review_status == target {
                Ok(Transition { record, changed: false })
            } else {
                Err(TransitionError::InvalidTransition {
                    from: record.review_status,
                    to: target,
                })
            }
        }
        Err(RepositoryError::NotFound) => Err(TransitionError::NotFound(id)),
        Err(err) => {
            error!("Could not move document {} to {}: {}", id, target, err);
            Err(TransitionError::PersistFailed(err))
        }
    }
}

fn load(services: &Services, id: Uuid) -> Result<DocumentRecord, TransitionError> {
    match services.documents.get(id) {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(TransitionError::NotFound(id)),
        Err(err) => {
            error!("Could not load document {}: {}", id, err);
            Err(TransitionError::LoadFailed(err))
        }
    }
}
