use diesel_derive_enum::DbEnum;
use failure::Fail;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Where a document is in its review.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Review_status"]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    /// Document was just ingested and nobody has looked at it yet.
    PendingReview,
    /// A reviewer has picked the document up.
    UnderReview,
    Approved,
    Rejected,
    /// The owner is asked to upload a different file.
    NeedsReplacement,
    /// The owner is asked to provide more information.
    NeedsAdditionalInfo,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 6] = [
        ReviewStatus::PendingReview,
        ReviewStatus::UnderReview,
        ReviewStatus::Approved,
        ReviewStatus::Rejected,
        ReviewStatus::NeedsReplacement,
        ReviewStatus::NeedsAdditionalInfo,
    ];

    /// Must a reviewer explain why a document is moved into this status?
    pub fn requires_reason(self) -> bool {
        match self {
            ReviewStatus::Rejected
            | ReviewStatus::NeedsReplacement
            | ReviewStatus::NeedsAdditionalInfo => true,
            _ => false,
        }
    }

    /// Is this a final review decision?
    pub fn is_decision(self) -> bool {
        match self {
            ReviewStatus::PendingReview | ReviewStatus::UnderReview => false,
            _ => true,
        }
    }

    /// Can a document in this status be moved into `target`?
    ///
    /// Only the review graph is checked here; moving a document into the
    /// status it already has is handled separately, as a no-op.
    pub fn can_become(self, target: ReviewStatus) -> bool {
        match (self, target) {
            (_, ReviewStatus::PendingReview) => false,
            (ReviewStatus::PendingReview, _) => true,
            (ReviewStatus::UnderReview, target) => target.is_decision(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::PendingReview => "PENDING_REVIEW",
            ReviewStatus::UnderReview => "UNDER_REVIEW",
            ReviewStatus::Approved => "APPROVED",
            ReviewStatus::Rejected => "REJECTED",
            ReviewStatus::NeedsReplacement => "NEEDS_REPLACEMENT",
            ReviewStatus::NeedsAdditionalInfo => "NEEDS_ADDITIONAL_INFO",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = ParseEnumError;

    /// Parse a status, accepting `UNDER_REVIEW` as well as `under-review`.
    fn from_str(v: &str) -> Result<Self, Self::Err> {
        let normalized = v.trim().replace('-', "_").to_ascii_uppercase();

        ReviewStatus::ALL.iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseEnumError("review status", v.to_string()))
    }
}

#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Protection_level"]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtectionLevel {
    None,
    /// Document is served with a watermark applied.
    Watermark,
    /// Document is only ever displayed, never downloaded.
    Full,
}

impl ProtectionLevel {
    /// Does this level require the file to be a PDF?
    pub fn requires_pdf(self) -> bool {
        self != ProtectionLevel::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProtectionLevel::None => "NONE",
            ProtectionLevel::Watermark => "WATERMARK",
            ProtectionLevel::Full => "FULL",
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for ProtectionLevel {
    type Err = ParseEnumError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        match v.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(ProtectionLevel::None),
            "WATERMARK" => Ok(ProtectionLevel::Watermark),
            "FULL" => Ok(ProtectionLevel::Full),
            _ => Err(ParseEnumError("protection level", v.to_string())),
        }
    }
}

/// Broad classification of a document's file, derived from its MIME type.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "Document_type"]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Pdf,
    Word,
    Excel,
    Image,
    Other,
}

impl DocumentType {
    pub fn from_mime(mime: &str) -> DocumentType {
        match mime {
            "application/pdf" => DocumentType::Pdf,
            "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                => DocumentType::Word,
            "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                => DocumentType::Excel,
            _ if mime.starts_with("image/") => DocumentType::Image,
            _ => DocumentType::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Pdf => "PDF",
            DocumentType::Word => "WORD",
            DocumentType::Excel => "EXCEL",
            DocumentType::Image => "IMAGE",
            DocumentType::Other => "OTHER",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Role of a user, as far as documents are concerned.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[DieselType = "User_role"]
#[PgType = "user_role"]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Uploads documents and sees their own.
    Owner,
    /// Reviews documents.
    Reviewer,
    /// Reviews and administers documents.
    Admin,
}

impl Role {
    /// Can this role make review decisions?
    pub fn can_review(self) -> bool {
        self != Role::Owner
    }
}

impl fmt::Display for Role {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            Role::Owner => "owner",
            Role::Reviewer => "reviewer",
            Role::Admin => "admin",
        })
    }
}

#[derive(Clone, Debug, Eq, Fail, PartialEq)]
#[fail(display = "{:?} is not a valid {}", _1, _0)]
pub struct ParseEnumError(&'static str, String);

#[cfg(test)]
mod tests {
    use super::*;
    use super::ReviewStatus::*;

    #[test]
    fn review_graph() {
        for &target in &ReviewStatus::ALL {
            assert_eq!(PendingReview.can_become(target), target != PendingReview);
            assert!(!target.can_become(PendingReview));
        }

        assert!(UnderReview.can_become(Approved));
        assert!(UnderReview.can_become(NeedsAdditionalInfo));
        assert!(!UnderReview.can_become(UnderReview));

        for &from in &[Approved, Rejected, NeedsReplacement, NeedsAdditionalInfo] {
            for &target in &ReviewStatus::ALL {
                assert!(!from.can_become(target), "{} -> {}", from, target);
            }
        }
    }

    #[test]
    fn reason_gated_statuses() {
        let gated = ReviewStatus::ALL.iter()
            .copied()
            .filter(|s| s.requires_reason())
            .collect::<Vec<_>>();

        assert_eq!(gated, [Rejected, NeedsReplacement, NeedsAdditionalInfo]);
    }

    #[test]
    fn parse_review_status() {
        assert_eq!("UNDER_REVIEW".parse(), Ok(UnderReview));
        assert_eq!("needs-additional-info".parse(), Ok(NeedsAdditionalInfo));
        assert!("archived".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn statuses_serialize_in_wire_form() {
        assert_eq!(
            serde_json::to_string(&NeedsReplacement).unwrap(),
            "\"NEEDS_REPLACEMENT\"",
        );
        assert_eq!(
            serde_json::from_str::<ProtectionLevel>("\"WATERMARK\"").unwrap(),
            ProtectionLevel::Watermark,
        );
    }

    #[test]
    fn classify_mime_types() {
        assert_eq!(DocumentType::from_mime("application/pdf"), DocumentType::Pdf);
        assert_eq!(DocumentType::from_mime("application/msword"), DocumentType::Word);
        assert_eq!(DocumentType::from_mime(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            DocumentType::Excel);
        assert_eq!(DocumentType::from_mime("image/png"), DocumentType::Image);
        assert_eq!(DocumentType::from_mime("application/zip"), DocumentType::Other);
    }
}
