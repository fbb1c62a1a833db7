use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    schema::{document_translations, documents},
    types::{DocumentType, ProtectionLevel, ReviewStatus},
};

#[derive(Clone, Debug, Identifiable, Queryable)]
#[table_name = "documents"]
pub struct Document {
    pub id: Uuid,
    pub owner: i32,
    pub lesson: Uuid,
    pub original_file_name: String,
    pub stored_file_name: String,
    pub storage_path: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub document_type: DocumentType,
    pub protection_level: ProtectionLevel,
    pub review_status: ReviewStatus,
    pub rejection_reason: Option<String>,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "documents"]
pub struct NewDocument<'a> {
    pub id: Uuid,
    pub owner: i32,
    pub lesson: Uuid,
    pub original_file_name: &'a str,
    pub stored_file_name: &'a str,
    pub storage_path: &'a str,
    pub file_url: &'a str,
    pub file_size: i64,
    pub mime_type: &'a str,
    pub document_type: DocumentType,
    pub protection_level: ProtectionLevel,
    pub review_status: ReviewStatus,
}

#[derive(Clone, Debug, Queryable)]
pub struct DocumentTranslation {
    pub document: Uuid,
    pub locale: String,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "document_translations"]
pub struct NewDocumentTranslation<'a> {
    pub document: Uuid,
    pub locale: &'a str,
    pub title: &'a str,
    pub description: &'a str,
}
