use chrono::Utc;
use diesel::{prelude::*, result::Error as DbError};
use lectern_i18n::LanguageTag;
use std::convert::TryFrom;
use uuid::Uuid;

use crate::{
    db::{
        Pool,
        PooledConnection,
        models as db,
        schema::{document_translations, documents, lessons, users},
        types::{ReviewStatus, Role},
    },
    directory::{DirectoryError, IdentityDirectory, LessonDirectory},
    document::{
        BlobPath,
        DocumentRecord,
        NewDocument,
        StatusUpdate,
        Translation,
        Translations,
        UserId,
    },
    repository::{DocumentRepository, RepositoryError},
};

/// Document repository and directories backed by PostgreSQL.
#[derive(Clone)]
pub struct PgBackend {
    pool: Pool,
}

impl PgBackend {
    pub fn new(pool: Pool) -> PgBackend {
        PgBackend { pool }
    }

    fn connection(&self) -> Result<PooledConnection, r2d2::Error> {
        self.pool.get()
    }
}

impl DocumentRepository for PgBackend {
    fn create(&self, document: NewDocument) -> Result<DocumentRecord, RepositoryError> {
        let conn = self.connection()?;
        let id = Uuid::new_v4();
        let file_size = i64::try_from(document.file_size)
            .map_err(|_| RepositoryError::Corrupt(
                format!("file size {} out of range", document.file_size)))?;

        conn.transaction::<_, RepositoryError, _>(|| {
            let row = diesel::insert_into(documents::table)
                .values(&db::NewDocument {
                    id,
                    owner: document.owner,
                    lesson: document.lesson,
                    original_file_name: &document.original_file_name,
                    stored_file_name: &document.stored_file_name,
                    storage_path: document.storage_path.as_str(),
                    file_url: &document.file_url,
                    file_size,
                    mime_type: &document.mime_type,
                    document_type: document.document_type,
                    protection_level: document.protection_level,
                    review_status: ReviewStatus::PendingReview,
                })
                .get_result::<db::Document>(&*conn)?;

            let translations = document.translations.iter()
                .map(|(locale, translation)| db::NewDocumentTranslation {
                    document: id,
                    locale: locale.as_str(),
                    title: &translation.title,
                    description: &translation.description,
                })
                .collect::<Vec<_>>();

            let translations = if translations.is_empty() {
                Vec::new()
            } else {
                diesel::insert_into(document_translations::table)
                    .values(&translations)
                    .get_results::<db::DocumentTranslation>(&*conn)?
            };

            record_from_db(row, translations)
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepositoryError> {
        let conn = self.connection()?;

        let row = match documents::table
            .filter(documents::id.eq(id))
            .get_result::<db::Document>(&*conn)
            .optional()?
        {
            Some(row) => row,
            None => return Ok(None),
        };

        let translations = translations_of(&conn, id)?;

        record_from_db(row, translations).map(Some)
    }

    fn update_review_status(&self, id: Uuid, update: &StatusUpdate)
    -> Result<DocumentRecord, RepositoryError> {
        let conn = self.connection()?;

        conn.transaction::<_, RepositoryError, _>(|| {
            let target = documents::table
                .filter(documents::id.eq(id))
                .filter(documents::review_status.eq(update.expected));

            let fields = (
                documents::review_status.eq(update.status),
                documents::rejection_reason.eq(update.rejection_reason.as_deref()),
                documents::reviewed_by.eq(Some(update.reviewed_by)),
                documents::reviewed_at.eq(Some(update.reviewed_at)),
                documents::updated_at.eq(Utc::now()),
            );

            let row = match update.review_notes {
                Some(ref notes) => diesel::update(target)
                    .set((fields, documents::review_notes.eq(Some(notes.as_str()))))
                    .get_result::<db::Document>(&*conn)
                    .optional()?,
                None => diesel::update(target)
                    .set(fields)
                    .get_result::<db::Document>(&*conn)
                    .optional()?,
            };

            match row {
                Some(row) => {
                    let translations = translations_of(&conn, id)?;
                    record_from_db(row, translations)
                }
                None => {
                    let current = documents::table
                        .filter(documents::id.eq(id))
                        .select(documents::review_status)
                        .get_result::<ReviewStatus>(&*conn)
                        .optional()?;

                    Err(match current {
                        Some(status) => RepositoryError::StatusChanged(status),
                        None => RepositoryError::NotFound,
                    })
                }
            }
        })
    }

    fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let conn = self.connection()?;

        // Translations are removed by ON DELETE CASCADE.
        let deleted = diesel::delete(documents::table.filter(documents::id.eq(id)))
            .execute(&*conn)?;

        if deleted == 0 {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}

impl LessonDirectory for PgBackend {
    fn lesson_exists(&self, lesson: Uuid) -> Result<bool, DirectoryError> {
        let conn = self.connection()?;

        let count = lessons::table
            .filter(lessons::id.eq(lesson))
            .count()
            .get_result::<i64>(&*conn)?;

        Ok(count > 0)
    }
}

impl IdentityDirectory for PgBackend {
    fn role(&self, user: UserId) -> Result<Option<Role>, DirectoryError> {
        let conn = self.connection()?;

        users::table
            .filter(users::id.eq(user))
            .select(users::role)
            .get_result::<Role>(&*conn)
            .optional()
            .map_err(Into::into)
    }
}

fn translations_of(conn: &PooledConnection, id: Uuid)
-> Result<Vec<db::DocumentTranslation>, DbError> {
    document_translations::table
        .filter(document_translations::document.eq(id))
        .get_results(&**conn)
}

fn record_from_db(row: db::Document, rows: Vec<db::DocumentTranslation>)
-> Result<DocumentRecord, RepositoryError> {
    let mut translations = Translations::default();

    for row in rows {
        let locale = row.locale.parse::<LanguageTag>()
            .map_err(|err| RepositoryError::Corrupt(err.to_string()))?;

        translations.insert(locale, Translation {
            title: row.title,
            description: row.description,
        });
    }

    let file_size = u64::try_from(row.file_size)
        .map_err(|_| RepositoryError::Corrupt(
            format!("negative file size {}", row.file_size)))?;

    Ok(DocumentRecord {
        id: row.id,
        owner: row.owner,
        lesson: row.lesson,
        original_file_name: row.original_file_name,
        stored_file_name: row.stored_file_name,
        storage_path: BlobPath::from_stored(row.storage_path),
        file_url: row.file_url,
        file_size,
        mime_type: row.mime_type,
        document_type: row.document_type,
        protection_level: row.protection_level,
        translations,
        review_status: row.review_status,
        rejection_reason: row.rejection_reason,
        review_notes: row.review_notes,
        reviewed_by: row.reviewed_by,
        reviewed_at: row.reviewed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
