//! Tests of the PostgreSQL backend.
//!
//! These tests run against the database named by `DATABASE_URL`, which is
//! emptied before every test. They are skipped when `DATABASE_URL` is not set.

use chrono::Utc;
use diesel::{RunQueryDsl, connection::SimpleConnection, prelude::*};
use diesel_migrations::{find_migrations_directory, run_pending_migrations_in_directory};
use failure::Error;
use lazy_static::lazy_static;
use lectern_models::{
    DocumentType,
    IngestError,
    ProtectionLevel,
    ReviewStatus,
    Role,
    Services,
    db::{Pool, PgBackend, schema::{document_translations, documents}},
    directory::{IdentityDirectory, LessonDirectory},
    document::{BlobPath, NewDocument, StatusUpdate},
    ingest,
    memory::MemoryStorage,
    repository::{DocumentRepository, RepositoryError},
    validation::{Policy, TranslationInput, Upload, validate_translations},
};
use r2d2_diesel::ConnectionManager;
use std::{sync::{Arc, Barrier, Mutex}, thread};
use uuid::Uuid;

const OWNER: i32 = 1;
const REVIEWER: i32 = 2;
const SECOND_REVIEWER: i32 = 3;

const LESSON: &str = "5f0c7b52-8f0e-4c5e-9a43-5d1b2b0c6a10";

/// Title which the test database refuses to store.
const POISONED_TITLE: &str = "Rejected by trigger";

struct Database {
    lock: Mutex<()>,
    pool: Pool,
}

impl Database {
    /// Obtain exclusive access to a freshly cleared and seeded database.
    fn lock<F>(&self, f: F)
    where
        F: FnOnce(Pool),
    {
        let _guard = match self.lock.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        };

        let conn = self.pool.get().expect("connection to test database");
        conn.batch_execute(CLEAR_DATABASE).expect("database to clear");
        conn.batch_execute(SEED).expect("database to seed");

        f(self.pool.clone())
    }
}

fn setup_db() -> Result<Option<Database>, Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => return Ok(None),
    };

    let conn = PgConnection::establish(&url)?;
    let migrations_dir = find_migrations_directory()?;
    run_pending_migrations_in_directory(&conn, &migrations_dir, &mut std::io::stderr())?;

    Ok(Some(Database {
        lock: Mutex::new(()),
        pool: Pool::new(ConnectionManager::new(url))?,
    }))
}

lazy_static! {
    static ref DATABASE: Option<Database> = setup_db()
        .expect("Cannot set up test database");
}

fn with_database<F: FnOnce(Pool)>(f: F) {
    match *DATABASE {
        Some(ref db) => db.lock(f),
        None => eprintln!("DATABASE_URL is not set, skipping"),
    }
}

fn lesson() -> Uuid {
    Uuid::parse_str(LESSON).unwrap()
}

fn policy() -> Policy {
    Policy::new(["en", "pl"].iter().map(|l| l.parse().unwrap()))
}

fn translations(title: &str) -> Vec<TranslationInput> {
    vec![
        TranslationInput {
            locale: "en".into(),
            title: title.into(),
            description: "How volcanoes erupt".into(),
        },
        TranslationInput {
            locale: "pl".into(),
            title: "Wulkany".into(),
            description: "Jak wybuchają wulkany".into(),
        },
    ]
}

fn new_document(title: &str) -> NewDocument {
    let stored = format!("{}.pdf", Uuid::new_v4());

    NewDocument {
        owner: OWNER,
        lesson: lesson(),
        original_file_name: "volcanoes.pdf".into(),
        storage_path: BlobPath::for_document(OWNER, lesson(), &stored),
        file_url: format!("https://lectern.test/blobs/{}", stored),
        stored_file_name: stored,
        file_size: 2048,
        mime_type: "application/pdf".into(),
        document_type: DocumentType::Pdf,
        protection_level: ProtectionLevel::Watermark,
        translations: validate_translations(&policy(), &translations(title)).unwrap(),
    }
}

fn update(
    expected: ReviewStatus,
    status: ReviewStatus,
    reason: Option<&str>,
    notes: Option<&str>,
    reviewer: i32,
) -> StatusUpdate {
    StatusUpdate {
        expected,
        status,
        rejection_reason: reason.map(str::to_string),
        review_notes: notes.map(str::to_string),
        reviewed_by: reviewer,
        reviewed_at: Utc::now(),
    }
}

fn count_rows(pool: &Pool) -> (i64, i64) {
    let conn = pool.get().unwrap();
    let documents = documents::table.count().get_result::<i64>(&*conn).unwrap();
    let translations = document_translations::table.count()
        .get_result::<i64>(&*conn).unwrap();
    (documents, translations)
}

#[test]
fn created_documents_can_be_read_back() {
    with_database(|pool| {
        let backend = PgBackend::new(pool.clone());

        let record = backend.create(new_document("Volcanoes")).unwrap();
        assert_eq!(record.review_status, ReviewStatus::PendingReview);
        assert_eq!(record.file_size, 2048);
        assert_eq!(record.translations.len(), 2);
        assert_eq!(
            record.translations.get(&"pl".parse().unwrap()).unwrap().title,
            "Wulkany",
        );

        assert_eq!(backend.get(record.id).unwrap(), Some(record));
        assert_eq!(count_rows(&pool), (1, 2));
    })
}

#[test]
fn failed_translation_insert_leaves_nothing_behind() {
    with_database(|pool| {
        let backend = PgBackend::new(pool.clone());

        match backend.create(new_document(POISONED_TITLE)) {
            Err(RepositoryError::Database(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(count_rows(&pool), (0, 0));
    })
}

#[test]
fn partially_persisted_ingest_is_compensated() {
    with_database(|pool| {
        let backend = Arc::new(PgBackend::new(pool.clone()));
        let storage = Arc::new(MemoryStorage::default());
        let services = Services {
            lessons: backend.clone(),
            identities: backend.clone(),
            storage: storage.clone(),
            documents: backend,
            policy: Arc::new(policy()),
        };

        let file = Upload {
            name: "volcanoes.pdf".into(),
            mime: Some("application/pdf".into()),
            content: b"%PDF-1.6\n".to_vec(),
        };

        let result = ingest(
            &services,
            file,
            ProtectionLevel::Full,
            &translations(POISONED_TITLE),
            lesson(),
            OWNER,
        );

        match result {
            Err(IngestError::PersistFailed(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(count_rows(&pool), (0, 0));
        assert!(storage.paths().is_empty());
    })
}

#[test]
fn status_update_requires_expected_status() {
    with_database(|pool| {
        let backend = PgBackend::new(pool);
        let record = backend.create(new_document("Volcanoes")).unwrap();

        let updated = backend.update_review_status(record.id, &update(
            ReviewStatus::PendingReview, ReviewStatus::UnderReview, None, None, REVIEWER,
        )).unwrap();
        assert_eq!(updated.review_status, ReviewStatus::UnderReview);
        assert_eq!(updated.reviewed_by, Some(REVIEWER));

        let stale = backend.update_review_status(record.id, &update(
            ReviewStatus::PendingReview,
            ReviewStatus::Rejected,
            Some("blurry scan"),
            None,
            SECOND_REVIEWER,
        ));
        match stale {
            Err(RepositoryError::StatusChanged(ReviewStatus::UnderReview)) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        let stored = backend.get(record.id).unwrap().unwrap();
        assert_eq!(stored.review_status, ReviewStatus::UnderReview);
        assert_eq!(stored.rejection_reason, None);
        assert_eq!(stored.reviewed_by, Some(REVIEWER));
    })
}

#[test]
fn only_one_concurrent_update_wins() {
    with_database(|pool| {
        let backend = PgBackend::new(pool);
        let id = backend.create(new_document("Volcanoes")).unwrap().id;
        let barrier = Arc::new(Barrier::new(2));

        let threads = [
            (ReviewStatus::Approved, None, REVIEWER),
            (ReviewStatus::Rejected, Some("blurry scan"), SECOND_REVIEWER),
        ].iter()
            .map(|&(status, reason, reviewer)| {
                let backend = backend.clone();
                let barrier = barrier.clone();
                let update = update(
                    ReviewStatus::PendingReview, status, reason, None, reviewer);

                thread::spawn(move || {
                    barrier.wait();
                    backend.update_review_status(id, &update)
                })
            })
            .collect::<Vec<_>>();

        let results = threads.into_iter()
            .map(|thread| thread.join().unwrap())
            .collect::<Vec<_>>();

        let winners = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(winners, 1);

        let stored = backend.get(id).unwrap().unwrap();
        for result in results {
            match result {
                Ok(record) => assert_eq!(record.review_status, stored.review_status),
                Err(RepositoryError::StatusChanged(status)) =>
                    assert_eq!(status, stored.review_status),
                Err(err) => panic!("unexpected error: {}", err),
            }
        }
    })
}

#[test]
fn approval_clears_reason_and_keeps_notes() {
    with_database(|pool| {
        let backend = PgBackend::new(pool);
        let record = backend.create(new_document("Volcanoes")).unwrap();

        let asked = backend.update_review_status(record.id, &update(
            ReviewStatus::PendingReview,
            ReviewStatus::NeedsAdditionalInfo,
            Some("Which edition is this?"),
            Some("Compare with the 2019 scan"),
            REVIEWER,
        )).unwrap();
        assert_eq!(asked.rejection_reason.as_deref(), Some("Which edition is this?"));
        assert_eq!(asked.review_notes.as_deref(), Some("Compare with the 2019 scan"));

        let approved = backend.update_review_status(record.id, &update(
            ReviewStatus::NeedsAdditionalInfo, ReviewStatus::Approved, None, None, SECOND_REVIEWER,
        )).unwrap();
        assert_eq!(approved.review_status, ReviewStatus::Approved);
        assert_eq!(approved.rejection_reason, None);
        assert_eq!(approved.review_notes.as_deref(), Some("Compare with the 2019 scan"));
        assert_eq!(approved.reviewed_by, Some(SECOND_REVIEWER));

        assert_eq!(backend.get(record.id).unwrap(), Some(approved));
    })
}

#[test]
fn missing_documents_are_reported() {
    with_database(|pool| {
        let backend = PgBackend::new(pool);
        let id = Uuid::new_v4();

        assert_eq!(backend.get(id).unwrap(), None);

        match backend.update_review_status(id, &update(
            ReviewStatus::PendingReview, ReviewStatus::Approved, None, None, REVIEWER,
        )) {
            Err(RepositoryError::NotFound) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        match backend.delete(id) {
            Err(RepositoryError::NotFound) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    })
}

#[test]
fn deleting_document_removes_translations() {
    with_database(|pool| {
        let backend = PgBackend::new(pool.clone());
        let record = backend.create(new_document("Volcanoes")).unwrap();

        backend.delete(record.id).unwrap();

        assert_eq!(backend.get(record.id).unwrap(), None);
        assert_eq!(count_rows(&pool), (0, 0));
    })
}

#[test]
fn directories_read_seeded_rows() {
    with_database(|pool| {
        let backend = PgBackend::new(pool);

        assert!(backend.lesson_exists(lesson()).unwrap());
        assert!(!backend.lesson_exists(Uuid::new_v4()).unwrap());
        assert_eq!(backend.role(OWNER).unwrap(), Some(Role::Owner));
        assert_eq!(backend.role(REVIEWER).unwrap(), Some(Role::Reviewer));
        assert_eq!(backend.role(99).unwrap(), None);
    })
}

const CLEAR_DATABASE: &str = r#"
do $$
declare
    stmt text;
begin
    select 'TRUNCATE '
        || string_agg(format('%I.%I', schemaname, tablename), ', ')
    into stmt
    from pg_tables
    where schemaname = 'public'
      and tablename not like '__diesel_%';

    execute stmt;

    for stmt in (
        select 'alter sequence ' || relname || ' restart with 1;'
        from pg_class
        where relkind = 'S'
    ) loop
        execute stmt;
    end loop;
end; $$
"#;

const SEED: &str = r#"
insert into users (id, name, role) values
    (1, 'Owner', 'owner'),
    (2, 'Reviewer', 'reviewer'),
    (3, 'Second reviewer', 'reviewer');

insert into lessons (id, title) values
    ('5f0c7b52-8f0e-4c5e-9a43-5d1b2b0c6a10', 'Volcanoes');

create or replace function reject_poisoned_translations() returns trigger as $$
begin
    if new.title = 'Rejected by trigger' then
        raise exception 'translation rejected';
    end if;
    return new;
end; $$ language plpgsql;

drop trigger if exists reject_poisoned_translations on document_translations;

create trigger reject_poisoned_translations
    before insert on document_translations
    for each row execute procedure reject_poisoned_translations();
"#;
