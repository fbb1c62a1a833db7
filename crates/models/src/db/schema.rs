table! {
    document_translations (document, locale) {
        document -> Uuid,
        locale -> Varchar,
        title -> Varchar,
        description -> Text,
    }
}

table! {
    documents (id) {
        id -> Uuid,
        owner -> Int4,
        lesson -> Uuid,
        original_file_name -> Varchar,
        stored_file_name -> Varchar,
        storage_path -> Varchar,
        file_url -> Varchar,
        file_size -> Int8,
        mime_type -> Varchar,
        document_type -> crate::db::types::Document_type,
        protection_level -> crate::db::types::Protection_level,
        review_status -> crate::db::types::Review_status,
        rejection_reason -> Nullable<Text>,
        review_notes -> Nullable<Text>,
        reviewed_by -> Nullable<Int4>,
        reviewed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    lessons (id) {
        id -> Uuid,
        title -> Varchar,
    }
}

table! {
    users (id) {
        id -> Int4,
        name -> Varchar,
        role -> crate::db::types::User_role,
    }
}

joinable!(document_translations -> documents (document));
joinable!(documents -> lessons (lesson));
joinable!(documents -> users (owner));

allow_tables_to_appear_in_same_query!(
    document_translations,
    documents,
    lessons,
    users,
);
