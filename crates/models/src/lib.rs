//! Lifecycle of lesson documents: ingestion, review, presentation and
//! removal.

#[macro_use] extern crate diesel;

#[cfg(not(debug_assertions))]
#[macro_use]
extern crate diesel_migrations;

mod config;
mod services;

pub mod db;
pub mod directory;
pub mod document;
pub mod ingest;
pub mod lifecycle;
pub mod memory;
pub mod presentation;
pub mod repository;
pub mod review;
pub mod storage;
pub mod validation;

pub use self::{
    config::{Config, ConfigError, Directory, DirectoryUser, Documents, Storage},
    db::types::{DocumentType, ProtectionLevel, ReviewStatus, Role},
    document::{BlobPath, DocumentRecord, Translation, Translations, UserId},
    ingest::{IngestError, ingest},
    lifecycle::{DeleteError, delete_document},
    presentation::{Audience, Badge, View, ViewError, present, view_document},
    review::{Transition, TransitionError, transition},
    services::{ConfigureError, Services},
};
