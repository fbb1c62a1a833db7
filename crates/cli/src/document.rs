//! Document management.

use failure::{Error, format_err};
use lectern_models::{
    Audience,
    DocumentRecord,
    ProtectionLevel,
    ReviewStatus,
    Services,
    UserId,
    View,
    presentation::{OwnerView, ReviewerView, Summary},
    validation::{TranslationInput, Upload},
};
use serde::Deserialize;
use std::path::PathBuf;
use structopt::StructOpt;
use uuid::Uuid;

use crate::{Config, Result, util::print_table};

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Show a document
    #[structopt(name = "show")]
    Show {
        /// Document's ID
        document: Uuid,
        /// Show the document as this user would see it
        #[structopt(long = "as")]
        actor: Option<UserId>,
    },
    /// Upload a new document
    #[structopt(name = "new")]
    New(NewOpts),
    /// Change a document's review status
    #[structopt(name = "review")]
    Review(ReviewOpts),
    /// Delete a document and its file
    #[structopt(name = "delete")]
    Delete {
        /// Document's ID
        document: Uuid,
    },
}

#[derive(StructOpt)]
pub struct NewOpts {
    /// Lesson the document is attached to
    #[structopt(long = "lesson")]
    lesson: Uuid,
    /// ID of the uploading user
    #[structopt(long = "owner")]
    owner: UserId,
    /// Protection level: none, watermark, or full
    #[structopt(long = "protection", default_value = "none")]
    protection: ProtectionLevel,
    /// Content type of the file, guessed from its name if omitted
    #[structopt(long = "mime")]
    mime: Option<String>,
    /// TOML file with a [[translation]] table for each locale
    #[structopt(long = "translations", parse(from_os_str))]
    translations: PathBuf,
    /// File to upload
    #[structopt(parse(from_os_str))]
    file: PathBuf,
}

#[derive(StructOpt)]
pub struct ReviewOpts {
    /// Document's ID
    document: Uuid,
    /// New review status
    status: ReviewStatus,
    /// ID of the reviewing user
    #[structopt(long = "reviewer")]
    reviewer: UserId,
    /// Reason shown to the owner
    #[structopt(long = "reason")]
    reason: Option<String>,
    /// Notes visible only to reviewers
    #[structopt(long = "notes")]
    notes: Option<String>,
}

#[derive(Deserialize)]
struct TranslationFile {
    #[serde(default)]
    translation: Vec<TranslationInput>,
}

pub fn main(cfg: &Config, opts: Opts) -> Result<()> {
    let services = Services::configure(&cfg.model)?;

    match opts.command {
        Command::Show { document, actor } => show(&services, document, actor),
        Command::New(opts) => new(&services, opts),
        Command::Review(opts) => review(&services, opts),
        Command::Delete { document } => delete(&services, document),
    }
}

fn show(services: &Services, id: Uuid, actor: Option<UserId>) -> Result<()> {
    let view = match actor {
        Some(actor) => lectern_models::view_document(services, id, actor)?,
        None => {
            let record = services.documents.get(id)?
                .ok_or_else(|| format_err!("No document with ID {}", id))?;
            lectern_models::present(&record, Audience::Admin)
        }
    };

    print_view(&view);

    Ok(())
}

fn new(services: &Services, opts: NewOpts) -> Result<()> {
    let translations = read_translations(&opts.translations)?;

    let name = opts.file.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format_err!("{} has no usable file name", opts.file.display()))?
        .to_string();
    let content = std::fs::read(&opts.file)?;

    let file = Upload { name, mime: opts.mime, content };

    let record = lectern_models::ingest(
        services,
        file,
        opts.protection,
        &translations,
        opts.lesson,
        opts.owner,
    )?;

    print_record(&record);

    Ok(())
}

fn read_translations(path: &PathBuf) -> Result<Vec<TranslationInput>, Error> {
    let data = std::fs::read(path)?;
    let file: TranslationFile = toml::from_slice(&data)?;
    Ok(file.translation)
}

fn review(services: &Services, opts: ReviewOpts) -> Result<()> {
    let role = services.identities.role(opts.reviewer)?
        .ok_or_else(|| format_err!("No user with ID {}", opts.reviewer))?;

    if !role.can_review() {
        return Err(format_err!("User {} is not allowed to review documents", opts.reviewer));
    }

    let result = lectern_models::transition(
        services,
        opts.document,
        opts.status,
        opts.reason.as_ref().map(String::as_str),
        opts.notes.as_ref().map(String::as_str),
        opts.reviewer,
    )?;

    if !result.changed {
        println!("Document was already {}", result.record.review_status);
    }

    print_record(&result.record);

    Ok(())
}

fn delete(services: &Services, id: Uuid) -> Result<()> {
    let record = lectern_models::delete_document(services, id)?;
    println!("Deleted {} ({})", record.id, record.original_file_name);
    Ok(())
}

fn print_record(record: &DocumentRecord) {
    print_view(&lectern_models::present(record, Audience::Admin));
}

fn print_view(view: &View) {
    match view {
        View::Owner(OwnerView { document, review_status, rejection_reason }) => {
            print_summary(document);
            println!("Status:      {}", review_status.label);
            if let Some(reason) = rejection_reason {
                println!("Reason:      {}", reason);
            }
            print_translations(document);
        }
        View::Reviewer(view) => print_reviewer_view(view),
    }
}

fn print_reviewer_view(view: &ReviewerView) {
    print_summary(&view.document);
    println!("Owner:       {}", view.owner);
    println!("Stored as:   {}", view.stored_file_name);
    println!("Status:      {} ({})", view.review_status.label, view.review_status.status);
    if let Some(ref reason) = view.rejection_reason {
        println!("Reason:      {}", reason);
    }
    if let Some(ref notes) = view.review_notes {
        println!("Notes:       {}", notes);
    }
    if let (Some(by), Some(at)) = (view.reviewed_by, view.reviewed_at) {
        println!("Reviewed:    by {} at {}", by, at);
    }
    print_translations(&view.document);
}

fn print_summary(document: &Summary) {
    println!("ID:          {}", document.id);
    println!("Lesson:      {}", document.lesson);
    println!("File:        {}", document.original_file_name);
    println!("URL:         {}", document.file_url);
    println!("Size:        {} bytes", document.file_size_bytes);
    println!("Type:        {} ({})", document.document_type, document.mime_type);
    println!("Protection:  {}", document.protection_level);
}

fn print_translations(document: &Summary) {
    let rows = document.translations.iter()
        .map(|(locale, t)| (locale.to_string(), t.title.as_str(), t.description.as_str()))
        .collect::<Vec<_>>();

    println!();
    print_table(("Locale", "Title", "Description"), rows);
}
