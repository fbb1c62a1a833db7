use actix_web::{
    HttpResponse,
    Responder,
    http::StatusCode,
    web::{self, Data, Json, Path, ServiceConfig},
};
use failure::Fail;
use lectern_error::ApiError;
use lectern_models::{
    Audience,
    ProtectionLevel,
    ReviewStatus,
    Services,
    View,
    ingest,
    lifecycle,
    presentation::{audience_of, present, view_document},
    transition,
    validation::{MAX_FILE_SIZE, TranslationInput, Upload},
};
use lectern_web::{Actor, Created};
use log::info;
use serde::{Deserialize, de::{Deserializer, Error, Visitor}};
use std::fmt;
use uuid::Uuid;

use crate::Result;

/// Largest accepted request body: a base64-encoded file of the largest
/// allowed size, plus room for metadata.
const MAX_BODY: usize = (MAX_FILE_SIZE as usize / 3 + 1) * 4 + 64 * 1024;

/// Configure routes.
pub fn configure(app: &mut ServiceConfig) {
    app
        .service(web::resource("/documents")
            .data(web::JsonConfig::default().limit(MAX_BODY))
            .route(web::post().to(create_document))
        )
        .service(web::resource("/documents/{id}")
            .route(web::get().to(get_document))
            .route(web::delete().to(delete_document))
        )
        .route("/documents/{id}/review", web::post().to(review_document))
    ;
}

#[derive(Deserialize)]
struct NewDocument {
    lesson: Uuid,
    protection: ProtectionLevel,
    translations: Vec<TranslationInput>,
    file: FileData,
}

#[derive(Deserialize)]
struct FileData {
    name: String,
    #[serde(default)]
    mime: Option<String>,
    /// Base64-encoded contents.
    #[serde(deserialize_with = "de_base64")]
    content: Vec<u8>,
}

/// Upload a new document.
///
/// ## Method
///
/// ```text
/// POST /documents
/// ```
fn create_document(services: Data<Services>, actor: Actor, data: Json<NewDocument>)
-> Result<impl Responder> {
    let audience = audience_of(&services, actor.id())?;
    let NewDocument { lesson, protection, translations, file } = data.into_inner();

    let upload = Upload {
        name: file.name,
        mime: file.mime,
        content: file.content,
    };

    let record = ingest(&services, upload, protection, &translations, lesson, actor.id())?;
    let view = present(&record, audience);

    Ok(Created(format!("/api/v1/documents/{}", view.id()), Json(view)))
}

/// Get a document by ID.
///
/// ## Method
///
/// ```text
/// GET /documents/:id
/// ```
fn get_document(services: Data<Services>, actor: Actor, id: Path<Uuid>)
-> Result<Json<View>> {
    Ok(Json(view_document(&services, *id, actor.id())?))
}

#[derive(Deserialize)]
struct Review {
    status: ReviewStatus,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Make a review decision.
///
/// ## Method
///
/// ```text
/// POST /documents/:id/review
/// ```
fn review_document(
    services: Data<Services>,
    actor: Actor,
    id: Path<Uuid>,
    data: Json<Review>,
) -> Result<Json<View>> {
    let audience = audience_of(&services, actor.id())?;

    if audience == Audience::Owner {
        return Err(ReviewForbidden.into());
    }

    let result = transition(
        &services,
        *id,
        data.status,
        data.reason.as_deref(),
        data.notes.as_deref(),
        actor.id(),
    )?;

    Ok(Json(present(&result.record, audience)))
}

/// Delete a document and its file.
///
/// ## Method
///
/// ```text
/// DELETE /documents/:id
/// ```
fn delete_document(services: Data<Services>, actor: Actor, id: Path<Uuid>)
-> Result<HttpResponse> {
    if audience_of(&services, actor.id())? != Audience::Admin {
        return Err(DeleteForbidden.into());
    }

    lifecycle::delete_document(&services, *id)?;
    info!("User {} deleted document {}", actor.id(), *id);

    Ok(HttpResponse::new(StatusCode::NO_CONTENT))
}

#[derive(ApiError, Debug, Fail)]
#[fail(display = "Only reviewers can make review decisions")]
#[api(code = "document:review:forbidden", status = "FORBIDDEN")]
struct ReviewForbidden;

#[derive(ApiError, Debug, Fail)]
#[fail(display = "Only administrators can delete documents")]
#[api(code = "document:delete:forbidden", status = "FORBIDDEN")]
struct DeleteForbidden;

/// Deserialize base64-encoded binary data.
fn de_base64<'de, D>(d: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    d.deserialize_str(Base64Visitor)
}

struct Base64Visitor;

impl<'de> Visitor<'de> for Base64Visitor {
    type Value = Vec<u8>;

    fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "base64-encoded binary data")
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Vec<u8>, E>
    where
        E: Error,
    {
        base64::decode(v).map_err(E::custom)
    }
}
