use failure::Fail;
use log::debug;
use mime::Mime;

use crate::db::types::{DocumentType, ProtectionLevel};
use super::Policy;

/// A file as received from its owner.
#[derive(Clone, Debug)]
pub struct Upload {
    /// File name as given by the client.
    pub name: String,
    /// Content type declared by the client, if any.
    pub mime: Option<String>,
    pub content: Vec<u8>,
}

/// Properties of an upload which passed [`validate_file`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidatedFile {
    /// Sanitized original file name.
    pub name: String,
    /// Normalized MIME type.
    pub mime: String,
    /// Canonical file extension for `mime`.
    pub extension: &'static str,
    pub document_type: DocumentType,
    pub size: u64,
}

#[derive(Clone, Debug, Eq, Fail, PartialEq)]
pub enum FileError {
    #[fail(display = "File is too large ({} bytes, at most {} allowed)", size, limit)]
    TooLarge {
        size: u64,
        limit: u64,
    },
    #[fail(display = "File is empty")]
    Empty,
    #[fail(display = "Files of type {} can't be uploaded with protection level {}",
        mime, protection)]
    UnsupportedType {
        mime: String,
        protection: ProtectionLevel,
    },
}

struct Format {
    mime: &'static str,
    extensions: &'static [&'static str],
}

/// Formats documents may be uploaded in.
static FORMATS: &[Format] = &[
    Format { mime: "application/pdf", extensions: &["pdf"] },
    Format { mime: "application/msword", extensions: &["doc"] },
    Format {
        mime: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        extensions: &["docx"],
    },
    Format { mime: "application/vnd.ms-excel", extensions: &["xls"] },
    Format {
        mime: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        extensions: &["xlsx"],
    },
    Format { mime: "application/vnd.ms-powerpoint", extensions: &["ppt"] },
    Format {
        mime: "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        extensions: &["pptx"],
    },
    Format { mime: "text/plain", extensions: &["txt", "text"] },
    Format { mime: "application/zip", extensions: &["zip"] },
    Format { mime: "application/x-rar-compressed", extensions: &["rar"] },
    Format { mime: "application/vnd.rar", extensions: &["rar"] },
    Format { mime: "application/x-7z-compressed", extensions: &["7z"] },
    Format { mime: "application/x-tar", extensions: &["tar"] },
    Format { mime: "application/gzip", extensions: &["gz", "tgz"] },
];

/// Non-standard MIME types some clients send, and their standard forms.
static ALIASES: &[(&str, &str)] = &[
    ("application/x-zip-compressed", "application/zip"),
];

/// Magic bytes every PDF file starts with.
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Check an upload against `policy` and the requested protection level.
///
/// Size is checked before type, so an oversized file is reported as such
/// regardless of its format.
pub fn validate_file(policy: &Policy, upload: &Upload, protection: ProtectionLevel)
-> Result<ValidatedFile, FileError> {
    let size = upload.content.len() as u64;

    if size > policy.max_file_size() {
        return Err(FileError::TooLarge { size, limit: policy.max_file_size() });
    }

    if size == 0 {
        return Err(FileError::Empty);
    }

    let mime = resolve_mime(upload);
    let unsupported = || FileError::UnsupportedType {
        mime: mime.clone(),
        protection,
    };

    let format = FORMATS.iter()
        .find(|format| format.mime == mime)
        .ok_or_else(unsupported)?;

    if protection.requires_pdf()
    && (mime != "application/pdf" || !upload.content.starts_with(PDF_SIGNATURE)) {
        debug!("Rejecting {} upload {:?} for protection level {}",
            mime, upload.name, protection);
        return Err(unsupported());
    }

    let extension = format.extensions[0];

    Ok(ValidatedFile {
        name: sanitize_name(&upload.name, extension),
        document_type: DocumentType::from_mime(&mime),
        mime,
        extension,
        size,
    })
}

/// Determine MIME type of an upload.
///
/// The declared type is used when it is present and specific. Otherwise the
/// type is guessed from the file's extension.
fn resolve_mime(upload: &Upload) -> String {
    let declared = upload.mime.as_ref()
        .and_then(|mime| mime.trim().parse::<Mime>().ok())
        .map(|mime| essence(&mime))
        .map(unalias)
        .filter(|mime| mime != "application/octet-stream");

    if let Some(mime) = declared {
        return mime;
    }

    let extension = upload.name.rsplit('.')
        .next()
        .filter(|ext| ext.len() < upload.name.len())
        .map(str::to_ascii_lowercase);

    extension
        .and_then(|ext| FORMATS.iter().find(|f| f.extensions.contains(&ext.as_str())))
        .map(|format| format.mime.to_string())
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}

fn unalias(mime: String) -> String {
    ALIASES.iter()
        .find(|(alias, _)| *alias == mime)
        .map_or(mime, |(_, standard)| standard.to_string())
}

/// MIME type without parameters, in lower case.
fn essence(mime: &Mime) -> String {
    let essence = match mime.suffix() {
        Some(suffix) => format!("{}/{}+{}", mime.type_(), mime.subtype(), suffix),
        None => format!("{}/{}", mime.type_(), mime.subtype()),
    };
    essence.to_ascii_lowercase()
}

/// Strip directories and control characters from a client-supplied name.
fn sanitize_name(name: &str, extension: &str) -> String {
    let name = name.rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();
    let name = name.trim();

    if name.is_empty() || name == "." || name == ".." {
        format!("document.{}", extension)
    } else {
        name.to_string()
    }
}
