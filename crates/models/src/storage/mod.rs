use failure::Fail;
use lectern_macros::From;
use std::io;

use crate::document::BlobPath;

mod fs;

pub use self::fs::FsStorage;

/// Blob storage in which document files are kept.
pub trait StorageGateway: Send + Sync {
    /// Store `data` under `path`, returning the URL it will be served from.
    fn put(&self, path: &BlobPath, data: &[u8]) -> Result<String, StorageError>;

    /// Remove the blob stored under `path`.
    fn delete(&self, path: &BlobPath) -> Result<(), StorageError>;
}

#[derive(Debug, Fail, From)]
pub enum StorageError {
    #[fail(display = "No blob stored at {}", _0)]
    NotFound(BlobPath),
    #[fail(display = "{} is not a valid storage path", _0)]
    InvalidPath(BlobPath),
    #[fail(display = "Storage I/O error: {}", _0)]
    Io(#[cause] #[from] io::Error),
    #[fail(display = "Storage unavailable: {}", _0)]
    Unavailable(String),
}
