use log::debug;
use std::{fs, io::{self, Write}, path::{Component, Path, PathBuf}};
use tempfile::NamedTempFile;

use crate::document::BlobPath;
use super::{StorageError, StorageGateway};

/// Storage keeping blobs as files in a local directory.
///
/// Files are first written to a temporary file in their target directory and
/// then moved into place, so that a blob is either fully written or absent.
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
    base_url: String,
}

impl FsStorage {
    pub fn new<P: Into<PathBuf>>(root: P, base_url: &str) -> FsStorage {
        FsStorage {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, path: &BlobPath) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.as_str());

        let normal = relative.components().all(|c| match c {
            Component::Normal(_) => true,
            _ => false,
        });

        if !normal || path.as_str().is_empty() {
            return Err(StorageError::InvalidPath(path.clone()));
        }

        Ok(self.root.join(relative))
    }
}

impl StorageGateway for FsStorage {
    fn put(&self, path: &BlobPath, data: &[u8]) -> Result<String, StorageError> {
        let target = self.resolve(path)?;
        let dir = target.parent().unwrap_or(&self.root);

        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(data)?;
        file.as_file().sync_all()?;
        file.persist(&target).map_err(|err| err.error)?;

        debug!("Wrote {} bytes to {}", data.len(), target.display());

        Ok(format!("{}/{}", self.base_url, path))
    }

    fn delete(&self, path: &BlobPath) -> Result<(), StorageError> {
        let target = self.resolve(path)?;

        match fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound =>
                Err(StorageError::NotFound(path.clone())),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn path() -> BlobPath {
        BlobPath::for_document(3, Uuid::new_v4(), "file.pdf")
    }

    #[test]
    fn put_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path(), "https://lectern.local/blobs/");
        let path = path();

        let url = storage.put(&path, b"%PDF-1.4").unwrap();
        assert_eq!(url, format!("https://lectern.local/blobs/{}", path));
        assert_eq!(fs::read(dir.path().join(path.as_str())).unwrap(), b"%PDF-1.4");

        storage.delete(&path).unwrap();
        assert!(!dir.path().join(path.as_str()).exists());
    }

    #[test]
    fn deleting_missing_blob_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path(), "http://localhost");

        assert!(matches!(storage.delete(&path()), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn paths_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path(), "http://localhost");
        let path = BlobPath::from_stored("../outside".to_string());

        assert!(matches!(
            storage.put(&path, b"data"),
            Err(StorageError::InvalidPath(_)),
        ));
    }
}
