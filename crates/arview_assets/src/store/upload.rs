//! Adding user files to the store.
//!
//! Uploads are two-phase: a record with an empty reference is created first
//! so the id exists, then the bytes are written under that id and the record
//! is patched to point at them.  If the second phase fails the half-made
//! record is removed again.

use std::path::Path;

use thiserror::Error;

use super::record::{ModelId, ModelPatch, ModelRecord, NewModel};
use super::{AssetStore, StoreError};
use crate::reference::extension_of;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["glb", "gltf", "obj", "fbx"];
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("'.{0}' files are not accepted (use one of: glb, gltf, obj, fbx)")]
    UnsupportedExtension(String),
    #[error("file is {size} bytes; the limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },
    #[error("a model name is required")]
    EmptyName,
    #[error("could not read the file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original file name; only its extension is used.
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub name: String,
    pub description: Option<String>,
}

/// Checks name, extension and size.  Returns the lower-case extension.
pub fn validate(file_name: &str, size: u64, name: &str) -> Result<String, UploadError> {
    if name.trim().is_empty() {
        return Err(UploadError::EmptyName);
    }
    let ext = extension_of(Path::new(file_name)).unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(UploadError::UnsupportedExtension(ext));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(ext)
}

/// Validates and stores `request`, returning the finished record.
pub fn upload(store: &dyn AssetStore, request: UploadRequest) -> Result<ModelRecord, UploadError> {
    let size = request.bytes.len() as u64;
    let ext = validate(&request.file_name, size, &request.name)?;

    let pending = store.save(NewModel {
        name: request.name.trim().to_string(),
        description: request.description.filter(|d| !d.trim().is_empty()),
        file_reference: String::new(),
        thumbnail: None,
        file_size: size,
    })?;

    match finish(store, pending.id, &ext, &request.bytes) {
        Ok(record) => {
            log::info!("uploaded '{}' as model {} ({size} bytes)", record.name, record.id);
            Ok(record)
        }
        Err(e) => {
            log::warn!("upload of model {} failed, rolling back: {e}", pending.id);
            if let Err(cleanup) = store.delete(pending.id) {
                log::error!("could not remove pending model {}: {cleanup}", pending.id);
            }
            Err(e.into())
        }
    }
}

fn finish(store: &dyn AssetStore, id: ModelId, ext: &str, bytes: &[u8]) -> Result<ModelRecord, StoreError> {
    let reference = store.write_blob(id, ext, bytes)?;
    store
        .update(
            id,
            ModelPatch {
                file_reference: Some(reference),
                ..Default::default()
            },
        )?
        .ok_or(StoreError::Missing(id))
}

/// Reads `path` from disk (size-checked first) and uploads it.
pub fn upload_file(
    store: &dyn AssetStore,
    path: &Path,
    name: &str,
    description: Option<String>,
) -> Result<ModelRecord, UploadError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let size = std::fs::metadata(path)?.len();
    validate(&file_name, size, name)?;
    let bytes = std::fs::read(path)?;
    upload(
        store,
        UploadRequest {
            file_name,
            bytes,
            name: name.to_string(),
            description,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsAssetStore;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn request(file_name: &str, len: usize) -> UploadRequest {
        UploadRequest {
            file_name: file_name.into(),
            bytes: vec![7; len],
            name: "Lamp".into(),
            description: Some("  ".into()),
        }
    }

    #[test]
    fn validation_rules() {
        assert_eq!(validate("a.GLB", 1, "x").unwrap(), "glb");
        assert!(matches!(validate("a.glb", 1, "  "), Err(UploadError::EmptyName)));
        assert!(matches!(
            validate("a.stl", 1, "x"),
            Err(UploadError::UnsupportedExtension(e)) if e == "stl"
        ));
        assert!(matches!(validate("noext", 1, "x"), Err(UploadError::UnsupportedExtension(_))));
        assert!(validate("a.fbx", MAX_UPLOAD_BYTES, "x").is_ok());
        assert!(matches!(
            validate("a.fbx", MAX_UPLOAD_BYTES + 1, "x"),
            Err(UploadError::TooLarge { .. })
        ));
    }

    #[test]
    fn upload_points_record_at_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::open(dir.path()).unwrap();
        let rec = upload(&store, request("lamp.gltf", 16)).unwrap();
        assert_eq!(rec.file_reference, format!("blob:{}", rec.id));
        assert_eq!(rec.file_size, 16);
        assert_eq!(rec.description, None);
        let path = store.blob_path(rec.id).unwrap().unwrap();
        assert_eq!(std::fs::read(path).unwrap().len(), 16);
    }

    #[test]
    fn rejected_upload_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::open(dir.path()).unwrap();
        assert!(upload(&store, request("lamp.png", 4)).is_err());
        assert!(store.list().unwrap().is_empty());
    }

    /// Delegates to a real store but fails every blob write.
    struct FailingBlobs {
        inner: FsAssetStore,
        deleted: AtomicBool,
    }

    impl AssetStore for FailingBlobs {
        fn list(&self) -> Result<Vec<ModelRecord>, StoreError> {
            self.inner.list()
        }
        fn get(&self, id: ModelId) -> Result<Option<ModelRecord>, StoreError> {
            self.inner.get(id)
        }
        fn save(&self, model: NewModel) -> Result<ModelRecord, StoreError> {
            self.inner.save(model)
        }
        fn update(&self, id: ModelId, patch: ModelPatch) -> Result<Option<ModelRecord>, StoreError> {
            self.inner.update(id, patch)
        }
        fn delete(&self, id: ModelId) -> Result<bool, StoreError> {
            self.deleted.store(true, Ordering::SeqCst);
            self.inner.delete(id)
        }
        fn write_blob(&self, _: ModelId, _: &str, _: &[u8]) -> Result<String, StoreError> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }
        fn blob_path(&self, id: ModelId) -> Result<Option<PathBuf>, StoreError> {
            self.inner.blob_path(id)
        }
        fn clear(&self) -> Result<(), StoreError> {
            self.inner.clear()
        }
        fn info(&self) -> Result<crate::store::StorageInfo, StoreError> {
            self.inner.info()
        }
    }

    #[test]
    fn failed_blob_write_rolls_back_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FailingBlobs {
            inner: FsAssetStore::open(dir.path()).unwrap(),
            deleted: AtomicBool::new(false),
        };
        let err = upload(&store, request("lamp.glb", 8)).unwrap_err();
        assert!(matches!(err, UploadError::Store(StoreError::Io(_))));
        assert!(store.deleted.load(Ordering::SeqCst));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn upload_file_checks_size_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::open(dir.path().join("store")).unwrap();
        let file = dir.path().join("duck.glb");
        std::fs::write(&file, b"glTF....").unwrap();
        let rec = upload_file(&store, &file, "Duck", None).unwrap();
        assert_eq!(rec.name, "Duck");
        assert_eq!(rec.file_size, 8);
    }
}
