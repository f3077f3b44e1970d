//! File-system store: `<root>/index.json` holds every record, model bytes live
//! in `<root>/blobs/<id>.<ext>`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use arview_core::time::unix_millis;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::record::{ModelId, ModelPatch, ModelRecord, NewModel};
use super::{AssetStore, StorageInfo, StoreError};
use crate::reference::BLOB_PREFIX;

const INDEX_FILE: &str = "index.json";
const BLOB_DIR: &str = "blobs";
const INDEX_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreIndex {
    version: u32,
    models: Vec<ModelRecord>,
}

pub struct FsAssetStore {
    root: PathBuf,
    // serialises read-modify-write of the index within this process
    lock: Mutex<()>,
}

impl FsAssetStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(BLOB_DIR))?;
        log::debug!("asset store at {}", root.display());
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    /// The per-user data directory, or `./arview-data` when the platform
    /// has none.
    pub fn default_root() -> PathBuf {
        platform_data_dir().unwrap_or_else(|| PathBuf::from("arview-data"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn blob_dir(&self) -> PathBuf {
        self.root.join(BLOB_DIR)
    }

    fn read_index(&self) -> Result<StoreIndex, StoreError> {
        let bytes = match fs::read(self.index_path()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreIndex::default()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<StoreIndex>(&bytes) {
            Ok(index) => Ok(index),
            Err(e) => {
                log::warn!("model index is unreadable ({e}); starting from an empty catalogue");
                Ok(StoreIndex::default())
            }
        }
    }

    fn write_index(&self, index: &mut StoreIndex) -> Result<(), StoreError> {
        index.version = INDEX_VERSION;
        let json = serde_json::to_vec_pretty(index)?;
        let tmp = self.root.join(format!("{INDEX_FILE}.tmp"));
        fs::create_dir_all(&self.root)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.index_path())?;
        Ok(())
    }

    fn blob_files(&self, id: ModelId) -> Result<Vec<PathBuf>, StoreError> {
        let stem = id.to_string();
        let entries = match fs::read_dir(self.blob_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(stem.as_str()) {
                out.push(path);
            }
        }
        Ok(out)
    }

    fn remove_blobs(&self, id: ModelId) -> Result<(), StoreError> {
        for path in self.blob_files(id)? {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "arview").map(|dirs| dirs.data_dir().join("models"))
}

#[cfg(target_arch = "wasm32")]
fn platform_data_dir() -> Option<PathBuf> {
    None
}

/// Millisecond id, bumped past every id already in use.
fn next_id(index: &StoreIndex) -> ModelId {
    let newest = index.models.iter().map(|m| m.id.0).max().unwrap_or(0);
    ModelId(unix_millis().max(newest + 1))
}

fn sanitize_extension(ext: &str) -> String {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext
    } else {
        "bin".to_string()
    }
}

fn dir_size(path: &Path) -> Result<u64, StoreError> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut total = 0;
    for entry in entries {
        let meta = entry?.metadata()?;
        if meta.is_file() {
            total += meta.len();
        }
    }
    Ok(total)
}

impl AssetStore for FsAssetStore {
    fn list(&self) -> Result<Vec<ModelRecord>, StoreError> {
        let _g = self.guard();
        let mut models = self.read_index()?.models;
        models.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(models)
    }

    fn get(&self, id: ModelId) -> Result<Option<ModelRecord>, StoreError> {
        let _g = self.guard();
        Ok(self.read_index()?.models.into_iter().find(|m| m.id == id))
    }

    fn save(&self, model: NewModel) -> Result<ModelRecord, StoreError> {
        let _g = self.guard();
        let mut index = self.read_index()?;
        let now = OffsetDateTime::now_utc();
        let record = ModelRecord {
            id: next_id(&index),
            name: model.name,
            description: model.description,
            file_reference: model.file_reference,
            thumbnail: model.thumbnail,
            created_at: now,
            updated_at: now,
            file_size: model.file_size,
        };
        index.models.push(record.clone());
        self.write_index(&mut index)?;
        log::info!("saved model {} '{}'", record.id, record.name);
        Ok(record)
    }

    fn update(&self, id: ModelId, patch: ModelPatch) -> Result<Option<ModelRecord>, StoreError> {
        let _g = self.guard();
        let mut index = self.read_index()?;
        let Some(record) = index.models.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        patch.apply(record);
        record.updated_at = OffsetDateTime::now_utc();
        let updated = record.clone();
        self.write_index(&mut index)?;
        Ok(Some(updated))
    }

    fn delete(&self, id: ModelId) -> Result<bool, StoreError> {
        let _g = self.guard();
        let mut index = self.read_index()?;
        let before = index.models.len();
        index.models.retain(|m| m.id != id);
        let removed = index.models.len() != before;
        if removed {
            self.write_index(&mut index)?;
            log::info!("deleted model {id}");
        }
        self.remove_blobs(id)?;
        Ok(removed)
    }

    fn write_blob(&self, id: ModelId, extension: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let _g = self.guard();
        self.remove_blobs(id)?;
        fs::create_dir_all(self.blob_dir())?;
        let path = self.blob_dir().join(format!("{id}.{}", sanitize_extension(extension)));
        fs::write(&path, bytes)?;
        log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(format!("{BLOB_PREFIX}{id}"))
    }

    fn blob_path(&self, id: ModelId) -> Result<Option<PathBuf>, StoreError> {
        let _g = self.guard();
        Ok(self.blob_files(id)?.into_iter().next())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _g = self.guard();
        match fs::remove_dir_all(self.blob_dir()) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        match fs::remove_file(self.index_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(self.blob_dir())?;
        log::info!("asset store cleared");
        Ok(())
    }

    fn info(&self) -> Result<StorageInfo, StoreError> {
        let _g = self.guard();
        let index = self.read_index()?;
        let index_bytes = match fs::metadata(self.index_path()) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        Ok(StorageInfo {
            model_count: index.models.len(),
            used_bytes: index_bytes + dir_size(&self.blob_dir())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsAssetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn save_then_list_newest_first() {
        let (_dir, store) = store();
        let a = store.save(NewModel::new("A", "builtin:cube", 10)).unwrap();
        let b = store.save(NewModel::new("B", "builtin:sphere", 20)).unwrap();
        assert!(b.id > a.id, "ids must be unique and increasing");

        let listed = store.list().unwrap();
        assert_eq!(listed.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), ["B", "A"]);
        assert_eq!(store.get(a.id).unwrap().unwrap().file_size, 10);
        assert!(store.get(ModelId(1)).unwrap().is_none());
    }

    #[test]
    fn update_bumps_timestamp_and_keeps_id() {
        let (_dir, store) = store();
        let rec = store.save(NewModel::new("A", "", 0)).unwrap();
        let updated = store
            .update(
                rec.id,
                ModelPatch {
                    file_reference: Some("blob:1".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, rec.id);
        assert_eq!(updated.file_reference, "blob:1");
        assert!(updated.updated_at >= rec.updated_at);
        assert!(store.update(ModelId(42), ModelPatch::default()).unwrap().is_none());
    }

    #[test]
    fn delete_removes_record_and_blob() {
        let (_dir, store) = store();
        let rec = store.save(NewModel::new("A", "", 3)).unwrap();
        let reference = store.write_blob(rec.id, "GLB", b"abc").unwrap();
        assert_eq!(reference, format!("blob:{}", rec.id));
        let path = store.blob_path(rec.id).unwrap().unwrap();
        assert_eq!(path.extension().unwrap(), "glb");

        assert!(store.delete(rec.id).unwrap());
        assert!(!path.exists());
        assert!(store.get(rec.id).unwrap().is_none());
        assert!(!store.delete(rec.id).unwrap());
    }

    #[test]
    fn corrupt_index_reads_as_empty() {
        let (dir, store) = store();
        fs::write(dir.path().join(INDEX_FILE), b"{ truncated").unwrap();
        assert!(store.list().unwrap().is_empty());
        // and the next save repairs it
        store.save(NewModel::new("A", "builtin:cone", 0)).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn index_loss_is_tolerated() {
        let (dir, store) = store();
        store.save(NewModel::new("A", "builtin:cube", 0)).unwrap();
        fs::remove_file(dir.path().join(INDEX_FILE)).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn clear_and_info() {
        let (_dir, store) = store();
        let rec = store.save(NewModel::new("A", "", 5)).unwrap();
        store.write_blob(rec.id, "gltf", b"12345").unwrap();
        let info = store.info().unwrap();
        assert_eq!(info.model_count, 1);
        assert!(info.used_bytes >= 5);

        store.clear().unwrap();
        assert_eq!(store.info().unwrap(), StorageInfo::default());
        assert!(store.blob_path(rec.id).unwrap().is_none());
    }

    #[test]
    fn odd_extensions_fall_back_to_bin() {
        assert_eq!(sanitize_extension(".GLTF"), "gltf");
        assert_eq!(sanitize_extension("../x"), "bin");
        assert_eq!(sanitize_extension(""), "bin");
    }
}
