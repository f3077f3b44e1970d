//! Local model catalogue.
//!
//! | Module    | Contents                                       |
//! |-----------|------------------------------------------------|
//! | `record`  | [`ModelRecord`], [`ModelId`], create / patch   |
//! | `fs_store`| [`FsAssetStore`]: JSON index + blob directory  |
//! | `upload`  | validation and the two-phase upload            |
//! | `samples` | built-in demo records                          |

mod fs_store;
mod record;
pub mod samples;
pub mod upload;

use std::path::PathBuf;

use thiserror::Error;

pub use fs_store::FsAssetStore;
pub use record::{format_bytes, ModelId, ModelPatch, ModelRecord, NewModel};
pub use upload::{UploadError, UploadRequest};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode the model index: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("no model with id {0}")]
    Missing(ModelId),
}

/// Summary of what the store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageInfo {
    pub model_count: usize,
    /// Index plus blob bytes on disk.
    pub used_bytes: u64,
}

impl StorageInfo {
    pub fn display_size(&self) -> String {
        format_bytes(self.used_bytes)
    }
}

/// Persistence seam used by the orchestrator, the loader and the CLI.
///
/// Implementations must tolerate the underlying data disappearing between
/// calls: a lost or corrupt index reads as an empty catalogue.
pub trait AssetStore: Send + Sync {
    /// All records, newest first.
    fn list(&self) -> Result<Vec<ModelRecord>, StoreError>;
    fn get(&self, id: ModelId) -> Result<Option<ModelRecord>, StoreError>;
    /// Creates a record with a fresh id and timestamps.
    fn save(&self, model: NewModel) -> Result<ModelRecord, StoreError>;
    /// Applies `patch` and bumps `updated_at`; `None` when the id is unknown.
    fn update(&self, id: ModelId, patch: ModelPatch) -> Result<Option<ModelRecord>, StoreError>;
    /// Removes the record and any blob it owns.  `false` when nothing matched.
    fn delete(&self, id: ModelId) -> Result<bool, StoreError>;
    /// Stores file content for `id` and returns the reference to put on the
    /// record.
    fn write_blob(&self, id: ModelId, extension: &str, bytes: &[u8]) -> Result<String, StoreError>;
    /// Location of the blob written for `id`.
    fn blob_path(&self, id: ModelId) -> Result<Option<PathBuf>, StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
    fn info(&self) -> Result<StorageInfo, StoreError>;
}
