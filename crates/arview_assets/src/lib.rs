//! Model assets for ARView: references, built-in primitives, glTF decoding,
//! normalisation, the background loader and the local asset store.
//!
//! ```rust,ignore
//! use arview_assets::{ModelLoader, LoaderSettings, PrimitiveKind};
//!
//! let loader = ModelLoader::new(LoaderSettings::default());
//! let cube = loader.load_builtin(PrimitiveKind::Cube);
//! let chair = loader.load_reference("Chair", "https://example.com/chair.glb", None)?;
//! ```

pub mod blob;
pub mod error;
pub mod fetch;
pub mod gltf_loader;
pub mod loader;
pub mod normalize;
pub mod primitives;
pub mod reference;
pub mod store;

pub use blob::{BlobHandle, BlobRegistry};
pub use error::LoadError;
pub use loader::{LoadProgress, LoaderSettings, ModelLoader, PendingLoad};
pub use normalize::{normalize, Normalization};
pub use primitives::PrimitiveKind;
pub use reference::ModelReference;
pub use store::{
    AssetStore, FsAssetStore, ModelId, ModelPatch, ModelRecord, NewModel, StorageInfo, StoreError,
};
