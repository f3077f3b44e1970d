//! Turns a model reference into a normalised [`SceneObject`].
//!
//! Built-in primitives are produced synchronously.  Everything else can run
//! on a worker thread via [`ModelLoader::spawn`]; the caller polls the
//! returned [`PendingLoad`] once per frame, the same way the font atlas is
//! picked up by the app runner.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use arview_core::{SceneNode, SceneObject};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::blob::BlobRegistry;
use crate::error::LoadError;
use crate::fetch;
use crate::gltf_loader;
use crate::normalize::{normalize, Normalization};
use crate::primitives::PrimitiveKind;
use crate::reference::{extension_of, ModelReference};
use crate::store::{AssetStore, StoreError};

/// Extensions that are recognised but cannot be decoded.
const UNSUPPORTED_EXTENSIONS: &[&str] = &["obj", "fbx", "stl", "ply", "dae", "3ds", "usdz", "blend"];

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub normalization: Normalization,
    pub fetch_timeout: Duration,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            normalization: Normalization::default(),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Milestones reported while a load runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadProgress {
    Resolving,
    Fetched { bytes: usize },
    Decoded { meshes: usize },
    Normalized,
}

#[derive(Clone)]
pub struct ModelLoader {
    settings: LoaderSettings,
    blobs: BlobRegistry,
    store: Option<Arc<dyn AssetStore>>,
}

impl ModelLoader {
    pub fn new(settings: LoaderSettings) -> Self {
        Self {
            settings,
            blobs: BlobRegistry::new(),
            store: None,
        }
    }

    /// Enables `blob:<id>` references.
    pub fn with_store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Registry holding embedded payloads while they decode.
    pub fn blobs(&self) -> &BlobRegistry {
        &self.blobs
    }

    pub fn load_builtin(&self, kind: PrimitiveKind) -> SceneObject {
        kind.build(self.settings.normalization.standoff)
    }

    /// Parses `reference` and loads it.  Blocking.
    pub fn load_reference(
        &self,
        name: &str,
        reference: &str,
        progress: Option<&Sender<LoadProgress>>,
    ) -> Result<SceneObject, LoadError> {
        let parsed = ModelReference::parse(reference)?;
        self.load(name, &parsed, progress)
    }

    /// Loads an already-parsed reference.  Blocking.
    pub fn load(
        &self,
        name: &str,
        reference: &ModelReference,
        progress: Option<&Sender<LoadProgress>>,
    ) -> Result<SceneObject, LoadError> {
        let report = |p: LoadProgress| {
            if let Some(tx) = progress {
                let _ = tx.send(p);
            }
        };
        report(LoadProgress::Resolving);

        let root = match reference {
            ModelReference::BuiltIn(kind) => {
                let mut object = self.load_builtin(*kind);
                object.name = name.to_string();
                report(LoadProgress::Normalized);
                return Ok(object);
            }
            ModelReference::Stored(id) => {
                let store = self
                    .store
                    .as_ref()
                    .ok_or_else(|| LoadError::NotFound(reference.to_string()))?;
                let path = store
                    .blob_path(*id)
                    .map_err(store_error)?
                    .ok_or_else(|| LoadError::NotFound(reference.to_string()))?;
                self.decode_path(&path, &report)?
            }
            ModelReference::Embedded { mime, payload } => {
                let bytes = STANDARD
                    .decode(payload.trim())
                    .map_err(|e| LoadError::Decode(format!("invalid base64 payload: {e}")))?;
                report(LoadProgress::Fetched { bytes: bytes.len() });
                let handle = self.blobs.register(bytes, mime);
                let data = handle
                    .bytes()
                    .ok_or_else(|| LoadError::NotFound(handle.url().to_string()))?;
                ensure_gltf(mime_extension(mime), &data)?;
                gltf_loader::decode_slice(&data, None)?
                // handle drops here, releasing the blob
            }
            ModelReference::Remote(url) => {
                reject_known_unsupported(reference.extension().as_deref())?;
                let fetched = fetch::fetch_bytes(url, self.settings.fetch_timeout)?;
                report(LoadProgress::Fetched {
                    bytes: fetched.bytes.len(),
                });
                let hint = reference
                    .extension()
                    .or_else(|| fetched.content_type.as_deref().and_then(mime_extension).map(str::to_owned));
                ensure_gltf(hint.as_deref(), &fetched.bytes)?;
                gltf_loader::decode_slice(&fetched.bytes, None)?
            }
            ModelReference::File(path) => self.decode_path(path, &report)?,
        };

        report(LoadProgress::Decoded {
            meshes: root.mesh_count(),
        });
        let object = self.finish(name, reference, root);
        report(LoadProgress::Normalized);
        Ok(object)
    }

    fn decode_path(&self, path: &Path, report: &impl Fn(LoadProgress)) -> Result<SceneNode, LoadError> {
        let ext = extension_of(path);
        reject_known_unsupported(ext.as_deref())?;
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path.display().to_string()),
            _ => LoadError::Io(e),
        })?;
        report(LoadProgress::Fetched { bytes: bytes.len() });
        ensure_gltf(ext.as_deref(), &bytes)?;
        gltf_loader::decode_slice(&bytes, path.parent())
    }

    fn finish(&self, name: &str, reference: &ModelReference, root: SceneNode) -> SceneObject {
        let mut object = SceneObject::new(name, reference.to_string(), root);
        let report = normalize(&mut object, &self.settings.normalization);
        log::info!(
            "loaded '{}' from {}: {} meshes, scale {:.4}",
            object.name,
            object.origin,
            object.mesh_count(),
            report.scale
        );
        object
    }

    /// Starts loading on a worker thread.
    pub fn spawn(&self, name: impl Into<String>, reference: impl Into<String>) -> PendingLoad {
        let (result_tx, result_rx) = mpsc::channel();
        let (progress_tx, progress_rx) = mpsc::channel();
        let name = name.into();
        let reference = reference.into();
        let loader = self.clone();

        let job = {
            let result_tx = result_tx.clone();
            move || {
                let result = loader.load_reference(&name, &reference, Some(&progress_tx));
                if let Err(e) = &result {
                    log::warn!("loading '{name}' from {reference} failed: {e}");
                }
                let _ = result_tx.send(result);
            }
        };

        run_worker(job, &result_tx);

        PendingLoad {
            result: result_rx,
            progress: progress_rx,
            last_progress: None,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_worker(job: impl FnOnce() + Send + 'static, result_tx: &Sender<Result<SceneObject, LoadError>>) {
    if let Err(e) = std::thread::Builder::new().name("arview-loader".into()).spawn(job) {
        let _ = result_tx.send(Err(LoadError::Io(e)));
    }
}

// No threads in the browser: run inline, the result is ready on the first poll.
#[cfg(target_arch = "wasm32")]
fn run_worker(job: impl FnOnce(), _result_tx: &Sender<Result<SceneObject, LoadError>>) {
    job();
}

fn store_error(e: StoreError) -> LoadError {
    match e {
        StoreError::Io(io) => LoadError::Io(io),
        other => LoadError::NotFound(other.to_string()),
    }
}

fn mime_extension(mime: &str) -> Option<&'static str> {
    match mime.split(';').next().unwrap_or(mime).trim() {
        "model/gltf-binary" => Some("glb"),
        "model/gltf+json" => Some("gltf"),
        "model/obj" => Some("obj"),
        "application/x-fbx" | "model/vnd.fbx" => Some("fbx"),
        _ => None,
    }
}

fn reject_known_unsupported(ext: Option<&str>) -> Result<(), LoadError> {
    match ext {
        Some(ext) if UNSUPPORTED_EXTENSIONS.contains(&ext) => {
            Err(LoadError::UnsupportedFormat(ext.to_ascii_uppercase()))
        }
        _ => Ok(()),
    }
}

/// glb/gltf hints are trusted (bad content then fails as a decode error);
/// without a hint the content must look like glTF.
fn ensure_gltf(hint: Option<&str>, bytes: &[u8]) -> Result<(), LoadError> {
    reject_known_unsupported(hint)?;
    match hint {
        Some("glb" | "gltf") => Ok(()),
        _ if gltf_loader::sniff(bytes).is_some() => Ok(()),
        Some(other) => Err(LoadError::UnsupportedFormat(other.to_ascii_uppercase())),
        None => Err(LoadError::UnsupportedFormat("unrecognised data".into())),
    }
}

/// A model load running in the background.
pub struct PendingLoad {
    result: Receiver<Result<SceneObject, LoadError>>,
    progress: Receiver<LoadProgress>,
    last_progress: Option<LoadProgress>,
}

impl PendingLoad {
    /// The result once the worker has finished; `None` while it is running.
    pub fn try_result(&mut self) -> Option<Result<SceneObject, LoadError>> {
        self.drain_progress();
        match self.result.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(LoadError::Decode("loader worker exited without a result".into())))
            }
        }
    }

    /// Blocks until the worker finishes.
    pub fn wait(mut self) -> Result<SceneObject, LoadError> {
        let result = self
            .result
            .recv()
            .unwrap_or_else(|_| Err(LoadError::Decode("loader worker exited without a result".into())));
        self.drain_progress();
        result
    }

    /// Most recent milestone seen so far.
    pub fn last_progress(&mut self) -> Option<&LoadProgress> {
        self.drain_progress();
        self.last_progress.as_ref()
    }

    fn drain_progress(&mut self) {
        while let Ok(p) = self.progress.try_recv() {
            self.last_progress = Some(p);
        }
    }
}

impl std::fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLoad")
            .field("last_progress", &self.last_progress)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf_loader::fixtures::triangle_gltf;
    use crate::normalize::{STANDOFF, TARGET_SIZE};
    use crate::store::FsAssetStore;
    use approx::assert_relative_eq;

    fn data_uri(src: &str) -> String {
        format!("data:model/gltf+json;base64,{}", STANDARD.encode(src))
    }

    #[test]
    fn builtin_keeps_unit_scale_at_standoff() {
        let loader = ModelLoader::new(LoaderSettings::default());
        let obj = loader.load_reference("Cube", "builtin:cube", None).unwrap();
        assert_eq!(obj.name, "Cube");
        assert_eq!(obj.transform.position, STANDOFF);
        assert_eq!(obj.transform.scale, 1.0);
    }

    #[test]
    fn embedded_model_is_normalised_and_blob_released() {
        let loader = ModelLoader::new(LoaderSettings::default());
        let (tx, rx) = mpsc::channel();
        let obj = loader
            .load_reference("Tri", &data_uri(&triangle_gltf(8.0, [3.0, 3.0, 3.0])), Some(&tx))
            .unwrap();
        assert_eq!(loader.blobs().live_count(), 0);

        assert_relative_eq!(obj.transform.scale, TARGET_SIZE / 8.0);
        assert_relative_eq!(obj.world_bounds().max_dim(), TARGET_SIZE, epsilon = 1e-5);
        let c = obj.world_bounds().center();
        assert_relative_eq!(c.z, STANDOFF.z, epsilon = 1e-5);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                LoadProgress::Resolving,
                LoadProgress::Fetched { bytes: triangle_gltf(8.0, [3.0, 3.0, 3.0]).len() },
                LoadProgress::Decoded { meshes: 1 },
                LoadProgress::Normalized,
            ]
        );
    }

    #[test]
    fn failed_embedded_decode_still_releases_blob() {
        let loader = ModelLoader::new(LoaderSettings::default());
        let err = loader
            .load_reference("Bad", &data_uri("{ \"asset\": 1 }"), None)
            .unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
        assert_eq!(loader.blobs().live_count(), 0);
    }

    #[test]
    fn obj_and_fbx_are_unsupported() {
        let loader = ModelLoader::new(LoaderSettings::default());
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("chair.obj");
        std::fs::write(&obj, "v 0 0 0\n").unwrap();
        assert!(matches!(
            loader.load_reference("Chair", obj.to_str().unwrap(), None),
            Err(LoadError::UnsupportedFormat(f)) if f == "OBJ"
        ));
        // rejected before any network access
        assert!(matches!(
            loader.load_reference("Chair", "https://example.invalid/chair.fbx", None),
            Err(LoadError::UnsupportedFormat(f)) if f == "FBX"
        ));
    }

    #[test]
    fn missing_sources_are_not_found() {
        let loader = ModelLoader::new(LoaderSettings::default());
        assert!(matches!(
            loader.load_reference("x", "/no/such/model.glb", None),
            Err(LoadError::NotFound(_))
        ));
        // no store attached
        assert!(matches!(
            loader.load_reference("x", "blob:12", None),
            Err(LoadError::NotFound(_))
        ));
        assert!(matches!(
            loader.load_reference("x", "builtin:torus", None),
            Err(LoadError::InvalidPrimitive(_))
        ));
    }

    #[test]
    fn stored_blob_loads_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsAssetStore::open(dir.path()).unwrap());
        let rec = store.save(crate::NewModel::new("Tri", "", 0)).unwrap();
        let reference = store
            .write_blob(rec.id, "gltf", triangle_gltf(1.0, [0.0; 3]).as_bytes())
            .unwrap();

        let loader = ModelLoader::new(LoaderSettings::default()).with_store(store);
        let obj = loader.load_reference(&rec.name, &reference, None).unwrap();
        assert_eq!(obj.mesh_count(), 1);
        assert_eq!(obj.origin, reference);
    }

    #[test]
    fn spawned_load_delivers_result() {
        let loader = ModelLoader::new(LoaderSettings::default());
        let pending = loader.spawn("Tri", data_uri(&triangle_gltf(1.0, [0.0; 3])));
        let obj = pending.wait().unwrap();
        assert_eq!(obj.name, "Tri");

        let mut pending = loader.spawn("Nope", "builtin:pyramid");
        let result = loop {
            if let Some(r) = pending.try_result() {
                break r;
            }
            std::thread::yield_now();
        };
        assert!(matches!(result, Err(LoadError::InvalidPrimitive(_))));
    }

    /// Serves one canned HTTP response on a local port.
    fn serve_once(response: &'static str) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/chair.glb")
    }

    #[test]
    fn remote_error_status_is_a_network_error() {
        let loader = ModelLoader::new(LoaderSettings::default());
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let err = loader.load_reference("Chair", &url, None).unwrap_err();
        assert!(matches!(&err, LoadError::Network(m) if m.contains("404")), "{err:?}");
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let loader = ModelLoader::new(LoaderSettings {
            fetch_timeout: Duration::from_secs(5),
            ..LoaderSettings::default()
        });
        let err = loader
            .load_reference("Chair", &format!("http://{addr}/chair.glb"), None)
            .unwrap_err();
        assert!(matches!(err, LoadError::Network(_)), "{err:?}");
    }

    #[test]
    fn unknown_bytes_without_hint_are_unsupported() {
        assert!(matches!(
            ensure_gltf(None, b"solid cube\nfacet normal"),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(ensure_gltf(None, b"glTF\x02\0\0\0").is_ok());
        assert!(ensure_gltf(Some("bin"), b"{}").is_ok());
    }
}
