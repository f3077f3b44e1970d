//! Transient in-memory blobs addressed by URL, released when their handle
//! drops.  Embedded model data is parked here while it is being decoded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

const URL_PREFIX: &str = "blob:arview/";

#[derive(Default)]
struct RegistryInner {
    next: u64,
    blobs: HashMap<String, Blob>,
}

#[derive(Clone)]
struct Blob {
    mime: String,
    bytes: Arc<[u8]>,
}

/// Shared, clonable registry.  Clones see the same blobs.
#[derive(Clone, Default)]
pub struct BlobRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores `bytes` and returns the handle that keeps them alive.
    pub fn register(&self, bytes: Vec<u8>, mime: &str) -> BlobHandle {
        let mut inner = self.lock();
        inner.next += 1;
        let url = format!("{URL_PREFIX}{}", inner.next);
        inner.blobs.insert(
            url.clone(),
            Blob {
                mime: mime.to_string(),
                bytes: bytes.into(),
            },
        );
        log::trace!("blob registered: {url} ({mime})");
        BlobHandle {
            url,
            registry: self.clone(),
        }
    }

    /// Bytes behind `url`, or `None` once the handle has been dropped.
    pub fn fetch(&self, url: &str) -> Option<Arc<[u8]>> {
        self.lock().blobs.get(url).map(|b| Arc::clone(&b.bytes))
    }

    pub fn mime(&self, url: &str) -> Option<String> {
        self.lock().blobs.get(url).map(|b| b.mime.clone())
    }

    /// Number of blobs whose handles are still alive.
    pub fn live_count(&self) -> usize {
        self.lock().blobs.len()
    }

    fn revoke(&self, url: &str) {
        if self.lock().blobs.remove(url).is_some() {
            log::trace!("blob revoked: {url}");
        }
    }
}

/// Owning reference to one registered blob.
pub struct BlobHandle {
    url: String,
    registry: BlobRegistry,
}

impl BlobHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> Option<Arc<[u8]>> {
        self.registry.fetch(&self.url)
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

impl std::fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobHandle").field("url", &self.url).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_drop_releases_blob() {
        let reg = BlobRegistry::new();
        let a = reg.register(vec![1, 2, 3], "model/gltf-binary");
        let b = reg.register(vec![4], "model/gltf+json");
        assert_ne!(a.url(), b.url());
        assert_eq!(reg.live_count(), 2);
        assert_eq!(a.bytes().as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(reg.mime(b.url()).as_deref(), Some("model/gltf+json"));

        let url = a.url().to_string();
        drop(a);
        assert_eq!(reg.live_count(), 1);
        assert!(reg.fetch(&url).is_none());
        drop(b);
        assert_eq!(reg.live_count(), 0);
    }

    #[test]
    fn clones_share_state() {
        let reg = BlobRegistry::new();
        let other = reg.clone();
        let _h = reg.register(Vec::new(), "application/octet-stream");
        assert_eq!(other.live_count(), 1);
    }
}
