//! Parsing of the reference strings stored on model records.
//!
//! | Prefix                 | Variant                       |
//! |------------------------|-------------------------------|
//! | `builtin:<kind>`       | [`ModelReference::BuiltIn`]   |
//! | `blob:<id>`            | [`ModelReference::Stored`]    |
//! | `data:<mime>;base64,…` | [`ModelReference::Embedded`]  |
//! | `http://`, `https://`  | [`ModelReference::Remote`]    |
//! | anything else          | [`ModelReference::File`]      |

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::primitives::PrimitiveKind;
use crate::store::ModelId;

pub const BUILTIN_PREFIX: &str = "builtin:";
pub const BLOB_PREFIX: &str = "blob:";

/// Where a model's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReference {
    BuiltIn(PrimitiveKind),
    /// A blob kept by the asset store under the given record id.
    Stored(ModelId),
    /// Inline base64 payload.
    Embedded { mime: String, payload: String },
    Remote(String),
    File(PathBuf),
}

impl ModelReference {
    /// Classifies `raw`.  Only `builtin:` names and malformed `data:` / `blob:`
    /// references are rejected here; everything else fails (or not) at load.
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        let raw = raw.trim();
        if let Some(name) = raw.strip_prefix(BUILTIN_PREFIX) {
            return name
                .parse::<PrimitiveKind>()
                .map(ModelReference::BuiltIn)
                .map_err(|_| LoadError::InvalidPrimitive(name.to_string()));
        }
        if let Some(id) = raw.strip_prefix(BLOB_PREFIX) {
            return id
                .parse::<u64>()
                .map(|id| ModelReference::Stored(ModelId(id)))
                .map_err(|_| LoadError::NotFound(raw.to_string()));
        }
        if let Some(rest) = raw.strip_prefix("data:") {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| LoadError::Decode("data reference has no payload".into()))?;
            let mime = meta
                .strip_suffix(";base64")
                .ok_or_else(|| LoadError::Decode("data reference is not base64 encoded".into()))?;
            return Ok(ModelReference::Embedded {
                mime: mime.to_string(),
                payload: payload.to_string(),
            });
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(ModelReference::Remote(raw.to_string()));
        }
        let path = raw.strip_prefix("file://").unwrap_or(raw);
        Ok(ModelReference::File(PathBuf::from(path)))
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, ModelReference::BuiltIn(_))
    }

    /// Lower-case file extension when the reference names one.
    pub fn extension(&self) -> Option<String> {
        match self {
            ModelReference::Remote(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                extension_of(Path::new(path))
            }
            ModelReference::File(path) => extension_of(path),
            _ => None,
        }
    }
}

pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

impl fmt::Display for ModelReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelReference::BuiltIn(kind) => write!(f, "{BUILTIN_PREFIX}{kind}"),
            ModelReference::Stored(id) => write!(f, "{BLOB_PREFIX}{id}"),
            ModelReference::Embedded { mime, payload } => {
                write!(f, "data:{mime};base64,<{} chars>", payload.len())
            }
            ModelReference::Remote(url) => f.write_str(url),
            ModelReference::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_resolve_without_io() {
        assert_eq!(
            ModelReference::parse("builtin:cube").unwrap(),
            ModelReference::BuiltIn(PrimitiveKind::Cube)
        );
        assert_eq!(
            ModelReference::parse("builtin:Sphere").unwrap(),
            ModelReference::BuiltIn(PrimitiveKind::Sphere)
        );
        assert!(matches!(
            ModelReference::parse("builtin:teapot"),
            Err(LoadError::InvalidPrimitive(name)) if name == "teapot"
        ));
    }

    #[test]
    fn classifies_remote_file_and_stored() {
        assert!(matches!(
            ModelReference::parse("https://cdn.example.com/a.glb?v=2").unwrap(),
            ModelReference::Remote(_)
        ));
        assert_eq!(
            ModelReference::parse("blob:1700000000000").unwrap(),
            ModelReference::Stored(ModelId(1_700_000_000_000))
        );
        assert_eq!(
            ModelReference::parse("file:///tmp/x.gltf").unwrap(),
            ModelReference::File(PathBuf::from("/tmp/x.gltf"))
        );
    }

    #[test]
    fn extension_ignores_query_string() {
        let r = ModelReference::parse("https://cdn.example.com/Chair.GLB?v=2#top").unwrap();
        assert_eq!(r.extension().as_deref(), Some("glb"));
        let r = ModelReference::parse("models/duck.obj").unwrap();
        assert_eq!(r.extension().as_deref(), Some("obj"));
    }

    #[test]
    fn data_reference_requires_base64() {
        let r = ModelReference::parse("data:model/gltf-binary;base64,Z2xURg==").unwrap();
        assert_eq!(
            r,
            ModelReference::Embedded {
                mime: "model/gltf-binary".into(),
                payload: "Z2xURg==".into()
            }
        );
        assert!(matches!(
            ModelReference::parse("data:text/plain,hello"),
            Err(LoadError::Decode(_))
        ));
    }
}
