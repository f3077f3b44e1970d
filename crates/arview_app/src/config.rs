//! `arview.toml`: every field is optional and falls back to its default.
//!
//! ```toml
//! log_level = "debug"
//! initial_model = "builtin:sphere"
//! screenshot_dir = "shots"
//!
//! [window]
//! title = "ARView"
//! width = 1280
//! height = 720
//!
//! [[capture.profiles]]
//! name = "rear"
//! facing = "environment"
//! ideal = { width = 1280, height = 720 }
//!
//! [interaction]
//! zoom_step = 1.25
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use arview_assets::{FsAssetStore, PrimitiveKind};
use arview_capture::{CapturePolicy, ConstraintProfile, SyntheticConfig};
use serde::{Deserialize, Serialize};

use crate::builder::AppConfig;
use crate::interaction::InteractionSettings;

pub const CONFIG_ENV: &str = "ARVIEW_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "arview.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Tried in order; empty means the built-in list.
    pub profiles: Vec<ConstraintProfile>,
    /// Simulation switches for the desktop camera.
    pub synthetic: SyntheticConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: AppConfig,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub store_dir: Option<PathBuf>,
    pub screenshot_dir: Option<PathBuf>,
    /// Loaded as soon as the camera is up, e.g. `builtin:cone` or `blob:3`.
    pub initial_model: Option<String>,
    pub fallback_primitive: String,
    pub capture: CaptureConfig,
    pub interaction: InteractionSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: AppConfig::default(),
            log_level: "info".into(),
            log_file: None,
            store_dir: None,
            screenshot_dir: None,
            initial_model: None,
            fallback_primitive: "cube".into(),
            capture: CaptureConfig::default(),
            interaction: InteractionSettings::default(),
        }
    }
}

impl ViewerConfig {
    /// Reads `explicit`, else `$ARVIEW_CONFIG`, else `./arview.toml`.  Only a
    /// missing default file is tolerated.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(p) => (PathBuf::from(p), true),
                None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        let mut config = if !required && !path.exists() {
            log::debug!("no {} found, using defaults", path.display());
            Self::default()
        } else {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Self::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        };
        config.apply_env(|key| std::env::var_os(key));
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// `ARVIEW_STORE_DIR` and `ARVIEW_SCREENSHOT_DIR` win over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<std::ffi::OsString>) {
        if let Some(dir) = lookup("ARVIEW_STORE_DIR") {
            self.store_dir = Some(dir.into());
        }
        if let Some(dir) = lookup("ARVIEW_SCREENSHOT_DIR") {
            self.screenshot_dir = Some(dir.into());
        }
    }

    /// Unknown names fall back to the cube.
    pub fn fallback_primitive(&self) -> PrimitiveKind {
        self.fallback_primitive.parse().unwrap_or_else(|_| {
            log::warn!("unknown fallback primitive '{}', using cube", self.fallback_primitive);
            PrimitiveKind::Cube
        })
    }

    pub fn store_root(&self) -> PathBuf {
        self.store_dir.clone().unwrap_or_else(FsAssetStore::default_root)
    }

    pub fn screenshot_root(&self) -> PathBuf {
        self.screenshot_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn capture_policy(&self) -> CapturePolicy {
        if self.capture.profiles.is_empty() {
            CapturePolicy::default()
        } else {
            CapturePolicy::new(self.capture.profiles.clone())
        }
    }
}
