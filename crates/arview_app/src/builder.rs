use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;

/// Window settings (`[window]` in `arview.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "ARView".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Entry point.  Starts from a loaded [`ViewerConfig`]; the `with_*` calls
/// override it.
pub struct App {
    config: ViewerConfig,
}

impl App {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.config.window.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.window.width = width;
        self.config.window.height = height;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.config.window.vsync = vsync;
        self
    }

    /// Model shown once the camera is up (`builtin:…`, `blob:<id>`, a path
    /// or a URL).
    pub fn with_initial_model(mut self, reference: impl Into<String>) -> Self {
        self.config.initial_model = Some(reference.into());
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Opens the window and runs until it is closed.
    pub fn run(self) -> anyhow::Result<()> {
        crate::runner::run_internal(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_config() {
        let app = App::new(ViewerConfig::default())
            .with_title("Showroom")
            .with_size(640, 480)
            .with_vsync(false)
            .with_initial_model("builtin:sphere");
        let c = app.config();
        assert_eq!(c.window.title, "Showroom");
        assert_eq!((c.window.width, c.window.height), (640, 480));
        assert!(!c.window.vsync);
        assert_eq!(c.initial_model.as_deref(), Some("builtin:sphere"));
    }
}
