use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A draw loop is already scheduled on this render context.
    #[error("a draw loop is already running")]
    LoopAlreadyRunning,
    #[error("layer readback failed: {0}")]
    Readback(String),
    #[error("surface error: {0}")]
    Surface(String),
}
