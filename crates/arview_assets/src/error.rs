use thiserror::Error;

/// Why a model could not be turned into a scene object.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The asset was found but is malformed.
    #[error("could not decode model: {0}")]
    Decode(String),
    /// Fetching a remote asset failed.
    #[error("could not fetch model: {0}")]
    Network(String),
    /// The asset is in a format the loader cannot decode.
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),
    #[error("unknown built-in primitive '{0}'")]
    InvalidPrimitive(String),
    /// A local file or stored blob does not exist.
    #[error("model source not found: {0}")]
    NotFound(String),
    #[error("i/o error while reading model: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Short message suitable for a status banner.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::Decode(_) => "The model file is damaged or not a valid glTF asset.".into(),
            LoadError::Network(_) => "The model could not be downloaded.".into(),
            LoadError::UnsupportedFormat(f) => format!("Models in {f} format cannot be displayed."),
            LoadError::InvalidPrimitive(p) => format!("There is no built-in shape called '{p}'."),
            LoadError::NotFound(_) => "The model file is missing from local storage.".into(),
            LoadError::Io(_) => "The model file could not be read.".into(),
        }
    }
}
