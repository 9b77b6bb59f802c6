use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid preset list: {0}")]
    PresetParse(#[from] serde_json::Error),

    #[error("failed to read tags: {0}")]
    TagRead(String),

    #[error("unsupported source: {0}")]
    UnsupportedSource(String),
}
