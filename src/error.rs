use thiserror::Error;

/// Library error type for screensaver operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured photo directory is invalid or unreadable.
    #[error("invalid photo directory: {0}")]
    BadDir(String),

    /// The scan completed but found no images.
    #[error("no images found in configured directory")]
    EmptyScan,

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),

    /// Rendering/display error from the viewer.
    #[error("render error: {0}")]
    Render(anyhow::Error),
}
