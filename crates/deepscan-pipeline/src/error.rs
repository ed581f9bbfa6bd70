//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The uploaded video cannot be used. Terminal, never retried.
    #[error("Video decode failed: {0}")]
    Decode(String),

    #[error(transparent)]
    Media(#[from] deepscan_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] deepscan_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn is_decode_error(&self) -> bool {
        match self {
            Self::Decode(_) => true,
            Self::Media(e) => e.is_decode_error(),
            _ => false,
        }
    }
}
