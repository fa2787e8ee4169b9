use thiserror::Error;

use crate::track::TrackKey;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported metric: {0}")]
    UnsupportedMetric(String),

    #[error("Track {key}: {field} has {got} entries, expected {expected}")]
    TrackShape {
        key: TrackKey,
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("Video error: {0}")]
    Video(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for Error {
    fn from(err: opencv::Error) -> Self {
        Error::Video(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
