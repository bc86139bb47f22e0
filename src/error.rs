use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewerError>;

/// Failures of the trace partitioning and session handling.
///
/// Execution errors reported by program states are not represented here;
/// they are part of the projected data.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("no partitioning rule for frame kind `{0}`")]
    UnknownFrameKind(String),

    #[error("frame `{frame}` checks a tested script, but no tested frame produced a final state")]
    MissingTestedState { frame: String },

    #[error("frame `{frame}` has no reduction tree although a trace is available")]
    MissingReduction { frame: String },

    #[error("frames are evaluated as [{found}], but this editor mode evaluates [{expected}]")]
    FrameOrderMismatch { expected: String, found: String },

    #[error("frame index {index} is out of range ({count} frames)")]
    FrameOutOfRange { index: usize, count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid session document: {0}")]
    Json(#[from] serde_json::Error),
}
