//! Error type shared by every stage of the worksheet pipeline.

use std::path::PathBuf;

use crate::model::GlyphId;

/// Broad class of a failure, used by hosts to decide how to react.
///
/// - `Configuration`: a deployment defect (missing glyph asset, malformed
///   tier table). Hard failure.
/// - `Input`: the caller asked for something invalid. Re-prompt.
/// - `Export`: writing or encoding the artifact failed. Retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Input,
    Export,
}

#[derive(Debug, thiserror::Error)]
pub enum RhythmError {
    #[error("glyph {0} has no backing image")]
    GlyphNotFound(GlyphId),

    #[error("difficulty tier '{0}' has an empty repertoire")]
    EmptyRepertoire(String),

    #[error("failed to load glyph asset '{}': {source}", path.display())]
    GlyphLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid tier table: {0}")]
    InvalidTierTable(String),

    #[error("invalid layout settings: {0}")]
    InvalidLayout(String),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("unknown difficulty '{0}'")]
    UnknownDifficulty(String),

    #[error("invalid measure count {0}: must be at least 1")]
    InvalidMeasureCount(i64),

    #[error("measure count {requested} is below the minimum of {min} for '{tier}'")]
    MeasureCountBelowMinimum { tier: String, requested: u32, min: u32 },

    #[error("preview width must be at least 1 pixel")]
    InvalidPreviewWidth,

    #[error("image is degenerate ({width}x{height})")]
    InvalidImage { width: u32, height: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Encode(#[from] image::ImageError),
}

impl RhythmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RhythmError::GlyphNotFound(_)
            | RhythmError::EmptyRepertoire(_)
            | RhythmError::GlyphLoad { .. }
            | RhythmError::InvalidTierTable(_)
            | RhythmError::InvalidLayout(_)
            | RhythmError::Settings(_) => ErrorKind::Configuration,
            RhythmError::UnknownDifficulty(_)
            | RhythmError::InvalidMeasureCount(_)
            | RhythmError::MeasureCountBelowMinimum { .. }
            | RhythmError::InvalidPreviewWidth => ErrorKind::Input,
            RhythmError::InvalidImage { .. } | RhythmError::Io(_) | RhythmError::Encode(_) => {
                ErrorKind::Export
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RhythmError>;
