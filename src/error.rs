//! Error types for the localizer

use crate::common::TagId;

/// Errors returned by the localization pipeline.
#[derive(thiserror::Error, Debug)]
pub enum LocalizerError {
    #[error("tag {0} is not part of the field layout")]
    UnknownTag(TagId),
    #[error("tag {id} has no usable pose candidate ({reason})")]
    DegenerateCandidates { id: TagId, reason: &'static str },
    #[error("tag {id} pose is ambiguous (ratio={ratio:.3}, max={max_ratio:.3})")]
    AmbiguousPose {
        id: TagId,
        ratio: f64,
        max_ratio: f64,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{name} is not active")]
    NotActive { name: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = LocalizerError> = std::result::Result<T, E>;
