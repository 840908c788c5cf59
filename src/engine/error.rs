// Copyright © 2024 blitzbeaver contributors

use std::error;
use std::result;

use crate::persistence::PersistedGraphFormatError;

use super::config::ConfigurationError;
use super::value::ElementKind;

#[allow(clippy::module_name_repetitions)]
pub type DynError = Box<dyn error::Error + Send + Sync>;
pub type DynResult<T> = result::Result<T, DynError>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("invalid persisted file: {0}")]
    PersistedGraphFormat(#[from] PersistedGraphFormatError),

    #[error("record schema must contain at least one field")]
    EmptySchema,

    #[error("frame {frame_idx} is out of order: expected frame {expected}")]
    FrameOutOfOrder { frame_idx: usize, expected: usize },

    #[error(
        "record {record_idx} of frame {frame_idx} has {actual} fields, the schema has {expected}"
    )]
    RecordWidthMismatch {
        frame_idx: usize,
        record_idx: usize,
        expected: usize,
        actual: usize,
    },

    #[error(
        "field {field:?} of record {record_idx} in frame {frame_idx}: expected {expected:?}, got {actual:?}"
    )]
    ElementKindMismatch {
        frame_idx: usize,
        record_idx: usize,
        field: String,
        expected: ElementKind,
        actual: ElementKind,
    },

    #[error("failed to start the scoring thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(DynError),
}

impl From<DynError> for Error {
    fn from(value: DynError) -> Self {
        Self::Other(value)
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;
