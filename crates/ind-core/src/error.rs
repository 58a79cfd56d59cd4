use std::io;

use thiserror::Error;

/// Error surfaced by any fallible entry point of this crate.
///
/// Configuration errors are always returned before any stream is touched
/// (see [`crate::config`]); I/O errors propagate from the consumed
/// [`crate::dataset_stream::DatasetStream`] or from spill-file access.
#[derive(Debug, Error)]
pub enum IndError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// A configuration error, surfaced at option-validation time, before
/// execution begins.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("mem_limit_mb must be >= 16, got {0}")]
    MemLimitTooSmall(u64),

    #[error("threads_num must be >= 1, got {0}")]
    ZeroThreads,

    #[error("no input tables given")]
    NoInputTables,

    #[error("lhs_indices must not be empty")]
    EmptyIndices,

    #[error("lhs_indices has length {lhs} but rhs_indices has length {rhs}")]
    MismatchedIndexWidth { lhs: usize, rhs: usize },

    #[error("lhs index {index} out of range for table with {columns} columns")]
    LhsIndexOutOfRange { index: usize, columns: usize },

    #[error("rhs index {index} out of range for table with {columns} columns")]
    RhsIndexOutOfRange { index: usize, columns: usize },
}

pub type Result<T, E = IndError> = std::result::Result<T, E>;
