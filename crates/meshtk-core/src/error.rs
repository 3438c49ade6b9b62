//! Error types for meshtk.

use thiserror::Error;

/// The main error type for meshtk operations.
#[derive(Error, Debug)]
pub enum MeshTkError {
    /// An attribute array's length does not match the dataset.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// An array with the given name was not found.
    #[error("array '{0}' not found")]
    ArrayNotFound(String),

    /// The dataset has no arrays to fall back on.
    #[error("dataset has no attribute arrays")]
    NoArrays,

    /// The operation needs points/cells the dataset does not have.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// Grid dimensions are invalid for the operation.
    #[error("invalid dimensions [{0}, {1}, {2}]")]
    InvalidDimensions(usize, usize, usize),

    /// The dataset variant is not supported by the operation.
    #[error("unsupported dataset type for {operation}: {found}")]
    UnsupportedDataSet {
        operation: &'static str,
        found: &'static str,
    },

    /// A flat buffer's length is not a multiple of the component count.
    #[error("buffer length {len} is not a multiple of {components} components")]
    BadBufferLength { len: usize, components: usize },
}

/// A specialized Result type for meshtk operations.
pub type Result<T> = std::result::Result<T, MeshTkError>;
