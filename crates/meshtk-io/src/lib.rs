//! File I/O for meshtk.
//!
//! Formats are chosen by file extension:
//! - `.vtk` — the classic legacy container, ASCII or binary, for every
//!   dataset type ([`legacy`])
//! - `.ply` — polygon meshes ([`ply`])
//! - `.stl` — triangle surfaces, ASCII or binary ([`stl`])

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]

pub mod legacy;
pub mod ply;
pub mod stl;

use std::path::Path;

use meshtk_core::{DataSet, MeshTkError, PolyData};
use thiserror::Error;

/// Errors raised while reading or writing files.
#[derive(Error, Debug)]
pub enum IoError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents do not parse.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// No reader/writer is registered for the extension.
    #[error("unsupported file extension '{0}'")]
    UnsupportedExtension(String),

    /// The format cannot represent this dataset type.
    #[error("{format} files cannot hold a {found}")]
    UnsupportedDataSet {
        format: &'static str,
        found: &'static str,
    },

    /// A dataset invariant failed while assembling the result.
    #[error("dataset error: {0}")]
    Core(#[from] MeshTkError),
}

/// A specialized Result type for I/O operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Options shared by the writers.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write binary payloads where the format supports them.
    pub binary: bool,
    /// Title/header comment embedded in the file.
    pub title: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            binary: false,
            title: "meshtk output".to_string(),
        }
    }
}

fn extension_of(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| IoError::UnsupportedExtension(path.display().to_string()))
}

/// Reads a dataset, picking the format from the file extension.
pub fn read(path: impl AsRef<Path>) -> Result<DataSet> {
    let path = path.as_ref();
    match extension_of(path)?.as_str() {
        "vtk" => legacy::read(path),
        "ply" => Ok(DataSet::PolyData(ply::read(path)?)),
        "stl" => Ok(DataSet::PolyData(stl::read(path)?)),
        other => Err(IoError::UnsupportedExtension(other.to_string())),
    }
}

/// Reads a file that must contain polygonal data.
pub fn read_poly_data(path: impl AsRef<Path>) -> Result<PolyData> {
    match read(path)? {
        DataSet::PolyData(pd) => Ok(pd),
        other => Err(IoError::UnsupportedDataSet {
            format: "polygonal",
            found: other.type_name(),
        }),
    }
}

/// Writes a dataset with default options, picking the format from the
/// file extension. Parent directories are created as needed.
pub fn write(data: &DataSet, path: impl AsRef<Path>) -> Result<()> {
    write_with(data, path, &WriteOptions::default())
}

/// Writes a dataset with explicit options.
pub fn write_with(data: &DataSet, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    match extension_of(path)?.as_str() {
        "vtk" => legacy::write(data, path, options),
        "ply" => match data {
            DataSet::PolyData(pd) => ply::write(pd, path, options),
            other => Err(IoError::UnsupportedDataSet {
                format: "PLY",
                found: other.type_name(),
            }),
        },
        "stl" => match data {
            DataSet::PolyData(pd) => stl::write(pd, path, options),
            other => Err(IoError::UnsupportedDataSet {
                format: "STL",
                found: other.type_name(),
            }),
        },
        other => Err(IoError::UnsupportedExtension(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension() {
        let err = read("mesh.xyz").unwrap_err();
        assert!(matches!(err, IoError::UnsupportedExtension(_)));

        let pd = PolyData::new();
        let err = write(&DataSet::PolyData(pd), "out.xyz").unwrap_err();
        assert!(matches!(err, IoError::UnsupportedExtension(_)));
    }
}
