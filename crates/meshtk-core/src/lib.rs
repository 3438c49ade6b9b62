//! Core types for meshtk.
//!
//! This crate provides the fundamental types used throughout meshtk:
//! - Concrete datasets: [`PolyData`], [`ImageData`], [`StructuredGrid`],
//!   [`UnstructuredGrid`], and the [`DataSet`] sum type over them
//! - Named attribute arrays ([`Attributes`], [`AttributeArray`]) with
//!   flat-buffer conversion, plus per-dataset [`FieldData`]
//! - Geometric helper functions ([`math`])
//! - Error types

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Index arithmetic over grid dims is pervasive and bounds-checked by construction
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod array;
pub mod data_set;
pub mod error;
pub mod image_data;
pub mod math;
pub mod poly_data;
pub mod structured_grid;
pub mod unstructured_grid;

pub use array::{AttributeArray, Attributes, FieldData};
pub use data_set::DataSet;
pub use error::{MeshTkError, Result};
pub use image_data::ImageData;
pub use poly_data::{PolyCellKind, PolyData};
pub use structured_grid::StructuredGrid;
pub use unstructured_grid::{Cell, CellType, UnstructuredGrid};

// Re-export glam types for convenience
pub use glam::{DMat4, DQuat, DVec3};
