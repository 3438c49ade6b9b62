//! meshtk: a simple, functional toolkit for mesh and volume data.
//!
//! The crate re-exports the whole public surface of the workspace:
//! - dataset types and attribute arrays from [`meshtk_core`]
//! - sources and filters from [`meshtk_filters`]
//! - file readers/writers from [`meshtk_io`]
//!
//! # Quick start
//!
//! ```
//! use meshtk::prelude::*;
//!
//! // Build a sphere surface
//! let mut sphere = sources::sphere(DVec3::ZERO, 1.0, 16);
//!
//! // Attach a per-point scalar array from a plain numeric buffer
//! let radii: Vec<f64> = sphere.points().iter().map(|p| p.length()).collect();
//! sphere.add_point_scalar("radius", radii).unwrap();
//!
//! // Smooth, then clip away the lower half
//! let smoothed = smooth::laplacian(&sphere, 50, 0.01);
//! let upper = clip::clip_by_plane_poly(&smoothed, DVec3::ZERO, DVec3::Z, false);
//! assert!(!upper.polys().is_empty());
//! ```

pub use meshtk_core::{
    AttributeArray, Attributes, Cell, CellType, DataSet, FieldData, ImageData, MeshTkError,
    PolyCellKind, PolyData, Result, StructuredGrid, UnstructuredGrid,
};

pub use meshtk_core::math;

pub use meshtk_filters::{
    clip, connectivity, cut, image_filters, implicit, mesh, resample, select, smooth, sources,
    surface, transform, BoxFunction, CleanOptions, Implicit, PlaneFunction, ProbeOptions,
    RegionSelect, SphereFunction,
};

pub use meshtk_io as io;
pub use meshtk_io::{IoError, WriteOptions};

// Re-export glam types for convenience
pub use glam::{DMat4, DQuat, DVec3};

/// Everything most call sites need, in one import.
pub mod prelude {
    pub use crate::io;
    pub use crate::{
        clip, connectivity, cut, image_filters, math, mesh, resample, select, smooth, sources,
        surface, transform,
    };
    pub use crate::{
        AttributeArray, Attributes, Cell, CellType, CleanOptions, DataSet, FieldData, ImageData,
        Implicit, MeshTkError, PolyCellKind, PolyData, ProbeOptions, RegionSelect,
        StructuredGrid, UnstructuredGrid, WriteOptions,
    };
    pub use glam::{DMat4, DQuat, DVec3};
}
