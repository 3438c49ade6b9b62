//! Curvilinear structured grid: image-like topology with explicit points.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::array::{Attributes, FieldData};
use crate::error::{MeshTkError, Result};
use crate::poly_data::{bounds_of, check_len};

/// A structured grid: regular `(nx, ny, nz)` topology over explicit points.
///
/// Point ordering is x-fastest, the same as [`crate::ImageData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredGrid {
    dims: [usize; 3],
    points: Vec<DVec3>,
    point_data: Attributes,
    cell_data: Attributes,
    field_data: FieldData,
}

impl StructuredGrid {
    /// Creates a structured grid, checking `points.len() == nx * ny * nz`.
    pub fn new(dims: [usize; 3], points: Vec<DVec3>) -> Result<Self> {
        if dims.contains(&0) {
            return Err(MeshTkError::InvalidDimensions(dims[0], dims[1], dims[2]));
        }
        check_len(points.len(), dims[0] * dims[1] * dims[2])?;
        Ok(Self {
            dims,
            points,
            point_data: Attributes::new(),
            cell_data: Attributes::new(),
            field_data: FieldData::new(),
        })
    }

    /// Node dimensions.
    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Number of points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Number of cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.dims
            .iter()
            .map(|&d| d.saturating_sub(1).max(1))
            .product()
    }

    /// Returns the points.
    #[must_use]
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Flattens a 3-D node index to a linear index.
    #[must_use]
    pub fn flatten_index(&self, ijk: [usize; 3]) -> usize {
        ijk[0] + ijk[1] * self.dims[0] + ijk[2] * self.dims[0] * self.dims[1]
    }

    /// Position of the node at a 3-D index.
    #[must_use]
    pub fn position(&self, ijk: [usize; 3]) -> DVec3 {
        self.points[self.flatten_index(ijk)]
    }

    /// Position of node `(0, 0, 0)`.
    #[must_use]
    pub fn origin(&self) -> DVec3 {
        self.points[0]
    }

    /// Per-axis node spacing, estimated from the first node's neighbors.
    ///
    /// Exact for grids with uniform spacing; an estimate otherwise.
    #[must_use]
    pub fn resolution(&self) -> DVec3 {
        let o = self.origin();
        let step = |axis: usize| -> f64 {
            if self.dims[axis] < 2 {
                return 0.0;
            }
            let mut ijk = [0_usize; 3];
            ijk[axis] = 1;
            (self.position(ijk) - o).length()
        };
        DVec3::new(step(0), step(1), step(2))
    }

    /// Axis-aligned bounds `(min, max)`.
    #[must_use]
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        bounds_of(&self.points)
    }

    /// Center of the bounding box.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.bounds()
            .map_or(DVec3::ZERO, |(lo, hi)| (lo + hi) * 0.5)
    }

    /// Per-point attribute arrays.
    #[must_use]
    pub fn point_data(&self) -> &Attributes {
        &self.point_data
    }

    /// Per-point attribute arrays, mutably.
    pub fn point_data_mut(&mut self) -> &mut Attributes {
        &mut self.point_data
    }

    /// Per-cell attribute arrays.
    #[must_use]
    pub fn cell_data(&self) -> &Attributes {
        &self.cell_data
    }

    /// Per-cell attribute arrays, mutably.
    pub fn cell_data_mut(&mut self) -> &mut Attributes {
        &mut self.cell_data
    }

    /// Whole-dataset field data.
    #[must_use]
    pub fn field_data(&self) -> &FieldData {
        &self.field_data
    }

    /// Whole-dataset field data, mutably.
    pub fn field_data_mut(&mut self) -> &mut FieldData {
        &mut self.field_data
    }

    /// Adds a per-point scalar array, checking the length.
    pub fn add_point_scalar(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        check_len(values.len(), self.num_points())?;
        self.point_data.insert_scalar(name, values);
        Ok(())
    }

    /// Adds a per-point vector array, checking the length.
    pub fn add_point_vector(&mut self, name: impl Into<String>, values: Vec<DVec3>) -> Result<()> {
        check_len(values.len(), self.num_points())?;
        self.point_data.insert_vector(name, values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(dims: [usize; 3], spacing: DVec3) -> StructuredGrid {
        let mut pts = Vec::new();
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    pts.push(DVec3::new(
                        i as f64 * spacing.x,
                        j as f64 * spacing.y,
                        k as f64 * spacing.z,
                    ));
                }
            }
        }
        StructuredGrid::new(dims, pts).unwrap()
    }

    #[test]
    fn test_length_checked() {
        assert!(StructuredGrid::new([2, 2, 2], vec![DVec3::ZERO; 7]).is_err());
        assert!(StructuredGrid::new([2, 2, 2], vec![DVec3::ZERO; 8]).is_ok());
    }

    #[test]
    fn test_resolution() {
        let g = regular([4, 3, 2], DVec3::new(0.5, 1.5, 2.0));
        let r = g.resolution();
        assert!((r - DVec3::new(0.5, 1.5, 2.0)).length() < 1e-12);
        assert_eq!(g.origin(), DVec3::ZERO);
    }

    #[test]
    fn test_counts() {
        let g = regular([4, 3, 2], DVec3::ONE);
        assert_eq!(g.num_points(), 24);
        assert_eq!(g.num_cells(), 3 * 2 * 1);
    }
}
