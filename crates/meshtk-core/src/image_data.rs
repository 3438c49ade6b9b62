//! Uniform rectilinear image volume: dims, spacing, origin.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::array::{Attributes, FieldData};
use crate::error::{MeshTkError, Result};
use crate::poly_data::check_len;

/// A uniform image volume.
///
/// Node `(i, j, k)` sits at `origin + (i, j, k) * spacing`. Linear indexing
/// is x-fastest: `index = i + j * nx + k * nx * ny`, matching the on-disk
/// ordering of the legacy file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    dims: [usize; 3],
    spacing: DVec3,
    origin: DVec3,
    point_data: Attributes,
    cell_data: Attributes,
    field_data: FieldData,
}

impl ImageData {
    /// Creates an image with the given node dimensions, spacing, and origin.
    ///
    /// Every dimension must be at least 1.
    pub fn new(dims: [usize; 3], spacing: DVec3, origin: DVec3) -> Result<Self> {
        if dims.contains(&0) {
            return Err(MeshTkError::InvalidDimensions(dims[0], dims[1], dims[2]));
        }
        Ok(Self {
            dims,
            spacing,
            origin,
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

    /// Node spacing.
    #[must_use]
    pub fn spacing(&self) -> DVec3 {
        self.spacing
    }

    /// Origin (position of node `(0, 0, 0)`).
    #[must_use]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Total number of nodes.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Total number of cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.dims
            .iter()
            .map(|&d| d.saturating_sub(1).max(1))
            .product()
    }

    /// Flattens a 3-D node index to a linear index.
    #[must_use]
    pub fn flatten_index(&self, ijk: [usize; 3]) -> usize {
        ijk[0] + ijk[1] * self.dims[0] + ijk[2] * self.dims[0] * self.dims[1]
    }

    /// Unflattens a linear node index to a 3-D index.
    #[must_use]
    pub fn unflatten_index(&self, index: usize) -> [usize; 3] {
        let i = index % self.dims[0];
        let j = (index / self.dims[0]) % self.dims[1];
        let k = index / (self.dims[0] * self.dims[1]);
        [i, j, k]
    }

    /// Position of the node at a 3-D index.
    #[must_use]
    pub fn position(&self, ijk: [usize; 3]) -> DVec3 {
        self.origin
            + DVec3::new(
                ijk[0] as f64 * self.spacing.x,
                ijk[1] as f64 * self.spacing.y,
                ijk[2] as f64 * self.spacing.z,
            )
    }

    /// Materializes every node position, in linear-index order.
    #[must_use]
    pub fn positions(&self) -> Vec<DVec3> {
        let mut out = Vec::with_capacity(self.num_points());
        for k in 0..self.dims[2] {
            for j in 0..self.dims[1] {
                for i in 0..self.dims[0] {
                    out.push(self.position([i, j, k]));
                }
            }
        }
        out
    }

    /// Axis-aligned bounds `(min, max)`.
    #[must_use]
    pub fn bounds(&self) -> (DVec3, DVec3) {
        let far = self.position([
            self.dims[0] - 1,
            self.dims[1] - 1,
            self.dims[2] - 1,
        ]);
        (self.origin.min(far), self.origin.max(far))
    }

    /// Center of the bounding box.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        let (lo, hi) = self.bounds();
        (lo + hi) * 0.5
    }

    /// Continuous (fractional) node coordinates of a world position.
    fn continuous_index(&self, x: DVec3) -> DVec3 {
        let d = x - self.origin;
        DVec3::new(
            if self.spacing.x.abs() > 0.0 { d.x / self.spacing.x } else { 0.0 },
            if self.spacing.y.abs() > 0.0 { d.y / self.spacing.y } else { 0.0 },
            if self.spacing.z.abs() > 0.0 { d.z / self.spacing.z } else { 0.0 },
        )
    }

    /// Linear index of the node nearest to `x`, or `None` outside the volume.
    #[must_use]
    pub fn find_point(&self, x: DVec3) -> Option<usize> {
        let c = self.continuous_index(x);
        let mut ijk = [0_usize; 3];
        for (axis, value) in [c.x, c.y, c.z].into_iter().enumerate() {
            let max = self.dims[axis] as f64 - 1.0;
            if value < -0.5 || value > max + 0.5 {
                return None;
            }
            ijk[axis] = value.round().clamp(0.0, max) as usize;
        }
        Some(self.flatten_index(ijk))
    }

    /// Structured cell coordinates of a world position.
    ///
    /// Returns the containing cell's lower corner `(i, j, k)` and the
    /// parametric coordinates within that cell (each in `[0, 1]`), or `None`
    /// outside the volume.
    #[must_use]
    pub fn structured_coords(&self, x: DVec3) -> Option<([usize; 3], DVec3)> {
        let c = self.continuous_index(x);
        let mut ijk = [0_usize; 3];
        let mut pcoords = [0.0_f64; 3];
        for (axis, value) in [c.x, c.y, c.z].into_iter().enumerate() {
            let max = self.dims[axis] as f64 - 1.0;
            if value < 0.0 || value > max {
                return None;
            }
            // Points on the far boundary land in the last cell
            let cell = (value.floor() as usize).min(self.dims[axis].saturating_sub(2));
            ijk[axis] = cell;
            pcoords[axis] = value - cell as f64;
        }
        Some((ijk, DVec3::from_array(pcoords)))
    }

    /// Linear indices of the (up to) 26-neighborhood of a node.
    ///
    /// `delta` widens the neighborhood to `(2*delta + 1)^3 - 1` nodes;
    /// out-of-bounds neighbors are skipped.
    #[must_use]
    pub fn neighbors(&self, index: usize, delta: usize) -> Vec<usize> {
        let [i, j, k] = self.unflatten_index(index);
        let d = delta as isize;
        let mut out = Vec::new();
        for dk in -d..=d {
            for dj in -d..=d {
                for di in -d..=d {
                    if di == 0 && dj == 0 && dk == 0 {
                        continue;
                    }
                    let ni = i as isize + di;
                    let nj = j as isize + dj;
                    let nk = k as isize + dk;
                    if ni < 0
                        || nj < 0
                        || nk < 0
                        || ni >= self.dims[0] as isize
                        || nj >= self.dims[1] as isize
                        || nk >= self.dims[2] as isize
                    {
                        continue;
                    }
                    out.push(self.flatten_index([ni as usize, nj as usize, nk as usize]));
                }
            }
        }
        out
    }

    /// Value of a named point scalar at the node nearest to `x`.
    pub fn scalar_at_nearest(&self, x: DVec3, name: &str) -> Result<Option<f64>> {
        let values = self.point_data.scalars(name)?;
        Ok(self.find_point(x).map(|i| values[i]))
    }

    /// A new empty image with the same dims, spacing, and origin.
    #[must_use]
    pub fn same_geometry(&self) -> Self {
        Self {
            dims: self.dims,
            spacing: self.spacing,
            origin: self.origin,
            point_data: Attributes::new(),
            cell_data: Attributes::new(),
            field_data: FieldData::new(),
        }
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

impl Default for ImageData {
    fn default() -> Self {
        Self {
            dims: [1, 1, 1],
            spacing: DVec3::ONE,
            origin: DVec3::ZERO,
            point_data: Attributes::new(),
            cell_data: Attributes::new(),
            field_data: FieldData::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ImageData {
        ImageData::new([3, 4, 5], DVec3::new(0.5, 1.0, 2.0), DVec3::new(1.0, 0.0, -1.0))
            .unwrap()
    }

    #[test]
    fn test_index_round_trip() {
        let img = small();
        for idx in [0, 1, 7, 59] {
            assert_eq!(img.flatten_index(img.unflatten_index(idx)), idx);
        }
        assert_eq!(img.num_points(), 60);
        assert_eq!(img.num_cells(), 2 * 3 * 4);
    }

    #[test]
    fn test_positions_match_indexing() {
        let img = small();
        let all = img.positions();
        assert_eq!(all.len(), img.num_points());
        let idx = img.flatten_index([2, 1, 3]);
        assert_eq!(all[idx], img.position([2, 1, 3]));
        assert_eq!(img.position([0, 0, 0]), img.origin());
    }

    #[test]
    fn test_find_point() {
        let img = small();
        // Exactly on a node
        let idx = img.find_point(img.position([1, 2, 0]));
        assert_eq!(idx, Some(img.flatten_index([1, 2, 0])));
        // Slightly off still snaps
        let idx = img.find_point(img.position([1, 2, 0]) + DVec3::splat(0.05));
        assert_eq!(idx, Some(img.flatten_index([1, 2, 0])));
        // Far outside
        assert_eq!(img.find_point(DVec3::splat(100.0)), None);
    }

    #[test]
    fn test_structured_coords() {
        let img = small();
        let x = img.position([1, 1, 1]) + DVec3::new(0.25, 0.5, 0.75) * img.spacing();
        let (ijk, p) = img.structured_coords(x).unwrap();
        assert_eq!(ijk, [1, 1, 1]);
        assert!((p - DVec3::new(0.25, 0.5, 0.75)).length() < 1e-12);
        // Far corner lands in the last cell with pcoords 1
        let (ijk, p) = img.structured_coords(img.position([2, 3, 4])).unwrap();
        assert_eq!(ijk, [1, 2, 3]);
        assert!((p - DVec3::ONE).length() < 1e-12);
    }

    #[test]
    fn test_neighbors_corner() {
        let img = small();
        let n = img.neighbors(0, 1);
        assert_eq!(n.len(), 7); // corner node of a 3x4x5 grid
        assert!(!n.contains(&0));
    }

    #[test]
    fn test_zero_dims_rejected() {
        assert!(ImageData::new([0, 2, 2], DVec3::ONE, DVec3::ZERO).is_err());
    }
}
