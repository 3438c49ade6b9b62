//! Polygonal dataset: points plus vertex, line, and polygon cells.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::array::{Attributes, FieldData};
use crate::error::{MeshTkError, Result};

/// Which cell stream a polygonal cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolyCellKind {
    /// Isolated vertex cells.
    Vert,
    /// Polyline cells (two or more points each).
    Line,
    /// Polygon cells (three or more points each).
    Poly,
}

/// A polygonal dataset.
///
/// Cells are grouped into three streams — `verts`, `lines`, `polys` — each a
/// list of point-index lists. Cell indexing (for per-cell data) runs over
/// verts first, then lines, then polys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyData {
    points: Vec<DVec3>,
    verts: Vec<Vec<u32>>,
    lines: Vec<Vec<u32>>,
    polys: Vec<Vec<u32>>,
    point_data: Attributes,
    cell_data: Attributes,
    field_data: FieldData,
}

impl PolyData {
    /// Creates an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dataset from points and polygon cells.
    #[must_use]
    pub fn from_polys(points: Vec<DVec3>, polys: Vec<Vec<u32>>) -> Self {
        Self {
            points,
            polys,
            ..Self::default()
        }
    }

    /// Creates a dataset from points and triangle cells.
    #[must_use]
    pub fn from_triangles(points: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self::from_polys(points, triangles.into_iter().map(|t| t.to_vec()).collect())
    }

    /// Creates a dataset holding a single polyline over all points.
    ///
    /// With `closed`, an extra segment joins the last point back to the first.
    #[must_use]
    pub fn from_polyline(points: Vec<DVec3>, closed: bool) -> Self {
        let mut ids: Vec<u32> = (0..points.len() as u32).collect();
        if closed && !ids.is_empty() {
            ids.push(0);
        }
        Self {
            points,
            lines: vec![ids],
            ..Self::default()
        }
    }

    /// Creates a vertex cloud: one vert cell per point.
    #[must_use]
    pub fn from_vertices(points: Vec<DVec3>) -> Self {
        let verts = (0..points.len() as u32).map(|i| vec![i]).collect();
        Self {
            points,
            verts,
            ..Self::default()
        }
    }

    /// Number of points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Number of cells across all three streams.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.verts.len() + self.lines.len() + self.polys.len()
    }

    /// Returns the points.
    #[must_use]
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Replaces the points.
    pub fn set_points(&mut self, points: Vec<DVec3>) {
        self.points = points;
    }

    /// Points flattened into `[x0, y0, z0, x1, ...]`.
    #[must_use]
    pub fn points_flat(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .collect()
    }

    /// Replaces the points from a flat xyz buffer.
    pub fn set_points_flat(&mut self, buffer: &[f64]) -> Result<()> {
        if buffer.len() % 3 != 0 {
            return Err(MeshTkError::BadBufferLength {
                len: buffer.len(),
                components: 3,
            });
        }
        self.points = buffer
            .chunks_exact(3)
            .map(|c| DVec3::new(c[0], c[1], c[2]))
            .collect();
        Ok(())
    }

    /// Vert cells.
    #[must_use]
    pub fn verts(&self) -> &[Vec<u32>] {
        &self.verts
    }

    /// Line cells.
    #[must_use]
    pub fn lines(&self) -> &[Vec<u32>] {
        &self.lines
    }

    /// Polygon cells.
    #[must_use]
    pub fn polys(&self) -> &[Vec<u32>] {
        &self.polys
    }

    /// Appends a vert cell.
    pub fn push_vert(&mut self, cell: Vec<u32>) {
        self.verts.push(cell);
    }

    /// Appends a line cell.
    pub fn push_line(&mut self, cell: Vec<u32>) {
        self.lines.push(cell);
    }

    /// Appends a polygon cell.
    pub fn push_poly(&mut self, cell: Vec<u32>) {
        self.polys.push(cell);
    }

    /// Replaces the line cells.
    pub fn set_lines(&mut self, lines: Vec<Vec<u32>>) {
        self.lines = lines;
    }

    /// Replaces the polygon cells.
    pub fn set_polys(&mut self, polys: Vec<Vec<u32>>) {
        self.polys = polys;
    }

    /// Looks up a cell by its flat index (verts, then lines, then polys).
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<(PolyCellKind, &[u32])> {
        if index < self.verts.len() {
            return Some((PolyCellKind::Vert, &self.verts[index]));
        }
        let index = index - self.verts.len();
        if index < self.lines.len() {
            return Some((PolyCellKind::Line, &self.lines[index]));
        }
        let index = index - self.lines.len();
        self.polys
            .get(index)
            .map(|c| (PolyCellKind::Poly, c.as_slice()))
    }

    /// Iterates over all cells in flat-index order.
    pub fn cells(&self) -> impl Iterator<Item = (PolyCellKind, &[u32])> {
        self.verts
            .iter()
            .map(|c| (PolyCellKind::Vert, c.as_slice()))
            .chain(self.lines.iter().map(|c| (PolyCellKind::Line, c.as_slice())))
            .chain(self.polys.iter().map(|c| (PolyCellKind::Poly, c.as_slice())))
    }

    /// True when the dataset consists of line cells only.
    #[must_use]
    pub fn is_polyline_only(&self) -> bool {
        !self.lines.is_empty() && self.verts.is_empty() && self.polys.is_empty()
    }

    /// Axis-aligned bounds `(min, max)`, or `None` for an empty dataset.
    #[must_use]
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        bounds_of(&self.points)
    }

    /// Center of the bounding box (zero for an empty dataset).
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.bounds()
            .map_or(DVec3::ZERO, |(lo, hi)| (lo + hi) * 0.5)
    }

    /// Mean distance of the points from the bounding-box center.
    #[must_use]
    pub fn mean_radius(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let c = self.center();
        self.points.iter().map(|p| (*p - c).length()).sum::<f64>() / self.points.len() as f64
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

    /// Adds a per-cell scalar array, checking the length.
    pub fn add_cell_scalar(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        check_len(values.len(), self.num_cells())?;
        self.cell_data.insert_scalar(name, values);
        Ok(())
    }

    /// Adds a per-cell vector array, checking the length.
    pub fn add_cell_vector(&mut self, name: impl Into<String>, values: Vec<DVec3>) -> Result<()> {
        check_len(values.len(), self.num_cells())?;
        self.cell_data.insert_vector(name, values);
        Ok(())
    }
}

pub(crate) fn check_len(actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(MeshTkError::SizeMismatch { expected, actual })
    }
}

pub(crate) fn bounds_of(points: &[DVec3]) -> Option<(DVec3, DVec3)> {
    let first = *points.first()?;
    let mut lo = first;
    let mut hi = first;
    for p in &points[1..] {
        lo = lo.min(*p);
        hi = hi.max(*p);
    }
    Some((lo, hi))
}
