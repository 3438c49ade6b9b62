//! Unstructured cell dataset: explicit points plus typed cells.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::array::{Attributes, FieldData};
use crate::error::Result;
use crate::poly_data::{bounds_of, check_len, PolyData};

/// Cell types, with the classic visualization-toolkit type ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    Vertex,
    PolyVertex,
    Line,
    PolyLine,
    Triangle,
    Polygon,
    Quad,
    Tetra,
    Voxel,
    Hexahedron,
    Wedge,
    Pyramid,
}

impl CellType {
    /// The on-disk type id used by the legacy file format.
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Self::Vertex => 1,
            Self::PolyVertex => 2,
            Self::Line => 3,
            Self::PolyLine => 4,
            Self::Triangle => 5,
            Self::Polygon => 7,
            Self::Quad => 9,
            Self::Tetra => 10,
            Self::Voxel => 11,
            Self::Hexahedron => 12,
            Self::Wedge => 13,
            Self::Pyramid => 14,
        }
    }

    /// Maps an on-disk type id back to a cell type.
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            1 => Self::Vertex,
            2 => Self::PolyVertex,
            3 => Self::Line,
            4 => Self::PolyLine,
            5 => Self::Triangle,
            7 => Self::Polygon,
            9 => Self::Quad,
            10 => Self::Tetra,
            11 => Self::Voxel,
            12 => Self::Hexahedron,
            13 => Self::Wedge,
            14 => Self::Pyramid,
            _ => None?,
        })
    }

    /// True for 2-D (surface) cell types.
    #[must_use]
    pub fn is_surface(self) -> bool {
        matches!(self, Self::Triangle | Self::Polygon | Self::Quad)
    }
}

/// One cell: a type tag plus point indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellType,
    pub connectivity: Vec<u32>,
}

impl Cell {
    /// Creates a cell.
    #[must_use]
    pub fn new(kind: CellType, connectivity: Vec<u32>) -> Self {
        Self { kind, connectivity }
    }
}

/// An unstructured grid: points and arbitrarily typed cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnstructuredGrid {
    points: Vec<DVec3>,
    cells: Vec<Cell>,
    point_data: Attributes,
    cell_data: Attributes,
    field_data: FieldData,
}

impl UnstructuredGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grid from points and cells.
    #[must_use]
    pub fn from_cells(points: Vec<DVec3>, cells: Vec<Cell>) -> Self {
        Self {
            points,
            cells,
            ..Self::default()
        }
    }

    /// Number of points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Number of cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
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

    /// Returns the cells.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Appends a cell.
    pub fn push_cell(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Axis-aligned bounds `(min, max)`, or `None` for an empty grid.
    #[must_use]
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        bounds_of(&self.points)
    }

    /// Center of the bounding box (zero for an empty grid).
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

    /// Adds a per-cell scalar array, checking the length.
    pub fn add_cell_scalar(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        check_len(values.len(), self.num_cells())?;
        self.cell_data.insert_scalar(name, values);
        Ok(())
    }

    /// Converts surface and lower-dimensional cells into a polygonal dataset.
    ///
    /// Volume cells are skipped; point data is carried over unchanged.
    #[must_use]
    pub fn to_poly_data(&self) -> PolyData {
        let mut pd = PolyData::new();
        pd.set_points(self.points.clone());
        *pd.point_data_mut() = self.point_data.clone();
        self.field_data.copy_into(pd.field_data_mut());
        for cell in &self.cells {
            match cell.kind {
                CellType::Vertex | CellType::PolyVertex => {
                    pd.push_vert(cell.connectivity.clone());
                }
                CellType::Line | CellType::PolyLine => {
                    pd.push_line(cell.connectivity.clone());
                }
                CellType::Triangle | CellType::Polygon | CellType::Quad => {
                    pd.push_poly(cell.connectivity.clone());
                }
                _ => {}
            }
        }
        pd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_type_ids_round_trip() {
        for kind in [
            CellType::Vertex,
            CellType::Line,
            CellType::Triangle,
            CellType::Quad,
            CellType::Tetra,
            CellType::Hexahedron,
        ] {
            assert_eq!(CellType::from_id(kind.id()), Some(kind));
        }
        assert_eq!(CellType::from_id(99), None);
    }

    #[test]
    fn test_to_poly_data_skips_volume_cells() {
        let points = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::Z,
        ];
        let grid = UnstructuredGrid::from_cells(
            points,
            vec![
                Cell::new(CellType::Triangle, vec![0, 1, 2]),
                Cell::new(CellType::Tetra, vec![0, 1, 2, 3]),
                Cell::new(CellType::Line, vec![0, 3]),
            ],
        );
        let pd = grid.to_poly_data();
        assert_eq!(pd.polys().len(), 1);
        assert_eq!(pd.lines().len(), 1);
        assert_eq!(pd.num_points(), 4);
    }
}
