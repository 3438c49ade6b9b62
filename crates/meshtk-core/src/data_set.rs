//! The [`DataSet`] sum type: uniform access to any concrete dataset.

use std::borrow::Cow;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::array::{Attributes, FieldData};
use crate::image_data::ImageData;
use crate::poly_data::PolyData;
use crate::structured_grid::StructuredGrid;
use crate::unstructured_grid::UnstructuredGrid;

/// Any of the four concrete dataset types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSet {
    PolyData(PolyData),
    ImageData(ImageData),
    StructuredGrid(StructuredGrid),
    UnstructuredGrid(UnstructuredGrid),
}

impl DataSet {
    /// True for polygonal data.
    #[must_use]
    pub fn is_poly_data(&self) -> bool {
        matches!(self, Self::PolyData(_))
    }

    /// True for image volumes.
    #[must_use]
    pub fn is_image_data(&self) -> bool {
        matches!(self, Self::ImageData(_))
    }

    /// True for structured grids.
    #[must_use]
    pub fn is_structured_grid(&self) -> bool {
        matches!(self, Self::StructuredGrid(_))
    }

    /// True for unstructured grids.
    #[must_use]
    pub fn is_unstructured_grid(&self) -> bool {
        matches!(self, Self::UnstructuredGrid(_))
    }

    /// A short name for the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::PolyData(_) => "PolyData",
            Self::ImageData(_) => "ImageData",
            Self::StructuredGrid(_) => "StructuredGrid",
            Self::UnstructuredGrid(_) => "UnstructuredGrid",
        }
    }

    /// Borrows the polygonal data, if that is the variant.
    #[must_use]
    pub fn as_poly_data(&self) -> Option<&PolyData> {
        match self {
            Self::PolyData(pd) => Some(pd),
            _ => None,
        }
    }

    /// Borrows the image volume, if that is the variant.
    #[must_use]
    pub fn as_image_data(&self) -> Option<&ImageData> {
        match self {
            Self::ImageData(img) => Some(img),
            _ => None,
        }
    }

    /// Borrows the structured grid, if that is the variant.
    #[must_use]
    pub fn as_structured_grid(&self) -> Option<&StructuredGrid> {
        match self {
            Self::StructuredGrid(sg) => Some(sg),
            _ => None,
        }
    }

    /// Borrows the unstructured grid, if that is the variant.
    #[must_use]
    pub fn as_unstructured_grid(&self) -> Option<&UnstructuredGrid> {
        match self {
            Self::UnstructuredGrid(ug) => Some(ug),
            _ => None,
        }
    }

    /// Number of points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        match self {
            Self::PolyData(pd) => pd.num_points(),
            Self::ImageData(img) => img.num_points(),
            Self::StructuredGrid(sg) => sg.num_points(),
            Self::UnstructuredGrid(ug) => ug.num_points(),
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        match self {
            Self::PolyData(pd) => pd.num_cells(),
            Self::ImageData(img) => img.num_cells(),
            Self::StructuredGrid(sg) => sg.num_cells(),
            Self::UnstructuredGrid(ug) => ug.num_cells(),
        }
    }

    /// Point positions; borrowed where the dataset stores them explicitly,
    /// materialized for image volumes.
    #[must_use]
    pub fn points(&self) -> Cow<'_, [DVec3]> {
        match self {
            Self::PolyData(pd) => Cow::Borrowed(pd.points()),
            Self::ImageData(img) => Cow::Owned(img.positions()),
            Self::StructuredGrid(sg) => Cow::Borrowed(sg.points()),
            Self::UnstructuredGrid(ug) => Cow::Borrowed(ug.points()),
        }
    }

    /// Axis-aligned bounds `(min, max)`, or `None` when there are no points.
    #[must_use]
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        match self {
            Self::PolyData(pd) => pd.bounds(),
            Self::ImageData(img) => Some(img.bounds()),
            Self::StructuredGrid(sg) => sg.bounds(),
            Self::UnstructuredGrid(ug) => ug.bounds(),
        }
    }

    /// Center of the bounding box (zero when empty).
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.bounds()
            .map_or(DVec3::ZERO, |(lo, hi)| (lo + hi) * 0.5)
    }

    /// The largest distance between any two bounding-box corners
    /// (the bounding-box diagonal).
    #[must_use]
    pub fn max_bound(&self) -> f64 {
        self.bounds().map_or(0.0, |(lo, hi)| (hi - lo).length())
    }

    /// Per-point attribute arrays.
    #[must_use]
    pub fn point_data(&self) -> &Attributes {
        match self {
            Self::PolyData(pd) => pd.point_data(),
            Self::ImageData(img) => img.point_data(),
            Self::StructuredGrid(sg) => sg.point_data(),
            Self::UnstructuredGrid(ug) => ug.point_data(),
        }
    }

    /// Per-point attribute arrays, mutably.
    pub fn point_data_mut(&mut self) -> &mut Attributes {
        match self {
            Self::PolyData(pd) => pd.point_data_mut(),
            Self::ImageData(img) => img.point_data_mut(),
            Self::StructuredGrid(sg) => sg.point_data_mut(),
            Self::UnstructuredGrid(ug) => ug.point_data_mut(),
        }
    }

    /// Per-cell attribute arrays.
    #[must_use]
    pub fn cell_data(&self) -> &Attributes {
        match self {
            Self::PolyData(pd) => pd.cell_data(),
            Self::ImageData(img) => img.cell_data(),
            Self::StructuredGrid(sg) => sg.cell_data(),
            Self::UnstructuredGrid(ug) => ug.cell_data(),
        }
    }

    /// Per-cell attribute arrays, mutably.
    pub fn cell_data_mut(&mut self) -> &mut Attributes {
        match self {
            Self::PolyData(pd) => pd.cell_data_mut(),
            Self::ImageData(img) => img.cell_data_mut(),
            Self::StructuredGrid(sg) => sg.cell_data_mut(),
            Self::UnstructuredGrid(ug) => ug.cell_data_mut(),
        }
    }

    /// Whole-dataset field data.
    #[must_use]
    pub fn field_data(&self) -> &FieldData {
        match self {
            Self::PolyData(pd) => pd.field_data(),
            Self::ImageData(img) => img.field_data(),
            Self::StructuredGrid(sg) => sg.field_data(),
            Self::UnstructuredGrid(ug) => ug.field_data(),
        }
    }

    /// Whole-dataset field data, mutably.
    pub fn field_data_mut(&mut self) -> &mut FieldData {
        match self {
            Self::PolyData(pd) => pd.field_data_mut(),
            Self::ImageData(img) => img.field_data_mut(),
            Self::StructuredGrid(sg) => sg.field_data_mut(),
            Self::UnstructuredGrid(ug) => ug.field_data_mut(),
        }
    }
}

impl From<PolyData> for DataSet {
    fn from(pd: PolyData) -> Self {
        Self::PolyData(pd)
    }
}

impl From<ImageData> for DataSet {
    fn from(img: ImageData) -> Self {
        Self::ImageData(img)
    }
}

impl From<StructuredGrid> for DataSet {
    fn from(sg: StructuredGrid) -> Self {
        Self::StructuredGrid(sg)
    }
}

impl From<UnstructuredGrid> for DataSet {
    fn from(ug: UnstructuredGrid) -> Self {
        Self::UnstructuredGrid(ug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates_and_points() {
        let pd = PolyData::from_vertices(vec![DVec3::ZERO, DVec3::X]);
        let ds: DataSet = pd.into();
        assert!(ds.is_poly_data());
        assert!(!ds.is_image_data());
        assert_eq!(ds.num_points(), 2);
        assert_eq!(ds.points().len(), 2);
        assert_eq!(ds.type_name(), "PolyData");
    }

    #[test]
    fn test_image_points_materialize() {
        let img = ImageData::new([2, 2, 1], DVec3::ONE, DVec3::ZERO).unwrap();
        let ds: DataSet = img.into();
        let pts = ds.points();
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[3], DVec3::new(1.0, 1.0, 0.0));
        assert_eq!(ds.center(), DVec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_max_bound() {
        let img = ImageData::new([2, 1, 1], DVec3::new(3.0, 1.0, 1.0), DVec3::ZERO).unwrap();
        let ds: DataSet = img.into();
        assert!((ds.max_bound() - 3.0).abs() < 1e-12);
    }
}
