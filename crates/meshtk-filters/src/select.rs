//! Selection: points enclosed by a surface, cell extraction and deletion.

use std::collections::HashMap;

use glam::DVec3;
use meshtk_core::{
    Cell, CellType, DataSet, PolyCellKind, PolyData, Result, UnstructuredGrid,
};

use crate::cut::line_pierces_triangle;
use crate::mesh::subset_attributes;
use crate::surface::triangulate;

/// Classifies every point of `data` as inside (`true`) or outside the
/// closed surface, by parity ray casting against its triangles.
#[must_use]
pub fn inside_mask(data: &DataSet, surface: &PolyData) -> Vec<bool> {
    let tri = triangulate(surface);
    let points = data.points();
    let Some((lo, hi)) = tri.bounds() else {
        return vec![false; points.len()];
    };
    let diag = (hi - lo).length();
    // Slightly skew direction avoids edge-on and vertex-on degeneracies
    let dir = DVec3::new(1.0, 1.732e-4, 2.236e-7).normalize();
    let reach = 2.0 * diag + 1.0;

    let tri_points = tri.points();
    let tris: Vec<[DVec3; 3]> = tri
        .polys()
        .iter()
        .map(|t| {
            [
                tri_points[t[0] as usize],
                tri_points[t[1] as usize],
                tri_points[t[2] as usize],
            ]
        })
        .collect();
    if points.len() * tris.len() > 10_000_000 {
        log::debug!(
            "inside_mask: {} points x {} triangles, this will be slow",
            points.len(),
            tris.len()
        );
    }

    points
        .iter()
        .map(|&p| {
            if p.x < lo.x || p.y < lo.y || p.z < lo.z || p.x > hi.x || p.y > hi.y || p.z > hi.z {
                return false;
            }
            let far = p + dir * reach;
            let mut crossings = 0_usize;
            for t in &tris {
                if line_pierces_triangle(p, far, t[0], t[1], t[2]).is_some() {
                    crossings += 1;
                }
            }
            crossings % 2 == 1
        })
        .collect()
}

/// Indices of the points of `data` enclosed by the surface.
#[must_use]
pub fn inside_ids(data: &DataSet, surface: &PolyData) -> Vec<usize> {
    inside_mask(data, surface)
        .iter()
        .enumerate()
        .filter(|(_, &inside)| inside)
        .map(|(i, _)| i)
        .collect()
}

/// The enclosed points of `data` as a vertex cloud.
#[must_use]
pub fn inside_cloud(data: &DataSet, surface: &PolyData) -> PolyData {
    let points = data.points();
    PolyData::from_vertices(
        inside_ids(data, surface)
            .into_iter()
            .map(|i| points[i])
            .collect(),
    )
}

/// Values of a named point scalar at the enclosed points.
pub fn scalars_inside_surface(
    data: &DataSet,
    surface: &PolyData,
    array: &str,
) -> Result<Vec<f64>> {
    let values = data.point_data().scalars(array)?;
    Ok(inside_ids(data, surface)
        .into_iter()
        .map(|i| values[i])
        .collect())
}

fn poly_cell_type(kind: PolyCellKind, len: usize) -> CellType {
    match kind {
        PolyCellKind::Vert => {
            if len == 1 {
                CellType::Vertex
            } else {
                CellType::PolyVertex
            }
        }
        PolyCellKind::Line => {
            if len == 2 {
                CellType::Line
            } else {
                CellType::PolyLine
            }
        }
        PolyCellKind::Poly => match len {
            3 => CellType::Triangle,
            4 => CellType::Quad,
            _ => CellType::Polygon,
        },
    }
}

/// Extracts the cells with the given flat indices into an unstructured
/// grid, compacting points and carrying attribute arrays.
#[must_use]
pub fn extract_cells(data: &PolyData, cell_ids: &[usize]) -> UnstructuredGrid {
    let mut sorted = cell_ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut new_index: HashMap<u32, u32> = HashMap::new();
    let mut used: Vec<usize> = Vec::new();
    let mut cells = Vec::with_capacity(sorted.len());
    let mut taken = Vec::with_capacity(sorted.len());
    for &id in &sorted {
        let Some((kind, conn)) = data.cell(id) else {
            continue;
        };
        let connectivity: Vec<u32> = conn
            .iter()
            .map(|&p| {
                *new_index.entry(p).or_insert_with(|| {
                    used.push(p as usize);
                    (used.len() - 1) as u32
                })
            })
            .collect();
        cells.push(Cell::new(poly_cell_type(kind, conn.len()), connectivity));
        taken.push(id);
    }

    let mut out = UnstructuredGrid::from_cells(
        used.iter().map(|&i| data.points()[i]).collect(),
        cells,
    );
    *out.point_data_mut() = subset_attributes(data.point_data(), &used);
    *out.cell_data_mut() = subset_attributes(data.cell_data(), &taken);
    data.field_data().copy_into(out.field_data_mut());
    out
}

/// Removes the listed cells, returning the rest as an unstructured grid.
#[must_use]
pub fn delete_cells_by_id(data: &PolyData, cell_ids: &[usize]) -> UnstructuredGrid {
    let drop: std::collections::HashSet<usize> = cell_ids.iter().copied().collect();
    let keep: Vec<usize> = (0..data.num_cells()).filter(|i| !drop.contains(i)).collect();
    extract_cells(data, &keep)
}

/// Removes every cell with an edge longer than `max_edge_length`.
#[must_use]
pub fn delete_cells_by_edge_length(data: &PolyData, max_edge_length: f64) -> UnstructuredGrid {
    let points = data.points();
    let max_sq = max_edge_length * max_edge_length;
    let mut keep = Vec::new();
    for (i, (kind, cell)) in data.cells().enumerate() {
        let too_long = match kind {
            PolyCellKind::Vert => false,
            PolyCellKind::Line => cell.windows(2).any(|w| {
                (points[w[0] as usize] - points[w[1] as usize]).length_squared() > max_sq
            }),
            PolyCellKind::Poly => (0..cell.len()).any(|k| {
                let a = points[cell[k] as usize];
                let b = points[cell[(k + 1) % cell.len()] as usize];
                (a - b).length_squared() > max_sq
            }),
        };
        if !too_long {
            keep.push(i);
        }
    }
    if keep.len() < data.num_cells() {
        log::debug!(
            "delete_cells_by_edge_length: dropped {} of {} cells",
            data.num_cells() - keep.len(),
            data.num_cells()
        );
    }
    extract_cells(data, &keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources;
    use meshtk_core::ImageData;

    #[test]
    fn test_inside_mask_sphere() {
        let surface = sources::sphere(DVec3::ZERO, 1.0, 16);
        let probes = PolyData::from_vertices(vec![
            DVec3::ZERO,
            DVec3::new(0.5, 0.0, 0.0),
            DVec3::new(0.0, 0.9, 0.0),
            DVec3::new(1.5, 0.0, 0.0),
            DVec3::new(0.0, 0.0, -3.0),
        ]);
        let mask = inside_mask(&DataSet::PolyData(probes), &surface);
        assert_eq!(mask, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_inside_ids_image_nodes() {
        let surface = sources::sphere(DVec3::ZERO, 0.75, 16);
        let img = ImageData::new([5, 5, 5], DVec3::splat(0.5), DVec3::splat(-1.0)).unwrap();
        let ids = inside_ids(&DataSet::ImageData(img.clone()), &surface);
        // Only nodes within the tessellated sphere qualify
        for &i in &ids {
            let p = img.position(img.unflatten_index(i));
            assert!(p.length() < 0.8, "node {p:?} marked inside");
        }
        // The center node is inside
        let center = img.flatten_index([2, 2, 2]);
        assert!(ids.contains(&center));
    }

    #[test]
    fn test_extract_cells_round_trip() {
        let mut s = sources::sphere(DVec3::ZERO, 1.0, 8);
        let n_cells = s.num_cells();
        s.add_cell_scalar("cid", (0..n_cells).map(|i| i as f64).collect())
            .unwrap();
        let picked = extract_cells(&s, &[3, 5, 7]);
        assert_eq!(picked.num_cells(), 3);
        assert_eq!(
            picked.cell_data().scalars("cid").unwrap(),
            &[3.0, 5.0, 7.0]
        );
    }

    #[test]
    fn test_delete_cells_by_id() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 8);
        let n = s.num_cells();
        let remaining = delete_cells_by_id(&s, &[0, 1]);
        assert_eq!(remaining.num_cells(), n - 2);
    }

    #[test]
    fn test_delete_cells_by_edge_length() {
        // One small and one stretched triangle
        let pd = PolyData::from_triangles(
            vec![
                DVec3::ZERO,
                DVec3::X,
                DVec3::Y,
                DVec3::X * 10.0,
            ],
            vec![[0, 1, 2], [0, 1, 3]],
        );
        let kept = delete_cells_by_edge_length(&pd, 2.0);
        assert_eq!(kept.num_cells(), 1);
    }
}
