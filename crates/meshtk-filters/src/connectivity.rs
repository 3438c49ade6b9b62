//! Connected-region extraction over shared-point adjacency.

use std::collections::HashMap;

use glam::DVec3;
use meshtk_core::{PolyCellKind, PolyData, UnstructuredGrid};

use crate::mesh::subset_attributes;

/// Groups cell ids into connected regions (cells sharing a point connect).
fn compute_regions(num_points: usize, cells: &[Vec<u32>]) -> Vec<Vec<usize>> {
    let mut point_cells: Vec<Vec<u32>> = vec![Vec::new(); num_points];
    for (c, cell) in cells.iter().enumerate() {
        for &p in cell {
            point_cells[p as usize].push(c as u32);
        }
    }

    let mut region_of: Vec<Option<u32>> = vec![None; cells.len()];
    let mut regions: Vec<Vec<usize>> = Vec::new();
    let mut stack: Vec<u32> = Vec::new();

    for seed in 0..cells.len() {
        if region_of[seed].is_some() {
            continue;
        }
        let region_id = regions.len() as u32;
        let mut members = Vec::new();
        stack.push(seed as u32);
        region_of[seed] = Some(region_id);
        while let Some(c) = stack.pop() {
            members.push(c as usize);
            for &p in &cells[c as usize] {
                for &n in &point_cells[p as usize] {
                    if region_of[n as usize].is_none() {
                        region_of[n as usize] = Some(region_id);
                        stack.push(n);
                    }
                }
            }
        }
        regions.push(members);
    }
    regions
}

/// Extracts a subset of cells (by flat index) into a new dataset,
/// compacting points and carrying point/cell arrays.
fn subset_poly(data: &PolyData, cell_ids: &[usize]) -> PolyData {
    let mut verts_ids = Vec::new();
    let mut lines_ids = Vec::new();
    let mut polys_ids = Vec::new();
    for &id in cell_ids {
        match data.cell(id) {
            Some((PolyCellKind::Vert, _)) => verts_ids.push(id),
            Some((PolyCellKind::Line, _)) => lines_ids.push(id),
            Some((PolyCellKind::Poly, _)) => polys_ids.push(id),
            None => {}
        }
    }
    verts_ids.sort_unstable();
    lines_ids.sort_unstable();
    polys_ids.sort_unstable();

    let mut new_index: HashMap<u32, u32> = HashMap::new();
    let mut used: Vec<usize> = Vec::new();
    let mut remap = |cell: &[u32]| -> Vec<u32> {
        cell.iter()
            .map(|&p| {
                *new_index.entry(p).or_insert_with(|| {
                    used.push(p as usize);
                    (used.len() - 1) as u32
                })
            })
            .collect()
    };

    let mut out = PolyData::new();
    let mut flat_order = Vec::new();
    for &id in &verts_ids {
        let (_, cell) = data.cell(id).unwrap();
        let mapped = remap(cell);
        out.push_vert(mapped);
        flat_order.push(id);
    }
    for &id in &lines_ids {
        let (_, cell) = data.cell(id).unwrap();
        let mapped = remap(cell);
        out.push_line(mapped);
        flat_order.push(id);
    }
    for &id in &polys_ids {
        let (_, cell) = data.cell(id).unwrap();
        let mapped = remap(cell);
        out.push_poly(mapped);
        flat_order.push(id);
    }

    out.set_points(used.iter().map(|&i| data.points()[i]).collect());
    *out.point_data_mut() = subset_attributes(data.point_data(), &used);
    *out.cell_data_mut() = subset_attributes(data.cell_data(), &flat_order);
    data.field_data().copy_into(out.field_data_mut());
    out
}

fn flat_cells(data: &PolyData) -> Vec<Vec<u32>> {
    data.cells().map(|(_, c)| c.to_vec()).collect()
}

/// Extracts every connected region, largest (by point count) first.
///
/// Regions with fewer than `min_points` points are dropped.
#[must_use]
pub fn regions_all(data: &PolyData, min_points: Option<usize>) -> Vec<PolyData> {
    let cells = flat_cells(data);
    let mut out: Vec<PolyData> = compute_regions(data.num_points(), &cells)
        .iter()
        .map(|ids| subset_poly(data, ids))
        .filter(|r| min_points.map_or(true, |m| r.num_points() >= m))
        .collect();
    out.sort_by_key(|r| std::cmp::Reverse(r.num_points()));
    log::debug!("connectivity: {} region(s)", out.len());
    out
}

/// Extracts the largest connected region (empty input gives empty output).
#[must_use]
pub fn region_largest(data: &PolyData) -> PolyData {
    regions_all(data, None).into_iter().next().unwrap_or_default()
}

/// Extracts the region containing the given flat cell index.
#[must_use]
pub fn region_containing_cell(data: &PolyData, cell_id: usize) -> PolyData {
    let cells = flat_cells(data);
    for ids in compute_regions(data.num_points(), &cells) {
        if ids.contains(&cell_id) {
            return subset_poly(data, &ids);
        }
    }
    PolyData::new()
}

/// Extracts the region containing the point closest to `x`.
#[must_use]
pub fn region_closest_to(data: &PolyData, x: DVec3) -> PolyData {
    region_min_dist_to(data, x, 1)
}

/// Extracts the region with the smallest point-to-`x` distance among the
/// regions holding at least `min_points` points.
///
/// Falls back to the closest region of any size when none qualifies.
#[must_use]
pub fn region_min_dist_to(data: &PolyData, x: DVec3, min_points: usize) -> PolyData {
    let mut regions = regions_all(data, Some(min_points));
    if regions.is_empty() {
        regions = regions_all(data, None);
    }
    let mut best: Option<(usize, f64)> = None;
    for (i, region) in regions.iter().enumerate() {
        let d = region
            .points()
            .iter()
            .map(|p| (*p - x).length_squared())
            .fold(f64::INFINITY, f64::min);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    match best {
        Some((i, _)) => regions.swap_remove(i),
        None => PolyData::new(),
    }
}

/// Flat indices of the cells incident to a point.
#[must_use]
pub fn connected_cell_ids(data: &PolyData, point_id: u32) -> Vec<usize> {
    data.cells()
        .enumerate()
        .filter(|(_, (_, cell))| cell.contains(&point_id))
        .map(|(i, _)| i)
        .collect()
}

/// Extracts the largest connected region of an unstructured grid.
#[must_use]
pub fn region_largest_unstructured(grid: &UnstructuredGrid) -> UnstructuredGrid {
    let cells: Vec<Vec<u32>> = grid.cells().iter().map(|c| c.connectivity.clone()).collect();
    let regions = compute_regions(grid.num_points(), &cells);
    let best = regions
        .iter()
        .max_by_key(|ids| region_point_count(&cells, ids));
    match best {
        Some(ids) => subset_unstructured(grid, ids),
        None => UnstructuredGrid::new(),
    }
}

/// Extracts the unstructured-grid region with the smallest point distance
/// to `x`.
#[must_use]
pub fn region_closest_to_unstructured(grid: &UnstructuredGrid, x: DVec3) -> UnstructuredGrid {
    let cells: Vec<Vec<u32>> = grid.cells().iter().map(|c| c.connectivity.clone()).collect();
    let regions = compute_regions(grid.num_points(), &cells);
    let mut best: Option<(&Vec<usize>, f64)> = None;
    for ids in &regions {
        let d = ids
            .iter()
            .flat_map(|&c| &cells[c])
            .map(|&p| (grid.points()[p as usize] - x).length_squared())
            .fold(f64::INFINITY, f64::min);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((ids, d));
        }
    }
    match best {
        Some((ids, _)) => subset_unstructured(grid, ids),
        None => UnstructuredGrid::new(),
    }
}

fn region_point_count(cells: &[Vec<u32>], ids: &[usize]) -> usize {
    let mut pts: Vec<u32> = ids.iter().flat_map(|&c| cells[c].clone()).collect();
    pts.sort_unstable();
    pts.dedup();
    pts.len()
}

fn subset_unstructured(grid: &UnstructuredGrid, cell_ids: &[usize]) -> UnstructuredGrid {
    let mut sorted = cell_ids.to_vec();
    sorted.sort_unstable();

    let mut new_index: HashMap<u32, u32> = HashMap::new();
    let mut used: Vec<usize> = Vec::new();
    let mut cells = Vec::with_capacity(sorted.len());
    for &id in &sorted {
        let mut cell = grid.cells()[id].clone();
        for p in &mut cell.connectivity {
            let idx = *new_index.entry(*p).or_insert_with(|| {
                used.push(*p as usize);
                (used.len() - 1) as u32
            });
            *p = idx;
        }
        cells.push(cell);
    }
    let mut out = UnstructuredGrid::from_cells(
        used.iter().map(|&i| grid.points()[i]).collect(),
        cells,
    );
    *out.point_data_mut() = subset_attributes(grid.point_data(), &used);
    *out.cell_data_mut() = subset_attributes(grid.cell_data(), &sorted);
    grid.field_data().copy_into(out.field_data_mut());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::append;
    use crate::sources;

    fn two_spheres() -> PolyData {
        let a = sources::sphere(DVec3::ZERO, 1.0, 8);
        let b = sources::sphere(DVec3::X * 10.0, 0.5, 6);
        append(&a, &b)
    }

    #[test]
    fn test_regions_all_sorted() {
        let joined = two_spheres();
        let regions = regions_all(&joined, None);
        assert_eq!(regions.len(), 2);
        assert!(regions[0].num_points() > regions[1].num_points());
    }

    #[test]
    fn test_region_largest() {
        let joined = two_spheres();
        let largest = region_largest(&joined);
        let a = sources::sphere(DVec3::ZERO, 1.0, 8);
        assert_eq!(largest.num_points(), a.num_points());
    }

    #[test]
    fn test_region_closest() {
        let joined = two_spheres();
        let near_small = region_closest_to(&joined, DVec3::X * 9.0);
        assert!(near_small.num_points() < 60);
        assert!(near_small
            .points()
            .iter()
            .all(|p| (p.x - 10.0).abs() <= 0.5 + 1e-9));
    }

    #[test]
    fn test_min_points_filter() {
        let joined = two_spheres();
        let small_count = sources::sphere(DVec3::X * 10.0, 0.5, 6).num_points();
        // Filter excludes the small sphere; closest must fall back to the big one
        let region = region_min_dist_to(&joined, DVec3::X * 9.0, small_count + 1);
        assert!(region.num_points() > small_count);
    }

    #[test]
    fn test_connected_cell_ids() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 8);
        let ids = connected_cell_ids(&s, 0);
        // The north pole belongs to `res` cap triangles
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn test_empty_input() {
        let empty = PolyData::new();
        assert_eq!(regions_all(&empty, None).len(), 0);
        assert_eq!(region_largest(&empty).num_points(), 0);
    }

    #[test]
    fn test_region_carries_data() {
        let mut joined = two_spheres();
        let n = joined.num_points();
        joined
            .add_point_scalar("id", (0..n).map(|i| i as f64).collect())
            .unwrap();
        let largest = region_largest(&joined);
        let ids = largest.point_data().scalars("id").unwrap();
        assert_eq!(ids.len(), largest.num_points());
        assert!((ids[0] - 0.0).abs() < 1e-12);
    }
}
