//! Polygonal mesh operations: appending, cleaning, edge queries, measures.

use std::collections::HashMap;

use glam::DVec3;
use meshtk_core::math;
use meshtk_core::{AttributeArray, Attributes, PolyData};
use serde::{Deserialize, Serialize};

/// Options for [`clean`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CleanOptions {
    /// Absolute merge tolerance; `0.0` merges exactly coincident points.
    pub tolerance: f64,
    /// Disable point merging entirely (degenerate-cell and unused-point
    /// removal still run).
    pub merge_points: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.0,
            merge_points: true,
        }
    }
}

/// Appends two polygonal datasets.
#[must_use]
pub fn append(a: &PolyData, b: &PolyData) -> PolyData {
    append_all(&[a, b])
}

/// Appends many polygonal datasets into one.
///
/// Point indices are re-offset per input. Point and cell arrays survive
/// only when present in every input with the same kind; others are
/// dropped with a debug log.
#[must_use]
pub fn append_all(inputs: &[&PolyData]) -> PolyData {
    let mut out = PolyData::new();
    if inputs.is_empty() {
        return out;
    }

    let mut points = Vec::new();
    let mut offsets = Vec::with_capacity(inputs.len());
    for data in inputs {
        offsets.push(points.len() as u32);
        points.extend_from_slice(data.points());
    }
    out.set_points(points);

    for (data, &off) in inputs.iter().zip(&offsets) {
        let shift = |cell: &Vec<u32>| cell.iter().map(|i| i + off).collect::<Vec<u32>>();
        for c in data.verts() {
            out.push_vert(shift(c));
        }
    }
    for (data, &off) in inputs.iter().zip(&offsets) {
        let shift = |cell: &Vec<u32>| cell.iter().map(|i| i + off).collect::<Vec<u32>>();
        for c in data.lines() {
            out.push_line(shift(c));
        }
    }
    for (data, &off) in inputs.iter().zip(&offsets) {
        let shift = |cell: &Vec<u32>| cell.iter().map(|i| i + off).collect::<Vec<u32>>();
        for c in data.polys() {
            out.push_poly(shift(c));
        }
    }

    merge_common_point_arrays(inputs, &mut out);
    merge_common_cell_arrays(inputs, &mut out);
    out
}

fn merge_common_point_arrays(inputs: &[&PolyData], out: &mut PolyData) {
    let first = inputs[0].point_data();
    for (name, array) in first.iter() {
        let mut merged = array.clone();
        let mut ok = true;
        for data in &inputs[1..] {
            match (data.point_data().get(name), &mut merged) {
                (Some(AttributeArray::Scalar(v)), AttributeArray::Scalar(acc)) => {
                    acc.extend_from_slice(v);
                }
                (Some(AttributeArray::Vector(v)), AttributeArray::Vector(acc)) => {
                    acc.extend_from_slice(v);
                }
                _ => {
                    log::debug!("append: dropping point array '{name}' (not in every input)");
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            out.point_data_mut().insert(name, merged);
        }
    }
}

fn merge_common_cell_arrays(inputs: &[&PolyData], out: &mut PolyData) {
    // Cell order changes on append (verts, lines, polys are regrouped), so
    // per-input values must be sliced by stream before concatenation.
    let first = inputs[0].cell_data();
    'arrays: for (name, _) in first.iter() {
        let mut per_stream: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        let mut kind_is_vector = None;
        for data in inputs {
            let Some(array) = data.cell_data().get(name) else {
                log::debug!("append: dropping cell array '{name}' (not in every input)");
                continue 'arrays;
            };
            let is_vec = matches!(array, AttributeArray::Vector(_));
            if *kind_is_vector.get_or_insert(is_vec) != is_vec {
                continue 'arrays;
            }
            let flat = array.to_flat();
            let comps = array.num_components();
            let nv = data.verts().len();
            let nl = data.lines().len();
            let np = data.polys().len();
            per_stream[0].extend_from_slice(&flat[..nv * comps]);
            per_stream[1].extend_from_slice(&flat[nv * comps..(nv + nl) * comps]);
            per_stream[2].extend_from_slice(&flat[(nv + nl) * comps..(nv + nl + np) * comps]);
        }
        let flat: Vec<f64> = per_stream.concat();
        let merged = if kind_is_vector == Some(true) {
            match AttributeArray::vector_from_flat(&flat) {
                Ok(a) => a,
                Err(_) => continue,
            }
        } else {
            AttributeArray::Scalar(flat)
        };
        out.cell_data_mut().insert(name, merged);
    }
}

/// Merges coincident points, removes degenerate cells and unused points.
#[must_use]
pub fn clean(data: &PolyData, options: CleanOptions) -> PolyData {
    let points = data.points();

    // Map every original point to a representative
    let mut representative: Vec<u32> = (0..points.len() as u32).collect();
    if options.merge_points {
        let tol = options.tolerance.max(0.0);
        let key = |p: DVec3| -> (i64, i64, i64) {
            if tol > 0.0 {
                (
                    (p.x / tol).round() as i64,
                    (p.y / tol).round() as i64,
                    (p.z / tol).round() as i64,
                )
            } else {
                (
                    p.x.to_bits() as i64,
                    p.y.to_bits() as i64,
                    p.z.to_bits() as i64,
                )
            }
        };
        let mut seen: HashMap<(i64, i64, i64), u32> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            let k = key(*p);
            match seen.get(&k) {
                Some(&rep) => representative[i] = rep,
                None => {
                    seen.insert(k, i as u32);
                }
            }
        }
    }

    // Rebuild cells, collapsing consecutive duplicates
    let remap_cell = |cell: &[u32]| -> Vec<u32> {
        let mut out: Vec<u32> = Vec::with_capacity(cell.len());
        for &i in cell {
            let r = representative[i as usize];
            if out.last() != Some(&r) {
                out.push(r);
            }
        }
        out
    };

    let nv = data.verts().len();
    let nl = data.lines().len();
    let mut kept_cell_ids: Vec<usize> = Vec::new();

    let mut verts = Vec::new();
    for (i, c) in data.verts().iter().enumerate() {
        let c = remap_cell(c);
        if !c.is_empty() {
            verts.push(c);
            kept_cell_ids.push(i);
        }
    }
    let mut lines = Vec::new();
    for (i, c) in data.lines().iter().enumerate() {
        let c = remap_cell(c);
        if c.len() >= 2 {
            lines.push(c);
            kept_cell_ids.push(nv + i);
        }
    }
    let mut polys = Vec::new();
    for (i, c) in data.polys().iter().enumerate() {
        let mut c = remap_cell(c);
        if c.len() > 1 && c.first() == c.last() {
            c.pop();
        }
        if c.len() >= 3 {
            polys.push(c);
            kept_cell_ids.push(nv + nl + i);
        }
    }

    // Compact to used points only
    let mut new_index: Vec<Option<u32>> = vec![None; points.len()];
    let mut used: Vec<u32> = Vec::new();
    let mut assign = |cells: &mut Vec<Vec<u32>>| {
        for cell in cells {
            for i in cell {
                let old = *i as usize;
                let idx = match new_index[old] {
                    Some(n) => n,
                    None => {
                        let n = used.len() as u32;
                        new_index[old] = Some(n);
                        used.push(*i);
                        n
                    }
                };
                *i = idx;
            }
        }
    };
    assign(&mut verts);
    assign(&mut lines);
    assign(&mut polys);

    let mut out = PolyData::new();
    out.set_points(used.iter().map(|&i| points[i as usize]).collect());
    for c in verts {
        out.push_vert(c);
    }
    for c in lines {
        out.push_line(c);
    }
    for c in polys {
        out.push_poly(c);
    }

    // Point data follows the surviving representatives, cell data the
    // surviving cells
    let used_indices: Vec<usize> = used.iter().map(|&i| i as usize).collect();
    *out.point_data_mut() = subset_attributes(data.point_data(), &used_indices);
    *out.cell_data_mut() = subset_attributes(data.cell_data(), &kept_cell_ids);
    data.field_data().copy_into(out.field_data_mut());
    out
}

/// Extracts the values of every array at the given element indices.
#[must_use]
pub(crate) fn subset_attributes(attrs: &Attributes, indices: &[usize]) -> Attributes {
    let mut out = Attributes::new();
    for (name, array) in attrs.iter() {
        match array {
            AttributeArray::Scalar(v) => {
                out.insert_scalar(name, indices.iter().map(|&i| v[i]).collect());
            }
            AttributeArray::Vector(v) => {
                out.insert_vector(name, indices.iter().map(|&i| v[i]).collect());
            }
        }
    }
    if let Some(n) = attrs.active_scalars() {
        let _ = out.set_active_scalars(n);
    }
    if let Some(n) = attrs.active_vectors() {
        let _ = out.set_active_vectors(n);
    }
    out
}

fn polygon_edges(data: &PolyData) -> HashMap<(u32, u32), usize> {
    let mut counts: HashMap<(u32, u32), usize> = HashMap::new();
    for poly in data.polys() {
        let n = poly.len();
        for i in 0..n {
            let a = poly[i];
            let b = poly[(i + 1) % n];
            let e = if a < b { (a, b) } else { (b, a) };
            *counts.entry(e).or_insert(0) += 1;
        }
    }
    counts
}

/// Extracts the boundary edges: polygon edges used by exactly one cell.
///
/// The output shares the input's point list; each boundary edge becomes a
/// two-point line cell.
#[must_use]
pub fn boundary_edges(data: &PolyData) -> PolyData {
    let mut edges: Vec<(u32, u32)> = polygon_edges(data)
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .map(|(e, _)| e)
        .collect();
    edges.sort_unstable();

    let mut out = PolyData::new();
    out.set_points(data.points().to_vec());
    out.set_lines(edges.iter().map(|&(a, b)| vec![a, b]).collect());
    clean(&out, CleanOptions::default())
}

/// Extracts every unique polygon edge as a line cell.
#[must_use]
pub fn edges(data: &PolyData) -> PolyData {
    let mut all: Vec<(u32, u32)> = polygon_edges(data).into_keys().collect();
    all.sort_unstable();
    let mut out = PolyData::new();
    out.set_points(data.points().to_vec());
    out.set_lines(all.iter().map(|&(a, b)| vec![a, b]).collect());
    clean(&out, CleanOptions::default())
}

/// Extracts boundary edges plus edges whose adjacent polygons meet at more
/// than `feature_angle` radians.
#[must_use]
pub fn feature_edges(data: &PolyData, feature_angle: f64) -> PolyData {
    // Normal per polygon, looked up per edge
    let points = data.points();
    let normals: Vec<DVec3> = data
        .polys()
        .iter()
        .map(|poly| {
            let ring: Vec<DVec3> = poly.iter().map(|&i| points[i as usize]).collect();
            math::newell_normal(&ring).normalize_or_zero()
        })
        .collect();

    let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (f, poly) in data.polys().iter().enumerate() {
        let n = poly.len();
        for i in 0..n {
            let a = poly[i];
            let b = poly[(i + 1) % n];
            let e = if a < b { (a, b) } else { (b, a) };
            edge_faces.entry(e).or_default().push(f);
        }
    }

    let mut keep: Vec<(u32, u32)> = Vec::new();
    for (e, faces) in &edge_faces {
        let sharp = match faces.as_slice() {
            [_] => true, // boundary
            [f0, f1] => math::angle_between(normals[*f0], normals[*f1]) > feature_angle,
            _ => true, // non-manifold
        };
        if sharp {
            keep.push(*e);
        }
    }
    keep.sort_unstable();

    let mut out = PolyData::new();
    out.set_points(points.to_vec());
    out.set_lines(keep.iter().map(|&(a, b)| vec![a, b]).collect());
    clean(&out, CleanOptions::default())
}

/// True when the polygonal surface has no boundary edges.
#[must_use]
pub fn is_watertight(data: &PolyData) -> bool {
    polygon_edges(data).values().all(|&count| count != 1)
}

/// Total area of the polygon cells.
///
/// A pure polyline input is treated as closed rings (one per line cell, in
/// cell order) and measured by triangulating each about its centroid.
#[must_use]
pub fn surface_area(data: &PolyData) -> f64 {
    if data.is_polyline_only() {
        let points = data.points();
        let mut area = 0.0;
        for cell in data.lines() {
            let mut ring: Vec<DVec3> = cell.iter().map(|&i| points[i as usize]).collect();
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            if ring.len() < 3 {
                continue;
            }
            let fan = crate::sources::triangle_fan(&ring, None, true, None);
            area += surface_area(&fan);
        }
        return area;
    }
    let points = data.points();
    let mut area = 0.0;
    for poly in data.polys() {
        if poly.len() < 3 {
            continue;
        }
        let p0 = points[poly[0] as usize];
        for i in 1..poly.len() - 1 {
            let p1 = points[poly[i] as usize];
            let p2 = points[poly[i + 1] as usize];
            area += (p1 - p0).cross(p2 - p0).length() * 0.5;
        }
    }
    area
}

/// Per-polygon centers and unit normals.
///
/// When `reference` is given, each normal is flipped as needed to agree
/// with it.
#[must_use]
pub fn cell_centers_and_normals(
    data: &PolyData,
    reference: Option<DVec3>,
) -> (Vec<DVec3>, Vec<DVec3>) {
    let points = data.points();
    let mut centers = Vec::with_capacity(data.polys().len());
    let mut normals = Vec::with_capacity(data.polys().len());
    for poly in data.polys() {
        let ring: Vec<DVec3> = poly.iter().map(|&i| points[i as usize]).collect();
        let center = ring.iter().copied().sum::<DVec3>() / ring.len().max(1) as f64;
        let mut normal = math::newell_normal(&ring).normalize_or_zero();
        if let Some(r) = reference {
            normal = math::oriented_like(normal, r);
        }
        centers.push(center);
        normals.push(normal);
    }
    (centers, normals)
}

/// Point-to-point adjacency over polygon and line cells.
pub(crate) fn vertex_adjacency(data: &PolyData) -> Vec<Vec<u32>> {
    let mut adj: Vec<Vec<u32>> = vec![Vec::new(); data.num_points()];
    let mut add = |a: u32, b: u32| {
        if !adj[a as usize].contains(&b) {
            adj[a as usize].push(b);
        }
        if !adj[b as usize].contains(&a) {
            adj[b as usize].push(a);
        }
    };
    for poly in data.polys() {
        let n = poly.len();
        for i in 0..n {
            add(poly[i], poly[(i + 1) % n]);
        }
    }
    for line in data.lines() {
        for w in line.windows(2) {
            add(w[0], w[1]);
        }
    }
    adj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources;

    #[test]
    fn test_append_offsets_indices() {
        let a = PolyData::from_triangles(vec![DVec3::ZERO, DVec3::X, DVec3::Y], vec![[0, 1, 2]]);
        let b = translate_tri(DVec3::Z);
        let joined = append(&a, &b);
        assert_eq!(joined.num_points(), 6);
        assert_eq!(joined.polys().len(), 2);
        assert_eq!(joined.polys()[1], vec![3, 4, 5]);
    }

    fn translate_tri(d: DVec3) -> PolyData {
        PolyData::from_triangles(vec![d, DVec3::X + d, DVec3::Y + d], vec![[0, 1, 2]])
    }

    #[test]
    fn test_append_merges_common_arrays() {
        let mut a = PolyData::from_triangles(vec![DVec3::ZERO, DVec3::X, DVec3::Y], vec![[0, 1, 2]]);
        let mut b = translate_tri(DVec3::Z);
        a.add_point_scalar("s", vec![1.0, 2.0, 3.0]).unwrap();
        b.add_point_scalar("s", vec![4.0, 5.0, 6.0]).unwrap();
        a.add_point_scalar("only_a", vec![0.0; 3]).unwrap();

        let joined = append(&a, &b);
        assert_eq!(
            joined.point_data().scalars("s").unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
        assert!(joined.point_data().get("only_a").is_none());
    }

    #[test]
    fn test_clean_merges_duplicates() {
        // Two triangles sharing an edge, stored with duplicated points
        let pts = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::X, // dup of 1
            DVec3::Y, // dup of 2
            DVec3::new(1.0, 1.0, 0.0),
        ];
        let pd = PolyData::from_triangles(pts, vec![[0, 1, 2], [3, 5, 4]]);
        let cleaned = clean(&pd, CleanOptions::default());
        assert_eq!(cleaned.num_points(), 4);
        assert_eq!(cleaned.polys().len(), 2);
        // The shared diagonal is interior now; only the outer 4 edges remain
        assert_eq!(boundary_edges(&cleaned).lines().len(), 4);
    }

    #[test]
    fn test_clean_drops_degenerate() {
        let pts = vec![DVec3::ZERO, DVec3::X, DVec3::X];
        let pd = PolyData::from_triangles(pts, vec![[0, 1, 2]]);
        let cleaned = clean(&pd, CleanOptions::default());
        assert_eq!(cleaned.polys().len(), 0);
    }

    #[test]
    fn test_sphere_is_watertight() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 8);
        assert!(is_watertight(&s));
        assert!(boundary_edges(&s).lines().is_empty());
    }

    #[test]
    fn test_plane_boundary() {
        let p = sources::plane(DVec3::ZERO, DVec3::X, DVec3::Y, (2, 2));
        assert!(!is_watertight(&p));
        let be = boundary_edges(&p);
        assert_eq!(be.lines().len(), 8);
    }

    #[test]
    fn test_surface_area_quad() {
        let p = sources::plane(DVec3::ZERO, DVec3::X * 2.0, DVec3::Y * 3.0, (4, 4));
        assert!((surface_area(&p) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_surface_area_ring_fallback() {
        // Unit square as a closed polyline
        let ring = PolyData::from_polyline(
            vec![DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0), DVec3::Y],
            true,
        );
        assert!((surface_area(&ring) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cell_centers_and_normals_oriented() {
        let p = sources::plane(DVec3::ZERO, DVec3::X, DVec3::Y, (1, 1));
        let (centers, normals) = cell_centers_and_normals(&p, Some(-DVec3::Z));
        assert_eq!(centers.len(), 1);
        assert!((centers[0] - DVec3::new(0.5, 0.5, 0.0)).length() < 1e-12);
        assert!(normals[0].z < 0.0, "normal not flipped to reference");
    }

    #[test]
    fn test_clean_options_json() {
        // Option structs round-trip through JSON for pipeline descriptions
        let options = CleanOptions {
            tolerance: 0.25,
            merge_points: false,
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: CleanOptions = serde_json::from_str(&json).unwrap();
        assert!((back.tolerance - 0.25).abs() < 1e-12);
        assert!(!back.merge_points);
    }

    #[test]
    fn test_sphere_area_near_analytic() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 24);
        let area = surface_area(&s);
        let analytic = 4.0 * std::f64::consts::PI;
        assert!(
            (area - analytic).abs() / analytic < 0.05,
            "area {area} too far from {analytic}"
        );
    }
}
