//! Cutting: plane cross-sections and line/triangle intersection queries.

use std::collections::{HashMap, HashSet};

use glam::DVec3;
use meshtk_core::PolyData;

use crate::clip::{chain_loops, AttrInterp};
use crate::implicit::{Implicit, PlaneFunction};
use crate::surface::triangulate;

/// Cuts a dataset with a plane, producing the cross-section as polylines.
///
/// Polygon cells are triangulated and intersected; the resulting segments
/// are chained into polyline cells (closed loops close on themselves).
/// Point arrays are interpolated onto the section points.
#[must_use]
pub fn cut_by_plane(data: &PolyData, origin: DVec3, normal: DVec3) -> PolyData {
    cut_by_implicit(data, &PlaneFunction::new(origin, normal))
}

/// Cuts a dataset at the zero level of an implicit function.
#[must_use]
pub fn cut_by_implicit(data: &PolyData, function: &dyn Implicit) -> PolyData {
    let tri = triangulate(data);
    let values: Vec<f64> = tri.points().iter().map(|&p| function.eval(p)).collect();

    let mut interp = AttrInterp::new(tri.point_data());
    let mut points: Vec<DVec3> = Vec::new();
    let mut edge_map: HashMap<(u32, u32), u32> = HashMap::new();
    let mut vertex_map: HashMap<u32, u32> = HashMap::new();
    let src = tri.points();

    let mut segments: Vec<[u32; 2]> = Vec::new();

    for t in tri.polys() {
        let d: Vec<f64> = t.iter().map(|&i| values[i as usize]).collect();

        // Both-on-plane edge: emit it directly
        let on_plane: Vec<usize> = (0..3).filter(|&i| d[i] == 0.0).collect();
        if on_plane.len() == 2 && d[3 - on_plane[0] - on_plane[1]] != 0.0 {
            let mut ids = [0_u32; 2];
            for (slot, &i) in on_plane.iter().enumerate() {
                let orig = t[i];
                let idx = *vertex_map.entry(orig).or_insert_with(|| {
                    let idx = points.len() as u32;
                    points.push(src[orig as usize]);
                    interp.push_orig(orig as usize);
                    idx
                });
                ids[slot] = idx;
            }
            if ids[0] != ids[1] {
                segments.push(ids);
            }
            continue;
        }

        // Edge crossings where the sign changes (zero counts as positive)
        let mut hits: Vec<u32> = Vec::new();
        for e in 0..3 {
            let (a, b) = (t[e], t[(e + 1) % 3]);
            let (da, db) = (values[a as usize], values[b as usize]);
            if (da >= 0.0) == (db >= 0.0) {
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            let idx = *edge_map.entry(key).or_insert_with(|| {
                let (i, j) = key;
                let di = values[i as usize];
                let dj = values[j as usize];
                let s = (di / (di - dj)).clamp(0.0, 1.0);
                let idx = points.len() as u32;
                points.push(src[i as usize] + (src[j as usize] - src[i as usize]) * s);
                interp.push_lerp(i as usize, j as usize, s);
                idx
            });
            hits.push(idx);
        }
        hits.dedup();
        if hits.len() >= 2 && points[hits[0] as usize] != points[hits[1] as usize] {
            segments.push([hits[0], hits[1]]);
        }
    }

    let mut out = PolyData::new();
    out.set_points(points);
    *out.point_data_mut() = interp.finish();
    tri.field_data().copy_into(out.field_data_mut());

    // Chain segments into polylines; closed loops repeat their first point
    let segment_set: HashSet<(u32, u32)> = segments
        .iter()
        .map(|s| if s[0] < s[1] { (s[0], s[1]) } else { (s[1], s[0]) })
        .collect();
    for chain in chain_loops(&segments) {
        if chain.len() < 2 {
            continue;
        }
        let first = chain[0];
        let last = *chain.last().unwrap();
        let close_key = if first < last { (first, last) } else { (last, first) };
        let mut cell = chain;
        if cell.len() > 2 && segment_set.contains(&close_key) {
            cell.push(first);
        }
        out.push_line(cell);
    }
    log::debug!("cut produced {} polyline(s)", out.lines().len());
    out
}

/// Cuts with a plane, then keeps the part of the section within `radius`
/// of the plane point — a circular cross-section probe.
#[must_use]
pub fn clip_by_circle(data: &PolyData, center: DVec3, normal: DVec3, radius: f64) -> PolyData {
    let section = cut_by_plane(data, center, normal);
    crate::clip::clip_by_sphere_poly(&section, center, radius)
}

/// Segment/triangle intersection (Möller–Trumbore).
///
/// Returns the intersection point of segment `p0 -> p1` with the triangle,
/// or `None` when they miss.
#[must_use]
pub fn line_pierces_triangle(
    p0: DVec3,
    p1: DVec3,
    a: DVec3,
    b: DVec3,
    c: DVec3,
) -> Option<DVec3> {
    const TOL: f64 = 1e-7;
    let dir = p1 - p0;
    let e1 = b - a;
    let e2 = c - a;
    let pvec = dir.cross(e2);
    let det = e1.dot(pvec);
    if det.abs() < TOL {
        return None; // parallel
    }
    let inv_det = 1.0 / det;
    let tvec = p0 - a;
    let u = tvec.dot(pvec) * inv_det;
    if !(-TOL..=1.0 + TOL).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(e1);
    let v = dir.dot(qvec) * inv_det;
    if v < -TOL || u + v > 1.0 + TOL {
        return None;
    }
    let t = e2.dot(qvec) * inv_det;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(p0 + dir * t)
}

/// Finds the first polygon cell pierced by segment `p0 -> p1`.
///
/// Polygons are fan-triangulated for the test; the returned index refers to
/// the input's polygon cells.
#[must_use]
pub fn first_pierced_poly(data: &PolyData, p0: DVec3, p1: DVec3) -> Option<(usize, DVec3)> {
    let points = data.points();
    for (cell_idx, poly) in data.polys().iter().enumerate() {
        if poly.len() < 3 {
            continue;
        }
        let a = points[poly[0] as usize];
        for i in 1..poly.len() - 1 {
            let b = points[poly[i] as usize];
            let c = points[poly[i + 1] as usize];
            if let Some(x) = line_pierces_triangle(p0, p1, a, b, c) {
                return Some((cell_idx, x));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources;
    use meshtk_core::math;

    #[test]
    fn test_cut_sphere_gives_circle() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 16);
        let section = cut_by_plane(&s, DVec3::new(0.0, 0.0, 0.3), DVec3::Z);
        assert!(!section.lines().is_empty());
        let r = (1.0_f64 - 0.3 * 0.3).sqrt();
        for p in section.points() {
            assert!((p.z - 0.3).abs() < 1e-9, "section point off plane: {p:?}");
            let rho = (p.x * p.x + p.y * p.y).sqrt();
            assert!((rho - r).abs() < 0.05, "radius {rho} vs {r}");
        }
        // The loop is closed
        let cell = &section.lines()[0];
        assert_eq!(cell.first(), cell.last());
    }

    #[test]
    fn test_cut_interpolates_point_data() {
        let mut s = sources::sphere(DVec3::ZERO, 1.0, 16);
        let zs: Vec<f64> = s.points().iter().map(|p| p.z).collect();
        s.add_point_scalar("z", zs).unwrap();
        let section = cut_by_plane(&s, DVec3::new(0.0, 0.0, 0.25), DVec3::Z);
        for v in section.point_data().scalars("z").unwrap() {
            assert!((v - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cut_misses() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 8);
        let section = cut_by_plane(&s, DVec3::new(0.0, 0.0, 5.0), DVec3::Z);
        assert_eq!(section.num_points(), 0);
    }

    #[test]
    fn test_circle_section_length() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 32);
        let probe = clip_by_circle(&s, DVec3::ZERO, DVec3::Z, 2.0);
        // Circle of radius 1: total polyline length near 2*pi
        let total: f64 = probe
            .lines()
            .iter()
            .map(|cell| {
                let pts: Vec<DVec3> =
                    cell.iter().map(|&i| probe.points()[i as usize]).collect();
                math::polyline_length(&pts)
            })
            .sum();
        assert!(
            (total - 2.0 * std::f64::consts::PI).abs() < 0.1,
            "length {total}"
        );
    }

    #[test]
    fn test_line_pierces_triangle() {
        let a = DVec3::ZERO;
        let b = DVec3::X;
        let c = DVec3::Y;
        let hit = line_pierces_triangle(
            DVec3::new(0.25, 0.25, 1.0),
            DVec3::new(0.25, 0.25, -1.0),
            a,
            b,
            c,
        );
        assert!((hit.unwrap() - DVec3::new(0.25, 0.25, 0.0)).length() < 1e-9);

        // Segment stops short of the plane
        let miss = line_pierces_triangle(
            DVec3::new(0.25, 0.25, 1.0),
            DVec3::new(0.25, 0.25, 0.5),
            a,
            b,
            c,
        );
        assert!(miss.is_none());
    }

    #[test]
    fn test_first_pierced_poly() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 16);
        let hit = first_pierced_poly(&s, DVec3::ZERO, DVec3::X * 2.0);
        let (_, x) = hit.expect("ray must pierce the sphere");
        assert!((x.length() - 1.0).abs() < 0.05);
        assert!(first_pierced_poly(&s, DVec3::X * 3.0, DVec3::X * 4.0).is_none());
    }
}
