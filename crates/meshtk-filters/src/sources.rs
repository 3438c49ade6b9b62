//! Geometric source constructors.
//!
//! Each function builds a [`PolyData`] from scratch: spheres, cylinders,
//! cubes, planes, polylines, vertex clouds, and bounding-box outlines.
//! Tessellated surfaces are emitted as triangles; the plane source emits
//! quads (triangulate afterwards if needed).

use glam::DVec3;
use meshtk_core::math;
use meshtk_core::{DataSet, PolyData};

use crate::transform;

/// Default angular resolution for tessellated sources.
pub const DEFAULT_RESOLUTION: usize = 8;

/// Builds a lat/long tessellated sphere.
///
/// `resolution` is used for both the latitude bands and the longitude
/// slices, matching the classic sphere source's phi/theta resolutions.
#[must_use]
pub fn sphere(center: DVec3, radius: f64, resolution: usize) -> PolyData {
    let res = resolution.max(3);
    let mut points = vec![center + DVec3::Z * radius]; // north pole
    for band in 1..res {
        let phi = std::f64::consts::PI * (band as f64) / (res as f64);
        for slice in 0..res {
            let theta = 2.0 * std::f64::consts::PI * (slice as f64) / (res as f64);
            points.push(
                center
                    + radius
                        * DVec3::new(
                            phi.sin() * theta.cos(),
                            phi.sin() * theta.sin(),
                            phi.cos(),
                        ),
            );
        }
    }
    points.push(center - DVec3::Z * radius); // south pole
    let south = (points.len() - 1) as u32;

    let ring = |band: usize, slice: usize| -> u32 {
        (1 + (band - 1) * res + (slice % res)) as u32
    };

    let mut tris: Vec<[u32; 3]> = Vec::new();
    // Pole caps
    for s in 0..res {
        tris.push([0, ring(1, s), ring(1, s + 1)]);
        tris.push([south, ring(res - 1, s + 1), ring(res - 1, s)]);
    }
    // Bands between rings, two triangles per quad
    for band in 1..res - 1 {
        for s in 0..res {
            let a = ring(band, s);
            let b = ring(band, s + 1);
            let c = ring(band + 1, s + 1);
            let d = ring(band + 1, s);
            tris.push([a, d, c]);
            tris.push([a, c, b]);
        }
    }
    PolyData::from_triangles(points, tris)
}

/// Builds a capped cylinder centered at `center`, axis along +Y.
///
/// Pass `axis` to re-orient the result so the cylinder axis lies along it.
#[must_use]
pub fn cylinder(
    center: DVec3,
    radius: f64,
    height: f64,
    resolution: usize,
    axis: Option<DVec3>,
) -> PolyData {
    let res = resolution.max(3);
    let h = height / 2.0;
    let mut points = Vec::with_capacity(2 * res + 2);
    for &y in &[h, -h] {
        for s in 0..res {
            let theta = 2.0 * std::f64::consts::PI * (s as f64) / (res as f64);
            points.push(center + DVec3::new(radius * theta.cos(), y, radius * theta.sin()));
        }
    }
    let top_center = points.len() as u32;
    points.push(center + DVec3::Y * h);
    let bottom_center = points.len() as u32;
    points.push(center - DVec3::Y * h);

    let top = |s: usize| (s % res) as u32;
    let bottom = |s: usize| (res + s % res) as u32;

    let mut tris: Vec<[u32; 3]> = Vec::new();
    for s in 0..res {
        // Side quad split into two triangles
        tris.push([top(s), bottom(s), bottom(s + 1)]);
        tris.push([top(s), bottom(s + 1), top(s + 1)]);
        // Caps
        tris.push([top_center, top(s + 1), top(s)]);
        tris.push([bottom_center, bottom(s), bottom(s + 1)]);
    }
    let cyl = PolyData::from_triangles(points, tris);
    match axis {
        Some(a) => transform::rotate_axis_to_axis(&cyl, DVec3::Y, a),
        None => cyl,
    }
}

/// Builds a box with a `width x width` face and `thickness` depth, placed
/// so the named face center sits at `face_center` with the outward face
/// normal along `normal`.
#[must_use]
pub fn cube(face_center: DVec3, normal: DVec3, width: f64, thickness: f64) -> PolyData {
    let (u, v, w) = math::basis_for_normal(normal, None);
    let body_center = face_center + w * (thickness / 2.0);
    let hw = width / 2.0;
    let ht = thickness / 2.0;
    let corner = |sx: f64, sy: f64, sz: f64| body_center + u * (sx * hw) + v * (sy * hw) + w * (sz * ht);
    let points = vec![
        corner(-1.0, -1.0, -1.0), // 0
        corner(1.0, -1.0, -1.0),  // 1
        corner(1.0, 1.0, -1.0),   // 2
        corner(-1.0, 1.0, -1.0),  // 3
        corner(-1.0, -1.0, 1.0),  // 4
        corner(1.0, -1.0, 1.0),   // 5
        corner(1.0, 1.0, 1.0),    // 6
        corner(-1.0, 1.0, 1.0),   // 7
    ];
    let quads: Vec<Vec<u32>> = vec![
        vec![0, 3, 2, 1], // -w face (holds face_center)
        vec![4, 5, 6, 7], // +w face
        vec![0, 1, 5, 4],
        vec![1, 2, 6, 5],
        vec![2, 3, 7, 6],
        vec![3, 0, 4, 7],
    ];
    PolyData::from_polys(points, quads)
}

/// Builds a subdivided planar patch from an origin and two edge points.
///
/// The patch spans `origin -> pt1` and `origin -> pt2` with
/// `resolution.0 x resolution.1` quads.
#[must_use]
pub fn plane(origin: DVec3, pt1: DVec3, pt2: DVec3, resolution: (usize, usize)) -> PolyData {
    let (nx, ny) = (resolution.0.max(1), resolution.1.max(1));
    let du = (pt1 - origin) / nx as f64;
    let dv = (pt2 - origin) / ny as f64;
    let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            points.push(origin + du * i as f64 + dv * j as f64);
        }
    }
    let idx = |i: usize, j: usize| (j * (nx + 1) + i) as u32;
    let mut quads = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            quads.push(vec![idx(i, j), idx(i + 1, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }
    PolyData::from_polys(points, quads)
}

/// Builds a planar patch centered on `center`, perpendicular to `normal`,
/// with side length `size` and roughly `size / resolution` spacing.
#[must_use]
pub fn plane_from_normal(center: DVec3, normal: DVec3, size: f64, spacing: f64) -> PolyData {
    let (u, v, _) = math::basis_for_normal(normal, None);
    let n_div = ((size / spacing).round().max(1.0)) as usize;
    let origin = center - u * (size / 2.0) - v * (size / 2.0);
    plane(origin, origin + u * size, origin + v * size, (n_div, n_div))
}

/// Builds a straight polyline between two points with `n` evenly spaced
/// points (`n >= 2`).
#[must_use]
pub fn polyline_between(start: DVec3, end: DVec3, n: usize) -> PolyData {
    let n = n.max(2);
    let points = (0..n)
        .map(|k| start + (end - start) * (k as f64 / (n - 1) as f64))
        .collect();
    PolyData::from_polyline(points, false)
}

/// Builds a polyline through the given points; `closed` adds a segment
/// from the last point back to the first.
#[must_use]
pub fn polyline(points: Vec<DVec3>, closed: bool) -> PolyData {
    PolyData::from_polyline(points, closed)
}

/// Builds a vertex cloud: one vert cell per point.
#[must_use]
pub fn vertex_cloud(points: Vec<DVec3>) -> PolyData {
    PolyData::from_vertices(points)
}

/// Builds a circle polyline about `center` in the plane perpendicular to
/// `normal`.
#[must_use]
pub fn circle(center: DVec3, normal: DVec3, radius: f64, n: usize) -> PolyData {
    PolyData::from_polyline(math::circle_points(center, normal, radius, n.max(3)), true)
}

/// Triangulates a closed polygonal ring about a center point.
///
/// Each consecutive point pair forms a triangle with the fan center
/// (the ring centroid unless `center` is given). When `reference` is set
/// and the ring has more than three points, the ring is re-wound so the
/// triangle normals agree with (`outward = true`) or oppose the reference.
#[must_use]
pub fn triangle_fan(
    ring: &[DVec3],
    reference: Option<DVec3>,
    outward: bool,
    center: Option<DVec3>,
) -> PolyData {
    let mut pts: Vec<DVec3> = ring.to_vec();
    if let Some(r) = reference {
        if pts.len() > 3 {
            let clockwise = math::is_polygon_clockwise(&pts, r);
            if (outward && clockwise) || (!outward && !clockwise) {
                pts.reverse();
            }
        }
    }
    let cp = center.unwrap_or_else(|| {
        pts.iter().copied().sum::<DVec3>() / pts.len().max(1) as f64
    });
    let n = pts.len() as u32;
    let mut points = pts;
    points.push(cp);
    let tris = (0..n)
        .map(|k| [k, (k + 1) % n, n])
        .collect();
    PolyData::from_triangles(points, tris)
}

/// Builds the 12-edge bounding-box outline of a dataset.
///
/// Corner ordering matches the classic outline filter: x varies fastest,
/// then y, then z — so corners 0/1, 0/2, and 0/4 are the x, y, and z
/// edges at the minimum corner.
#[must_use]
pub fn outline(data: &DataSet) -> PolyData {
    let Some((lo, hi)) = data.bounds() else {
        return PolyData::new();
    };
    let mut points = Vec::with_capacity(8);
    for k in 0..2 {
        for j in 0..2 {
            for i in 0..2 {
                points.push(DVec3::new(
                    if i == 0 { lo.x } else { hi.x },
                    if j == 0 { lo.y } else { hi.y },
                    if k == 0 { lo.z } else { hi.z },
                ));
            }
        }
    }
    let edges: [[u32; 2]; 12] = [
        [0, 1], [2, 3], [4, 5], [6, 7], // x edges
        [0, 2], [1, 3], [4, 6], [5, 7], // y edges
        [0, 4], [1, 5], [2, 6], [3, 7], // z edges
    ];
    let mut pd = PolyData::new();
    pd.set_points(points);
    pd.set_lines(edges.iter().map(|e| e.to_vec()).collect());
    pd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_counts_and_radius() {
        let res = 8;
        let s = sphere(DVec3::new(1.0, 2.0, 3.0), 2.0, res);
        assert_eq!(s.num_points(), 2 + (res - 1) * res);
        for p in s.points() {
            let r = (*p - DVec3::new(1.0, 2.0, 3.0)).length();
            assert!((r - 2.0).abs() < 1e-12, "point off the sphere: r = {r}");
        }
        // Closed tessellation: every edge shared by exactly two triangles
        assert_eq!(s.polys().len(), 2 * res + 2 * (res - 2) * res);
    }

    #[test]
    fn test_cylinder_bounds() {
        let c = cylinder(DVec3::ZERO, 1.0, 4.0, 12, None);
        let (lo, hi) = c.bounds().unwrap();
        assert!((hi.y - 2.0).abs() < 1e-12);
        assert!((lo.y + 2.0).abs() < 1e-12);
        assert!((hi.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cylinder_oriented() {
        let c = cylinder(DVec3::ZERO, 1.0, 4.0, 12, Some(DVec3::X));
        let (lo, hi) = c.bounds().unwrap();
        assert!((hi.x - 2.0).abs() < 1e-9, "axis not along X: {hi:?}");
        assert!((lo.x + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_plane_grid() {
        let p = plane(DVec3::ZERO, DVec3::X, DVec3::Y, (4, 3));
        assert_eq!(p.num_points(), 5 * 4);
        assert_eq!(p.polys().len(), 12);
    }

    #[test]
    fn test_polyline_between_spacing() {
        let pl = polyline_between(DVec3::ZERO, DVec3::X * 3.0, 4);
        let pts = pl.points();
        assert_eq!(pts.len(), 4);
        assert!((pts[1].x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cube_face_center() {
        let c = cube(DVec3::ZERO, DVec3::X, 2.0, 1.0);
        // Body extends from the face along +X
        let (lo, hi) = c.bounds().unwrap();
        assert!((lo.x - 0.0).abs() < 1e-12);
        assert!((hi.x - 1.0).abs() < 1e-12);
        assert_eq!(c.polys().len(), 6);
    }

    #[test]
    fn test_triangle_fan_winding() {
        let ring = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::Y,
        ];
        let fan = triangle_fan(&ring, Some(DVec3::Z), true, None);
        assert_eq!(fan.polys().len(), 4);
        assert_eq!(fan.num_points(), 5);
        // All triangle normals along +Z
        let pts = fan.points();
        for tri in fan.polys() {
            let n = (pts[tri[1] as usize] - pts[tri[0] as usize])
                .cross(pts[tri[2] as usize] - pts[tri[0] as usize]);
            assert!(n.z > 0.0, "triangle wound the wrong way");
        }
    }

    #[test]
    fn test_outline_corners() {
        let s = sphere(DVec3::ZERO, 1.0, 8);
        let o = outline(&DataSet::PolyData(s));
        assert_eq!(o.num_points(), 8);
        assert_eq!(o.lines().len(), 12);
        // Corner 0 is the minimum corner; 1/2/4 step x/y/z
        let pts = o.points();
        assert!(pts[1].x > pts[0].x && (pts[1].y - pts[0].y).abs() < 1e-12);
        assert!(pts[2].y > pts[0].y);
        assert!(pts[4].z > pts[0].z);
    }
}
