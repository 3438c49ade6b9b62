//! Small geometric helpers shared across the toolkit.
//!
//! Everything here operates on plain `f64` values and [`DVec3`] points;
//! filters and datasets build on these rather than re-deriving them.

use glam::DVec3;

/// Returns the unsigned angle between two vectors, in radians.
///
/// Zero-length inputs yield an angle of zero.
#[must_use]
pub fn angle_between(a: DVec3, b: DVec3) -> f64 {
    let na = a.normalize_or_zero();
    let nb = b.normalize_or_zero();
    if na == DVec3::ZERO || nb == DVec3::ZERO {
        return 0.0;
    }
    na.dot(nb).clamp(-1.0, 1.0).acos()
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: DVec3, b: DVec3) -> f64 {
    (a - b).length()
}

/// Distances from one point to each point in a slice.
#[must_use]
pub fn distances_to(x: DVec3, points: &[DVec3]) -> Vec<f64> {
    points.iter().map(|p| (*p - x).length()).collect()
}

/// Index of the point in `points` closest to `x`.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn closest_point_id(x: DVec3, points: &[DVec3]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = (*p - x).length_squared();
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Cumulative arc length along an ordered polyline.
///
/// The result has one entry per point; the first entry is `0.0` and the
/// last is the total length.
#[must_use]
pub fn cumulative_lengths(points: &[DVec3]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += (*p - points[i - 1]).length();
        }
        out.push(total);
    }
    out
}

/// Total arc length of an ordered polyline.
#[must_use]
pub fn polyline_length(points: &[DVec3]) -> f64 {
    cumulative_lengths(points).last().copied().unwrap_or(0.0)
}

/// Flips `v` if needed so it points the same way as `reference`.
#[must_use]
pub fn oriented_like(v: DVec3, reference: DVec3) -> DVec3 {
    if v.dot(reference) < 0.0 {
        -v
    } else {
        v
    }
}

/// Builds `n` points on a circle of `radius` about `center`, lying in the
/// plane perpendicular to `normal`.
#[must_use]
pub fn circle_points(center: DVec3, normal: DVec3, radius: f64, n: usize) -> Vec<DVec3> {
    let (u, v, _) = basis_for_normal(normal, None);
    (0..n)
        .map(|k| {
            let theta = 2.0 * std::f64::consts::PI * (k as f64) / (n as f64);
            center + radius * (theta.cos() * u + theta.sin() * v)
        })
        .collect()
}

/// Completes `normal` to a right-handed orthonormal basis `(u, v, w)` with
/// `w` along the normal.
///
/// If `guide` is given, `u` is the component of the guide perpendicular to
/// the normal; otherwise an arbitrary stable perpendicular is chosen.
#[must_use]
pub fn basis_for_normal(normal: DVec3, guide: Option<DVec3>) -> (DVec3, DVec3, DVec3) {
    let w = normal.normalize_or_zero();
    let mut u = match guide {
        Some(g) => g - w * w.dot(g),
        None => {
            // Pick the world axis least aligned with the normal
            if w.x.abs() < 0.9 {
                DVec3::X - w * w.x
            } else {
                DVec3::Y - w * w.y
            }
        }
    };
    u = u.normalize_or_zero();
    if u == DVec3::ZERO {
        u = DVec3::X;
    }
    let v = w.cross(u).normalize_or_zero();
    (u, v, w)
}

/// Newell's method normal of an ordered (not necessarily planar) polygon.
///
/// The result is unnormalized; its length is twice the polygon area.
#[must_use]
pub fn newell_normal(points: &[DVec3]) -> DVec3 {
    let n = points.len();
    let mut normal = DVec3::ZERO;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal
}

/// Tests whether an ordered closed polygon winds clockwise when viewed
/// along `reference` (i.e. its Newell normal opposes the reference).
#[must_use]
pub fn is_polygon_clockwise(points: &[DVec3], reference: DVec3) -> bool {
    newell_normal(points).dot(reference) < 0.0
}

/// Fits a plane to a point set.
///
/// Returns `(normal, centroid)`. The normal is the smallest-eigenvector
/// direction of the point covariance, found by power iteration on the
/// shifted matrix `trace * I - C`; no external solver is needed. Fewer
/// than three points yield the Z axis.
#[must_use]
pub fn fit_plane(points: &[DVec3]) -> (DVec3, DVec3) {
    if points.len() < 3 {
        return (DVec3::Z, points.first().copied().unwrap_or(DVec3::ZERO));
    }
    let n = points.len() as f64;
    let centroid = points.iter().copied().sum::<DVec3>() / n;

    // Symmetric covariance, upper triangle
    let (mut xx, mut xy, mut xz, mut yy, mut yz, mut zz) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for p in points {
        let d = *p - centroid;
        xx += d.x * d.x;
        xy += d.x * d.y;
        xz += d.x * d.z;
        yy += d.y * d.y;
        yz += d.y * d.z;
        zz += d.z * d.z;
    }
    let trace = xx + yy + zz;
    if trace <= f64::EPSILON {
        return (DVec3::Z, centroid);
    }

    // Largest eigenvector of (trace*I - C) == smallest of C
    let mul = |v: DVec3| -> DVec3 {
        DVec3::new(
            (trace - xx) * v.x - xy * v.y - xz * v.z,
            -xy * v.x + (trace - yy) * v.y - yz * v.z,
            -xz * v.x - yz * v.y + (trace - zz) * v.z,
        )
    };
    let mut v = DVec3::new(0.577_350_3, 0.577_350_3, 0.577_350_3);
    for _ in 0..32 {
        let next = mul(v).normalize_or_zero();
        if next == DVec3::ZERO {
            break;
        }
        v = next;
    }
    (v, centroid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_between() {
        let a = angle_between(DVec3::X, DVec3::Y);
        assert!((a - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(angle_between(DVec3::X, DVec3::X).abs() < 1e-12);
        assert!(angle_between(DVec3::ZERO, DVec3::X).abs() < 1e-12);
    }

    #[test]
    fn test_cumulative_lengths() {
        let pts = vec![DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0)];
        let cl = cumulative_lengths(&pts);
        assert_eq!(cl, vec![0.0, 1.0, 2.0]);
        assert!((polyline_length(&pts) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_closest_point_id() {
        let pts = vec![DVec3::ZERO, DVec3::X * 2.0, DVec3::X * 0.4];
        assert_eq!(closest_point_id(DVec3::X * 0.5, &pts), Some(2));
        assert_eq!(closest_point_id(DVec3::ZERO, &[]), None);
    }

    #[test]
    fn test_fit_plane_xy() {
        // Noise-free points in the z = 2 plane
        let mut pts = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                pts.push(DVec3::new(f64::from(i), f64::from(j), 2.0));
            }
        }
        let (normal, centroid) = fit_plane(&pts);
        assert!(normal.z.abs() > 0.999, "normal {normal:?} not along Z");
        assert!((centroid.z - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_winding() {
        // CCW square viewed from +Z
        let sq = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::Y,
        ];
        assert!(!is_polygon_clockwise(&sq, DVec3::Z));
        let rev: Vec<DVec3> = sq.into_iter().rev().collect();
        assert!(is_polygon_clockwise(&rev, DVec3::Z));
    }

    #[test]
    fn test_basis_for_normal() {
        for n in [DVec3::X, DVec3::Y, DVec3::Z, DVec3::new(1.0, 2.0, -0.5)] {
            let (u, v, w) = basis_for_normal(n, None);
            assert!(u.dot(v).abs() < 1e-12);
            assert!(u.dot(w).abs() < 1e-12);
            assert!((u.cross(v) - w).length() < 1e-9);
        }
    }
}
