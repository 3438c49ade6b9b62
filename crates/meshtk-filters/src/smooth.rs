//! Mesh smoothing and polyline resampling.

use glam::DVec3;
use meshtk_core::math;
use meshtk_core::PolyData;

use crate::mesh::vertex_adjacency;

/// Default iteration count for [`laplacian`].
pub const DEFAULT_LAPLACIAN_ITERATIONS: usize = 200;
/// Default relaxation factor for [`laplacian`].
pub const DEFAULT_RELAXATION: f64 = 0.01;
/// Default iteration count for [`windowed_sinc`].
pub const DEFAULT_SINC_ITERATIONS: usize = 20;
/// Default pass band for [`windowed_sinc`].
pub const DEFAULT_PASS_BAND: f64 = 0.001;

/// Laplacian smoothing: each point relaxes toward the average of its
/// edge-connected neighbors.
///
/// `relaxation` scales the per-iteration step; isolated points stay put.
#[must_use]
pub fn laplacian(data: &PolyData, iterations: usize, relaxation: f64) -> PolyData {
    let adjacency = vertex_adjacency(data);
    let mut points: Vec<DVec3> = data.points().to_vec();
    let mut next = points.clone();

    for _ in 0..iterations {
        for (i, neighbors) in adjacency.iter().enumerate() {
            if neighbors.is_empty() {
                next[i] = points[i];
                continue;
            }
            let mean = neighbors
                .iter()
                .map(|&n| points[n as usize])
                .sum::<DVec3>()
                / neighbors.len() as f64;
            next[i] = points[i] + (mean - points[i]) * relaxation;
        }
        std::mem::swap(&mut points, &mut next);
    }

    let mut out = data.clone();
    out.set_points(points);
    out
}

/// Low-pass smoothing without shrinkage.
///
/// Alternates a positive and a negative Laplacian step (Taubin's
/// lambda/mu scheme); `pass_band` sets the transfer-function cutoff, with
/// smaller values smoothing harder. The classic windowed-sinc filter's
/// defaults (20 iterations, 0.001 pass band) apply.
#[must_use]
pub fn windowed_sinc(data: &PolyData, iterations: usize, pass_band: f64) -> PolyData {
    let adjacency = vertex_adjacency(data);
    let mut points: Vec<DVec3> = data.points().to_vec();
    let mut next = points.clone();

    let lambda = 0.5;
    // mu solves 1/lambda + 1/mu = pass_band, giving the un-shrink step
    let mu = 1.0 / (pass_band - 1.0 / lambda);

    let mut step = |points: &mut Vec<DVec3>, next: &mut Vec<DVec3>, factor: f64| {
        for (i, neighbors) in adjacency.iter().enumerate() {
            if neighbors.is_empty() {
                next[i] = points[i];
                continue;
            }
            let mean = neighbors
                .iter()
                .map(|&n| points[n as usize])
                .sum::<DVec3>()
                / neighbors.len() as f64;
            next[i] = points[i] + (mean - points[i]) * factor;
        }
        std::mem::swap(points, next);
    };

    for _ in 0..iterations {
        step(&mut points, &mut next, lambda);
        step(&mut points, &mut next, mu);
    }

    let mut out = data.clone();
    out.set_points(points);
    out
}

/// Re-samples a polyline through a Catmull-Rom spline.
///
/// Exactly one of `spacing` / `num_points` drives the output sampling;
/// when both are given, `num_points` wins (mirroring the original filter's
/// subdivision switch). `smooth_factor` first coarsens the control points
/// by that factor and then resamples, which low-passes the curve. The
/// output runs in the same direction as the input.
#[must_use]
pub fn resample_polyline(
    data: &PolyData,
    spacing: Option<f64>,
    num_points: Option<usize>,
    smooth_factor: Option<f64>,
) -> PolyData {
    let control: Vec<DVec3> = polyline_points(data);
    if control.len() < 2 {
        return data.clone();
    }

    if let Some(factor) = smooth_factor {
        if factor > 1.0 {
            let coarse_n = ((control.len() as f64 / factor).round() as usize).max(2);
            let coarse = resample_polyline(data, None, Some(coarse_n), None);
            return resample_polyline(&coarse, spacing, num_points, None);
        }
    }

    let total = math::polyline_length(&control);
    let n = match (num_points, spacing) {
        (Some(n), _) => n.max(2),
        (None, Some(s)) if s > 0.0 => ((total / s).round() as usize + 1).max(2),
        _ => control.len(),
    };

    let cumulative = math::cumulative_lengths(&control);
    let mut out_points = Vec::with_capacity(n);
    for k in 0..n {
        let target = total * (k as f64) / (n - 1) as f64;
        out_points.push(spline_at(&control, &cumulative, target));
    }

    // Direction check: keep the start near the original start
    let d_start = (out_points[0] - control[0]).length();
    let d_end = (out_points[n - 1] - control[0]).length();
    if d_end < d_start {
        out_points.reverse();
    }
    PolyData::from_polyline(out_points, false)
}

/// Points of the first polyline cell (or all points in order when the
/// dataset has no line cells).
fn polyline_points(data: &PolyData) -> Vec<DVec3> {
    let points = data.points();
    match data.lines().first() {
        Some(cell) => cell.iter().map(|&i| points[i as usize]).collect(),
        None => points.to_vec(),
    }
}

/// Catmull-Rom evaluation at an arc-length position along the control
/// polyline.
fn spline_at(control: &[DVec3], cumulative: &[f64], target: f64) -> DVec3 {
    let n = control.len();
    // Find the segment containing the target arc length
    let mut seg = 0;
    while seg + 2 < cumulative.len() && cumulative[seg + 1] < target {
        seg += 1;
    }
    let seg_len = cumulative[seg + 1] - cumulative[seg];
    let t = if seg_len > 0.0 {
        ((target - cumulative[seg]) / seg_len).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let p1 = control[seg];
    let p2 = control[seg + 1];
    let p0 = if seg == 0 { p1 } else { control[seg - 1] };
    let p3 = if seg + 2 < n { control[seg + 2] } else { p2 };

    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources;

    #[test]
    fn test_laplacian_preserves_counts() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 12);
        let sm = laplacian(&s, 10, 0.1);
        assert_eq!(sm.num_points(), s.num_points());
        assert_eq!(sm.polys().len(), s.polys().len());
    }

    #[test]
    fn test_laplacian_shrinks_sphere() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 12);
        let sm = laplacian(&s, 50, 0.1);
        let mean_r: f64 =
            sm.points().iter().map(|p| p.length()).sum::<f64>() / sm.num_points() as f64;
        assert!(mean_r < 1.0, "Laplacian must shrink a closed surface");
        assert!(mean_r > 0.5, "shrunk too far: {mean_r}");
    }

    #[test]
    fn test_windowed_sinc_shrinks_less() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 12);
        let lap = laplacian(&s, 20, 0.5);
        let sinc = windowed_sinc(&s, 20, 0.1);
        let mean = |pd: &PolyData| {
            pd.points().iter().map(|p| p.length()).sum::<f64>() / pd.num_points() as f64
        };
        assert!(
            (mean(&sinc) - 1.0).abs() < (mean(&lap) - 1.0).abs(),
            "sinc {} vs laplacian {}",
            mean(&sinc),
            mean(&lap)
        );
    }

    #[test]
    fn test_smoothing_flattens_noise() {
        // A zigzag line smooths toward the straight line through it
        let mut pts = Vec::new();
        for i in 0..21 {
            let y = if i % 2 == 0 { 0.1 } else { -0.1 };
            pts.push(DVec3::new(f64::from(i) * 0.1, y, 0.0));
        }
        let line = PolyData::from_polyline(pts, false);
        let sm = laplacian(&line, 100, 0.5);
        let interior_max = sm.points()[2..19]
            .iter()
            .map(|p| p.y.abs())
            .fold(0.0, f64::max);
        assert!(interior_max < 0.05, "still wiggly: {interior_max}");
    }

    #[test]
    fn test_resample_polyline_spacing() {
        let line = sources::polyline_between(DVec3::ZERO, DVec3::X * 10.0, 5);
        let fine = resample_polyline(&line, Some(0.5), None, None);
        assert_eq!(fine.num_points(), 21);
        let pts = fine.points();
        assert!((pts[0] - DVec3::ZERO).length() < 1e-9);
        assert!((pts[20] - DVec3::X * 10.0).length() < 1e-9);
        // Uniform spacing
        for w in pts.windows(2) {
            assert!(((w[1] - w[0]).length() - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_resample_polyline_num_points() {
        let line = sources::polyline_between(DVec3::ZERO, DVec3::X, 9);
        let coarse = resample_polyline(&line, None, Some(3), None);
        assert_eq!(coarse.num_points(), 3);
        assert!((coarse.points()[1].x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resample_keeps_direction() {
        let line = sources::polyline_between(DVec3::X * 10.0, DVec3::ZERO, 5);
        let r = resample_polyline(&line, None, Some(11), None);
        assert!((r.points()[0] - DVec3::X * 10.0).length() < 1e-9);
    }
}
