//! Affine transforms for polygonal data.

use glam::{DMat4, DQuat, DVec3};
use meshtk_core::math;
use meshtk_core::PolyData;

/// Applies an affine matrix to every point of a dataset.
///
/// Cells and attribute arrays are carried over unchanged.
#[must_use]
pub fn apply_matrix(data: &PolyData, matrix: &DMat4) -> PolyData {
    let mut out = data.clone();
    out.set_points(
        data.points()
            .iter()
            .map(|p| matrix.transform_point3(*p))
            .collect(),
    );
    out
}

/// Translates a dataset.
#[must_use]
pub fn translate(data: &PolyData, displacement: DVec3) -> PolyData {
    apply_matrix(data, &DMat4::from_translation(displacement))
}

/// Scales a dataset about the origin.
#[must_use]
pub fn scale(data: &PolyData, factors: DVec3) -> PolyData {
    apply_matrix(data, &DMat4::from_scale(factors))
}

/// Rotates a dataset about the origin by `angle` radians around `axis`.
#[must_use]
pub fn rotate(data: &PolyData, angle: f64, axis: DVec3) -> PolyData {
    let axis = axis.normalize_or_zero();
    if axis == DVec3::ZERO {
        return data.clone();
    }
    apply_matrix(data, &DMat4::from_quat(DQuat::from_axis_angle(axis, angle)))
}

/// Rotates a dataset about its own center so that direction `from` maps
/// onto direction `to`.
///
/// Near-parallel axes return the input unchanged.
#[must_use]
pub fn rotate_axis_to_axis(data: &PolyData, from: DVec3, to: DVec3) -> PolyData {
    let angle = math::angle_between(from, to);
    if angle.abs() < 1e-9 {
        return data.clone();
    }
    let axis = from.cross(to).normalize_or_zero();
    if axis == DVec3::ZERO {
        // Anti-parallel: rotate about any perpendicular
        let (u, _, _) = math::basis_for_normal(from, None);
        let center = data.center();
        let m = DMat4::from_translation(center)
            * DMat4::from_quat(DQuat::from_axis_angle(u, std::f64::consts::PI))
            * DMat4::from_translation(-center);
        return apply_matrix(data, &m);
    }
    let center = data.center();
    let m = DMat4::from_translation(center)
        * DMat4::from_quat(DQuat::from_axis_angle(axis, angle))
        * DMat4::from_translation(-center);
    apply_matrix(data, &m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources;

    #[test]
    fn test_translate_scale() {
        let tri = PolyData::from_triangles(
            vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            vec![[0, 1, 2]],
        );
        let moved = translate(&tri, DVec3::Z * 2.0);
        assert_eq!(moved.points()[0], DVec3::Z * 2.0);

        let grown = scale(&tri, DVec3::splat(3.0));
        assert_eq!(grown.points()[1], DVec3::X * 3.0);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let tri = PolyData::from_triangles(
            vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            vec![[0, 1, 2]],
        );
        let r = rotate(&tri, std::f64::consts::FRAC_PI_2, DVec3::Z);
        assert!((r.points()[1] - DVec3::Y).length() < 1e-12);
    }

    #[test]
    fn test_axis_to_axis_preserves_center() {
        let cyl = sources::cylinder(DVec3::new(1.0, 2.0, 3.0), 0.5, 2.0, 8, None);
        let turned = rotate_axis_to_axis(&cyl, DVec3::Y, DVec3::Z);
        assert!((turned.center() - cyl.center()).length() < 1e-9);
        let (lo, hi) = turned.bounds().unwrap();
        assert!((hi.z - lo.z - 2.0).abs() < 1e-9, "axis not re-oriented");
    }

    #[test]
    fn test_axis_to_axis_antiparallel() {
        let cyl = sources::cylinder(DVec3::ZERO, 0.5, 2.0, 8, None);
        let flipped = rotate_axis_to_axis(&cyl, DVec3::Y, -DVec3::Y);
        let (lo, hi) = flipped.bounds().unwrap();
        assert!((hi.y - 1.0).abs() < 1e-9 && (lo.y + 1.0).abs() < 1e-9);
    }
}
