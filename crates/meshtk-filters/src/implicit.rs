//! Implicit functions for clipping and selection.
//!
//! An implicit function assigns every point a signed value; by convention
//! the value is negative inside the shape and positive outside. Clip
//! filters keep the positive side unless asked for the inside.

use glam::DVec3;
use meshtk_core::math;

/// A signed scalar field over space.
pub trait Implicit {
    /// Evaluates the function at a point. Negative means inside.
    fn eval(&self, p: DVec3) -> f64;
}

/// Implicit sphere: signed distance to the surface.
#[derive(Debug, Clone, Copy)]
pub struct SphereFunction {
    pub center: DVec3,
    pub radius: f64,
}

impl SphereFunction {
    /// Creates a sphere about `center`.
    #[must_use]
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Implicit for SphereFunction {
    fn eval(&self, p: DVec3) -> f64 {
        (p - self.center).length() - self.radius
    }
}

/// Implicit plane: signed distance along the normal.
///
/// Positive on the side the normal points to.
#[derive(Debug, Clone, Copy)]
pub struct PlaneFunction {
    pub origin: DVec3,
    normal: DVec3,
}

impl PlaneFunction {
    /// Creates a plane through `origin`; the normal is normalized.
    #[must_use]
    pub fn new(origin: DVec3, normal: DVec3) -> Self {
        Self {
            origin,
            normal: normal.normalize_or_zero(),
        }
    }

    /// The unit normal.
    #[must_use]
    pub fn normal(&self) -> DVec3 {
        self.normal
    }
}

impl Implicit for PlaneFunction {
    fn eval(&self, p: DVec3) -> f64 {
        self.normal.dot(p - self.origin)
    }
}

/// Implicit oriented box.
///
/// The box has a square `width x width` cross-section and a `thickness`
/// along `normal`; it is placed so that the *face* center sits at
/// `face_center` and the box extends from there along the normal — the
/// placement used when carving a slab away from a surface at a seed point.
#[derive(Debug, Clone, Copy)]
pub struct BoxFunction {
    center: DVec3,
    u: DVec3,
    v: DVec3,
    w: DVec3,
    half_width: f64,
    half_thickness: f64,
}

impl BoxFunction {
    /// Creates the box from a face center and outward normal.
    #[must_use]
    pub fn from_face(face_center: DVec3, normal: DVec3, width: f64, thickness: f64) -> Self {
        let (u, v, w) = math::basis_for_normal(normal, None);
        let half_thickness = thickness / 2.0;
        Self {
            center: face_center + w * half_thickness,
            u,
            v,
            w,
            half_width: width / 2.0,
            half_thickness,
        }
    }

    /// Center of the box body.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// The box axis along the construction normal.
    #[must_use]
    pub fn axis(&self) -> DVec3 {
        self.w
    }

    /// Half-extent along the construction normal.
    #[must_use]
    pub fn half_thickness(&self) -> f64 {
        self.half_thickness
    }
}

impl Implicit for BoxFunction {
    fn eval(&self, p: DVec3) -> f64 {
        let d = p - self.center;
        let local = DVec3::new(self.u.dot(d), self.v.dot(d), self.w.dot(d));
        // Chebyshev-style signed value: negative only inside all three slabs
        (local.x.abs() - self.half_width)
            .max(local.y.abs() - self.half_width)
            .max(local.z.abs() - self.half_thickness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_sign() {
        let s = SphereFunction::new(DVec3::ZERO, 1.0);
        assert!(s.eval(DVec3::ZERO) < 0.0);
        assert!(s.eval(DVec3::X * 2.0) > 0.0);
        assert!(s.eval(DVec3::X).abs() < 1e-12);
    }

    #[test]
    fn test_plane_sign() {
        let p = PlaneFunction::new(DVec3::ZERO, DVec3::Z * 3.0);
        assert!((p.eval(DVec3::new(5.0, -2.0, 1.5)) - 1.5).abs() < 1e-12);
        assert!(p.eval(DVec3::new(0.0, 0.0, -1.0)) < 0.0);
    }

    #[test]
    fn test_box_from_face() {
        // Face at origin, box extends one unit along +Z
        let b = BoxFunction::from_face(DVec3::ZERO, DVec3::Z, 2.0, 1.0);
        assert!(b.eval(DVec3::new(0.0, 0.0, 0.5)) < 0.0); // body center
        assert!(b.eval(DVec3::new(0.0, 0.0, -0.5)) > 0.0); // behind the face
        assert!(b.eval(DVec3::new(0.0, 0.0, 1.5)) > 0.0); // past the far face
        assert!(b.eval(DVec3::new(1.5, 0.0, 0.5)) > 0.0); // outside the width
        assert_eq!(b.center(), DVec3::new(0.0, 0.0, 0.5));
    }
}
