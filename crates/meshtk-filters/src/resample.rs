//! Resampling and probing: transfer point arrays between datasets.

use glam::DVec3;
use meshtk_core::{
    AttributeArray, DataSet, ImageData, MeshTkError, PolyData, Result, StructuredGrid,
};
use serde::{Deserialize, Serialize};

/// Options for [`probe`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProbeOptions {
    /// Keep the target's own point arrays alongside the probed ones.
    pub pass_point_data: bool,
}

/// Samples every point array of `source` at the points of `target`.
///
/// Image (and uniform structured) sources are sampled trilinearly; other
/// sources transfer the nearest source point's values. Target points
/// outside an image source receive zeros. The result is the target with
/// the probed arrays attached.
#[must_use]
pub fn probe(source: &DataSet, target: &DataSet, options: ProbeOptions) -> DataSet {
    let mut out = target.clone();
    if !options.pass_point_data {
        out.point_data_mut().clear();
    }
    let target_points = target.points();

    match source {
        DataSet::ImageData(img) => {
            for (name, array) in img.point_data().iter() {
                let sampled = match array {
                    AttributeArray::Scalar(v) => AttributeArray::Scalar(
                        target_points
                            .iter()
                            .map(|&p| trilinear_scalar(img, v, p).unwrap_or(0.0))
                            .collect(),
                    ),
                    AttributeArray::Vector(v) => AttributeArray::Vector(
                        target_points
                            .iter()
                            .map(|&p| trilinear_vector(img, v, p).unwrap_or(DVec3::ZERO))
                            .collect(),
                    ),
                };
                out.point_data_mut().insert(name, sampled);
            }
        }
        _ => {
            let source_points = source.points();
            if source_points.is_empty() {
                return out;
            }
            log::debug!(
                "probe: nearest-point transfer from {} source points",
                source_points.len()
            );
            let nearest: Vec<usize> = target_points
                .iter()
                .map(|&p| {
                    meshtk_core::math::closest_point_id(p, &source_points).unwrap_or(0)
                })
                .collect();
            for (name, array) in source.point_data().iter() {
                let sampled = match array {
                    AttributeArray::Scalar(v) => {
                        AttributeArray::Scalar(nearest.iter().map(|&i| v[i]).collect())
                    }
                    AttributeArray::Vector(v) => {
                        AttributeArray::Vector(nearest.iter().map(|&i| v[i]).collect())
                    }
                };
                out.point_data_mut().insert(name, sampled);
            }
        }
    }
    out
}

/// Probes each keyed source onto one static target.
#[must_use]
pub fn probe_each<K: Clone>(
    sources: &[(K, DataSet)],
    target: &DataSet,
    options: ProbeOptions,
) -> Vec<(K, DataSet)> {
    sources
        .iter()
        .map(|(key, src)| (key.clone(), probe(src, target, options)))
        .collect()
}

/// Trilinear interpolation of a point scalar at a world position.
#[must_use]
pub fn trilinear_scalar(image: &ImageData, values: &[f64], x: DVec3) -> Option<f64> {
    let (ijk, p) = image.structured_coords(x)?;
    let mut acc = 0.0;
    for (corner, weight) in corner_weights(image, ijk, p) {
        acc += values[corner] * weight;
    }
    Some(acc)
}

/// Trilinear interpolation of a point vector at a world position.
#[must_use]
pub fn trilinear_vector(image: &ImageData, values: &[DVec3], x: DVec3) -> Option<DVec3> {
    let (ijk, p) = image.structured_coords(x)?;
    let mut acc = DVec3::ZERO;
    for (corner, weight) in corner_weights(image, ijk, p) {
        acc += values[corner] * weight;
    }
    Some(acc)
}

fn corner_weights(
    image: &ImageData,
    ijk: [usize; 3],
    p: DVec3,
) -> impl Iterator<Item = (usize, f64)> + '_ {
    let dims = image.dims();
    (0..8_usize).map(move |c| {
        let di = c & 1;
        let dj = (c >> 1) & 1;
        let dk = (c >> 2) & 1;
        // Clamp handles flat (single-node) axes
        let corner = [
            (ijk[0] + di).min(dims[0] - 1),
            (ijk[1] + dj).min(dims[1] - 1),
            (ijk[2] + dk).min(dims[2] - 1),
        ];
        let w = |frac: f64, bit: usize| if bit == 1 { frac } else { 1.0 - frac };
        let weight = w(p.x, di) * w(p.y, dj) * w(p.z, dk);
        (image.flatten_index(corner), weight)
    })
}

/// Builds an empty image covering `(lo, hi)` at the given resolution, with
/// `pad` extra nodes per axis (half a pad of margin on the low side).
pub fn image_from_bounds(lo: DVec3, hi: DVec3, resolution: DVec3, pad: usize) -> Result<ImageData> {
    if resolution.min_element() <= 0.0 {
        return Err(MeshTkError::EmptyInput("non-positive resolution"));
    }
    let extent = hi - lo;
    let dims = [
        (extent.x / resolution.x) as usize + 1 + pad,
        (extent.y / resolution.y) as usize + 1 + pad,
        (extent.z / resolution.z) as usize + 1 + pad,
    ];
    let origin = lo - resolution * (pad as f64) / 2.0;
    ImageData::new(dims, resolution, origin)
}

/// Rasterizes a dataset's point arrays onto a new uniform image.
///
/// The image spans `bounds` (the dataset's own bounds by default) with the
/// given node dimensions; structured-grid inputs may omit `dims` to reuse
/// their own. Arrays are transferred with [`probe`].
pub fn resample_to_image(
    data: &DataSet,
    dims: Option<[usize; 3]>,
    bounds: Option<(DVec3, DVec3)>,
) -> Result<ImageData> {
    let dims = match (dims, data) {
        (Some(d), _) => d,
        (None, DataSet::StructuredGrid(sg)) => sg.dims(),
        (None, DataSet::ImageData(img)) => img.dims(),
        (None, _) => {
            return Err(MeshTkError::UnsupportedDataSet {
                operation: "resample_to_image without dims",
                found: data.type_name(),
            })
        }
    };
    let (lo, hi) = bounds
        .or_else(|| data.bounds())
        .ok_or(MeshTkError::EmptyInput("dataset has no bounds"))?;
    let spacing = DVec3::new(
        span(hi.x - lo.x, dims[0]),
        span(hi.y - lo.y, dims[1]),
        span(hi.z - lo.z, dims[2]),
    );
    let image = ImageData::new(dims, spacing, lo)?;
    match probe(data, &DataSet::ImageData(image), ProbeOptions::default()) {
        DataSet::ImageData(img) => Ok(img),
        _ => unreachable!(),
    }
}

fn span(extent: f64, dim: usize) -> f64 {
    if dim > 1 {
        extent / (dim - 1) as f64
    } else {
        1.0
    }
}

/// Materializes an image volume as a structured grid with explicit points.
#[must_use]
pub fn image_to_structured_grid(image: &ImageData) -> StructuredGrid {
    let mut sg = StructuredGrid::new(image.dims(), image.positions())
        .expect("image dims always match its positions");
    *sg.point_data_mut() = image.point_data().clone();
    *sg.cell_data_mut() = image.cell_data().clone();
    image.field_data().copy_into(sg.field_data_mut());
    sg
}

/// Merges two image volumes onto a common grid, averaging a named scalar.
pub fn merge_images(
    a: &ImageData,
    b: &ImageData,
    resolution: DVec3,
    array: &str,
) -> Result<ImageData> {
    let va = a.point_data().scalars(array)?;
    let vb = b.point_data().scalars(array)?;
    let (alo, ahi) = a.bounds();
    let (blo, bhi) = b.bounds();
    let mut merged = image_from_bounds(alo.min(blo), ahi.max(bhi), resolution, 1)?;
    let values: Vec<f64> = merged
        .positions()
        .iter()
        .map(|&p| {
            let sa = trilinear_scalar(a, va, p).unwrap_or(0.0);
            let sb = trilinear_scalar(b, vb, p).unwrap_or(0.0);
            (sa + sb) / 2.0
        })
        .collect();
    merged.add_point_scalar(array, values)?;
    merged.point_data_mut().set_active_scalars(array)?;
    Ok(merged)
}

/// Voxelizes a closed surface into a 0/1 image scalar.
///
/// Nodes enclosed by the surface get `1.0`. `dilate` grows the mask that
/// many times with a 3x3x3 kernel; `median_kernel > 1` finishes with a
/// median pass of that kernel size.
pub fn surface_to_binary_image(
    surface: &PolyData,
    array: &str,
    resolution: DVec3,
    dilate: usize,
    median_kernel: usize,
) -> Result<ImageData> {
    let (lo, hi) = surface
        .bounds()
        .ok_or(MeshTkError::EmptyInput("surface has no points"))?;
    let mut image = image_from_bounds(lo, hi, resolution, 10)?;
    let ids = crate::select::inside_ids(
        &DataSet::ImageData(image.same_geometry()),
        surface,
    );
    let mut mask = vec![0.0; image.num_points()];
    for i in ids {
        mask[i] = 1.0;
    }
    image.add_point_scalar(array, mask)?;
    image.point_data_mut().set_active_scalars(array)?;

    for _ in 0..dilate {
        image = crate::image_filters::dilate_erode(&image, [3, 3, 3], 1.0, 0.0, Some(array))?;
    }
    if median_kernel > 1 {
        image = crate::image_filters::median(&image, median_kernel, Some(array))?;
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources;

    fn linear_image() -> ImageData {
        // f(x, y, z) = x + 10y + 100z on a 4^3 grid
        let mut img = ImageData::new([4, 4, 4], DVec3::splat(0.5), DVec3::ZERO).unwrap();
        let values: Vec<f64> = img
            .positions()
            .iter()
            .map(|p| p.x + 10.0 * p.y + 100.0 * p.z)
            .collect();
        img.add_point_scalar("f", values).unwrap();
        img
    }

    #[test]
    fn test_trilinear_reproduces_linear_field() {
        let img = linear_image();
        let v = img.point_data().scalars("f").unwrap().to_vec();
        let x = DVec3::new(0.31, 0.77, 1.13);
        let got = trilinear_scalar(&img, &v, x).unwrap();
        let want = x.x + 10.0 * x.y + 100.0 * x.z;
        assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        // Outside the volume
        assert!(trilinear_scalar(&img, &v, DVec3::splat(9.0)).is_none());
    }

    #[test]
    fn test_probe_image_onto_points() {
        let img = linear_image();
        let probes = PolyData::from_vertices(vec![
            DVec3::new(0.25, 0.25, 0.25),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::splat(50.0), // outside -> 0
        ]);
        let probed = probe(
            &DataSet::ImageData(img),
            &DataSet::PolyData(probes),
            ProbeOptions::default(),
        );
        let v = probed.point_data().scalars("f").unwrap();
        assert!((v[0] - (0.25 + 2.5 + 25.0)).abs() < 1e-9);
        assert!((v[1] - 111.0).abs() < 1e-9);
        assert_eq!(v[2], 0.0);
    }

    #[test]
    fn test_probe_nearest_from_poly() {
        let mut cloud = PolyData::from_vertices(vec![DVec3::ZERO, DVec3::X * 2.0]);
        cloud.add_point_scalar("s", vec![5.0, 9.0]).unwrap();
        let target = PolyData::from_vertices(vec![DVec3::X * 0.3, DVec3::X * 1.8]);
        let probed = probe(
            &DataSet::PolyData(cloud),
            &DataSet::PolyData(target),
            ProbeOptions::default(),
        );
        assert_eq!(probed.point_data().scalars("s").unwrap(), &[5.0, 9.0]);
    }

    #[test]
    fn test_resample_to_image() {
        let img = linear_image();
        let sg = image_to_structured_grid(&img);
        let back = resample_to_image(&DataSet::StructuredGrid(sg), None, None).unwrap();
        assert_eq!(back.dims(), [4, 4, 4]);
        // Nearest-point transfer from the grid reproduces node values
        let f = back.point_data().scalars("f").unwrap();
        let orig = img.point_data().scalars("f").unwrap();
        for (a, b) in f.iter().zip(orig) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_merge_images_averages() {
        let mut a = ImageData::new([3, 3, 3], DVec3::ONE, DVec3::ZERO).unwrap();
        let mut b = ImageData::new([3, 3, 3], DVec3::ONE, DVec3::ZERO).unwrap();
        a.add_point_scalar("v", vec![2.0; 27]).unwrap();
        b.add_point_scalar("v", vec![4.0; 27]).unwrap();
        let merged = merge_images(&a, &b, DVec3::ONE, "v").unwrap();
        // Interior nodes see both fields; all values average to 3
        let idx = merged.find_point(DVec3::ONE).unwrap();
        let v = merged.point_data().scalars("v").unwrap();
        assert!((v[idx] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_surface_to_binary_image() {
        let surface = sources::sphere(DVec3::ZERO, 1.0, 16);
        let img = surface_to_binary_image(&surface, "mask", DVec3::splat(0.25), 0, 0).unwrap();
        let v = img.point_data().scalars("mask").unwrap();
        let center = img.find_point(DVec3::ZERO).unwrap();
        assert_eq!(v[center], 1.0);
        let corner = 0; // image corner is well outside the sphere
        assert_eq!(v[corner], 0.0);
        let filled: usize = v.iter().filter(|&&x| x > 0.5).count();
        assert!(filled > 100, "only {filled} nodes filled");
    }
}
