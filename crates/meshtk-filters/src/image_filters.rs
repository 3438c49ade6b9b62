//! Filters over image volumes: morphology, median, VOI extraction.

use meshtk_core::{
    AttributeArray, ImageData, MeshTkError, Result, StructuredGrid,
};

fn named_or_active(image: &ImageData, array: Option<&str>) -> Result<String> {
    match array {
        Some(name) => {
            image.point_data().scalars(name)?;
            Ok(name.to_string())
        }
        None => {
            let mut attrs = image.point_data().clone();
            attrs.ensure_scalars(None).map_err(|_| MeshTkError::NoArrays)
        }
    }
}

/// 3-D grayscale morphology with a box kernel.
///
/// A node currently at `erode_value` becomes `dilate_value` when any node
/// in its kernel window carries `dilate_value` — so `(1, 0)` dilates a
/// binary mask and `(0, 1)` erodes it. Other values pass through.
pub fn dilate_erode(
    image: &ImageData,
    kernel: [usize; 3],
    dilate_value: f64,
    erode_value: f64,
    array: Option<&str>,
) -> Result<ImageData> {
    let name = named_or_active(image, array)?;
    let input = image.point_data().scalars(&name)?.to_vec();
    let dims = image.dims();
    let half = [kernel[0] / 2, kernel[1] / 2, kernel[2] / 2];

    let mut output = input.clone();
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                let idx = image.flatten_index([i, j, k]);
                if input[idx] != erode_value {
                    continue;
                }
                if window_contains(&input, image, [i, j, k], half, dilate_value) {
                    output[idx] = dilate_value;
                }
            }
        }
    }

    let mut out = image.clone();
    out.point_data_mut().insert_scalar(&name, output);
    Ok(out)
}

fn window_contains(
    values: &[f64],
    image: &ImageData,
    center: [usize; 3],
    half: [usize; 3],
    needle: f64,
) -> bool {
    let dims = image.dims();
    for dk in -(half[2] as isize)..=half[2] as isize {
        for dj in -(half[1] as isize)..=half[1] as isize {
            for di in -(half[0] as isize)..=half[0] as isize {
                let ni = center[0] as isize + di;
                let nj = center[1] as isize + dj;
                let nk = center[2] as isize + dk;
                if ni < 0
                    || nj < 0
                    || nk < 0
                    || ni >= dims[0] as isize
                    || nj >= dims[1] as isize
                    || nk >= dims[2] as isize
                {
                    continue;
                }
                if values[image.flatten_index([ni as usize, nj as usize, nk as usize])] == needle
                {
                    return true;
                }
            }
        }
    }
    false
}

/// 3-D median filter with a cubic kernel of the given size.
pub fn median(image: &ImageData, kernel_size: usize, array: Option<&str>) -> Result<ImageData> {
    let name = named_or_active(image, array)?;
    let input = image.point_data().scalars(&name)?.to_vec();
    let dims = image.dims();
    let half = kernel_size / 2;

    let mut output = Vec::with_capacity(input.len());
    let mut window: Vec<f64> = Vec::with_capacity(kernel_size.pow(3));
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                window.clear();
                for dk in -(half as isize)..=half as isize {
                    for dj in -(half as isize)..=half as isize {
                        for di in -(half as isize)..=half as isize {
                            let ni = i as isize + di;
                            let nj = j as isize + dj;
                            let nk = k as isize + dk;
                            if ni < 0
                                || nj < 0
                                || nk < 0
                                || ni >= dims[0] as isize
                                || nj >= dims[1] as isize
                                || nk >= dims[2] as isize
                            {
                                continue;
                            }
                            window.push(
                                input[image.flatten_index([
                                    ni as usize,
                                    nj as usize,
                                    nk as usize,
                                ])],
                            );
                        }
                    }
                }
                window.sort_by(f64::total_cmp);
                output.push(window[window.len() / 2]);
            }
        }
    }

    let mut out = image.clone();
    out.point_data_mut().insert_scalar(&name, output);
    Ok(out)
}

/// Extracts a volume of interest: node range `[i0, i1] x [j0, j1] x [k0, k1]`
/// (inclusive) with a per-axis sampling rate.
///
/// Point arrays are subsampled; the output keeps the source's world
/// geometry (origin at node `(i0, j0, k0)`, spacing scaled by the rate).
pub fn extract_voi(
    image: &ImageData,
    ijk_min_max: [usize; 6],
    sample_rate: [usize; 3],
) -> Result<ImageData> {
    let dims = image.dims();
    let [i0, i1, j0, j1, k0, k1] = ijk_min_max;
    let i1 = i1.min(dims[0] - 1);
    let j1 = j1.min(dims[1] - 1);
    let k1 = k1.min(dims[2] - 1);
    if i0 > i1 || j0 > j1 || k0 > k1 {
        return Err(MeshTkError::InvalidDimensions(
            i1.saturating_sub(i0),
            j1.saturating_sub(j0),
            k1.saturating_sub(k0),
        ));
    }
    let rate = [
        sample_rate[0].max(1),
        sample_rate[1].max(1),
        sample_rate[2].max(1),
    ];
    let new_dims = [
        (i1 - i0) / rate[0] + 1,
        (j1 - j0) / rate[1] + 1,
        (k1 - k0) / rate[2] + 1,
    ];
    let spacing = image.spacing()
        * glam::DVec3::new(rate[0] as f64, rate[1] as f64, rate[2] as f64);
    let origin = image.position([i0, j0, k0]);
    let mut out = ImageData::new(new_dims, spacing, origin)?;

    // Linear indices of the sampled nodes, x fastest
    let mut picked = Vec::with_capacity(new_dims[0] * new_dims[1] * new_dims[2]);
    for k in 0..new_dims[2] {
        for j in 0..new_dims[1] {
            for i in 0..new_dims[0] {
                picked.push(image.flatten_index([
                    i0 + i * rate[0],
                    j0 + j * rate[1],
                    k0 + k * rate[2],
                ]));
            }
        }
    }
    for (name, array) in image.point_data().iter() {
        let sub = match array {
            AttributeArray::Scalar(v) => {
                AttributeArray::Scalar(picked.iter().map(|&i| v[i]).collect())
            }
            AttributeArray::Vector(v) => {
                AttributeArray::Vector(picked.iter().map(|&i| v[i]).collect())
            }
        };
        out.point_data_mut().insert(name, sub);
    }
    if !image.cell_data().is_empty() {
        log::debug!("extract_voi: cell arrays are not carried over");
    }
    image.field_data().copy_into(out.field_data_mut());
    Ok(out)
}

/// Extracts the smallest VOI covering another dataset's bounds.
pub fn extract_voi_from_bounds(
    image: &ImageData,
    lo: glam::DVec3,
    hi: glam::DVec3,
) -> Result<ImageData> {
    let dims = image.dims();
    let clamp_coords = |x: glam::DVec3| -> [usize; 3] {
        let (blo, bhi) = image.bounds();
        let clamped = x.clamp(blo, bhi);
        match image.structured_coords(clamped) {
            Some((ijk, _)) => ijk,
            None => [0, 0, 0],
        }
    };
    let a = clamp_coords(lo);
    let b = clamp_coords(hi);
    let ijk_min_max = [
        a[0].min(b[0]),
        (a[0].max(b[0]) + 1).min(dims[0] - 1),
        a[1].min(b[1]),
        (a[1].max(b[1]) + 1).min(dims[1] - 1),
        a[2].min(b[2]),
        (a[2].max(b[2]) + 1).min(dims[2] - 1),
    ];
    extract_voi(image, ijk_min_max, [1, 1, 1])
}

/// Concatenates image volumes along an axis (0 = x, 1 = y, 2 = z).
///
/// Cross-axis dimensions must match; point arrays present in every input
/// are concatenated node-wise.
pub fn append_images(images: &[&ImageData], axis: usize) -> Result<ImageData> {
    let first = images
        .first()
        .ok_or(MeshTkError::EmptyInput("no images to append"))?;
    if axis > 2 {
        return Err(MeshTkError::InvalidDimensions(axis, 0, 0));
    }
    let mut dims = first.dims();
    for img in &images[1..] {
        let d = img.dims();
        for a in 0..3 {
            if a != axis && d[a] != dims[a] {
                return Err(MeshTkError::SizeMismatch {
                    expected: dims[a],
                    actual: d[a],
                });
            }
        }
        dims[axis] += d[axis];
    }
    let mut out = ImageData::new(dims, first.spacing(), first.origin())?;

    // Map every output node to (image, local linear index)
    let mut mapping: Vec<(usize, usize)> = Vec::with_capacity(out.num_points());
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                let mut along = [i, j, k][axis];
                let mut source = 0;
                while along >= images[source].dims()[axis] {
                    along -= images[source].dims()[axis];
                    source += 1;
                }
                let mut local = [i, j, k];
                local[axis] = along;
                mapping.push((source, images[source].flatten_index(local)));
            }
        }
    }

    'arrays: for (name, array) in first.point_data().iter() {
        let is_vector = matches!(array, AttributeArray::Vector(_));
        for img in images {
            match img.point_data().get(name) {
                Some(a) if matches!(a, AttributeArray::Vector(_)) == is_vector => {}
                _ => continue 'arrays,
            }
        }
        if is_vector {
            let gathered: Vec<glam::DVec3> = mapping
                .iter()
                .map(|&(s, i)| {
                    images[s].point_data().vectors(name).map(|v| v[i]).unwrap_or_default()
                })
                .collect();
            out.point_data_mut().insert_vector(name, gathered);
        } else {
            let gathered: Vec<f64> = mapping
                .iter()
                .map(|&(s, i)| {
                    images[s].point_data().scalars(name).map(|v| v[i]).unwrap_or(0.0)
                })
                .collect();
            out.point_data_mut().insert_scalar(name, gathered);
        }
    }
    Ok(out)
}

/// Extracts a structured sub-grid with a node range and sampling rate.
pub fn extract_structured_subgrid(
    grid: &StructuredGrid,
    ijk_min_max: [usize; 6],
    sample_rate: [usize; 3],
) -> Result<StructuredGrid> {
    let dims = grid.dims();
    let [i0, i1, j0, j1, k0, k1] = ijk_min_max;
    let i1 = i1.min(dims[0] - 1);
    let j1 = j1.min(dims[1] - 1);
    let k1 = k1.min(dims[2] - 1);
    if i0 > i1 || j0 > j1 || k0 > k1 {
        return Err(MeshTkError::InvalidDimensions(
            i1.saturating_sub(i0),
            j1.saturating_sub(j0),
            k1.saturating_sub(k0),
        ));
    }
    let rate = [
        sample_rate[0].max(1),
        sample_rate[1].max(1),
        sample_rate[2].max(1),
    ];
    let new_dims = [
        (i1 - i0) / rate[0] + 1,
        (j1 - j0) / rate[1] + 1,
        (k1 - k0) / rate[2] + 1,
    ];
    let mut picked = Vec::with_capacity(new_dims[0] * new_dims[1] * new_dims[2]);
    let mut points = Vec::with_capacity(picked.capacity());
    for k in 0..new_dims[2] {
        for j in 0..new_dims[1] {
            for i in 0..new_dims[0] {
                let idx = grid.flatten_index([
                    i0 + i * rate[0],
                    j0 + j * rate[1],
                    k0 + k * rate[2],
                ]);
                picked.push(idx);
                points.push(grid.points()[idx]);
            }
        }
    }
    let mut out = StructuredGrid::new(new_dims, points)?;
    *out.point_data_mut() = crate::mesh::subset_attributes(grid.point_data(), &picked);
    grid.field_data().copy_into(out.field_data_mut());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn binary_image() -> ImageData {
        let mut img = ImageData::new([5, 5, 5], DVec3::ONE, DVec3::ZERO).unwrap();
        let mut mask = vec![0.0; 125];
        mask[img.flatten_index([2, 2, 2])] = 1.0;
        img.add_point_scalar("mask", mask).unwrap();
        img.point_data_mut().set_active_scalars("mask").unwrap();
        img
    }

    #[test]
    fn test_dilate_grows_mask() {
        let img = binary_image();
        let dilated = dilate_erode(&img, [3, 3, 3], 1.0, 0.0, None).unwrap();
        let v = dilated.point_data().scalars("mask").unwrap();
        let filled = v.iter().filter(|&&x| x > 0.5).count();
        assert_eq!(filled, 27); // single voxel grows to a 3x3x3 block
    }

    #[test]
    fn test_erode_undoes_dilate() {
        let img = binary_image();
        let dilated = dilate_erode(&img, [3, 3, 3], 1.0, 0.0, None).unwrap();
        let eroded = dilate_erode(&dilated, [3, 3, 3], 0.0, 1.0, None).unwrap();
        let v = eroded.point_data().scalars("mask").unwrap();
        let filled = v.iter().filter(|&&x| x > 0.5).count();
        assert_eq!(filled, 1);
    }

    #[test]
    fn test_median_removes_speck() {
        let img = binary_image();
        let filtered = median(&img, 3, None).unwrap();
        let v = filtered.point_data().scalars("mask").unwrap();
        assert!(v.iter().all(|&x| x == 0.0), "lone voxel must vanish");
    }

    #[test]
    fn test_extract_voi() {
        let mut img = ImageData::new([5, 4, 3], DVec3::ONE, DVec3::ZERO).unwrap();
        let ids: Vec<f64> = (0..img.num_points()).map(|i| i as f64).collect();
        img.add_point_scalar("id", ids).unwrap();

        let voi = extract_voi(&img, [1, 3, 0, 2, 1, 2], [1, 1, 1]).unwrap();
        assert_eq!(voi.dims(), [3, 3, 2]);
        assert_eq!(voi.origin(), DVec3::new(1.0, 0.0, 1.0));
        let v = voi.point_data().scalars("id").unwrap();
        assert_eq!(v[0], img.flatten_index([1, 0, 1]) as f64);
    }

    #[test]
    fn test_extract_voi_subsampled() {
        let img = ImageData::new([5, 5, 5], DVec3::ONE, DVec3::ZERO).unwrap();
        let voi = extract_voi(&img, [0, 4, 0, 4, 0, 4], [2, 2, 2]).unwrap();
        assert_eq!(voi.dims(), [3, 3, 3]);
        assert_eq!(voi.spacing(), DVec3::splat(2.0));
    }

    #[test]
    fn test_append_images_z() {
        let mut a = ImageData::new([2, 2, 2], DVec3::ONE, DVec3::ZERO).unwrap();
        let mut b = ImageData::new([2, 2, 3], DVec3::ONE, DVec3::ZERO).unwrap();
        a.add_point_scalar("v", vec![1.0; 8]).unwrap();
        b.add_point_scalar("v", vec![2.0; 12]).unwrap();
        let joined = append_images(&[&a, &b], 2).unwrap();
        assert_eq!(joined.dims(), [2, 2, 5]);
        let v = joined.point_data().scalars("v").unwrap();
        assert_eq!(v[0], 1.0);
        assert_eq!(v[19], 2.0);
        // Axis mismatch errors
        assert!(append_images(&[&a, &b], 0).is_err());
    }

    #[test]
    fn test_structured_subgrid() {
        let mut pts = Vec::new();
        for k in 0..3 {
            for j in 0..3 {
                for i in 0..3 {
                    pts.push(DVec3::new(f64::from(i), f64::from(j), f64::from(k)));
                }
            }
        }
        let sg = StructuredGrid::new([3, 3, 3], pts).unwrap();
        let sub = extract_structured_subgrid(&sg, [0, 2, 0, 2, 1, 2], [1, 1, 1]).unwrap();
        assert_eq!(sub.dims(), [3, 3, 2]);
        assert_eq!(sub.origin(), DVec3::new(0.0, 0.0, 1.0));
    }
}
