//! End-to-end tests for the meshtk facade: the quick-start pipeline of
//! build source -> attach arrays -> filter -> write -> read.

use meshtk::prelude::*;

fn temp(name: &str) -> std::path::PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("meshtk_toolkit_{}_{name}", std::process::id()));
    p
}

#[test]
fn test_source_filter_save_pipeline() {
    // Build a sphere and attach a scalar field from a flat buffer
    let mut sphere = sources::sphere(DVec3::ZERO, 1.0, 16);
    let n = sphere.num_points();
    let heights: Vec<f64> = sphere.points().iter().map(|p| p.z).collect();
    sphere.add_point_scalar("height", heights).unwrap();
    sphere.point_data_mut().set_active_scalars("height").unwrap();
    assert_eq!(sphere.point_data().scalars("height").unwrap().len(), n);

    // Smooth, clip, and keep the main piece
    let smoothed = smooth::windowed_sinc(&sphere, 20, 0.01);
    let upper = clip::clip_by_plane_poly(&smoothed, DVec3::ZERO, DVec3::Z, false);
    let main = connectivity::region_largest(&upper);
    assert!(!main.polys().is_empty());
    assert!(main.points().iter().all(|p| p.z >= -1e-9));

    // Interpolated field survives the pipeline
    let heights = main.point_data().scalars("height").unwrap();
    assert_eq!(heights.len(), main.num_points());

    // Round-trip through the legacy container
    let path = temp("pipeline.vtk");
    io::write(&DataSet::PolyData(main.clone()), &path).unwrap();
    let loaded = io::read(&path).unwrap();
    assert!(loaded.is_poly_data());
    assert_eq!(loaded.num_points(), main.num_points());
    assert_eq!(
        loaded.point_data().scalars("height").unwrap().len(),
        main.num_points()
    );
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_flat_buffer_round_trip() {
    // The numeric-buffer conversion surface: points and arrays as flat f64
    let mut plane = sources::plane(DVec3::ZERO, DVec3::X, DVec3::Y, (2, 2));
    let flat = plane.points_flat();
    assert_eq!(flat.len(), plane.num_points() * 3);

    // Shift every z through the flat buffer and push it back
    let shifted: Vec<f64> = flat
        .chunks_exact(3)
        .flat_map(|c| [c[0], c[1], c[2] + 2.0])
        .collect();
    plane.set_points_flat(&shifted).unwrap();
    assert!((plane.center().z - 2.0).abs() < 1e-12);

    let vectors = AttributeArray::vector_from_flat(&shifted).unwrap();
    plane.point_data_mut().insert("offset", vectors);
    assert_eq!(
        plane.point_data().get("offset").unwrap().len(),
        plane.num_points()
    );
}

#[test]
fn test_image_contour_to_surface_formats() {
    // Volume with a spherical field, contoured and saved in every format
    let n = 16;
    let mut img = ImageData::new(
        [n, n, n],
        DVec3::splat(2.0 / (n as f64 - 1.0)),
        DVec3::splat(-1.0),
    )
    .unwrap();
    let field: Vec<f64> = img.positions().iter().map(|p| p.length() - 0.7).collect();
    img.add_point_scalar("dist", field).unwrap();

    let surf = surface::contour(&img, "dist", 0.0).unwrap();
    assert!(mesh::is_watertight(&surf));

    for ext in ["vtk", "ply", "stl"] {
        let path = temp(&format!("contour.{ext}"));
        io::write(&DataSet::PolyData(surf.clone()), &path).unwrap();
        let back = io::read_poly_data(&path).unwrap();
        assert_eq!(back.polys().len(), surf.polys().len(), "{ext} round trip");
        std::fs::remove_file(&path).ok();
    }
}

#[test]
fn test_probe_image_along_line() {
    // Sample a linear field along a polyline through the volume
    let mut img = ImageData::new([5, 5, 5], DVec3::splat(0.25), DVec3::ZERO).unwrap();
    let field: Vec<f64> = img.positions().iter().map(|p| p.x).collect();
    img.add_point_scalar("x", field).unwrap();

    let line = sources::polyline_between(DVec3::ZERO, DVec3::splat(1.0), 11);
    let probed = resample::probe(
        &DataSet::ImageData(img),
        &DataSet::PolyData(line),
        ProbeOptions::default(),
    );
    let values = probed.point_data().scalars("x").unwrap();
    for (p, v) in probed.points().iter().zip(values) {
        assert!((p.x - v).abs() < 1e-9);
    }
}

#[test]
fn test_cut_and_measure() {
    let sphere = sources::sphere(DVec3::ZERO, 1.0, 24);
    let section = cut::cut_by_plane(&sphere, DVec3::ZERO, DVec3::X);
    assert!(section.is_polyline_only());

    // Ring area from the polyline fallback is close to a unit disc
    let area = mesh::surface_area(&section);
    assert!(
        (area - std::f64::consts::PI).abs() < 0.1,
        "section area {area}"
    );
}

#[test]
fn test_field_data_travels_with_file() {
    let mut pd = sources::sphere(DVec3::ZERO, 0.5, 8);
    pd.field_data_mut().insert_value("frame", 12.0);
    pd.field_data_mut().insert("window", vec![0.0, 1.0]);

    let path = temp("field.vtk");
    io::write(&DataSet::PolyData(pd), &path).unwrap();
    let loaded = io::read(&path).unwrap();
    assert_eq!(loaded.field_data().get("frame"), Some(&[12.0][..]));
    assert_eq!(loaded.field_data().get("window"), Some(&[0.0, 1.0][..]));
    std::fs::remove_file(&path).ok();
}
