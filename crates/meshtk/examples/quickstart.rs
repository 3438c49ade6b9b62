//! The quick-start pipeline: build a source, attach numeric arrays, run
//! filters, and save the result.
//!
//! Run with: cargo run --example quickstart

use meshtk::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // A sphere surface with a scalar field
    let mut sphere = sources::sphere(DVec3::ZERO, 1.0, 24);
    let heights: Vec<f64> = sphere.points().iter().map(|p| p.z).collect();
    sphere.add_point_scalar("height", heights)?;
    sphere.point_data_mut().set_active_scalars("height")?;
    println!(
        "sphere: {} points, {} triangles, area {:.3}",
        sphere.num_points(),
        sphere.polys().len(),
        mesh::surface_area(&sphere)
    );

    // Smooth it, then keep the upper half with a capped clip
    let smoothed = smooth::windowed_sinc(&sphere, 20, 0.001);
    let capped = clip::clip_closed_surface(&smoothed, DVec3::ZERO, DVec3::Z);
    println!(
        "capped upper half: {} points, watertight: {}",
        capped.num_points(),
        mesh::is_watertight(&capped)
    );

    // A circular cross-section through the equator
    let section = cut::cut_by_plane(&sphere, DVec3::ZERO, DVec3::Z);
    println!("equator section: {} polyline(s)", section.lines().len());

    // Rasterize the surface into a binary volume and take its isosurface
    let volume = resample::surface_to_binary_image(&sphere, "mask", DVec3::splat(0.1), 1, 0)?;
    let shell = surface::contour(&volume, "mask", 0.5)?;
    println!(
        "voxelized shell: {} triangles from a {:?} volume",
        shell.polys().len(),
        volume.dims()
    );

    // Save everything; the extension picks the format
    io::write(&DataSet::PolyData(capped), "quickstart_capped.vtk")?;
    io::write(&DataSet::PolyData(shell), "quickstart_shell.stl")?;
    io::write(&DataSet::ImageData(volume), "quickstart_volume.vtk")?;
    println!("wrote quickstart_capped.vtk, quickstart_shell.stl, quickstart_volume.vtk");
    Ok(())
}
