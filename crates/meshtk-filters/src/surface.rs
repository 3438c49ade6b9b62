//! Surface extraction: outer boundaries, isosurfaces, triangulation,
//! decimation.

use std::collections::HashMap;

use glam::DVec3;
use meshtk_core::{
    AttributeArray, CellType, DataSet, ImageData, MeshTkError, PolyData, Result, StructuredGrid,
    UnstructuredGrid,
};

use crate::mesh::{clean, CleanOptions};

/// Extracts the outer surface of any dataset as polygonal data.
///
/// - Polygonal data passes through unchanged.
/// - Unstructured grids yield the faces used by exactly one volume cell,
///   plus any surface/line/vertex cells as-is.
/// - Image volumes and structured grids yield their outer shell quads.
#[must_use]
pub fn extract_surface(data: &DataSet) -> PolyData {
    match data {
        DataSet::PolyData(pd) => pd.clone(),
        DataSet::UnstructuredGrid(ug) => unstructured_surface(ug),
        DataSet::ImageData(img) => grid_shell(img.dims(), &img.positions(), img),
        DataSet::StructuredGrid(sg) => {
            grid_shell_sg(sg.dims(), sg.points(), sg)
        }
    }
}

/// Extracts the outer surface and fan-triangulates it.
#[must_use]
pub fn extract_triangulated(data: &DataSet) -> PolyData {
    triangulate(&extract_surface(data))
}

fn cell_faces(kind: CellType, c: &[u32]) -> Vec<Vec<u32>> {
    match kind {
        CellType::Tetra => vec![
            vec![c[0], c[2], c[1]],
            vec![c[0], c[1], c[3]],
            vec![c[1], c[2], c[3]],
            vec![c[0], c[3], c[2]],
        ],
        CellType::Hexahedron => hex_faces(c),
        CellType::Voxel => {
            // Re-order voxel corners into hexahedron ordering
            let h = [c[0], c[1], c[3], c[2], c[4], c[5], c[7], c[6]];
            hex_faces(&h)
        }
        CellType::Wedge => vec![
            vec![c[0], c[1], c[2]],
            vec![c[3], c[5], c[4]],
            vec![c[0], c[3], c[4], c[1]],
            vec![c[1], c[4], c[5], c[2]],
            vec![c[2], c[5], c[3], c[0]],
        ],
        CellType::Pyramid => vec![
            vec![c[0], c[3], c[2], c[1]],
            vec![c[0], c[1], c[4]],
            vec![c[1], c[2], c[4]],
            vec![c[2], c[3], c[4]],
            vec![c[3], c[0], c[4]],
        ],
        _ => Vec::new(),
    }
}

fn hex_faces(c: &[u32]) -> Vec<Vec<u32>> {
    vec![
        vec![c[0], c[3], c[2], c[1]],
        vec![c[4], c[5], c[6], c[7]],
        vec![c[0], c[1], c[5], c[4]],
        vec![c[1], c[2], c[6], c[5]],
        vec![c[2], c[3], c[7], c[6]],
        vec![c[3], c[0], c[4], c[7]],
    ]
}

fn unstructured_surface(ug: &UnstructuredGrid) -> PolyData {
    let mut face_count: HashMap<Vec<u32>, (usize, Vec<u32>)> = HashMap::new();
    let mut pd = PolyData::new();
    pd.set_points(ug.points().to_vec());
    *pd.point_data_mut() = ug.point_data().clone();
    ug.field_data().copy_into(pd.field_data_mut());

    for cell in ug.cells() {
        match cell.kind {
            CellType::Vertex | CellType::PolyVertex => pd.push_vert(cell.connectivity.clone()),
            CellType::Line | CellType::PolyLine => pd.push_line(cell.connectivity.clone()),
            CellType::Triangle | CellType::Polygon | CellType::Quad => {
                pd.push_poly(cell.connectivity.clone());
            }
            _ => {
                for face in cell_faces(cell.kind, &cell.connectivity) {
                    let mut key = face.clone();
                    key.sort_unstable();
                    let entry = face_count.entry(key).or_insert((0, face));
                    entry.0 += 1;
                }
            }
        }
    }
    let mut boundary: Vec<Vec<u32>> = face_count
        .into_values()
        .filter(|(count, _)| *count == 1)
        .map(|(_, face)| face)
        .collect();
    boundary.sort_unstable();
    for face in boundary {
        pd.push_poly(face);
    }
    pd
}

fn shell_quads(dims: [usize; 3]) -> Vec<Vec<u32>> {
    let idx =
        |i: usize, j: usize, k: usize| (i + j * dims[0] + k * dims[0] * dims[1]) as u32;
    let mut quads = Vec::new();
    let (nx, ny, nz) = (dims[0], dims[1], dims[2]);

    // A grid flat along any axis is its own shell
    if nx == 1 {
        for k in 0..nz.saturating_sub(1) {
            for j in 0..ny.saturating_sub(1) {
                quads.push(vec![idx(0, j, k), idx(0, j + 1, k), idx(0, j + 1, k + 1), idx(0, j, k + 1)]);
            }
        }
        return quads;
    }
    if ny == 1 {
        for k in 0..nz.saturating_sub(1) {
            for i in 0..nx.saturating_sub(1) {
                quads.push(vec![idx(i, 0, k), idx(i + 1, 0, k), idx(i + 1, 0, k + 1), idx(i, 0, k + 1)]);
            }
        }
        return quads;
    }
    if nz == 1 {
        for j in 0..ny.saturating_sub(1) {
            for i in 0..nx.saturating_sub(1) {
                quads.push(vec![idx(i, j, 0), idx(i + 1, j, 0), idx(i + 1, j + 1, 0), idx(i, j + 1, 0)]);
            }
        }
        return quads;
    }

    for k in [0, nz - 1] {
        for j in 0..ny - 1 {
            for i in 0..nx - 1 {
                quads.push(vec![idx(i, j, k), idx(i + 1, j, k), idx(i + 1, j + 1, k), idx(i, j + 1, k)]);
            }
        }
    }
    for j in [0, ny - 1] {
        for k in 0..nz - 1 {
            for i in 0..nx - 1 {
                quads.push(vec![idx(i, j, k), idx(i + 1, j, k), idx(i + 1, j, k + 1), idx(i, j, k + 1)]);
            }
        }
    }
    for i in [0, nx - 1] {
        for k in 0..nz - 1 {
            for j in 0..ny - 1 {
                quads.push(vec![idx(i, j, k), idx(i, j + 1, k), idx(i, j + 1, k + 1), idx(i, j, k + 1)]);
            }
        }
    }
    quads
}

fn grid_shell(dims: [usize; 3], points: &[DVec3], img: &ImageData) -> PolyData {
    let mut pd = PolyData::new();
    pd.set_points(points.to_vec());
    *pd.point_data_mut() = img.point_data().clone();
    img.field_data().copy_into(pd.field_data_mut());
    for q in shell_quads(dims) {
        pd.push_poly(q);
    }
    pd
}

fn grid_shell_sg(dims: [usize; 3], points: &[DVec3], sg: &StructuredGrid) -> PolyData {
    let mut pd = PolyData::new();
    pd.set_points(points.to_vec());
    *pd.point_data_mut() = sg.point_data().clone();
    sg.field_data().copy_into(pd.field_data_mut());
    for q in shell_quads(dims) {
        pd.push_poly(q);
    }
    pd
}

/// Fan-triangulates every polygon cell; line and vertex cells pass through.
///
/// Per-cell arrays are replicated per output triangle.
#[must_use]
pub fn triangulate(data: &PolyData) -> PolyData {
    let mut out = PolyData::new();
    out.set_points(data.points().to_vec());
    *out.point_data_mut() = data.point_data().clone();
    data.field_data().copy_into(out.field_data_mut());

    for c in data.verts() {
        out.push_vert(c.clone());
    }
    for c in data.lines() {
        out.push_line(c.clone());
    }
    // Triangle count per source polygon, for cell-data replication
    let mut replication: Vec<usize> = Vec::with_capacity(data.polys().len());
    for poly in data.polys() {
        if poly.len() < 3 {
            replication.push(0);
            continue;
        }
        let fans = poly.len() - 2;
        replication.push(fans);
        for i in 1..poly.len() - 1 {
            out.push_poly(vec![poly[0], poly[i], poly[i + 1]]);
        }
    }

    replicate_cell_data(data, &mut out, &replication);
    out
}

fn replicate_cell_data(data: &PolyData, out: &mut PolyData, poly_replication: &[usize]) {
    let nv = data.verts().len();
    let nl = data.lines().len();
    for (name, array) in data.cell_data().iter() {
        let flat = array.to_flat();
        let comps = array.num_components();
        let mut new_flat: Vec<f64> = Vec::new();
        // Verts and lines keep one value each
        new_flat.extend_from_slice(&flat[..(nv + nl) * comps]);
        for (p, &reps) in poly_replication.iter().enumerate() {
            let start = (nv + nl + p) * comps;
            for _ in 0..reps {
                new_flat.extend_from_slice(&flat[start..start + comps]);
            }
        }
        let rebuilt = if comps == 3 {
            match AttributeArray::vector_from_flat(&new_flat) {
                Ok(a) => a,
                Err(_) => continue,
            }
        } else {
            AttributeArray::Scalar(new_flat)
        };
        out.cell_data_mut().insert(name, rebuilt);
    }
}

// Six-tetrahedron decomposition of a cube around the 0-7 diagonal.
// Corner ids: bit 0 = +x, bit 1 = +y, bit 2 = +z.
const CUBE_TETS: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 3, 2, 7],
    [0, 2, 6, 7],
    [0, 6, 4, 7],
    [0, 4, 5, 7],
    [0, 5, 1, 7],
];

/// Extracts the isosurface of a named point scalar on an image volume.
///
/// Each grid cube is decomposed into six tetrahedra and contoured by edge
/// interpolation, so the output is a closed, crack-free triangle surface
/// wherever the field crosses `isovalue` in the interior. Triangles are
/// wound so their normals point toward values above the isovalue.
pub fn contour(image: &ImageData, array: &str, isovalue: f64) -> Result<PolyData> {
    let dims = image.dims();
    if dims[0] < 2 || dims[1] < 2 || dims[2] < 2 {
        return Err(MeshTkError::InvalidDimensions(dims[0], dims[1], dims[2]));
    }
    let field = image.point_data().scalars(array)?;

    let mut points: Vec<DVec3> = Vec::new();
    let mut tris: Vec<[u32; 3]> = Vec::new();
    // One interpolated vertex per crossed grid edge
    let mut edge_vertex: HashMap<(usize, usize), u32> = HashMap::new();

    let mut corner_idx = [0_usize; 8];
    let mut corner_val = [0.0_f64; 8];

    for k in 0..dims[2] - 1 {
        for j in 0..dims[1] - 1 {
            for i in 0..dims[0] - 1 {
                for (c, ci) in corner_idx.iter_mut().enumerate() {
                    let ijk = [
                        i + (c & 1),
                        j + ((c >> 1) & 1),
                        k + ((c >> 2) & 1),
                    ];
                    *ci = image.flatten_index(ijk);
                }
                for c in 0..8 {
                    corner_val[c] = field[corner_idx[c]] - isovalue;
                }
                // Skip cubes entirely on one side
                if corner_val.iter().all(|&v| v >= 0.0)
                    || corner_val.iter().all(|&v| v < 0.0)
                {
                    continue;
                }

                for tet in &CUBE_TETS {
                    contour_tet(
                        image,
                        field,
                        isovalue,
                        [tet[0], tet[1], tet[2], tet[3]].map(|c| corner_idx[c]),
                        &mut points,
                        &mut tris,
                        &mut edge_vertex,
                    );
                }
            }
        }
    }

    log::debug!(
        "contour at {isovalue}: {} points, {} triangles",
        points.len(),
        tris.len()
    );
    Ok(PolyData::from_triangles(points, tris))
}

#[allow(clippy::too_many_arguments)]
fn contour_tet(
    image: &ImageData,
    field: &[f64],
    isovalue: f64,
    verts: [usize; 4],
    points: &mut Vec<DVec3>,
    tris: &mut Vec<[u32; 3]>,
    edge_vertex: &mut HashMap<(usize, usize), u32>,
) {
    let d: Vec<f64> = verts.iter().map(|&v| field[v] - isovalue).collect();
    let inside: Vec<usize> = (0..4).filter(|&i| d[i] >= 0.0).collect();
    if inside.is_empty() || inside.len() == 4 {
        return;
    }

    let mut edge_point = |a: usize, b: usize| -> u32 {
        let key = if verts[a] < verts[b] {
            (verts[a], verts[b])
        } else {
            (verts[b], verts[a])
        };
        if let Some(&idx) = edge_vertex.get(&key) {
            return idx;
        }
        let (ga, gb) = key;
        let da = field[ga] - isovalue;
        let db = field[gb] - isovalue;
        let t = if (da - db).abs() < f64::EPSILON {
            0.5
        } else {
            da / (da - db)
        };
        let pa = image.position(image.unflatten_index(ga));
        let pb = image.position(image.unflatten_index(gb));
        let idx = points.len() as u32;
        points.push(pa + (pb - pa) * t);
        edge_vertex.insert(key, idx);
        idx
    };

    let outside: Vec<usize> = (0..4).filter(|&i| d[i] < 0.0).collect();
    let pos_of = |v: usize| image.position(image.unflatten_index(verts[v]));

    // Collect triangles first; orientation needs the finished point list
    let mut pending: Vec<([u32; 3], DVec3)> = Vec::with_capacity(2);
    match inside.len() {
        1 => {
            let p = inside[0];
            let tri = [
                edge_point(p, outside[0]),
                edge_point(p, outside[1]),
                edge_point(p, outside[2]),
            ];
            pending.push((tri, pos_of(p)));
        }
        3 => {
            let q = outside[0];
            let tri = [
                edge_point(q, inside[0]),
                edge_point(q, inside[1]),
                edge_point(q, inside[2]),
            ];
            // Normal points away from the single outside vertex
            let toward = (pos_of(inside[0]) + pos_of(inside[1]) + pos_of(inside[2])) / 3.0;
            pending.push((tri, toward));
        }
        2 => {
            let (p0, p1) = (inside[0], inside[1]);
            let (q0, q1) = (outside[0], outside[1]);
            let e00 = edge_point(p0, q0);
            let e01 = edge_point(p0, q1);
            let e10 = edge_point(p1, q0);
            let e11 = edge_point(p1, q1);
            let toward = (pos_of(p0) + pos_of(p1)) * 0.5;
            pending.push(([e00, e10, e11], toward));
            pending.push(([e00, e11, e01], toward));
        }
        _ => unreachable!(),
    }

    for (tri, toward) in pending {
        let a = points[tri[0] as usize];
        let b = points[tri[1] as usize];
        let c = points[tri[2] as usize];
        let n = (b - a).cross(c - a);
        let centroid = (a + b + c) / 3.0;
        if n.dot(toward - centroid) >= 0.0 {
            tris.push(tri);
        } else {
            tris.push([tri[0], tri[2], tri[1]]);
        }
    }
}

/// Coarsens a triangle surface by clustering vertices on a regular grid.
///
/// `divisions` is the number of grid bins along the longest bounding-box
/// axis; clustered vertices collapse to their bin centroid and degenerate
/// triangles are dropped.
#[must_use]
pub fn decimate_by_clustering(data: &PolyData, divisions: usize) -> PolyData {
    let tri = triangulate(data);
    let Some((lo, hi)) = tri.bounds() else {
        return tri;
    };
    let divisions = divisions.max(1);
    let extent = (hi - lo).max_element().max(f64::EPSILON);
    let bin = extent / divisions as f64;

    let points = tri.points();
    let key = |p: DVec3| -> (i64, i64, i64) {
        (
            ((p.x - lo.x) / bin).floor() as i64,
            ((p.y - lo.y) / bin).floor() as i64,
            ((p.z - lo.z) / bin).floor() as i64,
        )
    };

    // Bin id and accumulated centroid per cluster
    let mut clusters: HashMap<(i64, i64, i64), (u32, DVec3, usize)> = HashMap::new();
    let mut remap: Vec<u32> = Vec::with_capacity(points.len());
    for p in points {
        let k = key(*p);
        let next = clusters.len() as u32;
        let entry = clusters.entry(k).or_insert((next, DVec3::ZERO, 0));
        entry.1 += *p;
        entry.2 += 1;
        remap.push(entry.0);
    }
    let mut new_points = vec![DVec3::ZERO; clusters.len()];
    for (id, sum, count) in clusters.into_values() {
        new_points[id as usize] = sum / count as f64;
    }

    let mut new_tris: Vec<[u32; 3]> = Vec::new();
    for poly in tri.polys() {
        let a = remap[poly[0] as usize];
        let b = remap[poly[1] as usize];
        let c = remap[poly[2] as usize];
        if a != b && b != c && a != c {
            new_tris.push([a, b, c]);
        }
    }
    let out = PolyData::from_triangles(new_points, new_tris);
    clean(&out, CleanOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{is_watertight, surface_area};
    use crate::sources;
    use meshtk_core::Cell;

    #[test]
    fn test_unstructured_surface_of_two_tets() {
        // Two tetrahedra sharing a face: shared face must not appear
        let pts = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::Z,
            DVec3::new(1.0, 1.0, 1.0),
        ];
        let ug = UnstructuredGrid::from_cells(
            pts,
            vec![
                Cell::new(CellType::Tetra, vec![0, 1, 2, 3]),
                Cell::new(CellType::Tetra, vec![1, 2, 3, 4]),
            ],
        );
        let surf = unstructured_surface(&ug);
        assert_eq!(surf.polys().len(), 6);
    }

    #[test]
    fn test_image_shell_closed() {
        let img = ImageData::new([3, 3, 3], DVec3::ONE, DVec3::ZERO).unwrap();
        let shell = extract_surface(&DataSet::ImageData(img));
        assert_eq!(shell.polys().len(), 6 * 4);
        assert!(is_watertight(&shell));
        assert!((surface_area(&shell) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangulate_replicates_cell_data() {
        let mut p = sources::plane(DVec3::ZERO, DVec3::X, DVec3::Y, (1, 2));
        p.add_cell_scalar("id", vec![10.0, 20.0]).unwrap();
        let t = triangulate(&p);
        assert_eq!(t.polys().len(), 4);
        assert_eq!(
            t.cell_data().scalars("id").unwrap(),
            &[10.0, 10.0, 20.0, 20.0]
        );
    }

    #[test]
    fn test_contour_sphere_field() {
        // Signed-distance field of a sphere on a 20^3 grid
        let n = 20;
        let mut img = ImageData::new([n, n, n], DVec3::splat(0.1), DVec3::splat(-0.95)).unwrap();
        let radius = 0.6;
        let field: Vec<f64> = img
            .positions()
            .iter()
            .map(|p| p.length() - radius)
            .collect();
        img.add_point_scalar("dist", field).unwrap();

        let surf = contour(&img, "dist", 0.0).unwrap();
        assert!(surf.polys().len() > 100, "too few triangles: {}", surf.polys().len());
        assert!(is_watertight(&surf), "isosurface has boundary edges");
        for p in surf.points() {
            assert!(
                (p.length() - radius).abs() < 0.1,
                "contour vertex {p:?} off the sphere"
            );
        }
        let area = surface_area(&surf);
        let analytic = 4.0 * std::f64::consts::PI * radius * radius;
        assert!((area - analytic).abs() / analytic < 0.15, "area {area} vs {analytic}");
    }

    #[test]
    fn test_contour_missing_array() {
        let img = ImageData::new([3, 3, 3], DVec3::ONE, DVec3::ZERO).unwrap();
        assert!(contour(&img, "nope", 0.0).is_err());
    }

    #[test]
    fn test_contour_flat_field_empty() {
        let mut img = ImageData::new([4, 4, 4], DVec3::ONE, DVec3::ZERO).unwrap();
        img.add_point_scalar("f", vec![1.0; 64]).unwrap();
        let surf = contour(&img, "f", 0.0).unwrap();
        assert_eq!(surf.num_points(), 0);
    }

    #[test]
    fn test_decimate_reduces() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 24);
        let d = decimate_by_clustering(&s, 8);
        assert!(d.num_points() < s.num_points() / 2);
        assert!(!d.polys().is_empty());
    }
}
