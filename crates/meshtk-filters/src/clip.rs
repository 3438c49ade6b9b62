//! Clipping: exact interpolated clips for polygonal data, crinkle clips
//! for volumetric datasets.
//!
//! Clips keep the side where the driving value is non-negative (for an
//! implicit function, the positive side — outside the shape). Pass
//! `inside_out` to keep the other side, mirroring the classic toolkit's
//! inside-out toggle.

use std::collections::HashMap;

use glam::DVec3;
use meshtk_core::{
    Attributes, Cell, CellType, DataSet, ImageData, PolyData, Result, StructuredGrid,
    UnstructuredGrid,
};
use serde::{Deserialize, Serialize};

use crate::connectivity;
use crate::implicit::{BoxFunction, Implicit, PlaneFunction, SphereFunction};
use crate::surface::triangulate;

/// Which connected region to keep after a box clip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum RegionSelect {
    /// Keep everything.
    Full,
    /// Keep the largest region.
    #[default]
    Largest,
    /// Keep the region with the smallest point distance to a location.
    ClosestTo(DVec3),
    /// Keep the region nearest the point three half-thicknesses along the
    /// box normal — the region "in front of" the carved slab.
    NearNormal,
}

/// Interpolating builder for per-point attribute arrays.
///
/// Tracks, for every emitted output point, either a source point copy or a
/// lerp between two source points; produces the output [`Attributes`].
pub(crate) struct AttrInterp {
    names: Vec<(String, usize)>,
    source: Vec<Vec<f64>>,
    out: Vec<Vec<f64>>,
    active_scalars: Option<String>,
    active_vectors: Option<String>,
}

impl AttrInterp {
    pub(crate) fn new(attrs: &Attributes) -> Self {
        let mut names = Vec::new();
        let mut source = Vec::new();
        for (name, array) in attrs.iter() {
            names.push((name.to_string(), array.num_components()));
            source.push(array.to_flat());
        }
        let out = vec![Vec::new(); names.len()];
        Self {
            names,
            source,
            out,
            active_scalars: attrs.active_scalars().map(str::to_string),
            active_vectors: attrs.active_vectors().map(str::to_string),
        }
    }

    pub(crate) fn push_orig(&mut self, i: usize) {
        for (a, (_, comps)) in self.names.iter().enumerate() {
            for c in 0..*comps {
                let v = self.source[a][i * comps + c];
                self.out[a].push(v);
            }
        }
    }

    pub(crate) fn push_lerp(&mut self, i: usize, j: usize, t: f64) {
        for (a, (_, comps)) in self.names.iter().enumerate() {
            for c in 0..*comps {
                let vi = self.source[a][i * comps + c];
                let vj = self.source[a][j * comps + c];
                self.out[a].push(vi + (vj - vi) * t);
            }
        }
    }

    /// Appends one tuple that is the mean of already-emitted output tuples.
    pub(crate) fn push_mean_of_out(&mut self, out_ids: &[u32]) {
        for (a, (_, comps)) in self.names.iter().enumerate() {
            for c in 0..*comps {
                let sum: f64 = out_ids
                    .iter()
                    .map(|&i| self.out[a][i as usize * comps + c])
                    .sum();
                let v = sum / out_ids.len().max(1) as f64;
                self.out[a].push(v);
            }
        }
    }

    pub(crate) fn finish(self) -> Attributes {
        let mut attrs = Attributes::new();
        for ((name, comps), flat) in self.names.into_iter().zip(self.out) {
            if comps == 3 {
                if let Ok(arr) = meshtk_core::AttributeArray::vector_from_flat(&flat) {
                    attrs.insert(name, arr);
                }
            } else {
                attrs.insert_scalar(name, flat);
            }
        }
        if let Some(n) = self.active_scalars {
            let _ = attrs.set_active_scalars(&n);
        }
        if let Some(n) = self.active_vectors {
            let _ = attrs.set_active_vectors(&n);
        }
        attrs
    }
}

struct ClipBuilder<'a> {
    src_points: &'a [DVec3],
    values: &'a [f64],
    points: Vec<DVec3>,
    attrs: AttrInterp,
    orig_map: HashMap<u32, u32>,
    edge_map: HashMap<(u32, u32), u32>,
}

impl<'a> ClipBuilder<'a> {
    fn new(data: &'a PolyData, values: &'a [f64]) -> Self {
        Self {
            src_points: data.points(),
            values,
            points: Vec::new(),
            attrs: AttrInterp::new(data.point_data()),
            orig_map: HashMap::new(),
            edge_map: HashMap::new(),
        }
    }

    fn orig(&mut self, i: u32) -> u32 {
        if let Some(&idx) = self.orig_map.get(&i) {
            return idx;
        }
        let idx = self.points.len() as u32;
        self.points.push(self.src_points[i as usize]);
        self.attrs.push_orig(i as usize);
        self.orig_map.insert(i, idx);
        idx
    }

    /// Interpolated point on the crossing of edge `(a, b)`.
    fn edge(&mut self, a: u32, b: u32) -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&idx) = self.edge_map.get(&key) {
            return idx;
        }
        let (i, j) = key;
        let di = self.values[i as usize];
        let dj = self.values[j as usize];
        let t = if (di - dj).abs() < f64::EPSILON {
            0.5
        } else {
            (di / (di - dj)).clamp(0.0, 1.0)
        };
        let pi = self.src_points[i as usize];
        let pj = self.src_points[j as usize];
        let idx = self.points.len() as u32;
        self.points.push(pi + (pj - pi) * t);
        self.attrs.push_lerp(i as usize, j as usize, t);
        self.edge_map.insert(key, idx);
        idx
    }
}

/// Clips triangulated polygonal data by per-point signed values, keeping
/// the region where `values >= 0`.
///
/// Returns the clipped data and the cut segments (pairs of output point
/// indices) lying on the zero level, used for capping.
fn clip_by_values(data: &PolyData, values: &[f64]) -> (PolyData, Vec<[u32; 2]>) {
    let tri = triangulate(data);
    let mut b = ClipBuilder::new(&tri, values);
    let mut polys: Vec<Vec<u32>> = Vec::new();
    let mut cut_segments: Vec<[u32; 2]> = Vec::new();
    let mut poly_sources: Vec<usize> = Vec::new();

    let nv = tri.verts().len();
    let nl = tri.lines().len();

    for (cell_idx, t) in tri.polys().iter().enumerate() {
        let kept: Vec<bool> = t.iter().map(|&i| values[i as usize] >= 0.0).collect();
        let n_kept = kept.iter().filter(|&&k| k).count();
        match n_kept {
            3 => {
                let tri_out = vec![b.orig(t[0]), b.orig(t[1]), b.orig(t[2])];
                polys.push(tri_out);
                poly_sources.push(nv + nl + cell_idx);
            }
            1 => {
                // Rotate so the kept vertex leads; cyclic order is preserved
                let i = kept.iter().position(|&k| k).unwrap();
                let (v0, v1, v2) = (t[i], t[(i + 1) % 3], t[(i + 2) % 3]);
                let e01 = b.edge(v0, v1);
                let e02 = b.edge(v0, v2);
                polys.push(vec![b.orig(v0), e01, e02]);
                cut_segments.push([e01, e02]);
                poly_sources.push(nv + nl + cell_idx);
            }
            2 => {
                let i = kept.iter().position(|&k| !k).unwrap();
                // Vertex i is cut; (i+1, i+2) survive
                let (vc, v1, v2) = (t[i], t[(i + 1) % 3], t[(i + 2) % 3]);
                let e2c = b.edge(v2, vc);
                let ec1 = b.edge(vc, v1);
                let (o1, o2) = (b.orig(v1), b.orig(v2));
                polys.push(vec![o1, o2, e2c]);
                polys.push(vec![o1, e2c, ec1]);
                cut_segments.push([e2c, ec1]);
                poly_sources.push(nv + nl + cell_idx);
                poly_sources.push(nv + nl + cell_idx);
            }
            _ => {}
        }
    }

    // Polylines: split into kept sub-chains with interpolated endpoints
    let mut lines: Vec<Vec<u32>> = Vec::new();
    let mut line_sources: Vec<usize> = Vec::new();
    for (cell_idx, line) in tri.lines().iter().enumerate() {
        let mut chain: Vec<u32> = Vec::new();
        let mut flush = |chain: &mut Vec<u32>| {
            if chain.len() >= 2 {
                lines.push(std::mem::take(chain));
                line_sources.push(nv + cell_idx);
            } else {
                chain.clear();
            }
        };
        for w in line.windows(2) {
            let (a, bp) = (w[0], w[1]);
            let ka = values[a as usize] >= 0.0;
            let kb = values[bp as usize] >= 0.0;
            match (ka, kb) {
                (true, true) => {
                    if chain.is_empty() {
                        chain.push(b.orig(a));
                    }
                    chain.push(b.orig(bp));
                }
                (true, false) => {
                    if chain.is_empty() {
                        chain.push(b.orig(a));
                    }
                    let e = b.edge(a, bp);
                    chain.push(e);
                    flush(&mut chain);
                }
                (false, true) => {
                    flush(&mut chain);
                    chain.push(b.edge(a, bp));
                    chain.push(b.orig(bp));
                }
                (false, false) => flush(&mut chain),
            }
        }
        flush(&mut chain);
    }

    // Verts: keep cells whose points survive
    let mut verts: Vec<Vec<u32>> = Vec::new();
    let mut vert_sources: Vec<usize> = Vec::new();
    for (cell_idx, cell) in tri.verts().iter().enumerate() {
        let kept: Vec<u32> = cell
            .iter()
            .filter(|&&i| values[i as usize] >= 0.0)
            .map(|&i| b.orig(i))
            .collect();
        if !kept.is_empty() {
            verts.push(kept);
            vert_sources.push(cell_idx);
        }
    }

    let mut out = PolyData::new();
    out.set_points(b.points);
    *out.point_data_mut() = b.attrs.finish();
    for c in verts {
        out.push_vert(c);
    }
    for c in lines {
        out.push_line(c);
    }
    for c in polys {
        out.push_poly(c);
    }
    tri.field_data().copy_into(out.field_data_mut());

    // Cell data: gather source values in the new flat cell order
    let mut cell_sources = vert_sources;
    cell_sources.extend(line_sources);
    cell_sources.extend(poly_sources);
    *out.cell_data_mut() = crate::mesh::subset_attributes(tri.cell_data(), &cell_sources);

    (out, cut_segments)
}

fn signed_values(data: &PolyData, function: &dyn Implicit, inside_out: bool) -> Vec<f64> {
    data.points()
        .iter()
        .map(|&p| {
            let v = function.eval(p);
            if inside_out {
                -v
            } else {
                v
            }
        })
        .collect()
}

/// Clips polygonal data by an implicit function.
///
/// Keeps the positive (outside) region; `inside_out` keeps the inside.
#[must_use]
pub fn clip_poly_data(data: &PolyData, function: &dyn Implicit, inside_out: bool) -> PolyData {
    let values = signed_values(data, function, inside_out);
    let (raw, _) = clip_by_values(data, &values);
    // Clips through existing vertices leave coincident points and
    // zero-area cells behind
    crate::mesh::clean(&raw, crate::mesh::CleanOptions::default())
}

/// Clips polygonal data by a plane, keeping the side the normal points to.
#[must_use]
pub fn clip_by_plane_poly(
    data: &PolyData,
    origin: DVec3,
    normal: DVec3,
    inside_out: bool,
) -> PolyData {
    clip_poly_data(data, &PlaneFunction::new(origin, normal), inside_out)
}

/// Clips polygonal data by a sphere, keeping the inside.
#[must_use]
pub fn clip_by_sphere_poly(data: &PolyData, center: DVec3, radius: f64) -> PolyData {
    clip_poly_data(data, &SphereFunction::new(center, radius), true)
}

/// Clips polygonal data by an interpolated point-scalar threshold, keeping
/// `scalar >= value` (or the complement with `inside_out`).
pub fn clip_by_scalar_poly(
    data: &PolyData,
    array: &str,
    value: f64,
    inside_out: bool,
) -> Result<PolyData> {
    let scalars = data.point_data().scalars(array)?;
    let values: Vec<f64> = scalars
        .iter()
        .map(|&s| if inside_out { value - s } else { s - value })
        .collect();
    let (raw, _) = clip_by_values(data, &values);
    Ok(crate::mesh::clean(&raw, crate::mesh::CleanOptions::default()))
}

/// Clips a plane through a closed surface and caps the cut loops so the
/// result stays closed.
///
/// Keeps the side the normal points to; each boundary loop produced by the
/// cut is filled with a triangle fan about its centroid.
#[must_use]
pub fn clip_closed_surface(data: &PolyData, origin: DVec3, normal: DVec3) -> PolyData {
    let plane = PlaneFunction::new(origin, normal);
    let values = signed_values(data, &plane, false);
    let (mut out, segments) = clip_by_values(data, &values);
    if segments.is_empty() {
        return crate::mesh::clean(&out, crate::mesh::CleanOptions::default());
    }

    let points_now: Vec<DVec3> = out.points().to_vec();
    let tolerance = out
        .bounds()
        .map_or(1e-12, |(lo, hi)| (hi - lo).length() * 1e-9)
        .max(1e-12);

    // Canonicalize segment endpoints by position: a plane grazing existing
    // vertices yields near-coincident cut points under distinct indices,
    // which would otherwise break the loop chaining.
    let mut canon: HashMap<(i64, i64, i64), u32> = HashMap::new();
    let mut rep = |i: u32| -> u32 {
        let p = points_now[i as usize];
        let key = (
            (p.x / tolerance).round() as i64,
            (p.y / tolerance).round() as i64,
            (p.z / tolerance).round() as i64,
        );
        *canon.entry(key).or_insert(i)
    };
    let mut seen = std::collections::HashSet::new();
    let mut canonical_segments: Vec<[u32; 2]> = Vec::new();
    for s in &segments {
        let (a, b) = (rep(s[0]), rep(s[1]));
        if a == b {
            continue;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if seen.insert(key) {
            canonical_segments.push([a, b]);
        }
    }

    let loops = chain_loops(&canonical_segments);
    let n_before = out.num_points();

    // Cap each loop with a centroid fan, wound to face away from the kept side
    let mut new_points = points_now.clone();
    let mut interp = AttrInterp::new(out.point_data());
    for i in 0..n_before {
        interp.push_orig(i);
    }

    let mut cap_tris: Vec<Vec<u32>> = Vec::new();
    for lp in &loops {
        if lp.len() < 3 {
            continue;
        }
        let ring: Vec<DVec3> = lp.iter().map(|&i| points_now[i as usize]).collect();
        let centroid = ring.iter().copied().sum::<DVec3>() / ring.len() as f64;
        let centroid_idx = new_points.len() as u32;
        new_points.push(centroid);
        interp.push_mean_of_out(lp);

        // Cap outward normal opposes the clip normal
        let mut ordered = lp.clone();
        if meshtk_core::math::newell_normal(&ring).dot(normal) > 0.0 {
            ordered.reverse();
        }
        for i in 0..ordered.len() {
            let a = ordered[i];
            let b = ordered[(i + 1) % ordered.len()];
            cap_tris.push(vec![a, b, centroid_idx]);
        }
    }

    out.set_points(new_points);
    *out.point_data_mut() = interp.finish();
    let n_new_cells = cap_tris.len();
    for t in cap_tris {
        out.push_poly(t);
    }
    // Cap cells have no source cell; pad per-cell arrays with zeros
    if n_new_cells > 0 {
        pad_cell_data(&mut out, n_new_cells);
    }
    // Tolerance merging closes the hairline gaps left where the plane
    // grazed existing vertices
    crate::mesh::clean(
        &out,
        crate::mesh::CleanOptions {
            tolerance,
            merge_points: true,
        },
    )
}

fn pad_cell_data(out: &mut PolyData, added: usize) {
    let names: Vec<String> = out
        .cell_data()
        .names()
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    for name in names {
        if let Some(array) = out.cell_data_mut().get_mut(&name) {
            match array {
                meshtk_core::AttributeArray::Scalar(v) => v.extend(std::iter::repeat(0.0).take(added)),
                meshtk_core::AttributeArray::Vector(v) => {
                    v.extend(std::iter::repeat(DVec3::ZERO).take(added));
                }
            }
        }
    }
}

/// Chains undirected segments into closed (or open) loops.
pub(crate) fn chain_loops(segments: &[[u32; 2]]) -> Vec<Vec<u32>> {
    let mut adjacency: HashMap<u32, Vec<u32>> = HashMap::new();
    for s in segments {
        adjacency.entry(s[0]).or_default().push(s[1]);
        adjacency.entry(s[1]).or_default().push(s[0]);
    }
    let mut visited: HashMap<(u32, u32), bool> = HashMap::new();
    let edge_key = |a: u32, b: u32| if a < b { (a, b) } else { (b, a) };

    let mut loops = Vec::new();
    for s in segments {
        if visited.contains_key(&edge_key(s[0], s[1])) {
            continue;
        }
        let mut lp = vec![s[0], s[1]];
        visited.insert(edge_key(s[0], s[1]), true);
        loop {
            let last = *lp.last().unwrap();
            let prev = lp[lp.len() - 2];
            let next = adjacency
                .get(&last)
                .and_then(|ns| {
                    ns.iter()
                        .find(|&&n| n != prev && !visited.contains_key(&edge_key(last, n)))
                        .copied()
                });
            match next {
                Some(n) => {
                    visited.insert(edge_key(last, n), true);
                    if n == lp[0] {
                        break; // closed
                    }
                    lp.push(n);
                }
                None => break, // open chain
            }
        }
        loops.push(lp);
    }
    loops
}

/// Clips polygonal data by an oriented box carved at a surface point.
///
/// The box has a `width x width` face and extends `thickness` along
/// `-normal` from `center` (the slab sits behind the normal). By default
/// the box region is removed and the largest remaining piece is returned;
/// `inside` keeps the box region instead, and `selection` picks which
/// connected region survives.
#[must_use]
pub fn clip_by_box(
    data: &PolyData,
    center: DVec3,
    normal: DVec3,
    width: f64,
    thickness: f64,
    inside: bool,
    selection: RegionSelect,
) -> PolyData {
    let normal = normal.normalize_or_zero();
    let function = BoxFunction::from_face(center, -normal, width, thickness);
    let clipped = clip_poly_data(data, &function, inside);
    match selection {
        RegionSelect::Full => clipped,
        RegionSelect::Largest => connectivity::region_largest(&clipped),
        RegionSelect::ClosestTo(x) => connectivity::region_min_dist_to(&clipped, x, 1),
        RegionSelect::NearNormal => {
            let probe = center + normal * (3.0 * thickness / 2.0);
            connectivity::region_min_dist_to(&clipped, probe, 1)
        }
    }
}

fn grid_cells_image(img: &ImageData) -> (Vec<DVec3>, Vec<Cell>) {
    let dims = img.dims();
    let idx = |i: usize, j: usize, k: usize| (i + j * dims[0] + k * dims[0] * dims[1]) as u32;
    let mut cells = Vec::new();
    for k in 0..dims[2].saturating_sub(1) {
        for j in 0..dims[1].saturating_sub(1) {
            for i in 0..dims[0].saturating_sub(1) {
                cells.push(Cell::new(
                    CellType::Voxel,
                    vec![
                        idx(i, j, k),
                        idx(i + 1, j, k),
                        idx(i, j + 1, k),
                        idx(i + 1, j + 1, k),
                        idx(i, j, k + 1),
                        idx(i + 1, j, k + 1),
                        idx(i, j + 1, k + 1),
                        idx(i + 1, j + 1, k + 1),
                    ],
                ));
            }
        }
    }
    (img.positions(), cells)
}

fn grid_cells_structured(sg: &StructuredGrid) -> (Vec<DVec3>, Vec<Cell>) {
    let dims = sg.dims();
    let idx = |i: usize, j: usize, k: usize| (i + j * dims[0] + k * dims[0] * dims[1]) as u32;
    let mut cells = Vec::new();
    for k in 0..dims[2].saturating_sub(1) {
        for j in 0..dims[1].saturating_sub(1) {
            for i in 0..dims[0].saturating_sub(1) {
                cells.push(Cell::new(
                    CellType::Hexahedron,
                    vec![
                        idx(i, j, k),
                        idx(i + 1, j, k),
                        idx(i + 1, j + 1, k),
                        idx(i, j + 1, k),
                        idx(i, j, k + 1),
                        idx(i + 1, j, k + 1),
                        idx(i + 1, j + 1, k + 1),
                        idx(i, j + 1, k + 1),
                    ],
                ));
            }
        }
    }
    (sg.points().to_vec(), cells)
}

/// Crinkle-clips a volumetric dataset: keeps whole cells with at least one
/// point on the kept side.
fn crinkle_clip(
    points: Vec<DVec3>,
    cells: Vec<Cell>,
    point_data: &Attributes,
    cell_data: &Attributes,
    values: &[f64],
) -> UnstructuredGrid {
    let mut kept_cells = Vec::new();
    let mut kept_ids = Vec::new();
    for (i, cell) in cells.into_iter().enumerate() {
        if cell
            .connectivity
            .iter()
            .any(|&p| values[p as usize] >= 0.0)
        {
            kept_cells.push(cell);
            kept_ids.push(i);
        }
    }

    // Compact to referenced points
    let mut new_index: HashMap<u32, u32> = HashMap::new();
    let mut used: Vec<usize> = Vec::new();
    for cell in &mut kept_cells {
        for p in &mut cell.connectivity {
            let idx = *new_index.entry(*p).or_insert_with(|| {
                used.push(*p as usize);
                (used.len() - 1) as u32
            });
            *p = idx;
        }
    }

    let mut out = UnstructuredGrid::from_cells(
        used.iter().map(|&i| points[i]).collect(),
        kept_cells,
    );
    *out.point_data_mut() = crate::mesh::subset_attributes(point_data, &used);
    *out.cell_data_mut() = crate::mesh::subset_attributes(cell_data, &kept_ids);
    out
}

/// Clips any dataset by a plane, keeping the side the normal points to.
///
/// Polygonal data is clipped exactly; volumetric datasets are crinkle
/// clipped into an unstructured grid.
#[must_use]
pub fn clip_by_plane(data: &DataSet, origin: DVec3, normal: DVec3) -> DataSet {
    clip_data_set(data, &PlaneFunction::new(origin, normal), false)
}

/// Clips any dataset by a sphere, keeping the inside.
#[must_use]
pub fn clip_by_sphere(data: &DataSet, center: DVec3, radius: f64) -> DataSet {
    clip_data_set(data, &SphereFunction::new(center, radius), true)
}

/// Clips any dataset by an implicit function.
#[must_use]
pub fn clip_data_set(data: &DataSet, function: &dyn Implicit, inside_out: bool) -> DataSet {
    match data {
        DataSet::PolyData(pd) => DataSet::PolyData(clip_poly_data(pd, function, inside_out)),
        DataSet::ImageData(img) => {
            let (points, cells) = grid_cells_image(img);
            let values: Vec<f64> = points
                .iter()
                .map(|&p| {
                    let v = function.eval(p);
                    if inside_out {
                        -v
                    } else {
                        v
                    }
                })
                .collect();
            DataSet::UnstructuredGrid(crinkle_clip(
                points,
                cells,
                img.point_data(),
                img.cell_data(),
                &values,
            ))
        }
        DataSet::StructuredGrid(sg) => {
            let (points, cells) = grid_cells_structured(sg);
            let values: Vec<f64> = points
                .iter()
                .map(|&p| {
                    let v = function.eval(p);
                    if inside_out {
                        -v
                    } else {
                        v
                    }
                })
                .collect();
            DataSet::UnstructuredGrid(crinkle_clip(
                points,
                cells,
                sg.point_data(),
                sg.cell_data(),
                &values,
            ))
        }
        DataSet::UnstructuredGrid(ug) => {
            let values: Vec<f64> = ug
                .points()
                .iter()
                .map(|&p| {
                    let v = function.eval(p);
                    if inside_out {
                        -v
                    } else {
                        v
                    }
                })
                .collect();
            DataSet::UnstructuredGrid(crinkle_clip(
                ug.points().to_vec(),
                ug.cells().to_vec(),
                ug.point_data(),
                ug.cell_data(),
                &values,
            ))
        }
    }
}

/// Clips any dataset by a point-scalar threshold, keeping
/// `scalar >= value` (or the complement with `inside_out`).
pub fn clip_by_scalar(
    data: &DataSet,
    array: &str,
    value: f64,
    inside_out: bool,
) -> Result<DataSet> {
    match data {
        DataSet::PolyData(pd) => Ok(DataSet::PolyData(clip_by_scalar_poly(
            pd, array, value, inside_out,
        )?)),
        _ => {
            let scalars = data.point_data().scalars(array)?;
            let values: Vec<f64> = scalars
                .iter()
                .map(|&s| if inside_out { value - s } else { s - value })
                .collect();
            let clipped = match data {
                DataSet::ImageData(img) => {
                    let (points, cells) = grid_cells_image(img);
                    crinkle_clip(points, cells, img.point_data(), img.cell_data(), &values)
                }
                DataSet::StructuredGrid(sg) => {
                    let (points, cells) = grid_cells_structured(sg);
                    crinkle_clip(points, cells, sg.point_data(), sg.cell_data(), &values)
                }
                DataSet::UnstructuredGrid(ug) => crinkle_clip(
                    ug.points().to_vec(),
                    ug.cells().to_vec(),
                    ug.point_data(),
                    ug.cell_data(),
                    &values,
                ),
                DataSet::PolyData(_) => unreachable!(),
            };
            Ok(DataSet::UnstructuredGrid(clipped))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{is_watertight, surface_area};
    use crate::sources;

    #[test]
    fn test_clip_plane_keeps_normal_side() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 16);
        let upper = clip_by_plane_poly(&s, DVec3::ZERO, DVec3::Z, false);
        assert!(!upper.polys().is_empty());
        for p in upper.points() {
            assert!(p.z >= -1e-9, "kept point below the plane: {p:?}");
        }
        let lower = clip_by_plane_poly(&s, DVec3::ZERO, DVec3::Z, true);
        for p in lower.points() {
            assert!(p.z <= 1e-9);
        }
    }

    #[test]
    fn test_clip_interpolates_point_data() {
        // Segment-on-a-triangle strip with a linear field; the cut point
        // value must be the lerp of its edge endpoints.
        let mut strip = sources::plane(DVec3::ZERO, DVec3::X * 2.0, DVec3::Y, (2, 1));
        let xs: Vec<f64> = strip.points().iter().map(|p| p.x).collect();
        strip.add_point_scalar("x", xs).unwrap();
        let clipped = clip_by_plane_poly(&strip, DVec3::new(0.5, 0.0, 0.0), DVec3::X, false);
        let vals = clipped.point_data().scalars("x").unwrap();
        for (p, v) in clipped.points().iter().zip(vals) {
            assert!((p.x - v).abs() < 1e-9, "field not interpolated: {p:?} {v}");
        }
        // No point survives left of the plane
        assert!(clipped.points().iter().all(|p| p.x >= 0.5 - 1e-9));
    }

    #[test]
    fn test_clip_sphere_keeps_inside() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 16);
        let cap = clip_by_sphere_poly(&s, DVec3::new(0.0, 0.0, 1.0), 0.5);
        assert!(!cap.polys().is_empty());
        for p in cap.points() {
            assert!((*p - DVec3::Z).length() <= 0.5 + 1e-9);
        }
    }

    #[test]
    fn test_clip_by_scalar() {
        let mut s = sources::sphere(DVec3::ZERO, 1.0, 16);
        let zs: Vec<f64> = s.points().iter().map(|p| p.z).collect();
        s.add_point_scalar("z", zs).unwrap();
        let top = clip_by_scalar_poly(&s, "z", 0.5, false).unwrap();
        for p in top.points() {
            assert!(p.z >= 0.5 - 1e-9);
        }
    }

    #[test]
    fn test_clip_closed_surface_stays_closed() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 16);
        assert!(is_watertight(&s));
        let capped = clip_closed_surface(&s, DVec3::ZERO, DVec3::Z);
        assert!(is_watertight(&capped), "capped clip has boundary edges");
        // Half sphere + disc cap area
        let analytic = 2.0 * std::f64::consts::PI + std::f64::consts::PI;
        let area = surface_area(&capped);
        assert!(
            (area - analytic).abs() / analytic < 0.1,
            "area {area} vs {analytic}"
        );
    }

    #[test]
    fn test_crinkle_clip_image() {
        let mut img = ImageData::new([4, 4, 4], DVec3::ONE, DVec3::ZERO).unwrap();
        let ids: Vec<f64> = (0..64).map(f64::from).collect();
        img.add_point_scalar("id", ids).unwrap();
        let half = clip_by_plane(&DataSet::ImageData(img), DVec3::splat(1.5), DVec3::X);
        let DataSet::UnstructuredGrid(ug) = half else {
            panic!("expected unstructured output");
        };
        // 27 cells total; kept cells have at least one corner with x >= 1.5
        assert_eq!(ug.num_cells(), 18);
        assert!(ug.point_data().get("id").is_some());
        for p in ug.points() {
            assert!(p.x >= 1.0 - 1e-9, "crinkle kept a far-side point");
        }
    }

    #[test]
    fn test_clip_box_removes_slab() {
        let s = sources::sphere(DVec3::ZERO, 1.0, 16);
        let carved = clip_by_box(
            &s,
            DVec3::Z, // surface point at the north pole
            DVec3::Z,
            1.0,
            0.5,
            false,
            RegionSelect::Largest,
        );
        assert!(!carved.polys().is_empty());
        // The polar cap strictly inside the box is gone (boundary points
        // land exactly on the box surface)
        for p in carved.points() {
            let in_box =
                p.x.abs() < 0.5 - 1e-9 && p.y.abs() < 0.5 - 1e-9 && p.z > 0.5 + 1e-9;
            assert!(!in_box, "point {p:?} survived inside the carved box");
        }
    }

    #[test]
    fn test_clip_polyline() {
        let line = sources::polyline_between(DVec3::new(-1.0, 0.0, 0.0), DVec3::X, 11);
        let right = clip_by_plane_poly(&line, DVec3::ZERO, DVec3::X, false);
        assert_eq!(right.lines().len(), 1);
        let pts = right.points();
        assert!(pts.iter().all(|p| p.x >= -1e-9));
        // The interpolated endpoint lands exactly on the plane
        assert!(pts.iter().any(|p| p.x.abs() < 1e-9));
    }

    #[test]
    fn test_chain_loops_square() {
        let segs = vec![[0_u32, 1], [2, 3], [1, 2], [3, 0]];
        let loops = chain_loops(&segs);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
    }
}
