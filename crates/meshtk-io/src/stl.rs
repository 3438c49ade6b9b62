//! STL triangle surfaces, ASCII and binary.
//!
//! STL stores bare triangle soup; the reader merges coincident vertices so
//! the result behaves like a connected surface.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;

use glam::DVec3;
use meshtk_core::PolyData;

use crate::{IoError, Result, WriteOptions};

const BINARY_HEADER_LEN: usize = 80;
const TRIANGLE_RECORD_LEN: usize = 50;

/// Reads an STL file (format auto-detected) into polygonal data.
pub fn read(path: &Path) -> Result<PolyData> {
    let bytes = std::fs::read(path)?;
    if is_binary(&bytes) {
        read_binary(&bytes)
    } else {
        read_ascii(&bytes)
    }
}

/// Binary files carry a triangle count that must match the file length;
/// ASCII files start with "solid" and keyword text.
fn is_binary(bytes: &[u8]) -> bool {
    if bytes.len() < BINARY_HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes(
        bytes[BINARY_HEADER_LEN..BINARY_HEADER_LEN + 4]
            .try_into()
            .expect("slice is four bytes"),
    ) as usize;
    let expected = BINARY_HEADER_LEN + 4 + count * TRIANGLE_RECORD_LEN;
    if bytes.len() == expected {
        return true;
    }
    !bytes.starts_with(b"solid")
}

struct MergingBuilder {
    points: Vec<DVec3>,
    index_of: HashMap<(u64, u64, u64), u32>,
    triangles: Vec<[u32; 3]>,
}

impl MergingBuilder {
    fn new() -> Self {
        Self {
            points: Vec::new(),
            index_of: HashMap::new(),
            triangles: Vec::new(),
        }
    }

    fn vertex(&mut self, p: DVec3) -> u32 {
        let key = (p.x.to_bits(), p.y.to_bits(), p.z.to_bits());
        if let Some(&i) = self.index_of.get(&key) {
            return i;
        }
        let i = self.points.len() as u32;
        self.points.push(p);
        self.index_of.insert(key, i);
        i
    }

    fn triangle(&mut self, a: DVec3, b: DVec3, c: DVec3) {
        let tri = [self.vertex(a), self.vertex(b), self.vertex(c)];
        if tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2] {
            self.triangles.push(tri);
        }
    }

    fn finish(self) -> PolyData {
        PolyData::from_triangles(self.points, self.triangles)
    }
}

fn read_binary(bytes: &[u8]) -> Result<PolyData> {
    let count = u32::from_le_bytes(
        bytes[BINARY_HEADER_LEN..BINARY_HEADER_LEN + 4]
            .try_into()
            .expect("slice is four bytes"),
    ) as usize;
    let body = &bytes[BINARY_HEADER_LEN + 4..];
    if body.len() < count * TRIANGLE_RECORD_LEN {
        return Err(IoError::Parse {
            line: 0,
            message: format!(
                "binary STL truncated: {count} triangles declared, {} bytes present",
                body.len()
            ),
        });
    }

    let mut builder = MergingBuilder::new();
    for record in body.chunks_exact(TRIANGLE_RECORD_LEN).take(count) {
        let f = |offset: usize| -> f64 {
            f64::from(f32::from_le_bytes(
                record[offset..offset + 4].try_into().expect("four bytes"),
            ))
        };
        // Offsets 0..12 hold the facet normal, which we recompute on demand
        let a = DVec3::new(f(12), f(16), f(20));
        let b = DVec3::new(f(24), f(28), f(32));
        let c = DVec3::new(f(36), f(40), f(44));
        builder.triangle(a, b, c);
    }
    Ok(builder.finish())
}

fn read_ascii(bytes: &[u8]) -> Result<PolyData> {
    let text = String::from_utf8_lossy(bytes);
    let mut builder = MergingBuilder::new();
    let mut facet: Vec<DVec3> = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("vertex") => {
                let mut next = || -> Result<f64> {
                    tokens
                        .next()
                        .and_then(|t| t.parse().ok())
                        .ok_or_else(|| IoError::Parse {
                            line: line_no + 1,
                            message: "malformed vertex line".to_string(),
                        })
                };
                let p = DVec3::new(next()?, next()?, next()?);
                facet.push(p);
            }
            Some("endfacet") => {
                if facet.len() != 3 {
                    return Err(IoError::Parse {
                        line: line_no + 1,
                        message: format!("facet has {} vertices", facet.len()),
                    });
                }
                builder.triangle(facet[0], facet[1], facet[2]);
                facet.clear();
            }
            _ => {}
        }
    }
    Ok(builder.finish())
}

/// Writes polygonal data as an STL file.
///
/// Polygons are fan-triangulated; non-polygon cells cannot be represented
/// and are skipped.
pub fn write(data: &PolyData, path: &Path, options: &WriteOptions) -> Result<()> {
    let points = data.points();
    let mut triangles: Vec<[DVec3; 3]> = Vec::new();
    for poly in data.polys() {
        if poly.len() < 3 {
            continue;
        }
        let a = points[poly[0] as usize];
        for i in 1..poly.len() - 1 {
            triangles.push([
                a,
                points[poly[i] as usize],
                points[poly[i + 1] as usize],
            ]);
        }
    }
    if !data.lines().is_empty() || !data.verts().is_empty() {
        log::warn!(
            "STL writer: skipping {} line and {} vert cell(s)",
            data.lines().len(),
            data.verts().len()
        );
    }

    if options.binary {
        write_binary(&triangles, path, options)
    } else {
        write_ascii(&triangles, path, options)
    }
}

fn facet_normal(t: &[DVec3; 3]) -> DVec3 {
    (t[1] - t[0]).cross(t[2] - t[0]).normalize_or_zero()
}

fn write_ascii(triangles: &[[DVec3; 3]], path: &Path, options: &WriteOptions) -> Result<()> {
    let name = options.title.replace('\n', " ");
    let mut buf: Vec<u8> = Vec::new();
    writeln!(buf, "solid {name}")?;
    for t in triangles {
        let n = facet_normal(t);
        writeln!(buf, "  facet normal {} {} {}", n.x, n.y, n.z)?;
        writeln!(buf, "    outer loop")?;
        for v in t {
            writeln!(buf, "      vertex {} {} {}", v.x, v.y, v.z)?;
        }
        writeln!(buf, "    endloop")?;
        writeln!(buf, "  endfacet")?;
    }
    writeln!(buf, "endsolid {name}")?;
    std::fs::write(path, buf)?;
    Ok(())
}

fn write_binary(triangles: &[[DVec3; 3]], path: &Path, options: &WriteOptions) -> Result<()> {
    let mut buf: Vec<u8> =
        Vec::with_capacity(BINARY_HEADER_LEN + 4 + triangles.len() * TRIANGLE_RECORD_LEN);
    let mut header = options.title.replace('\n', " ").into_bytes();
    header.resize(BINARY_HEADER_LEN, 0);
    buf.extend_from_slice(&header);
    buf.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for t in triangles {
        let n = facet_normal(t);
        for v in [n, t[0], t[1], t[2]] {
            buf.extend_from_slice(&(v.x as f32).to_le_bytes());
            buf.extend_from_slice(&(v.y as f32).to_le_bytes());
            buf.extend_from_slice(&(v.z as f32).to_le_bytes());
        }
        buf.extend_from_slice(&0_u16.to_le_bytes());
    }
    std::fs::write(path, buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshtk_filters::mesh::is_watertight;
    use meshtk_filters::sources;

    fn temp(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("meshtk_stl_{}_{name}", std::process::id()));
        p
    }

    #[test]
    fn test_ascii_round_trip_merges_points() {
        let sphere = sources::sphere(DVec3::ZERO, 1.0, 8);
        let path = temp("ascii.stl");
        write(&sphere, &path, &WriteOptions::default()).unwrap();
        let back = read(&path).unwrap();
        // Triangle soup merges back into a closed surface
        assert_eq!(back.polys().len(), sphere.polys().len());
        assert!(is_watertight(&back));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_binary_round_trip() {
        let sphere = sources::sphere(DVec3::new(0.5, -2.0, 3.0), 1.5, 10);
        let path = temp("binary.stl");
        let options = WriteOptions {
            binary: true,
            ..WriteOptions::default()
        };
        write(&sphere, &path, &options).unwrap();
        let back = read(&path).unwrap();
        assert_eq!(back.polys().len(), sphere.polys().len());
        // f32 quantization bounds the coordinate error
        let (lo, hi) = back.bounds().unwrap();
        assert!((lo.y + 3.5).abs() < 1e-3);
        assert!((hi.y + 0.5).abs() < 1e-3);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_binary_detection_vs_ascii_solid() {
        // An ASCII file whose name starts like a binary header
        let tri = PolyData::from_triangles(
            vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            vec![[0, 1, 2]],
        );
        let path = temp("detect.stl");
        write(&tri, &path, &WriteOptions::default()).unwrap();
        let back = read(&path).unwrap();
        assert_eq!(back.polys().len(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_truncated_binary_rejected() {
        let mut bytes = vec![1_u8; BINARY_HEADER_LEN];
        bytes.extend_from_slice(&10_u32.to_le_bytes()); // claims 10 triangles
        bytes.extend_from_slice(&[0; 25]); // but holds half a record
        let path = temp("truncated.stl");
        std::fs::write(&path, bytes).unwrap();
        assert!(read(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
