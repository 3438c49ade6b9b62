//! PLY polygon files, via `ply-rs`.
//!
//! Vertices carry `x`/`y`/`z` plus one property per point scalar array;
//! faces carry `vertex_indices`. Binary little-endian and ASCII files both
//! read; writing follows [`crate::WriteOptions::binary`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::DVec3;
use meshtk_core::{AttributeArray, PolyData};
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;

use crate::{IoError, Result, WriteOptions};

fn numeric(property: &Property) -> Option<f64> {
    Some(match property {
        Property::Char(v) => f64::from(*v),
        Property::UChar(v) => f64::from(*v),
        Property::Short(v) => f64::from(*v),
        Property::UShort(v) => f64::from(*v),
        Property::Int(v) => f64::from(*v),
        Property::UInt(v) => f64::from(*v),
        Property::Float(v) => f64::from(*v),
        Property::Double(v) => *v,
        _ => None?,
    })
}

fn index_list(property: &Property) -> Option<Vec<u32>> {
    Some(match property {
        Property::ListChar(v) => v.iter().map(|&i| i as u32).collect(),
        Property::ListUChar(v) => v.iter().map(|&i| u32::from(i)).collect(),
        Property::ListShort(v) => v.iter().map(|&i| i as u32).collect(),
        Property::ListUShort(v) => v.iter().map(|&i| u32::from(i)).collect(),
        Property::ListInt(v) => v.iter().map(|&i| i as u32).collect(),
        Property::ListUInt(v) => v.clone(),
        _ => None?,
    })
}

/// Reads a PLY file into polygonal data.
pub fn read(path: &Path) -> Result<PolyData> {
    let mut reader = BufReader::new(File::open(path)?);
    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(&mut reader)?;

    let vertices = ply.payload.get("vertex").ok_or_else(|| IoError::Parse {
        line: 0,
        message: "PLY file has no 'vertex' element".to_string(),
    })?;

    let mut points = Vec::with_capacity(vertices.len());
    // Extra per-vertex scalar properties become point arrays
    let mut extra_names: Vec<String> = Vec::new();
    if let Some(first) = vertices.first() {
        for (name, property) in first.iter() {
            let is_coord = matches!(name.as_str(), "x" | "y" | "z");
            if !is_coord && numeric(property).is_some() {
                extra_names.push(name.clone());
            }
        }
    }
    let mut extras: Vec<Vec<f64>> = vec![Vec::with_capacity(vertices.len()); extra_names.len()];

    for v in vertices {
        let coord = |key: &str| -> Result<f64> {
            v.get(key).and_then(numeric).ok_or_else(|| IoError::Parse {
                line: 0,
                message: format!("vertex is missing '{key}'"),
            })
        };
        points.push(DVec3::new(coord("x")?, coord("y")?, coord("z")?));
        for (slot, name) in extra_names.iter().enumerate() {
            extras[slot].push(v.get(name).and_then(numeric).unwrap_or(0.0));
        }
    }

    let mut polys: Vec<Vec<u32>> = Vec::new();
    if let Some(faces) = ply.payload.get("face") {
        for f in faces {
            let list = f
                .get("vertex_indices")
                .or_else(|| f.get("vertex_index"))
                .and_then(index_list)
                .ok_or_else(|| IoError::Parse {
                    line: 0,
                    message: "face is missing 'vertex_indices'".to_string(),
                })?;
            if list.len() >= 3 {
                polys.push(list);
            }
        }
    }

    let mut pd = PolyData::from_polys(points, polys);
    for (name, values) in extra_names.into_iter().zip(extras) {
        pd.point_data_mut().insert_scalar(name, values);
    }
    Ok(pd)
}

/// Writes polygonal data as a PLY file.
///
/// Polygon cells become faces; line and vert cells are not representable
/// and are skipped with a log message. Point scalar arrays are written as
/// per-vertex double properties.
pub fn write(data: &PolyData, path: &Path, options: &WriteOptions) -> Result<()> {
    if !data.lines().is_empty() || !data.verts().is_empty() {
        log::warn!(
            "PLY writer: skipping {} line and {} vert cell(s)",
            data.lines().len(),
            data.verts().len()
        );
    }

    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = if options.binary {
        Encoding::BinaryLittleEndian
    } else {
        Encoding::Ascii
    };
    ply.header.comments.push(options.title.replace('\n', " "));

    let scalar_arrays: Vec<(&str, &[f64])> = data
        .point_data()
        .iter()
        .filter_map(|(name, array)| match array {
            AttributeArray::Scalar(v) => Some((name, v.as_slice())),
            AttributeArray::Vector(_) => None,
        })
        .collect();

    let mut vertex_def = ElementDef::new("vertex".to_string());
    for key in ["x", "y", "z"] {
        vertex_def.properties.add(PropertyDef::new(
            key.to_string(),
            PropertyType::Scalar(ScalarType::Double),
        ));
    }
    for (name, _) in &scalar_arrays {
        vertex_def.properties.add(PropertyDef::new(
            (*name).to_string(),
            PropertyType::Scalar(ScalarType::Double),
        ));
    }
    ply.header.elements.add(vertex_def);

    let mut face_def = ElementDef::new("face".to_string());
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::UInt),
    ));
    ply.header.elements.add(face_def);

    let mut vertices = Vec::with_capacity(data.num_points());
    for (i, p) in data.points().iter().enumerate() {
        let mut element = DefaultElement::new();
        element.insert("x".to_string(), Property::Double(p.x));
        element.insert("y".to_string(), Property::Double(p.y));
        element.insert("z".to_string(), Property::Double(p.z));
        for (name, values) in &scalar_arrays {
            element.insert((*name).to_string(), Property::Double(values[i]));
        }
        vertices.push(element);
    }
    ply.payload.insert("vertex".to_string(), vertices);

    let mut faces = Vec::with_capacity(data.polys().len());
    for poly in data.polys() {
        let mut element = DefaultElement::new();
        element.insert(
            "vertex_indices".to_string(),
            Property::ListUInt(poly.clone()),
        );
        faces.push(element);
    }
    ply.payload.insert("face".to_string(), faces);

    let mut file = File::create(path)?;
    let writer = Writer::new();
    writer.write_ply(&mut file, &mut ply)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("meshtk_ply_{}_{name}", std::process::id()));
        p
    }

    #[test]
    fn test_round_trip_with_scalars() {
        let mut pd = meshtk_filters::sources::sphere(DVec3::ZERO, 1.0, 8);
        let radii: Vec<f64> = pd.points().iter().map(|p| p.length()).collect();
        pd.add_point_scalar("radius", radii).unwrap();

        let path = temp("sphere.ply");
        write(&pd, &path, &WriteOptions::default()).unwrap();
        let back = read(&path).unwrap();

        assert_eq!(back.num_points(), pd.num_points());
        assert_eq!(back.polys(), pd.polys());
        let r = back.point_data().scalars("radius").unwrap();
        assert!(r.iter().all(|v| (v - 1.0).abs() < 1e-9));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_round_trip_binary() {
        let pd = meshtk_filters::sources::sphere(DVec3::ZERO, 2.0, 6);
        let path = temp("binary.ply");
        let options = WriteOptions {
            binary: true,
            ..WriteOptions::default()
        };
        write(&pd, &path, &options).unwrap();
        let back = read(&path).unwrap();
        assert_eq!(back.num_points(), pd.num_points());
        for (p, q) in back.points().iter().zip(pd.points()) {
            assert!((*p - *q).length() < 1e-12);
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_reads_float_vertices() {
        let text = "\
ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
0 1 0
3 0 1 2
";
        let path = temp("float.ply");
        std::fs::write(&path, text).unwrap();
        let pd = read(&path).unwrap();
        assert_eq!(pd.num_points(), 3);
        assert_eq!(pd.polys(), &[vec![0, 1, 2]]);
        std::fs::remove_file(&path).ok();
    }
}
