//! Legacy visualization-toolkit file format, ASCII and binary.
//!
//! One container covers all four dataset types (`POLYDATA`,
//! `STRUCTURED_POINTS`, `STRUCTURED_GRID`, `UNSTRUCTURED_GRID`) with
//! `POINT_DATA` / `CELL_DATA` sections holding `SCALARS`, `VECTORS`,
//! `NORMALS`, and `FIELD` arrays. Binary payloads are big-endian, per the
//! format specification.

use std::io::Write as _;
use std::path::Path;

use glam::DVec3;
use meshtk_core::{
    Attributes, Cell, CellType, DataSet, FieldData, ImageData, PolyData, StructuredGrid,
    UnstructuredGrid,
};

use crate::{IoError, Result, WriteOptions};

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Writes a dataset as a legacy file.
pub fn write(data: &DataSet, path: &Path, options: &WriteOptions) -> Result<()> {
    let mut buf: Vec<u8> = Vec::new();
    writeln!(buf, "# vtk DataFile Version 3.0")?;
    writeln!(buf, "{}", options.title.replace('\n', " "))?;
    writeln!(buf, "{}", if options.binary { "BINARY" } else { "ASCII" })?;

    match data {
        DataSet::PolyData(pd) => write_poly_data(&mut buf, pd, options.binary)?,
        DataSet::ImageData(img) => write_image(&mut buf, img)?,
        DataSet::StructuredGrid(sg) => write_structured(&mut buf, sg, options.binary)?,
        DataSet::UnstructuredGrid(ug) => write_unstructured(&mut buf, ug, options.binary)?,
    }

    if !data.field_data().is_empty() {
        write_field_block(&mut buf, data.field_data(), options.binary)?;
    }
    if !data.point_data().is_empty() {
        writeln!(buf, "POINT_DATA {}", data.num_points())?;
        write_attributes(&mut buf, data.point_data(), options.binary)?;
    }
    if !data.cell_data().is_empty() {
        writeln!(buf, "CELL_DATA {}", data.num_cells())?;
        write_attributes(&mut buf, data.cell_data(), options.binary)?;
    }

    std::fs::write(path, buf)?;
    Ok(())
}

fn write_f64s(buf: &mut Vec<u8>, values: &[f64], per_line: usize, binary: bool) -> Result<()> {
    if binary {
        for v in values {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        writeln!(buf)?;
        return Ok(());
    }
    for chunk in values.chunks(per_line.max(1)) {
        let line: Vec<String> = chunk.iter().map(std::string::ToString::to_string).collect();
        writeln!(buf, "{}", line.join(" "))?;
    }
    Ok(())
}

fn write_points(buf: &mut Vec<u8>, points: &[DVec3], binary: bool) -> Result<()> {
    writeln!(buf, "POINTS {} double", points.len())?;
    let flat: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
    write_f64s(buf, &flat, 3, binary)
}

fn write_cell_block(
    buf: &mut Vec<u8>,
    keyword: &str,
    cells: &[Vec<u32>],
    binary: bool,
) -> Result<()> {
    let size: usize = cells.iter().map(|c| c.len() + 1).sum();
    writeln!(buf, "{keyword} {} {size}", cells.len())?;
    if binary {
        for cell in cells {
            buf.extend_from_slice(&(cell.len() as i32).to_be_bytes());
            for &i in cell {
                buf.extend_from_slice(&(i as i32).to_be_bytes());
            }
        }
        writeln!(buf)?;
    } else {
        for cell in cells {
            let ids: Vec<String> = cell.iter().map(std::string::ToString::to_string).collect();
            writeln!(buf, "{} {}", cell.len(), ids.join(" "))?;
        }
    }
    Ok(())
}

fn write_poly_data(buf: &mut Vec<u8>, pd: &PolyData, binary: bool) -> Result<()> {
    writeln!(buf, "DATASET POLYDATA")?;
    write_points(buf, pd.points(), binary)?;
    if !pd.verts().is_empty() {
        write_cell_block(buf, "VERTICES", pd.verts(), binary)?;
    }
    if !pd.lines().is_empty() {
        write_cell_block(buf, "LINES", pd.lines(), binary)?;
    }
    if !pd.polys().is_empty() {
        write_cell_block(buf, "POLYGONS", pd.polys(), binary)?;
    }
    Ok(())
}

fn write_image(buf: &mut Vec<u8>, img: &ImageData) -> Result<()> {
    let [nx, ny, nz] = img.dims();
    let s = img.spacing();
    let o = img.origin();
    writeln!(buf, "DATASET STRUCTURED_POINTS")?;
    writeln!(buf, "DIMENSIONS {nx} {ny} {nz}")?;
    writeln!(buf, "SPACING {} {} {}", s.x, s.y, s.z)?;
    writeln!(buf, "ORIGIN {} {} {}", o.x, o.y, o.z)?;
    Ok(())
}

fn write_structured(buf: &mut Vec<u8>, sg: &StructuredGrid, binary: bool) -> Result<()> {
    let [nx, ny, nz] = sg.dims();
    writeln!(buf, "DATASET STRUCTURED_GRID")?;
    writeln!(buf, "DIMENSIONS {nx} {ny} {nz}")?;
    write_points(buf, sg.points(), binary)
}

fn write_unstructured(buf: &mut Vec<u8>, ug: &UnstructuredGrid, binary: bool) -> Result<()> {
    writeln!(buf, "DATASET UNSTRUCTURED_GRID")?;
    write_points(buf, ug.points(), binary)?;
    let cells: Vec<Vec<u32>> = ug.cells().iter().map(|c| c.connectivity.clone()).collect();
    write_cell_block(buf, "CELLS", &cells, binary)?;
    writeln!(buf, "CELL_TYPES {}", ug.num_cells())?;
    if binary {
        for cell in ug.cells() {
            buf.extend_from_slice(&i32::from(cell.kind.id()).to_be_bytes());
        }
        writeln!(buf)?;
    } else {
        for cell in ug.cells() {
            writeln!(buf, "{}", cell.kind.id())?;
        }
    }
    Ok(())
}

fn write_field_block(buf: &mut Vec<u8>, field: &FieldData, binary: bool) -> Result<()> {
    writeln!(buf, "FIELD FieldData {}", field.names().len())?;
    for (name, values) in field.iter() {
        writeln!(buf, "{} 1 {} double", sanitize(name), values.len())?;
        write_f64s(buf, values, 9, binary)?;
    }
    Ok(())
}

fn sanitize(name: &str) -> String {
    name.replace(char::is_whitespace, "_")
}

fn write_attributes(buf: &mut Vec<u8>, attrs: &Attributes, binary: bool) -> Result<()> {
    let active_s = attrs.active_scalars();
    let active_v = attrs.active_vectors();

    let mut field_arrays = Vec::new();
    for (name, array) in attrs.iter() {
        if Some(name) == active_s {
            writeln!(buf, "SCALARS {} double 1", sanitize(name))?;
            writeln!(buf, "LOOKUP_TABLE default")?;
            write_f64s(buf, &array.to_flat(), 9, binary)?;
        } else if Some(name) == active_v {
            writeln!(buf, "VECTORS {} double", sanitize(name))?;
            write_f64s(buf, &array.to_flat(), 3, binary)?;
        } else {
            field_arrays.push((name, array));
        }
    }
    if !field_arrays.is_empty() {
        writeln!(buf, "FIELD FieldData {}", field_arrays.len())?;
        for (name, array) in field_arrays {
            writeln!(
                buf,
                "{} {} {} double",
                sanitize(name),
                array.num_components(),
                array.len()
            )?;
            write_f64s(buf, &array.to_flat(), array.num_components().max(3), binary)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarKind {
    UnsignedChar,
    Char,
    UnsignedShort,
    Short,
    UnsignedInt,
    Int,
    UnsignedLong,
    Long,
    Float,
    Double,
}

impl ScalarKind {
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "unsigned_char" => Self::UnsignedChar,
            "char" => Self::Char,
            "unsigned_short" => Self::UnsignedShort,
            "short" => Self::Short,
            "unsigned_int" => Self::UnsignedInt,
            "int" | "vtkIdType" => Self::Int,
            "unsigned_long" => Self::UnsignedLong,
            "long" | "vtktypeint64" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            _ => None?,
        })
    }

    fn size(self) -> usize {
        match self {
            Self::UnsignedChar | Self::Char => 1,
            Self::UnsignedShort | Self::Short => 2,
            Self::UnsignedInt | Self::Int | Self::Float => 4,
            Self::UnsignedLong | Self::Long | Self::Double => 8,
        }
    }

    fn decode_be(self, bytes: &[u8]) -> f64 {
        match self {
            Self::UnsignedChar => f64::from(bytes[0]),
            Self::Char => f64::from(bytes[0] as i8),
            Self::UnsignedShort => f64::from(u16::from_be_bytes([bytes[0], bytes[1]])),
            Self::Short => f64::from(i16::from_be_bytes([bytes[0], bytes[1]])),
            Self::UnsignedInt => f64::from(u32::from_be_bytes(bytes[..4].try_into().unwrap())),
            Self::Int => f64::from(i32::from_be_bytes(bytes[..4].try_into().unwrap())),
            Self::UnsignedLong => u64::from_be_bytes(bytes[..8].try_into().unwrap()) as f64,
            Self::Long => i64::from_be_bytes(bytes[..8].try_into().unwrap()) as f64,
            Self::Float => f64::from(f32::from_be_bytes(bytes[..4].try_into().unwrap())),
            Self::Double => f64::from_be_bytes(bytes[..8].try_into().unwrap()),
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    binary: bool,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            line: 1,
            binary: false,
        }
    }

    fn err(&self, message: impl Into<String>) -> IoError {
        IoError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn read_line(&mut self) -> Option<String> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
        let line = String::from_utf8_lossy(&self.bytes[start..self.pos])
            .trim_end_matches('\r')
            .to_string();
        if self.pos < self.bytes.len() {
            self.pos += 1; // consume the newline
            self.line += 1;
        }
        Some(line)
    }

    /// Consumes the remainder of the current line and returns it.
    fn rest_of_line(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
        let rest = String::from_utf8_lossy(&self.bytes[start..self.pos])
            .trim()
            .to_string();
        if self.pos < self.bytes.len() {
            self.pos += 1;
            self.line += 1;
        }
        rest
    }

    /// Advances past the next newline (no-op at EOF).
    fn skip_line(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
        if self.pos < self.bytes.len() {
            self.pos += 1;
            self.line += 1;
        }
    }

    fn next_token(&mut self) -> Option<String> {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            if self.bytes[self.pos] == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Some(String::from_utf8_lossy(&self.bytes[start..self.pos]).to_string())
    }

    fn expect_token(&mut self) -> Result<String> {
        self.next_token()
            .ok_or_else(|| self.err("unexpected end of file"))
    }

    fn expect_usize(&mut self) -> Result<usize> {
        let t = self.expect_token()?;
        t.parse()
            .map_err(|_| self.err(format!("expected an integer, got '{t}'")))
    }

    fn expect_f64(&mut self) -> Result<f64> {
        let t = self.expect_token()?;
        t.parse()
            .map_err(|_| self.err(format!("expected a number, got '{t}'")))
    }

    /// True when the next line starts with the prefix (nothing consumed).
    fn peek_line_starts_with(&self, prefix: &str) -> bool {
        let rest = &self.bytes[self.pos.min(self.bytes.len())..];
        let trimmed: &[u8] = match rest.iter().position(|&b| !b.is_ascii_whitespace()) {
            Some(i) => &rest[i..],
            None => return false,
        };
        trimmed.starts_with(prefix.as_bytes())
    }

    /// Reads `n` numeric values of the declared kind (ASCII tokens or a
    /// big-endian binary run).
    fn read_values(&mut self, n: usize, kind: ScalarKind) -> Result<Vec<f64>> {
        if self.binary {
            self.skip_line_if_mid_line();
            let size = kind.size();
            let need = n * size;
            if self.pos + need > self.bytes.len() {
                return Err(self.err(format!(
                    "binary payload truncated: need {need} bytes, have {}",
                    self.bytes.len() - self.pos
                )));
            }
            let mut out = Vec::with_capacity(n);
            for i in 0..n {
                let start = self.pos + i * size;
                out.push(kind.decode_be(&self.bytes[start..start + size]));
            }
            self.pos += need;
            return Ok(out);
        }
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.expect_f64()?);
        }
        Ok(out)
    }

    /// In binary mode the payload begins on the line after the keyword.
    fn skip_line_if_mid_line(&mut self) {
        if self.pos > 0 && self.pos <= self.bytes.len() && self.bytes[self.pos - 1] != b'\n' {
            self.skip_line();
        }
    }

    fn read_indices(&mut self, n: usize) -> Result<Vec<i64>> {
        if self.binary {
            let vals = self.read_values(n, ScalarKind::Int)?;
            return Ok(vals.iter().map(|&v| v as i64).collect());
        }
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let t = self.expect_token()?;
            out.push(
                t.parse()
                    .map_err(|_| self.err(format!("expected an index, got '{t}'")))?,
            );
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrTarget {
    Point,
    Cell,
}

#[derive(Default)]
struct Parsed {
    dataset_type: String,
    points: Vec<DVec3>,
    dims: Option<[usize; 3]>,
    spacing: Option<DVec3>,
    origin: Option<DVec3>,
    verts: Vec<Vec<u32>>,
    lines: Vec<Vec<u32>>,
    polys: Vec<Vec<u32>>,
    cells: Vec<Vec<u32>>,
    cell_types: Vec<u8>,
    point_attrs: Attributes,
    cell_attrs: Attributes,
    field: FieldData,
}

/// Reads a legacy file.
pub fn read(path: &Path) -> Result<DataSet> {
    let bytes = std::fs::read(path)?;
    let mut r = Reader::new(&bytes);

    let header = r.read_line().ok_or_else(|| r.err("empty file"))?;
    if !header.starts_with("# vtk DataFile") {
        return Err(r.err("missing '# vtk DataFile' header"));
    }
    let _title = r.read_line().ok_or_else(|| r.err("missing title line"))?;
    let format = r
        .read_line()
        .ok_or_else(|| r.err("missing ASCII/BINARY line"))?;
    match format.trim() {
        "ASCII" => r.binary = false,
        "BINARY" => r.binary = true,
        other => return Err(r.err(format!("expected ASCII or BINARY, got '{other}'"))),
    }

    let mut parsed = Parsed::default();
    let mut target: Option<AttrTarget> = None;
    let mut target_len = 0_usize;

    while let Some(keyword) = r.next_token() {
        match keyword.to_ascii_uppercase().as_str() {
            "DATASET" => parsed.dataset_type = r.expect_token()?.to_ascii_uppercase(),
            "DIMENSIONS" => {
                parsed.dims = Some([r.expect_usize()?, r.expect_usize()?, r.expect_usize()?]);
            }
            "SPACING" | "ASPECT_RATIO" => {
                parsed.spacing =
                    Some(DVec3::new(r.expect_f64()?, r.expect_f64()?, r.expect_f64()?));
            }
            "ORIGIN" => {
                parsed.origin =
                    Some(DVec3::new(r.expect_f64()?, r.expect_f64()?, r.expect_f64()?));
            }
            "POINTS" => {
                let n = r.expect_usize()?;
                let kind = expect_kind(&mut r)?;
                let flat = r.read_values(n * 3, kind)?;
                parsed.points = flat
                    .chunks_exact(3)
                    .map(|c| DVec3::new(c[0], c[1], c[2]))
                    .collect();
            }
            "VERTICES" => parsed.verts = read_cell_block(&mut r)?,
            "LINES" => parsed.lines = read_cell_block(&mut r)?,
            "POLYGONS" => parsed.polys = read_cell_block(&mut r)?,
            "TRIANGLE_STRIPS" => {
                // Decode strips into triangles
                for strip in read_cell_block(&mut r)? {
                    for w in strip.windows(3) {
                        parsed.polys.push(w.to_vec());
                    }
                }
            }
            "CELLS" => parsed.cells = read_cell_block(&mut r)?,
            "CELL_TYPES" => {
                let n = r.expect_usize()?;
                parsed.cell_types = r
                    .read_indices(n)?
                    .into_iter()
                    .map(|v| v as u8)
                    .collect();
            }
            "POINT_DATA" => {
                target_len = r.expect_usize()?;
                target = Some(AttrTarget::Point);
            }
            "CELL_DATA" => {
                target_len = r.expect_usize()?;
                target = Some(AttrTarget::Cell);
            }
            "SCALARS" => read_scalars(&mut r, &mut parsed, target, target_len)?,
            "VECTORS" | "NORMALS" => {
                let name = r.expect_token()?;
                let kind = expect_kind(&mut r)?;
                let flat = r.read_values(target_len * 3, kind)?;
                let vectors: Vec<DVec3> = flat
                    .chunks_exact(3)
                    .map(|c| DVec3::new(c[0], c[1], c[2]))
                    .collect();
                let attrs = attrs_for(&mut parsed, target)?;
                attrs.insert_vector(name.clone(), vectors);
                if keyword.eq_ignore_ascii_case("VECTORS") {
                    let _ = attrs.set_active_vectors(&name);
                }
            }
            "FIELD" => {
                let _field_name = r.expect_token()?;
                let n_arrays = r.expect_usize()?;
                for _ in 0..n_arrays {
                    read_field_array(&mut r, &mut parsed, target)?;
                }
            }
            "LOOKUP_TABLE" => {
                // Standalone color table: skip its entries
                let _name = r.expect_token()?;
                let n = r.expect_usize()?;
                if r.binary {
                    let _ = r.read_values(n * 4, ScalarKind::UnsignedChar)?;
                } else {
                    let _ = r.read_values(n * 4, ScalarKind::Float)?;
                }
            }
            "METADATA" => skip_metadata(&mut r),
            other => {
                log::warn!("legacy reader: skipping unknown keyword '{other}'");
                r.skip_line();
            }
        }
    }

    assemble(parsed).map_err(IoError::from)
}

fn expect_kind(r: &mut Reader<'_>) -> Result<ScalarKind> {
    let t = r.expect_token()?;
    ScalarKind::parse(&t).ok_or_else(|| r.err(format!("unknown data type '{t}'")))
}

fn read_cell_block(r: &mut Reader<'_>) -> Result<Vec<Vec<u32>>> {
    let n = r.expect_usize()?;
    let size = r.expect_usize()?;
    let flat = r.read_indices(size)?;
    let mut cells = Vec::with_capacity(n);
    let mut i = 0;
    while i < flat.len() {
        let len = flat[i] as usize;
        i += 1;
        if i + len > flat.len() {
            return Err(r.err("cell block truncated"));
        }
        cells.push(flat[i..i + len].iter().map(|&v| v as u32).collect());
        i += len;
    }
    Ok(cells)
}

fn attrs_for<'p>(
    parsed: &'p mut Parsed,
    target: Option<AttrTarget>,
) -> Result<&'p mut Attributes> {
    match target {
        Some(AttrTarget::Point) => Ok(&mut parsed.point_attrs),
        Some(AttrTarget::Cell) => Ok(&mut parsed.cell_attrs),
        None => Err(IoError::Parse {
            line: 0,
            message: "attribute section before POINT_DATA/CELL_DATA".to_string(),
        }),
    }
}

fn read_scalars(
    r: &mut Reader<'_>,
    parsed: &mut Parsed,
    target: Option<AttrTarget>,
    target_len: usize,
) -> Result<()> {
    let name = r.expect_token()?;
    let kind = expect_kind(r)?;
    // The optional component count sits on the SCALARS line itself, which
    // disambiguates it from the first data value
    let rest = r.rest_of_line();
    let components = match rest.split_whitespace().next().map(str::parse::<usize>) {
        Some(Ok(c)) if (1..=4).contains(&c) => c,
        _ => 1,
    };
    // Optional LOOKUP_TABLE line (the format requires it, some writers omit it)
    if r.peek_line_starts_with("LOOKUP_TABLE") {
        let _ = r.next_token();
        let _table = r.expect_token()?;
    }

    let flat = r.read_values(target_len * components, kind)?;
    let attrs = attrs_for(parsed, target)?;
    match components {
        1 => {
            attrs.insert_scalar(name.clone(), flat);
            let _ = attrs.set_active_scalars(&name);
        }
        3 => {
            let vectors: Vec<DVec3> = flat
                .chunks_exact(3)
                .map(|c| DVec3::new(c[0], c[1], c[2]))
                .collect();
            attrs.insert_vector(name, vectors);
        }
        _ => {
            log::warn!("legacy reader: dropping {components}-component scalars '{name}'");
        }
    }
    Ok(())
}

fn read_field_array(
    r: &mut Reader<'_>,
    parsed: &mut Parsed,
    target: Option<AttrTarget>,
) -> Result<()> {
    let name = r.expect_token()?;
    let components = r.expect_usize()?;
    let tuples = r.expect_usize()?;
    let kind = expect_kind(r)?;
    let flat = r.read_values(components * tuples, kind)?;
    match target {
        None => parsed.field.insert(name, flat),
        Some(t) => {
            let attrs = if t == AttrTarget::Point {
                &mut parsed.point_attrs
            } else {
                &mut parsed.cell_attrs
            };
            match components {
                1 => attrs.insert_scalar(name, flat),
                3 => attrs.insert_vector(
                    name,
                    flat.chunks_exact(3)
                        .map(|c| DVec3::new(c[0], c[1], c[2]))
                        .collect(),
                ),
                _ => log::warn!(
                    "legacy reader: dropping {components}-component field array '{name}'"
                ),
            }
        }
    }
    Ok(())
}

fn skip_metadata(r: &mut Reader<'_>) {
    // METADATA blocks end at the first blank line
    r.skip_line();
    while let Some(line) = r.read_line() {
        if line.trim().is_empty() {
            break;
        }
    }
}

fn assemble(parsed: Parsed) -> meshtk_core::Result<DataSet> {
    let mut data = match parsed.dataset_type.as_str() {
        "STRUCTURED_POINTS" => {
            let dims = parsed.dims.unwrap_or([1, 1, 1]);
            let img = ImageData::new(
                dims,
                parsed.spacing.unwrap_or(DVec3::ONE),
                parsed.origin.unwrap_or(DVec3::ZERO),
            )?;
            DataSet::ImageData(img)
        }
        "STRUCTURED_GRID" => {
            let dims = parsed.dims.unwrap_or([parsed.points.len(), 1, 1]);
            DataSet::StructuredGrid(StructuredGrid::new(dims, parsed.points)?)
        }
        "UNSTRUCTURED_GRID" => {
            let cells = parsed
                .cells
                .into_iter()
                .zip(parsed.cell_types)
                .filter_map(|(conn, id)| CellType::from_id(id).map(|k| Cell::new(k, conn)))
                .collect();
            DataSet::UnstructuredGrid(UnstructuredGrid::from_cells(parsed.points, cells))
        }
        // POLYDATA, and the sensible default for files without a DATASET line
        _ => {
            let mut pd = PolyData::new();
            pd.set_points(parsed.points);
            for c in parsed.verts {
                pd.push_vert(c);
            }
            for c in parsed.lines {
                pd.push_line(c);
            }
            for c in parsed.polys {
                pd.push_poly(c);
            }
            DataSet::PolyData(pd)
        }
    };

    *data.point_data_mut() = parsed.point_attrs;
    *data.cell_data_mut() = parsed.cell_attrs;
    parsed.field.copy_into(data.field_data_mut());
    Ok(data)
}
