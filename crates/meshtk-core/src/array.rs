//! Named attribute arrays and their numeric-buffer conversions.
//!
//! Datasets carry per-point and per-cell data as [`Attributes`]: an ordered,
//! name-keyed collection of [`AttributeArray`] values with optional *active
//! scalars* and *active vectors* designations. Small per-dataset metadata
//! lives in [`FieldData`].

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{MeshTkError, Result};

/// A single named data array: one scalar or one 3-vector per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeArray {
    /// One `f64` per point/cell.
    Scalar(Vec<f64>),
    /// One 3-vector per point/cell.
    Vector(Vec<DVec3>),
}

impl AttributeArray {
    /// Number of tuples in the array.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(v) => v.len(),
            Self::Vector(v) => v.len(),
        }
    }

    /// Returns true if the array has no tuples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of components per tuple (1 or 3).
    #[must_use]
    pub fn num_components(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Vector(_) => 3,
        }
    }

    /// Flattens the array into a plain numeric buffer
    /// (`[x0, y0, z0, x1, ...]` for vectors).
    #[must_use]
    pub fn to_flat(&self) -> Vec<f64> {
        match self {
            Self::Scalar(v) => v.clone(),
            Self::Vector(v) => v.iter().flat_map(|p| [p.x, p.y, p.z]).collect(),
        }
    }

    /// Builds a vector array from a flat buffer of xyz triples.
    pub fn vector_from_flat(buffer: &[f64]) -> Result<Self> {
        if buffer.len() % 3 != 0 {
            return Err(MeshTkError::BadBufferLength {
                len: buffer.len(),
                components: 3,
            });
        }
        Ok(Self::Vector(
            buffer
                .chunks_exact(3)
                .map(|c| DVec3::new(c[0], c[1], c[2]))
                .collect(),
        ))
    }

    /// Returns the scalar values, if this is a scalar array.
    #[must_use]
    pub fn as_scalars(&self) -> Option<&[f64]> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Vector(_) => None,
        }
    }

    /// Returns the vector values, if this is a vector array.
    #[must_use]
    pub fn as_vectors(&self) -> Option<&[DVec3]> {
        match self {
            Self::Vector(v) => Some(v),
            Self::Scalar(_) => None,
        }
    }
}

/// An ordered collection of named attribute arrays.
///
/// Insertion order is preserved; inserting under an existing name replaces
/// that array in place. At most one array is designated the active scalars
/// and one the active vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    arrays: Vec<(String, AttributeArray)>,
    active_scalars: Option<String>,
    active_vectors: Option<String>,
}

impl Attributes {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of arrays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Returns true if there are no arrays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Array names, in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.arrays.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Returns true if an array with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.arrays.iter().any(|(n, _)| n == name)
    }

    /// Looks up an array by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeArray> {
        self.arrays.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// Looks up an array by name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttributeArray> {
        self.arrays
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    /// Scalar values of a named array, erroring if missing or not scalar.
    pub fn scalars(&self, name: &str) -> Result<&[f64]> {
        self.get(name)
            .and_then(AttributeArray::as_scalars)
            .ok_or_else(|| MeshTkError::ArrayNotFound(name.to_string()))
    }

    /// Vector values of a named array, erroring if missing or not vector.
    pub fn vectors(&self, name: &str) -> Result<&[DVec3]> {
        self.get(name)
            .and_then(AttributeArray::as_vectors)
            .ok_or_else(|| MeshTkError::ArrayNotFound(name.to_string()))
    }

    /// Inserts an array, replacing any existing array with the same name.
    pub fn insert(&mut self, name: impl Into<String>, array: AttributeArray) {
        let name = name.into();
        if let Some(existing) = self.get_mut(&name) {
            *existing = array;
        } else {
            self.arrays.push((name, array));
        }
    }

    /// Inserts a scalar array.
    pub fn insert_scalar(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.insert(name, AttributeArray::Scalar(values));
    }

    /// Inserts a vector array.
    pub fn insert_vector(&mut self, name: impl Into<String>, values: Vec<DVec3>) {
        self.insert(name, AttributeArray::Vector(values));
    }

    /// Removes an array; clears the active designations if they pointed at it.
    pub fn remove(&mut self, name: &str) -> Option<AttributeArray> {
        let idx = self.arrays.iter().position(|(n, _)| n == name)?;
        if self.active_scalars.as_deref() == Some(name) {
            self.active_scalars = None;
        }
        if self.active_vectors.as_deref() == Some(name) {
            self.active_vectors = None;
        }
        Some(self.arrays.remove(idx).1)
    }

    /// Renames an array, keeping its position and active designations.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> Result<()> {
        let new = new.into();
        let Some(entry) = self.arrays.iter_mut().find(|(n, _)| n == old) else {
            return Err(MeshTkError::ArrayNotFound(old.to_string()));
        };
        entry.0.clone_from(&new);
        if self.active_scalars.as_deref() == Some(old) {
            self.active_scalars = Some(new.clone());
        }
        if self.active_vectors.as_deref() == Some(old) {
            self.active_vectors = Some(new);
        }
        Ok(())
    }

    /// Drops every array whose name is not in `keep`.
    pub fn retain_only(&mut self, keep: &[&str]) {
        let dropped: Vec<String> = self
            .arrays
            .iter()
            .filter(|(n, _)| !keep.contains(&n.as_str()))
            .map(|(n, _)| n.clone())
            .collect();
        for name in dropped {
            self.remove(&name);
        }
    }

    /// Removes all arrays.
    pub fn clear(&mut self) {
        self.arrays.clear();
        self.active_scalars = None;
        self.active_vectors = None;
    }

    /// Name of the active scalars array, if designated.
    #[must_use]
    pub fn active_scalars(&self) -> Option<&str> {
        self.active_scalars.as_deref()
    }

    /// Name of the active vectors array, if designated.
    #[must_use]
    pub fn active_vectors(&self) -> Option<&str> {
        self.active_vectors.as_deref()
    }

    /// Designates an existing scalar array as the active scalars.
    pub fn set_active_scalars(&mut self, name: &str) -> Result<()> {
        match self.get(name) {
            Some(AttributeArray::Scalar(_)) => {
                self.active_scalars = Some(name.to_string());
                Ok(())
            }
            _ => Err(MeshTkError::ArrayNotFound(name.to_string())),
        }
    }

    /// Designates an existing vector array as the active vectors.
    pub fn set_active_vectors(&mut self, name: &str) -> Result<()> {
        match self.get(name) {
            Some(AttributeArray::Vector(_)) => {
                self.active_vectors = Some(name.to_string());
                Ok(())
            }
            _ => Err(MeshTkError::ArrayNotFound(name.to_string())),
        }
    }

    /// Ensures some scalar array is active and returns its name.
    ///
    /// If none is designated, `preferred` is used when it names an existing
    /// scalar array; otherwise the first scalar array wins. Errors when the
    /// collection holds no scalar array at all.
    pub fn ensure_scalars(&mut self, preferred: Option<&str>) -> Result<String> {
        if let Some(name) = &self.active_scalars {
            return Ok(name.clone());
        }
        if let Some(p) = preferred {
            if self.set_active_scalars(p).is_ok() {
                return Ok(p.to_string());
            }
        }
        let first = self
            .arrays
            .iter()
            .find(|(_, a)| matches!(a, AttributeArray::Scalar(_)))
            .map(|(n, _)| n.clone())
            .ok_or(MeshTkError::NoArrays)?;
        self.active_scalars = Some(first.clone());
        Ok(first)
    }

    /// Adds `dst` as the per-tuple magnitude of the vector array `src`.
    pub fn add_magnitude(&mut self, src: &str, dst: impl Into<String>) -> Result<()> {
        let mags: Vec<f64> = self.vectors(src)?.iter().map(|v| v.length()).collect();
        self.insert_scalar(dst, mags);
        Ok(())
    }

    /// Adds `dst` as the signed component of the vector array `src` along a
    /// direction (normalized internally).
    pub fn add_normal_component(
        &mut self,
        src: &str,
        direction: DVec3,
        dst: impl Into<String>,
    ) -> Result<()> {
        let n = direction.normalize_or_zero();
        let comps: Vec<f64> = self.vectors(src)?.iter().map(|v| v.dot(n)).collect();
        self.insert_scalar(dst, comps);
        Ok(())
    }

    /// Iterates over `(name, array)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeArray)> {
        self.arrays.iter().map(|(n, a)| (n.as_str(), a))
    }
}

/// Small named numeric arrays attached to a whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldData {
    arrays: Vec<(String, Vec<f64>)>,
}

impl FieldData {
    /// Creates an empty field-data block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Entry names, in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.arrays.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Looks up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.arrays
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Inserts an entry, replacing any existing entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        if let Some(entry) = self.arrays.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = values;
        } else {
            self.arrays.push((name, values));
        }
    }

    /// Inserts a single-value entry.
    pub fn insert_value(&mut self, name: impl Into<String>, value: f64) {
        self.insert(name, vec![value]);
    }

    /// Removes an entry.
    pub fn remove(&mut self, name: &str) -> Option<Vec<f64>> {
        let idx = self.arrays.iter().position(|(n, _)| n == name)?;
        Some(self.arrays.remove(idx).1)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.arrays.clear();
    }

    /// Copies all entries into another field-data block.
    pub fn copy_into(&self, dest: &mut FieldData) {
        for (name, values) in &self.arrays {
            dest.insert(name.clone(), values.clone());
        }
    }

    /// Iterates over `(name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.arrays.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces() {
        let mut attrs = Attributes::new();
        attrs.insert_scalar("a", vec![1.0, 2.0]);
        attrs.insert_scalar("a", vec![3.0, 4.0]);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.scalars("a").unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn test_flat_round_trip() {
        let arr = AttributeArray::Vector(vec![DVec3::X, DVec3::new(1.0, 2.0, 3.0)]);
        let flat = arr.to_flat();
        assert_eq!(flat, vec![1.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
        let back = AttributeArray::vector_from_flat(&flat).unwrap();
        assert_eq!(arr, back);

        assert!(AttributeArray::vector_from_flat(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_ensure_scalars_fallback() {
        let mut attrs = Attributes::new();
        attrs.insert_vector("vel", vec![DVec3::X]);
        attrs.insert_scalar("p", vec![1.0]);
        attrs.insert_scalar("q", vec![2.0]);

        // No active, no preference: first scalar wins
        assert_eq!(attrs.ensure_scalars(None).unwrap(), "p");
        // Already designated: preference is ignored
        assert_eq!(attrs.ensure_scalars(Some("q")).unwrap(), "p");
    }

    #[test]
    fn test_ensure_scalars_preferred() {
        let mut attrs = Attributes::new();
        attrs.insert_scalar("p", vec![1.0]);
        attrs.insert_scalar("q", vec![2.0]);
        assert_eq!(attrs.ensure_scalars(Some("q")).unwrap(), "q");
    }

    #[test]
    fn test_remove_clears_active() {
        let mut attrs = Attributes::new();
        attrs.insert_scalar("p", vec![1.0]);
        attrs.set_active_scalars("p").unwrap();
        attrs.remove("p");
        assert!(attrs.active_scalars().is_none());
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_rename_tracks_active() {
        let mut attrs = Attributes::new();
        attrs.insert_scalar("p", vec![1.0]);
        attrs.set_active_scalars("p").unwrap();
        attrs.rename("p", "pressure").unwrap();
        assert_eq!(attrs.active_scalars(), Some("pressure"));
        assert!(attrs.rename("missing", "x").is_err());
    }

    #[test]
    fn test_retain_only() {
        let mut attrs = Attributes::new();
        attrs.insert_scalar("a", vec![1.0]);
        attrs.insert_scalar("b", vec![2.0]);
        attrs.insert_scalar("c", vec![3.0]);
        attrs.retain_only(&["b"]);
        assert_eq!(attrs.names(), vec!["b"]);
    }

    #[test]
    fn test_magnitude_and_normal_component() {
        let mut attrs = Attributes::new();
        attrs.insert_vector("vel", vec![DVec3::new(3.0, 4.0, 0.0), DVec3::Z]);
        attrs.add_magnitude("vel", "speed").unwrap();
        assert_eq!(attrs.scalars("speed").unwrap(), &[5.0, 1.0]);

        attrs
            .add_normal_component("vel", DVec3::Z * 2.0, "vn")
            .unwrap();
        assert_eq!(attrs.scalars("vn").unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn test_field_data() {
        let mut fd = FieldData::new();
        fd.insert_value("time", 0.25);
        fd.insert("range", vec![0.0, 1.0]);
        assert_eq!(fd.get("time"), Some(&[0.25][..]));
        assert_eq!(fd.names(), vec!["time", "range"]);

        let mut other = FieldData::new();
        fd.copy_into(&mut other);
        assert_eq!(other.get("range"), Some(&[0.0, 1.0][..]));
    }
}
