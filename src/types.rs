//! Core data model types for ingestion.
//!
//! Every source, whatever its on-disk format, normalizes into an entry of a
//! [`SourceMap`]: an insertion-ordered mapping from source name to a
//! [`geojson::GeoJson`] document (usually a feature collection). Entry order is
//! significant; it drives the reproducibility of downstream topology output.

use std::path::{Path, PathBuf};

use geojson::GeoJson;
use serde::{Deserialize, Serialize};

/// A qualified file reference: a display name plus a filesystem path.
///
/// Parsed from `"name=path"` (explicit) or a bare `"path"` (name = file stem).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Name the source's feature collection is registered under.
    pub name: String,
    /// Path to the input file.
    pub path: PathBuf,
}

impl SourceRef {
    /// Parse a qualified file reference.
    pub fn parse(specifier: &str) -> Self {
        match specifier.split_once('=') {
            Some((name, path)) if !name.is_empty() => Self {
                name: name.to_owned(),
                path: PathBuf::from(path),
            },
            _ => Self::from_path(specifier),
        }
    }

    /// Reference a bare path; the name is the basename without its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_owned();
        Self {
            name,
            path: path.to_path_buf(),
        }
    }
}

/// The per-run mapping from source name to geometry document.
///
/// Preserves insertion order. Re-inserting an existing name overwrites the value
/// in place, keeping the first insertion's position. Built once per ingestion run
/// and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    entries: Vec<(String, GeoJson)>,
}

impl SourceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named document, overwriting any existing entry with that name.
    pub fn insert(&mut self, name: impl Into<String>, value: GeoJson) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a document by name.
    pub fn get(&self, name: &str) -> Option<&GeoJson> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GeoJson)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Source names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for SourceMap {
    type Item = (String, GeoJson);
    type IntoIter = std::vec::IntoIter<(String, GeoJson)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Coordinate-system mode shared by topology build, simplify, and filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    /// Infer spherical vs. cartesian from the input coordinates.
    #[default]
    Auto,
    /// Longitude/latitude degrees on the sphere.
    Spherical,
    /// Planar coordinates.
    Cartesian,
}

/// Simplification mode. The two modes are mutually exclusive by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Simplify {
    /// Remove points whose effective area falls below this threshold.
    AreaThreshold(f64),
    /// Retain this proportion of points (0, 1].
    RetainProportion(f64),
}
