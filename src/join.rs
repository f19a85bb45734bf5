//! External-property join: side-loaded id-keyed property mappings.
//!
//! Runs eagerly, once per configured file, before ingestion begins; the
//! resulting [`PropertyTable`] is destined for the downstream bind step and is
//! never merged into features here. Unlike the tabular-point reader, every
//! non-id column passes through the property transform.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use geojson::{JsonObject, JsonValue};

use crate::error::{IngestError, IngestResult};
use crate::rules::PropertyTransforms;
use crate::types::SourceRef;

/// Accumulated external properties, keyed by identifier value.
///
/// Rows sharing an id merge additively; within a single row, later columns win
/// on key collision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTable {
    entries: HashMap<String, JsonObject>,
}

impl PropertyTable {
    /// Look up the properties joined for an id.
    pub fn get(&self, id: &str) -> Option<&JsonObject> {
        self.entries.get(id)
    }

    /// Number of distinct ids in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any row was joined. The downstream bind step only runs when the
    /// table is non-empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate (id, properties) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonObject)> {
        self.entries.iter().map(|(id, props)| (id.as_str(), props))
    }
}

/// Join every configured external file into `table`.
pub fn join_external(
    paths: &[impl AsRef<Path>],
    transforms: &PropertyTransforms,
    table: &mut PropertyTable,
) -> IngestResult<()> {
    for path in paths {
        let path = path.as_ref();
        join_file(path, transforms, table).map_err(|cause| {
            let source = SourceRef::from_path(path);
            IngestError::for_source(source.name.as_str(), path, cause)
        })?;
    }
    Ok(())
}

fn join_file(
    path: &Path,
    transforms: &PropertyTransforms,
    table: &mut PropertyTable,
) -> IngestResult<()> {
    let text = fs::read_to_string(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(infer_delimiter(path, &text))
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let id_idx = headers
        .iter()
        .position(|h| h == "id")
        .ok_or_else(|| IngestError::Malformed {
            message: format!(
                "missing required column 'id'. headers={:?}",
                headers.iter().collect::<Vec<_>>()
            ),
        })?;

    for result in rdr.records() {
        let record = result?;
        let id = record.get(id_idx).unwrap_or("").to_owned();
        let entry = table.entries.entry(id).or_default();

        for (idx, key) in headers.iter().enumerate() {
            if idx == id_idx {
                continue;
            }
            let raw = record.get(idx).unwrap_or("");
            let value = if raw.is_empty() {
                JsonValue::Null
            } else {
                JsonValue::String(raw.to_owned())
            };
            transforms.apply(entry, key, &value);
        }
    }
    Ok(())
}

/// Infer the delimiter from the extension, falling back to a tab-presence
/// heuristic on the file contents actually read from disk.
fn infer_delimiter(path: &Path, text: &str) -> u8 {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("csv") => b',',
        Some("tsv") => b'\t',
        _ => {
            if text.contains('\t') {
                b'\t'
            } else {
                b','
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::infer_delimiter;

    #[test]
    fn extension_wins_over_contents() {
        assert_eq!(infer_delimiter(Path::new("x.csv"), "a\tb"), b',');
        assert_eq!(infer_delimiter(Path::new("x.tsv"), "a,b"), b'\t');
    }

    #[test]
    fn ambiguous_extension_falls_back_to_tab_presence() {
        assert_eq!(infer_delimiter(Path::new("x.dat"), "id\tname\n"), b'\t');
        assert_eq!(infer_delimiter(Path::new("x.dat"), "id,name\n"), b',');
        assert_eq!(infer_delimiter(Path::new("x"), "id,name\n"), b',');
    }
}
