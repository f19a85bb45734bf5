//! Tabular-point ingestion: delimited text where every row is one point feature.
//!
//! The header row defines column names. The configured longitude/latitude columns
//! are consumed to build the point geometry; every remaining column becomes a
//! feature property verbatim (string-valued). Property transforms never apply on
//! this path; they belong to the external-property join.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::error::IngestResult;
use crate::rules::IdExtractor;
use crate::types::SourceRef;

use super::IngestOptions;

/// Read a delimited-text point file into a [`FeatureCollection`].
///
/// Rows keep their input order. A row whose longitude or latitude is missing or
/// non-numeric yields a feature with no geometry; its other properties are kept
/// unchanged and the coordinate columns are still removed.
pub fn read_table(
    source: &SourceRef,
    options: &IngestOptions,
    id: &IdExtractor,
) -> IngestResult<FeatureCollection> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter_for_path(source))
        .has_headers(true)
        .from_path(&source.path)?;
    read_table_from_reader(&mut rdr, options, id)
}

/// Read tabular point rows from an existing CSV reader.
pub fn read_table_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    options: &IngestOptions,
    id: &IdExtractor,
) -> IngestResult<FeatureCollection> {
    let headers = rdr.headers()?.clone();

    let mut features = Vec::new();
    for result in rdr.records() {
        let record = result?;

        let mut row = JsonObject::new();
        for (key, raw) in headers.iter().zip(record.iter()) {
            row.insert(key.to_owned(), JsonValue::String(raw.to_owned()));
        }

        // Coordinate columns are consumed before the identifier runs.
        let x = row.remove(&options.longitude);
        let y = row.remove(&options.latitude);
        let geometry = match (parse_coordinate(x.as_ref()), parse_coordinate(y.as_ref())) {
            (Some(x), Some(y)) => Some(Geometry::new(Value::Point(vec![x, y]))),
            _ => None,
        };

        features.push(Feature {
            bbox: None,
            geometry,
            id: id.row_id(&row),
            properties: Some(row),
            foreign_members: None,
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn delimiter_for_path(source: &SourceRef) -> u8 {
    match source
        .path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    }
}

fn parse_coordinate(value: Option<&JsonValue>) -> Option<f64> {
    let raw = value.and_then(JsonValue::as_str)?;
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
