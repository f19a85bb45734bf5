//! Shapefile ingestion: geometry stream plus dbase attribute records.
//!
//! Shapes and records are read in stream order and appended one by one; the
//! collection completes only once the stream is exhausted, and any stream-level
//! error aborts immediately. An optional character-encoding label overrides the
//! attribute reader's default (the geometry stream is encoding-agnostic).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use shapefile::Shape;

use crate::error::{IngestError, IngestResult};
use crate::types::SourceRef;

use super::IngestOptions;

type ShpReader = shapefile::Reader<BufReader<File>, BufReader<File>>;

/// Read a shapefile into a [`FeatureCollection`].
pub fn read_shapefile(source: &SourceRef, options: &IngestOptions) -> IngestResult<FeatureCollection> {
    let mut reader = open_reader(&source.path, options.encoding.as_deref())?;

    let mut features = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        features.push(Feature {
            bbox: None,
            geometry: shape_geometry(shape)?,
            id: None,
            properties: Some(record_properties(record)),
            foreign_members: None,
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn open_reader(path: &Path, encoding: Option<&str>) -> IngestResult<ShpReader> {
    let Some(label) = encoding else {
        return Ok(shapefile::Reader::from_path(path)?);
    };

    let shape_reader = shapefile::ShapeReader::from_path(path)?;
    let dbf_path = path.with_extension("dbf");
    let dbase_reader = match label.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => {
            dbase::Reader::from_path_with_encoding(&dbf_path, dbase::encoding::UnicodeLossy)?
        }
        "windows-1252" | "cp1252" | "latin1" | "latin-1" | "iso-8859-1" => {
            dbase::Reader::from_path_with_encoding(&dbf_path, yore::code_pages::CP1252)?
        }
        "windows-1251" | "cp1251" => {
            dbase::Reader::from_path_with_encoding(&dbf_path, yore::code_pages::CP1251)?
        }
        "windows-1250" | "cp1250" => {
            dbase::Reader::from_path_with_encoding(&dbf_path, yore::code_pages::CP1250)?
        }
        "cp437" | "ibm437" => {
            dbase::Reader::from_path_with_encoding(&dbf_path, yore::code_pages::CP437)?
        }
        "cp850" | "ibm850" => {
            dbase::Reader::from_path_with_encoding(&dbf_path, yore::code_pages::CP850)?
        }
        "cp866" | "ibm866" => {
            dbase::Reader::from_path_with_encoding(&dbf_path, yore::code_pages::CP866)?
        }
        other => {
            return Err(IngestError::Config {
                message: format!("unsupported shapefile encoding '{other}'"),
            });
        }
    };
    Ok(shapefile::Reader::new(shape_reader, dbase_reader))
}

fn shape_geometry(shape: Shape) -> IngestResult<Option<Geometry>> {
    if matches!(shape, Shape::NullShape) {
        return Ok(None);
    }
    let shape_kind = shape.shapetype();
    let geometry =
        geo_types::Geometry::<f64>::try_from(shape).map_err(|err| IngestError::Malformed {
            message: format!("unsupported shape {shape_kind:?}: {err:?}"),
        })?;
    Ok(Some(Geometry::new(geojson::Value::from(&geometry))))
}

fn record_properties(record: dbase::Record) -> JsonObject {
    let mut properties = JsonObject::new();
    for (name, value) in record {
        properties.insert(name, field_value(value));
    }
    properties
}

fn field_value(value: dbase::FieldValue) -> JsonValue {
    use dbase::FieldValue;

    match value {
        FieldValue::Character(v) => v.map_or(JsonValue::Null, JsonValue::String),
        FieldValue::Memo(v) => JsonValue::String(v),
        FieldValue::Numeric(v) => v.map_or(JsonValue::Null, number),
        FieldValue::Float(v) => v.map_or(JsonValue::Null, |f| number(f64::from(f))),
        FieldValue::Double(v) => number(v),
        FieldValue::Currency(v) => number(v),
        FieldValue::Integer(v) => JsonValue::from(v),
        FieldValue::Logical(v) => v.map_or(JsonValue::Null, JsonValue::Bool),
        FieldValue::Date(v) => v.map_or(JsonValue::Null, |d| {
            JsonValue::String(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }),
        FieldValue::DateTime(v) => {
            let (date, time) = (v.date(), v.time());
            JsonValue::String(format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                date.year(),
                date.month(),
                date.day(),
                time.hours(),
                time.minutes(),
                time.seconds()
            ))
        }
        _ => JsonValue::Null,
    }
}

fn number(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
}
