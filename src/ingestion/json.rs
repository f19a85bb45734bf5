//! JSON ingestion: GeoJSON documents and topology rehydration.
//!
//! A file whose `type` tag is `"Topology"` is a previously built multi-object
//! topology: every named child of its `objects` member is converted back into a
//! plain geometry object through the injected [`TopologyDecoder`] and registered
//! under its own name, splicing the topology's contents into the current run as
//! if each object were an independent source. Any other JSON document is
//! registered verbatim under the file's derived name.

use std::fs;

use geojson::{GeoJson, JsonValue};

use crate::error::{IngestError, IngestResult};
use crate::types::{SourceMap, SourceRef};

use super::IngestStats;

/// External topology-to-geometry decoder.
///
/// Topology construction and its inverse live outside this crate; the reader
/// only needs a way to turn one named object of a topology document back into a
/// plain geometry/feature object.
pub trait TopologyDecoder {
    /// Decode one named object definition of `topology`.
    fn decode(&self, topology: &JsonValue, name: &str, object: &JsonValue)
    -> IngestResult<GeoJson>;
}

/// Placeholder decoder for runs whose inputs never include topology documents.
///
/// Encountering a topology file with this decoder is a malformed-document error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTopologyDecoder;

impl TopologyDecoder for NoTopologyDecoder {
    fn decode(
        &self,
        _topology: &JsonValue,
        name: &str,
        _object: &JsonValue,
    ) -> IngestResult<GeoJson> {
        Err(IngestError::Malformed {
            message: format!("no topology decoder configured (object '{name}')"),
        })
    }
}

/// Read a JSON document, registering one or more entries into `map`.
pub fn read_document_into(
    source: &SourceRef,
    decoder: &dyn TopologyDecoder,
    map: &mut SourceMap,
) -> IngestResult<IngestStats> {
    let text = fs::read_to_string(&source.path)?;
    let document: JsonValue = serde_json::from_str(&text)?;

    if document.get("type").and_then(JsonValue::as_str) == Some("Topology") {
        rehydrate_topology(source, &document, decoder, map)
    } else {
        let features = match GeoJson::from_json_value(document)? {
            GeoJson::FeatureCollection(fc) => {
                let features = fc.features.len();
                map.insert(source.name.clone(), GeoJson::FeatureCollection(fc));
                features
            }
            other => {
                map.insert(source.name.clone(), other);
                1
            }
        };
        Ok(IngestStats {
            entries: 1,
            features,
        })
    }
}

/// Expand a topology document's objects into independent named entries.
///
/// Entries are inserted in the topology's own object order; the topology file's
/// derived name is not inserted.
fn rehydrate_topology(
    source: &SourceRef,
    document: &JsonValue,
    decoder: &dyn TopologyDecoder,
    map: &mut SourceMap,
) -> IngestResult<IngestStats> {
    let objects = document
        .get("objects")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| IngestError::Malformed {
            message: format!("topology '{}' has no objects member", source.name),
        })?;

    let mut entries = 0;
    for (name, object) in objects {
        let decoded = decoder.decode(document, name, object)?;
        map.insert(name.clone(), decoded);
        entries += 1;
    }
    Ok(IngestStats {
        entries,
        features: entries,
    })
}
