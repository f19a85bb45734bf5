//! Format readers and the sequential ingestion orchestrator.
//!
//! Most callers should use [`ingest_sources`], which:
//!
//! - resolves each source's format once, from its extension (or a forced
//!   [`IngestOptions::format`])
//! - runs the readers strictly one at a time, in input order
//! - aborts the whole run on the first reader error (fail-fast; the partially
//!   populated map is discarded, never returned)
//! - optionally reports per-source success/failure/alerts to an
//!   [`IngestObserver`]
//!
//! Format-specific readers are also available under:
//! - [`table`]
//! - [`shape`]
//! - [`json`]

pub mod json;
pub mod observability;
pub mod shape;
pub mod table;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use geojson::GeoJson;

use crate::error::{IngestError, IngestResult};
use crate::rules::IdExtractor;
use crate::types::{SourceMap, SourceRef};

pub use json::{NoTopologyDecoder, TopologyDecoder};
pub use observability::{
    CompositeObserver, IngestObserver, IngestSeverity, IngestStats, SourceContext, StdErrObserver,
};

/// Supported source formats, resolved once per file before scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited-text point table (`.csv`, `.tsv`, `.txt`).
    Table,
    /// Shapefile geometry stream with dbase attributes (`.shp`).
    Shape,
    /// GeoJSON document or previously built topology (`.json` and friends).
    Json,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Table),
            "shp" => Some(Self::Shape),
            "json" | "geojson" | "topojson" => Some(Self::Json),
            _ => None,
        }
    }

    /// Resolve the format for a path; unknown or missing extensions fall back
    /// to JSON, matching the original command-line dispatch.
    pub fn for_path(path: &Path) -> Self {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Self::Json)
    }
}

/// Options controlling ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestOptions {
    /// If `None`, auto-detect each source's format from its file extension.
    pub format: Option<SourceFormat>,
    /// Longitude column name for tabular sources.
    pub longitude: String,
    /// Latitude column name for tabular sources.
    pub latitude: String,
    /// Character-encoding override for shapefile attributes; `None` = reader
    /// default.
    pub encoding: Option<String>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestSeverity,
}

impl fmt::Debug for IngestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestOptions")
            .field("format", &self.format)
            .field("longitude", &self.longitude)
            .field("latitude", &self.latitude)
            .field("encoding", &self.encoding)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            format: None,
            longitude: "longitude".to_owned(),
            latitude: "latitude".to_owned(),
            encoding: None,
            observer: None,
            alert_at_or_above: IngestSeverity::Critical,
        }
    }
}

/// Ingest an ordered list of sources into a fresh [`SourceMap`].
///
/// Sources are read strictly one at a time, in list order, so map entries appear
/// in file-argument order; a topology document expands into its objects' names
/// at the file's position. The first reader error aborts the run: remaining
/// sources never execute and no partially populated map escapes.
///
/// The identifier extractor is compiled before any reader executes and is
/// read-only during ingestion; it is applied to tabular rows here, and handed to
/// the downstream topology build for the other formats.
pub fn ingest_sources(
    sources: &[SourceRef],
    options: &IngestOptions,
    id: &IdExtractor,
    decoder: &dyn TopologyDecoder,
) -> IngestResult<SourceMap> {
    let mut map = SourceMap::new();

    for source in sources {
        let format = options
            .format
            .unwrap_or_else(|| SourceFormat::for_path(&source.path));
        let ctx = SourceContext {
            name: source.name.clone(),
            path: source.path.clone(),
            format,
        };

        match read_source(source, format, options, id, decoder, &mut map) {
            Ok(stats) => {
                if let Some(obs) = options.observer.as_ref() {
                    obs.on_success(&ctx, stats);
                }
            }
            Err(cause) => {
                let error = IngestError::for_source(source.name.as_str(), &source.path, cause);
                if let Some(obs) = options.observer.as_ref() {
                    let severity = severity_for_error(&error);
                    obs.on_failure(&ctx, severity, &error);
                    if severity >= options.alert_at_or_above {
                        obs.on_alert(&ctx, severity, &error);
                    }
                }
                return Err(error);
            }
        }
    }

    Ok(map)
}

fn read_source(
    source: &SourceRef,
    format: SourceFormat,
    options: &IngestOptions,
    id: &IdExtractor,
    decoder: &dyn TopologyDecoder,
    map: &mut SourceMap,
) -> IngestResult<IngestStats> {
    match format {
        SourceFormat::Table => {
            let fc = table::read_table(source, options, id)?;
            let features = fc.features.len();
            map.insert(source.name.clone(), GeoJson::FeatureCollection(fc));
            Ok(IngestStats {
                entries: 1,
                features,
            })
        }
        SourceFormat::Shape => {
            let fc = shape::read_shapefile(source, options)?;
            let features = fc.features.len();
            map.insert(source.name.clone(), GeoJson::FeatureCollection(fc));
            Ok(IngestStats {
                entries: 1,
                features,
            })
        }
        SourceFormat::Json => json::read_document_into(source, decoder, map),
    }
}

fn severity_for_error(error: &IngestError) -> IngestSeverity {
    match error {
        IngestError::Io(_) => IngestSeverity::Critical,
        IngestError::Csv(err) => match err.kind() {
            csv::ErrorKind::Io(_) => IngestSeverity::Critical,
            _ => IngestSeverity::Error,
        },
        IngestError::Source { source, .. } => severity_for_error(source),
        _ => IngestSeverity::Error,
    }
}
