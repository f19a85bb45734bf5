use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Error type returned by ingestion, join, and pipeline functions.
///
/// This is a single error enum shared across the tabular, shapefile, and JSON
/// readers, the external-property join, and the pipeline driver.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-text parsing error (tabular sources and external-property files).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A parsed JSON document is not structurally valid GeoJSON.
    #[error("geojson error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Shapefile geometry-stream error.
    #[error("shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// Shapefile attribute-table (.dbf) error.
    #[error("dbase error: {0}")]
    Dbase(#[from] dbase::Error),

    /// Invalid or conflicting configuration, detected before any I/O occurs.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// The input parsed, but does not have the required shape (missing `id`
    /// column, topology without an `objects` member, non-GeoJSON document, ...).
    #[error("malformed document: {message}")]
    Malformed { message: String },

    /// A reader failed; identifies the failing source and carries the cause.
    #[error("failed to ingest '{name}' ({}): {source}", path.display())]
    Source {
        name: String,
        path: PathBuf,
        #[source]
        source: Box<IngestError>,
    },
}

impl IngestError {
    /// Wrap an error with the source file it came from.
    pub fn for_source(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        source: IngestError,
    ) -> Self {
        Self::Source {
            name: name.into(),
            path: path.into(),
            source: Box::new(source),
        }
    }
}
