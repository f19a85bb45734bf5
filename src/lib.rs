//! `geo-ingest` normalizes geometry data from heterogeneous file formats into a
//! single canonical in-memory representation: an insertion-ordered
//! [`types::SourceMap`] from source name to GeoJSON document, ready to hand to a
//! downstream topology pipeline (a [`pipeline::TopologyBackend`] implemented
//! outside this crate).
//!
//! The primary entrypoint is [`ingestion::ingest_sources`]; [`pipeline::run`]
//! additionally drives the downstream build/simplify/filter/bind/serialize call
//! sequence.
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension):**
//!
//! - **Point tables**: `.csv`, `.tsv`, `.txt` — one point feature per row, with
//!   configurable longitude/latitude columns
//! - **Shapefiles**: `.shp` (+ `.dbf` attributes, optional encoding override)
//! - **GeoJSON**: `.json`, `.geojson` — inserted under the file's derived name
//! - **TopoJSON topologies**: rehydrated through an external
//!   [`ingestion::TopologyDecoder`]; every named object splices into the run as
//!   an independent source
//!
//! Sources are read strictly one at a time, in input order, and the first
//! failure aborts the whole run — map entry order is reproducible by
//! construction.
//!
//! ## Quick example: ingest two sources
//!
//! ```no_run
//! use geo_ingest::ingestion::{ingest_sources, IngestOptions, NoTopologyDecoder};
//! use geo_ingest::rules::IdExtractor;
//! use geo_ingest::types::SourceRef;
//!
//! # fn main() -> Result<(), geo_ingest::IngestError> {
//! let sources = [
//!     SourceRef::parse("counties=data/us-counties.shp"),
//!     SourceRef::parse("data/cities.csv"),
//! ];
//! let map = ingest_sources(
//!     &sources,
//!     &IngestOptions::default(),
//!     &IdExtractor::parse("+fips,name"),
//!     &NoTopologyDecoder,
//! )?;
//! assert_eq!(map.names(), vec!["counties", "cities"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Rule engine
//!
//! Identifier and property-transform specifiers compile once, before any reader
//! runs:
//!
//! ```rust
//! use geo_ingest::rules::{IdExtractor, PropertySpec, PropertyTransforms};
//! use serde_json::json;
//!
//! // First usable specifier wins; `+` coerces numerically, NaN counts as absent.
//! let id = IdExtractor::parse("+code,name");
//!
//! let transforms = PropertyTransforms::compile(&PropertySpec::List(vec![
//!     "pop=+population".to_string(),
//! ]));
//! let mut out = geojson::JsonObject::new();
//! assert!(transforms.apply(&mut out, "population", &json!("1200")));
//! assert_eq!(out.get("pop"), Some(&json!(1200.0)));
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: format readers and the sequential ingestion orchestrator
//! - [`rules`]: identifier and property-transform rule engine
//! - [`join`]: eager external-property join
//! - [`pipeline`]: configuration resolution + downstream pipeline contract
//! - [`types`]: source references and the canonical source map
//! - [`error`]: error types used across the crate

pub mod error;
pub mod ingestion;
pub mod join;
pub mod pipeline;
pub mod rules;
pub mod types;

pub use error::{IngestError, IngestResult};
