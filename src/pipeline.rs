//! Configuration resolution and the downstream pipeline contract.
//!
//! The topology math itself (build, quantize, simplify, filter, bind,
//! serialize) lives outside this crate, behind [`TopologyBackend`]. This module
//! owns what feeds it: validated configuration, the eager external-property
//! join, sequential ingestion, and the fixed call sequence with its option
//! propagation rules.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};
use crate::ingestion::{IngestOptions, TopologyDecoder, ingest_sources};
use crate::join::{PropertyTable, join_external};
use crate::rules::{IdExtractor, PropertySpec, PropertyTransforms};
use crate::types::{CoordinateSystem, Simplify, SourceMap, SourceRef};

/// Raw run configuration, as supplied by a caller (or deserialized from file).
///
/// Conflicting settings are rejected by [`Config::resolve`] before any I/O
/// occurs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ordered input files, each `"name=path"` or a bare path.
    pub files: Vec<String>,
    /// External-property files joined eagerly before ingestion.
    pub external_properties: Vec<PathBuf>,
    /// Comma-separated identifier specifiers (`+` marks numeric coercion).
    pub id_properties: Option<String>,
    /// Which feature properties to preserve downstream.
    pub properties: PropertySpec,
    /// Force spherical coordinates.
    pub spherical: bool,
    /// Force cartesian coordinates. Mutually exclusive with `spherical`.
    pub cartesian: bool,
    /// Quantization depth; `0` disables quantization.
    pub quantization: f64,
    /// Simplify to this minimum effective area.
    pub simplify_area: Option<f64>,
    /// Simplify retaining this proportion of points. Mutually exclusive with
    /// `simplify_area`.
    pub simplify_proportion: Option<f64>,
}

/// Options produced by [`Config::resolve`], constructed once before any reader
/// executes and immutable during ingestion.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    /// Coordinate-system mode shared by build, simplify, and filter.
    pub coordinate_system: CoordinateSystem,
    /// Quantization depth.
    pub quantization: f64,
    /// Requested simplification, if any.
    pub simplify: Option<Simplify>,
    /// Compiled identifier rules.
    pub id: IdExtractor,
    /// Compiled property transforms.
    pub transforms: PropertyTransforms,
}

impl Config {
    /// Validate the configuration and compile its rule specifications.
    ///
    /// Mutually exclusive coordinate-system flags and simplification modes are
    /// configuration errors; they must prevent any reader from running.
    pub fn resolve(&self) -> IngestResult<ResolvedOptions> {
        let coordinate_system = match (self.spherical, self.cartesian) {
            (true, true) => {
                return Err(IngestError::Config {
                    message: "--spherical and --cartesian are mutually exclusive".to_owned(),
                });
            }
            (true, false) => CoordinateSystem::Spherical,
            (false, true) => CoordinateSystem::Cartesian,
            (false, false) => CoordinateSystem::Auto,
        };

        let simplify = match (self.simplify_area, self.simplify_proportion) {
            (Some(_), Some(_)) => {
                return Err(IngestError::Config {
                    message: "simplify-area and simplify-proportion are mutually exclusive"
                        .to_owned(),
                });
            }
            (Some(area), None) => Some(Simplify::AreaThreshold(area)),
            (None, Some(p)) => {
                if !(p > 0.0 && p <= 1.0) {
                    return Err(IngestError::Config {
                        message: format!("simplify-proportion must be in (0, 1], got {p}"),
                    });
                }
                Some(Simplify::RetainProportion(p))
            }
            (None, None) => None,
        };

        let id = self
            .id_properties
            .as_deref()
            .map(IdExtractor::parse)
            .unwrap_or_default();

        Ok(ResolvedOptions {
            coordinate_system,
            quantization: self.quantization,
            simplify,
            id,
            transforms: PropertyTransforms::compile(&self.properties),
        })
    }
}

/// External topology/simplify/filter/bind pipeline.
///
/// Implemented outside this crate; [`run`] only fixes the call sequence and the
/// option propagation between the stages.
pub trait TopologyBackend {
    /// The backend's topology representation.
    type Topology;

    /// Build a topology from the ingested sources. The identifier extractor is
    /// applied to features of non-tabular sources here.
    fn build(
        &mut self,
        sources: SourceMap,
        id: &IdExtractor,
        quantization: f64,
        coordinate_system: CoordinateSystem,
    ) -> IngestResult<Self::Topology>;

    /// Simplify topology arcs in place.
    fn simplify(
        &mut self,
        topology: &mut Self::Topology,
        mode: Simplify,
        coordinate_system: CoordinateSystem,
    ) -> IngestResult<()>;

    /// Remove rings whose area falls below `min_area`. Always invoked.
    fn filter(
        &mut self,
        topology: &mut Self::Topology,
        min_area: f64,
        coordinate_system: CoordinateSystem,
    ) -> IngestResult<()>;

    /// Bind externally joined properties into the topology's features.
    fn bind(&mut self, topology: &mut Self::Topology, table: &PropertyTable) -> IngestResult<()>;

    /// Write the finished topology out.
    fn serialize(&mut self, topology: Self::Topology) -> IngestResult<()>;
}

/// Run the whole pipeline: validate, join, ingest, then drive the backend.
///
/// Stage order and option propagation:
///
/// 1. [`Config::resolve`] — conflicts fail here, before any I/O.
/// 2. External-property join, eagerly, once per configured file.
/// 3. Sequential ingestion of `config.files`.
/// 4. `build`, then optional `simplify`, then `filter` — always, with a zero
///    threshold when simplification was not requested — all three with the same
///    resolved coordinate-system mode.
/// 5. `bind`, only when the external-property table is non-empty.
/// 6. `serialize`.
///
/// Any error aborts immediately; no partial output is produced.
pub fn run<B: TopologyBackend>(
    config: &Config,
    ingest: &IngestOptions,
    backend: &mut B,
    decoder: &dyn TopologyDecoder,
) -> IngestResult<()> {
    let resolved = config.resolve()?;

    let mut table = PropertyTable::default();
    join_external(&config.external_properties, &resolved.transforms, &mut table)?;

    let sources: Vec<SourceRef> = config.files.iter().map(|f| SourceRef::parse(f)).collect();
    let map = ingest_sources(&sources, ingest, &resolved.id, decoder)?;

    let mut topology = backend.build(
        map,
        &resolved.id,
        resolved.quantization,
        resolved.coordinate_system,
    )?;

    let min_area = match resolved.simplify {
        Some(mode) => {
            backend.simplify(&mut topology, mode, resolved.coordinate_system)?;
            match mode {
                Simplify::AreaThreshold(area) => area,
                // The effective minimum area for proportion-based runs is only
                // known to the simplifier; the backend refines it internally.
                Simplify::RetainProportion(_) => 0.0,
            }
        }
        None => 0.0,
    };
    backend.filter(&mut topology, min_area, resolved.coordinate_system)?;

    if !table.is_empty() {
        backend.bind(&mut topology, &table)?;
    }
    backend.serialize(topology)
}
