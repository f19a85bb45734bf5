use geojson::{Feature, GeoJson, JsonValue};
use serde_json::json;

use geo_ingest::ingestion::{IngestOptions, TopologyDecoder};
use geo_ingest::join::PropertyTable;
use geo_ingest::pipeline::{Config, TopologyBackend, run};
use geo_ingest::rules::{IdExtractor, PropertySpec};
use geo_ingest::types::{CoordinateSystem, Simplify, SourceMap};
use geo_ingest::{IngestError, IngestResult};

struct StubDecoder;

impl TopologyDecoder for StubDecoder {
    fn decode(
        &self,
        _topology: &JsonValue,
        _name: &str,
        _object: &JsonValue,
    ) -> IngestResult<GeoJson> {
        Ok(GeoJson::Feature(Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: None,
            foreign_members: None,
        }))
    }
}

/// Backend mock that records the call sequence and the options each stage saw.
#[derive(Default)]
struct RecordingBackend {
    calls: Vec<String>,
    source_names: Vec<String>,
    bound_ids: Vec<String>,
}

impl TopologyBackend for RecordingBackend {
    type Topology = ();

    fn build(
        &mut self,
        sources: SourceMap,
        _id: &IdExtractor,
        quantization: f64,
        coordinate_system: CoordinateSystem,
    ) -> IngestResult<()> {
        self.source_names = sources.names().iter().map(|n| (*n).to_owned()).collect();
        self.calls
            .push(format!("build q={quantization} cs={coordinate_system:?}"));
        Ok(())
    }

    fn simplify(
        &mut self,
        _topology: &mut (),
        mode: Simplify,
        coordinate_system: CoordinateSystem,
    ) -> IngestResult<()> {
        self.calls
            .push(format!("simplify {mode:?} cs={coordinate_system:?}"));
        Ok(())
    }

    fn filter(
        &mut self,
        _topology: &mut (),
        min_area: f64,
        coordinate_system: CoordinateSystem,
    ) -> IngestResult<()> {
        self.calls
            .push(format!("filter min_area={min_area} cs={coordinate_system:?}"));
        Ok(())
    }

    fn bind(&mut self, _topology: &mut (), table: &PropertyTable) -> IngestResult<()> {
        self.bound_ids = table.iter().map(|(id, _)| id.to_owned()).collect();
        self.bound_ids.sort();
        self.calls.push("bind".to_owned());
        Ok(())
    }

    fn serialize(&mut self, _topology: ()) -> IngestResult<()> {
        self.calls.push("serialize".to_owned());
        Ok(())
    }
}

#[test]
fn minimal_run_always_filters_with_zero_threshold_and_skips_bind() {
    let config = Config {
        files: vec!["tests/fixtures/cities.csv".to_owned()],
        ..Config::default()
    };
    let mut backend = RecordingBackend::default();
    run(&config, &IngestOptions::default(), &mut backend, &StubDecoder).unwrap();

    assert_eq!(
        backend.calls,
        vec![
            "build q=0 cs=Auto".to_owned(),
            "filter min_area=0 cs=Auto".to_owned(),
            "serialize".to_owned(),
        ]
    );
    assert_eq!(backend.source_names, vec!["cities".to_owned()]);
}

#[test]
fn simplify_and_filter_share_the_resolved_coordinate_system() {
    let config = Config {
        files: vec!["tests/fixtures/cities.csv".to_owned()],
        spherical: true,
        quantization: 10000.0,
        simplify_area: Some(0.25),
        ..Config::default()
    };
    let mut backend = RecordingBackend::default();
    run(&config, &IngestOptions::default(), &mut backend, &StubDecoder).unwrap();

    assert_eq!(
        backend.calls,
        vec![
            "build q=10000 cs=Spherical".to_owned(),
            "simplify AreaThreshold(0.25) cs=Spherical".to_owned(),
            "filter min_area=0.25 cs=Spherical".to_owned(),
            "serialize".to_owned(),
        ]
    );
}

#[test]
fn bind_runs_only_when_external_properties_were_joined() {
    let config = Config {
        files: vec!["tests/fixtures/cities.csv".to_owned()],
        external_properties: vec!["tests/fixtures/ratings.csv".into()],
        properties: PropertySpec::List(vec!["pop=+population".to_owned()]),
        ..Config::default()
    };
    let mut backend = RecordingBackend::default();
    run(&config, &IngestOptions::default(), &mut backend, &StubDecoder).unwrap();

    assert_eq!(
        backend.calls,
        vec![
            "build q=0 cs=Auto".to_owned(),
            "filter min_area=0 cs=Auto".to_owned(),
            "bind".to_owned(),
            "serialize".to_owned(),
        ]
    );
    assert_eq!(backend.bound_ids, vec!["7".to_owned(), "8".to_owned()]);
}

#[test]
fn configuration_conflicts_fail_before_any_io() {
    // The input file does not exist; a conflict must surface first.
    let config = Config {
        files: vec!["tests/fixtures/does_not_exist.csv".to_owned()],
        external_properties: vec!["tests/fixtures/also_missing.csv".into()],
        spherical: true,
        cartesian: true,
        ..Config::default()
    };
    let mut backend = RecordingBackend::default();
    let err = run(&config, &IngestOptions::default(), &mut backend, &StubDecoder).unwrap_err();

    assert!(matches!(err, IngestError::Config { .. }));
    assert!(backend.calls.is_empty());
}

#[test]
fn reader_failure_aborts_before_the_backend_runs() {
    let config = Config {
        files: vec![
            "tests/fixtures/cities.csv".to_owned(),
            "tests/fixtures/does_not_exist.csv".to_owned(),
        ],
        ..Config::default()
    };
    let mut backend = RecordingBackend::default();
    let err = run(&config, &IngestOptions::default(), &mut backend, &StubDecoder).unwrap_err();

    assert!(matches!(err, IngestError::Source { .. }));
    // No partial output: the backend never saw the partially populated map.
    assert!(backend.calls.is_empty());
}

#[test]
fn identifier_rules_flow_into_tabular_features() {
    let config = Config {
        files: vec!["tests/fixtures/cities.csv".to_owned()],
        id_properties: Some("name".to_owned()),
        ..Config::default()
    };
    let resolved = config.resolve().unwrap();
    assert_eq!(resolved.id, IdExtractor::parse("name"));

    let mut row = geojson::JsonObject::new();
    row.insert("name".to_owned(), json!("Oslo"));
    assert_eq!(
        resolved.id.row_id(&row),
        Some(geojson::feature::Id::String("Oslo".to_owned()))
    );
}
