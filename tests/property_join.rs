use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

use geo_ingest::join::{PropertyTable, join_external};
use geo_ingest::rules::{PropertySpec, PropertyTransforms};
use geo_ingest::IngestError;

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("geo-ingest-join-{nanos}-{name}"))
}

fn select(entries: &[&str]) -> PropertyTransforms {
    PropertyTransforms::compile(&PropertySpec::List(
        entries.iter().map(|s| (*s).to_owned()).collect(),
    ))
}

#[test]
fn join_renames_and_coerces_matching_columns() {
    let transforms = select(&["pop=+population", "name"]);
    let mut table = PropertyTable::default();
    join_external(&["tests/fixtures/ratings.csv"], &transforms, &mut table).unwrap();

    assert_eq!(table.len(), 2);
    let seven = table.get("7").unwrap();
    assert_eq!(seven.get("pop"), Some(&json!(1200.0)));
    assert_eq!(seven.get("name"), Some(&json!("Alpha")));

    // Row 8 has an empty population cell: null source, designed no-op.
    let eight = table.get("8").unwrap();
    assert!(!eight.contains_key("pop"));
    assert_eq!(eight.get("name"), Some(&json!("Beta")));
}

#[test]
fn rows_sharing_an_id_merge_additively_across_files() {
    let transforms = select(&["pop=+population", "name", "+area"]);
    let mut table = PropertyTable::default();
    join_external(
        &["tests/fixtures/ratings.csv", "tests/fixtures/extra.tsv"],
        &transforms,
        &mut table,
    )
    .unwrap();

    let seven = table.get("7").unwrap();
    assert_eq!(seven.get("pop"), Some(&json!(1200.0)));
    assert_eq!(seven.get("name"), Some(&json!("Alpha")));
    assert_eq!(seven.get("area"), Some(&json!(10.5)));
}

#[test]
fn ambiguous_extension_uses_tab_presence_of_file_contents() {
    let path = tmp_file("sidecar");
    std::fs::write(&path, "id\tscore\n7\t9.5\n").unwrap();

    let transforms = select(&["+score"]);
    let mut table = PropertyTable::default();
    join_external(&[&path], &transforms, &mut table).unwrap();

    assert_eq!(table.get("7").unwrap().get("score"), Some(&json!(9.5)));

    std::fs::remove_file(&path).ok();
}

#[test]
fn preserve_all_copies_every_column_verbatim() {
    let transforms = PropertyTransforms::compile(&PropertySpec::All);
    let mut table = PropertyTable::default();
    join_external(&["tests/fixtures/ratings.csv"], &transforms, &mut table).unwrap();

    let seven = table.get("7").unwrap();
    assert_eq!(seven.get("population"), Some(&json!("1200")));
    assert_eq!(seven.get("name"), Some(&json!("Alpha")));
}

#[test]
fn missing_id_column_is_malformed() {
    let path = tmp_file("noid.csv");
    std::fs::write(&path, "code,name\n7,Alpha\n").unwrap();

    let mut table = PropertyTable::default();
    let err = join_external(&[&path], &PropertyTransforms::All, &mut table).unwrap_err();
    let IngestError::Source { source, .. } = err else {
        panic!("expected a source error");
    };
    assert!(matches!(*source, IngestError::Malformed { .. }));

    std::fs::remove_file(&path).ok();
}
