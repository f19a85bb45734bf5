//! Declarative identifier and property-transform rules.
//!
//! Both rule kinds are parsed from comma-separated specifier strings into small
//! data-carrying rule structs, then interpreted per record:
//!
//! - Identifier specifiers: ordered property names, each optionally prefixed with
//!   the numeric-coercion sigil `+`. The first specifier producing a usable value
//!   wins (short-circuit precedence).
//! - Property-transform specifiers: `target`, `target=source`, `target=+source`,
//!   or `+source`. The compiled table renames and optionally numeric-coerces
//!   matching properties; keys without a rule are dropped.

use std::collections::HashMap;

use geojson::feature::Id;
use geojson::{Feature, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// One identifier rule: a property name plus its coercion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRule {
    /// Property to read.
    pub key: String,
    /// Whether the value is coerced to a number (`+` sigil).
    pub numeric: bool,
}

/// Compiled identifier rules, evaluated in listed order per record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdExtractor {
    /// No identifier configuration: a record's own `id` field is used.
    #[default]
    RecordId,
    /// Ordered precedence list over a record's properties.
    Properties(Vec<IdRule>),
}

impl IdExtractor {
    /// Parse a comma-separated identifier specifier list.
    ///
    /// An empty specifier falls back to [`IdExtractor::RecordId`].
    pub fn parse(specifier: &str) -> Self {
        let rules: Vec<IdRule> = specifier
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.strip_prefix('+') {
                Some(key) => IdRule {
                    key: key.to_owned(),
                    numeric: true,
                },
                None => IdRule {
                    key: entry.to_owned(),
                    numeric: false,
                },
            })
            .collect();

        if rules.is_empty() {
            Self::RecordId
        } else {
            Self::Properties(rules)
        }
    }

    /// Evaluate against a raw row mapping (tabular input).
    ///
    /// In [`IdExtractor::RecordId`] mode the row's `id` column is the identifier.
    pub fn row_id(&self, row: &JsonObject) -> Option<Id> {
        match self {
            Self::RecordId => row.get("id").and_then(|v| usable_id_value(v, false)),
            Self::Properties(rules) => self.from_properties(row),
        }
    }

    /// Evaluate against an already-built feature.
    ///
    /// In [`IdExtractor::RecordId`] mode the feature's own `id` is returned.
    pub fn feature_id(&self, feature: &Feature) -> Option<Id> {
        match self {
            Self::RecordId => feature.id.clone(),
            Self::Properties(_) => feature
                .properties
                .as_ref()
                .and_then(|props| self.from_properties(props)),
        }
    }

    fn from_properties(&self, properties: &JsonObject) -> Option<Id> {
        let Self::Properties(rules) = self else {
            return None;
        };
        rules.iter().find_map(|rule| {
            properties
                .get(&rule.key)
                .and_then(|v| usable_id_value(v, rule.numeric))
        })
    }
}

/// Coerce a raw property value into an identifier, or report it unusable.
///
/// Null values are skipped; numeric coercion that yields NaN counts as absent;
/// values that are neither numeric nor string are coerced to their string form.
fn usable_id_value(value: &JsonValue, numeric: bool) -> Option<Id> {
    if value.is_null() {
        return None;
    }
    if numeric {
        // Number::from_f64 rejects NaN and infinities, so a failed coercion
        // falls through to the next rule.
        return coerce_f64(value)
            .and_then(serde_json::Number::from_f64)
            .map(Id::Number);
    }
    match value {
        JsonValue::Number(n) => Some(Id::Number(n.clone())),
        JsonValue::String(s) => Some(Id::String(s.clone())),
        other => Some(Id::String(other.to_string())),
    }
}

/// Numeric coercion shared by identifier and transform rules.
fn coerce_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Which properties survive into the output, as configured.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertySpec {
    /// Preserve nothing (default).
    #[default]
    None,
    /// Preserve everything unchanged.
    All,
    /// Preserve the listed properties, with optional renaming and coercion.
    List(Vec<String>),
}

/// One compiled transform rule: output key plus coercion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRule {
    /// Destination property name.
    pub target: String,
    /// Whether the value is coerced to a number (`+` sigil).
    pub numeric: bool,
}

/// Compiled property transforms, dispatched by source property name.
///
/// The two sentinel modes bypass rule tables entirely; only
/// [`PropertyTransforms::Select`] carries a compiled table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyTransforms {
    /// Every property is dropped; `apply` always reports no write.
    #[default]
    None,
    /// Every property is copied verbatim.
    All,
    /// Properties matching the table are renamed/coerced; others are dropped.
    Select(HashMap<String, PropertyRule>),
}

impl PropertyTransforms {
    /// Compile a [`PropertySpec`] into a dispatchable transform.
    pub fn compile(specifier: &PropertySpec) -> Self {
        match specifier {
            PropertySpec::None => Self::None,
            PropertySpec::All => Self::All,
            PropertySpec::List(entries) => {
                let mut table = HashMap::with_capacity(entries.len());
                for entry in entries {
                    let (source, rule) = compile_entry(entry);
                    table.insert(source, rule);
                }
                Self::Select(table)
            }
        }
    }

    /// Apply the transform for one source property.
    ///
    /// Writes the possibly-renamed, possibly-coerced value into `target` and
    /// returns `true`; when no rule matches (or the raw value is null for a
    /// table rule) nothing is written and `false` is returned. The no-op is
    /// designed behavior, not an error.
    pub fn apply(&self, target: &mut JsonObject, key: &str, value: &JsonValue) -> bool {
        match self {
            Self::None => false,
            Self::All => {
                target.insert(key.to_owned(), value.clone());
                true
            }
            Self::Select(table) => {
                let Some(rule) = table.get(key) else {
                    return false;
                };
                if value.is_null() {
                    return false;
                }
                let out = if rule.numeric {
                    // A non-coercible value becomes JSON null, the closest JSON
                    // rendition of NaN.
                    coerce_f64(value)
                        .and_then(serde_json::Number::from_f64)
                        .map_or(JsonValue::Null, JsonValue::Number)
                } else {
                    value.clone()
                };
                target.insert(rule.target.clone(), out);
                true
            }
        }
    }
}

/// Parse one `target[=[+]source]` / `+source` specifier entry.
fn compile_entry(entry: &str) -> (String, PropertyRule) {
    let (explicit_target, source) = match entry.split_once('=') {
        Some((target, source)) => (Some(target), source),
        None => (None, entry),
    };
    let (numeric, source) = match source.strip_prefix('+') {
        Some(stripped) => (true, stripped),
        None => (false, source),
    };
    let target = explicit_target
        .filter(|t| !t.is_empty())
        .unwrap_or(source)
        .to_owned();
    (source.to_owned(), PropertyRule { target, numeric })
}

#[cfg(test)]
mod tests {
    use geojson::feature::Id;
    use geojson::{JsonObject, JsonValue};
    use serde_json::json;

    use super::{IdExtractor, PropertySpec, PropertyTransforms};

    fn props(pairs: &[(&str, JsonValue)]) -> JsonObject {
        let mut map = JsonObject::new();
        for (k, v) in pairs {
            map.insert((*k).to_owned(), v.clone());
        }
        map
    }

    #[test]
    fn first_usable_specifier_wins() {
        let id = IdExtractor::parse("fips,name");
        let row = props(&[("fips", json!("06")), ("name", json!("California"))]);
        assert_eq!(id.row_id(&row), Some(Id::String("06".to_owned())));
    }

    #[test]
    fn numeric_nan_is_skipped_in_precedence_order() {
        let id = IdExtractor::parse("+code,name");
        let row = props(&[("code", json!("abc")), ("name", json!("X"))]);
        assert_eq!(id.row_id(&row), Some(Id::String("X".to_owned())));
    }

    #[test]
    fn numeric_sigil_coerces_strings() {
        let id = IdExtractor::parse("+code");
        let row = props(&[("code", json!("42"))]);
        assert_eq!(
            id.row_id(&row),
            Some(Id::Number(serde_json::Number::from_f64(42.0).unwrap()))
        );
    }

    #[test]
    fn default_extractor_reads_the_id_column() {
        let id = IdExtractor::parse("");
        let row = props(&[("id", json!("7")), ("name", json!("X"))]);
        assert_eq!(id.row_id(&row), Some(Id::String("7".to_owned())));
        assert_eq!(id.row_id(&props(&[("name", json!("X"))])), None);
    }

    #[test]
    fn non_string_non_numeric_values_are_stringified() {
        let id = IdExtractor::parse("flag");
        let row = props(&[("flag", json!(true))]);
        assert_eq!(id.row_id(&row), Some(Id::String("true".to_owned())));
    }

    #[test]
    fn transform_renames_and_coerces() {
        let transforms =
            PropertyTransforms::compile(&PropertySpec::List(vec!["pop=+population".to_owned()]));
        let mut out = JsonObject::new();
        assert!(transforms.apply(&mut out, "population", &json!("1200")));
        assert_eq!(out.get("pop"), Some(&json!(1200.0)));
    }

    #[test]
    fn transform_is_a_noop_for_null_and_unmatched_keys() {
        let transforms =
            PropertyTransforms::compile(&PropertySpec::List(vec!["pop=+population".to_owned()]));
        let mut out = JsonObject::new();
        assert!(!transforms.apply(&mut out, "population", &JsonValue::Null));
        assert!(!transforms.apply(&mut out, "area", &json!("10")));
        assert!(out.is_empty());
    }

    #[test]
    fn bare_plus_entry_defaults_target_to_stripped_source() {
        let transforms =
            PropertyTransforms::compile(&PropertySpec::List(vec!["+density".to_owned()]));
        let mut out = JsonObject::new();
        assert!(transforms.apply(&mut out, "density", &json!("3.5")));
        assert_eq!(out.get("density"), Some(&json!(3.5)));
    }

    #[test]
    fn sentinel_modes_bypass_the_table() {
        let none = PropertyTransforms::compile(&PropertySpec::None);
        let all = PropertyTransforms::compile(&PropertySpec::All);
        let mut out = JsonObject::new();
        assert!(!none.apply(&mut out, "name", &json!("X")));
        assert!(out.is_empty());
        assert!(all.apply(&mut out, "name", &json!("X")));
        assert_eq!(out.get("name"), Some(&json!("X")));
    }
}
