//! Record datasets and the selections that feed the layout engine.

mod parse;
mod select;

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::layout::GroupSeed;

pub use parse::{DatasetOptions, load_dataset, parse_dataset};
pub use select::{Filter, Selection};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dataset JSON")]
    Json(#[from] serde_json::Error),

    #[error("dataset must be an array of records or an object with a `nodes` array")]
    Shape,

    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("record {index} has no usable `{field}` value")]
    MissingId { index: usize, field: String },

    #[error("invalid filter `{0}`, expected attribute=value[,value...]")]
    InvalidFilter(String),
}

/// One entity of the dataset with its raw attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub id: String,
    pub size: f32,
    pub attributes: Map<String, Value>,
}

impl Record {
    /// Values of an attribute as strings. Arrays contribute each scalar
    /// element; null and missing attributes contribute nothing.
    pub fn attribute_values(&self, attribute: &str) -> Vec<String> {
        match self.attributes.get(attribute) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
            Some(value) => scalar_text(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Scalar attributes in key order, for tooltips.
    pub fn display_attributes(&self) -> impl Iterator<Item = (&str, String)> {
        self.attributes.iter().filter_map(|(key, value)| match value {
            Value::Array(items) => {
                let joined = items.iter().filter_map(scalar_text).collect::<Vec<_>>();
                (!joined.is_empty()).then(|| (key.as_str(), joined.join(", ")))
            }
            other => scalar_text(other).map(|text| (key.as_str(), text)),
        })
    }
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<Record>,
    /// Groups listed by the file itself, used when no attribute grouping is
    /// requested.
    groups: Vec<GroupSeed>,
    index_by_id: HashMap<String, usize>,
}

impl Dataset {
    pub fn new(records: Vec<Record>, groups: Vec<GroupSeed>) -> Self {
        let mut index_by_id = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            index_by_id.entry(record.id.clone()).or_insert(index);
        }

        Self {
            records,
            groups,
            index_by_id,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn groups(&self) -> &[GroupSeed] {
        &self.groups
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.records.get(index))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every attribute key present on at least one record, sorted.
    pub fn attribute_names(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|record| record.attributes.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One group per distinct value of `attribute`, in order of first
    /// appearance. A record joins every group its value list names.
    pub fn group_by(&self, attribute: &str) -> Vec<GroupSeed> {
        let mut groups: Vec<GroupSeed> = Vec::new();
        let mut slot_by_value: HashMap<String, usize> = HashMap::new();

        for record in &self.records {
            for value in record.attribute_values(attribute) {
                let slot = *slot_by_value.entry(value.clone()).or_insert_with(|| {
                    groups.push(GroupSeed::new(value, Vec::<String>::new()));
                    groups.len() - 1
                });
                let members = &mut groups[slot].members;
                if members.last() != Some(&record.id) {
                    members.push(record.id.clone());
                }
            }
        }

        groups
    }

    /// Distinct values of `attribute` in order of first appearance.
    pub fn distinct_values(&self, attribute: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .flat_map(|record| record.attribute_values(attribute))
            .filter(|value| seen.insert(value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(id: &str, attributes: Value) -> Record {
        let Value::Object(attributes) = attributes else {
            panic!("fixture attributes must be an object");
        };
        Record {
            id: id.to_owned(),
            size: 0.0,
            attributes,
        }
    }

    fn faculty() -> Dataset {
        Dataset::new(
            vec![
                record(
                    "ana",
                    json!({ "areas": ["ml", "vision"], "degree": "PhD", "papers": 4 }),
                ),
                record("ben", json!({ "areas": ["systems"], "degree": "MSc" })),
                record("cruz", json!({ "areas": ["vision", "ml", "ml"], "degree": "PhD" })),
                record("dee", json!({ "areas": null, "degree": "BSc" })),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn duplicate_ids_resolve_to_first_record() {
        let dataset = Dataset::new(
            vec![
                record("ana", json!({ "degree": "PhD" })),
                record("ana", json!({ "degree": "MSc" })),
            ],
            Vec::new(),
        );

        assert_eq!(dataset.record("ana").unwrap().attributes["degree"], "PhD");
    }

    #[test]
    fn group_by_keeps_first_appearance_order() {
        let groups = faculty().group_by("areas");
        let names = groups.iter().map(|group| group.name.as_str()).collect::<Vec<_>>();

        assert_eq!(names, ["ml", "vision", "systems"]);
        assert_eq!(groups[0].members, ["ana", "cruz"]);
        assert_eq!(groups[1].members, ["ana", "cruz"]);
        assert_eq!(groups[2].members, ["ben"]);
    }

    #[test]
    fn group_by_scalar_attribute() {
        let groups = faculty().group_by("degree");
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].name, "PhD");
        assert_eq!(groups[0].members, ["ana", "cruz"]);
    }

    #[test]
    fn distinct_values_are_unique() {
        assert_eq!(faculty().distinct_values("degree"), ["PhD", "MSc", "BSc"]);
        assert!(faculty().distinct_values("missing").is_empty());
    }

    #[test]
    fn attribute_names_are_sorted_union() {
        assert_eq!(faculty().attribute_names(), ["areas", "degree", "papers"]);
    }

    #[test]
    fn display_attributes_join_arrays_and_skip_nulls() {
        let dataset = faculty();
        let ana = dataset.record("ana").unwrap();
        let shown = ana.display_attributes().collect::<Vec<_>>();
        assert!(shown.contains(&("areas", "ml, vision".to_owned())));
        assert!(shown.contains(&("papers", "4".to_owned())));

        let dee = dataset.record("dee").unwrap();
        assert!(dee.display_attributes().all(|(key, _)| key != "areas"));
    }
}
