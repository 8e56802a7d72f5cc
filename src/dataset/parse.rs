use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::layout::GroupSeed;

use super::{Dataset, DatasetError, Record, scalar_text};

const FALLBACK_ID_FIELD: &str = "name";

/// Which record attributes carry identity and size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetOptions {
    pub id_field: String,
    pub size_field: String,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            id_field: "id".to_owned(),
            size_field: "research_papers".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    name: String,
    #[serde(default)]
    members: Vec<Value>,
}

pub fn load_dataset(path: &Path, options: &DatasetOptions) -> Result<Dataset, DatasetError> {
    let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_dataset(&raw, options)?;

    info!(
        path = %path.display(),
        records = dataset.len(),
        groups = dataset.groups().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Parses either `{ "nodes": [...], "groups": [...] }` or a bare array of
/// records.
pub fn parse_dataset(raw: &str, options: &DatasetOptions) -> Result<Dataset, DatasetError> {
    let parsed: Value = serde_json::from_str(raw)?;

    let (raw_records, raw_groups) = match parsed {
        Value::Array(records) => (records, Vec::new()),
        Value::Object(mut object) => {
            let Some(Value::Array(records)) = object.remove("nodes") else {
                return Err(DatasetError::Shape);
            };
            let groups = match object.remove("groups") {
                Some(value @ Value::Array(_)) => Vec::<RawGroup>::deserialize(value)?,
                Some(Value::Null) | None => Vec::new(),
                Some(_) => return Err(DatasetError::Shape),
            };
            (records, groups)
        }
        _ => return Err(DatasetError::Shape),
    };

    let mut records = Vec::with_capacity(raw_records.len());
    let mut seen = HashSet::with_capacity(raw_records.len());
    for (index, value) in raw_records.into_iter().enumerate() {
        let Value::Object(attributes) = value else {
            return Err(DatasetError::NotAnObject { index });
        };

        let id = attributes
            .get(&options.id_field)
            .and_then(scalar_text)
            .or_else(|| attributes.get(FALLBACK_ID_FIELD).and_then(scalar_text))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DatasetError::MissingId {
                index,
                field: options.id_field.clone(),
            })?;

        if !seen.insert(id.clone()) {
            warn!(id = %id, index, "duplicate record id, keeping the first");
            continue;
        }

        let size = attributes
            .get(&options.size_field)
            .and_then(Value::as_f64)
            .filter(|size| size.is_finite())
            .unwrap_or(0.0) as f32;

        records.push(Record {
            id,
            size,
            attributes,
        });
    }

    let groups = raw_groups
        .into_iter()
        .map(|group| {
            GroupSeed::new(
                group.name,
                group.members.iter().filter_map(scalar_text),
            )
        })
        .collect();

    Ok(Dataset::new(records, groups))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_nodes_and_groups_object() {
        let dataset = parse_dataset(
            r#"{
                "nodes": [
                    { "id": "a", "research_papers": 12 },
                    { "id": "b", "research_papers": "many" },
                    { "id": 7 }
                ],
                "groups": [{ "name": "G", "members": ["a", 7, "ghost"] }]
            }"#,
            &DatasetOptions::default(),
        )
        .unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.record("a").unwrap().size, 12.0);
        assert_eq!(dataset.record("b").unwrap().size, 0.0);
        assert!(dataset.record("7").is_some());
        assert_eq!(dataset.groups()[0].members, ["a", "7", "ghost"]);
    }

    #[test]
    fn bare_array_falls_back_to_name() {
        let dataset = parse_dataset(
            r#"[{ "name": "Ada", "papers": 3 }, { "name": "Bo" }]"#,
            &DatasetOptions {
                size_field: "papers".to_owned(),
                ..DatasetOptions::default()
            },
        )
        .unwrap();

        assert_eq!(dataset.records()[0].id, "Ada");
        assert_eq!(dataset.records()[0].size, 3.0);
        assert!(dataset.groups().is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let dataset = parse_dataset(
            r#"[{ "id": "a", "research_papers": 1 }, { "id": "a", "research_papers": 9 }]"#,
            &DatasetOptions::default(),
        )
        .unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.record("a").unwrap().size, 1.0);
    }

    #[test]
    fn rejects_records_without_identity() {
        let error = parse_dataset(r#"[{ "id": "a" }, { "title": "x" }]"#, &DatasetOptions::default())
            .unwrap_err();
        assert!(matches!(error, DatasetError::MissingId { index: 1, .. }));
    }

    #[test]
    fn rejects_unexpected_shapes() {
        let options = DatasetOptions::default();
        assert!(matches!(
            parse_dataset(r#"{ "records": [] }"#, &options),
            Err(DatasetError::Shape)
        ));
        assert!(matches!(
            parse_dataset("42", &options),
            Err(DatasetError::Shape)
        ));
        assert!(matches!(
            parse_dataset("[1, 2]", &options),
            Err(DatasetError::NotAnObject { index: 0 })
        ));
        assert!(matches!(
            parse_dataset("{ nodes", &options),
            Err(DatasetError::Json(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "id": "a" }}]"#).unwrap();

        let dataset = load_dataset(file.path(), &DatasetOptions::default()).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let error = load_dataset(&path, &DatasetOptions::default()).unwrap_err();
        assert!(matches!(error, DatasetError::Io { .. }));
        assert!(error.to_string().contains("absent.json"));
    }
}
