use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use eframe::egui::Vec2;
use tracing::debug;

use crate::layout::{GroupSeed, NodeSeed};

use super::{Dataset, DatasetError, Record};

/// Keeps records whose attribute takes one of the listed values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub attribute: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new<I, S>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses `attribute=value1,value2`. An empty value list is accepted
    /// and matches nothing.
    pub fn parse(raw: &str) -> Result<Self, DatasetError> {
        let (attribute, values) = raw
            .split_once('=')
            .ok_or_else(|| DatasetError::InvalidFilter(raw.to_owned()))?;
        let attribute = attribute.trim();
        if attribute.is_empty() {
            return Err(DatasetError::InvalidFilter(raw.to_owned()));
        }

        Ok(Self::new(
            attribute,
            values
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty()),
        ))
    }

    pub fn matches(&self, record: &Record) -> bool {
        record
            .attribute_values(&self.attribute)
            .iter()
            .any(|value| self.values.contains(value))
    }
}

impl FromStr for Filter {
    type Err = DatasetError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

/// How a dataset is turned into engine input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Attribute to derive groups from. `None` uses the file's own groups.
    pub group_by: Option<String>,
    pub filter: Option<Filter>,
}

impl Dataset {
    /// Builds a consistent node and group set for the engine.
    ///
    /// Group members are restricted to surviving records and groups left
    /// empty are dropped. Nodes found in `prior` start where they were.
    pub fn select(
        &self,
        selection: &Selection,
        prior: &HashMap<String, Vec2>,
    ) -> (Vec<NodeSeed>, Vec<GroupSeed>) {
        let kept = self
            .records()
            .iter()
            .filter(|record| {
                selection
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(record))
            })
            .collect::<Vec<_>>();
        let kept_ids = kept
            .iter()
            .map(|record| record.id.as_str())
            .collect::<HashSet<_>>();

        let nodes = kept
            .iter()
            .map(|record| {
                let seed = NodeSeed::new(record.id.clone(), record.size);
                match prior.get(&record.id) {
                    Some(&position) => seed.at(position),
                    None => seed,
                }
            })
            .collect::<Vec<_>>();

        let source = match &selection.group_by {
            Some(attribute) => self.group_by(attribute),
            None => self.groups().to_vec(),
        };
        let groups = source
            .into_iter()
            .filter_map(|mut group| {
                group
                    .members
                    .retain(|member| kept_ids.contains(member.as_str()));
                (!group.members.is_empty()).then_some(group)
            })
            .collect::<Vec<_>>();

        debug!(
            nodes = nodes.len(),
            groups = groups.len(),
            group_by = selection.group_by.as_deref().unwrap_or("<file>"),
            "selection built"
        );
        (nodes, groups)
    }
}
