//! Repeat-group configuration types.
//!
//! A repeat-group node is either a leaf (it names a `data_path`) or a
//! container of further nodes. Only leaves are typed here; containers stay as
//! raw JSON objects so that the resolver can walk arbitrary nesting and report
//! malformed entries instead of failing the whole config.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Key whose presence marks a node as a leaf group.
pub const LEAF_MARKER: &str = "data_path";

/// Child column matched against the parent `ID` when a leaf names none.
pub const DEFAULT_FILTER_COLUMN: &str = "Parent_ID";

/// Parent column holding the submission identifier.
pub const ID_COLUMN: &str = "ID";

/// Parent column holding the family/household identifier.
pub const FAMILY_ID_COLUMN: &str = "Family_ID";

/// Group name used for the legacy single child table.
pub const LEGACY_GROUP_NAME: &str = "repeat_group";

/// How a source value is rendered into the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Date,
}

/// One output field of a leaf group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawFieldSpec")]
pub struct FieldSpec {
    /// Source column in the child table.
    pub column: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn text(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: FieldKind::Text,
        }
    }

    pub fn date(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: FieldKind::Date,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldSpec {
    Column(String),
    Detailed {
        column: String,
        #[serde(default, rename = "type")]
        kind: FieldKind,
    },
}

impl From<RawFieldSpec> for FieldSpec {
    fn from(raw: RawFieldSpec) -> Self {
        match raw {
            RawFieldSpec::Column(column) => Self::text(column),
            RawFieldSpec::Detailed { column, kind } => Self { column, kind },
        }
    }
}

/// Ordered mapping of output field name to source field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(Vec<(String, FieldSpec)>);

impl FieldMap {
    pub fn new(entries: Vec<(String, FieldSpec)>) -> Self {
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Source columns referenced by the mapping, in mapping order.
    pub fn source_columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, spec)| spec.column.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a mapping of output field names to source columns")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, spec)) = access.next_entry::<String, FieldSpec>()? {
                    if entries.iter().any(|(existing, _)| existing == &name) {
                        return Err(de::Error::custom(format!("duplicate field '{name}'")));
                    }
                    entries.push((name, spec));
                }
                Ok(FieldMap(entries))
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// A leaf group as written in the config, before its table is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeafSpec {
    pub data_path: PathBuf,
    #[serde(default)]
    filter_column: Option<String>,
    pub fields: FieldMap,
}

impl LeafSpec {
    pub fn new(data_path: impl Into<PathBuf>, filter_column: Option<String>, fields: FieldMap) -> Self {
        Self {
            data_path: data_path.into(),
            filter_column,
            fields,
        }
    }

    /// Parse a leaf node from its raw JSON value.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// The legacy child table layout: Name, Age and Gender keyed on `Parent_ID`.
    pub fn legacy(data_path: &Path) -> Self {
        let fields = ["Name", "Age", "Gender"]
            .into_iter()
            .map(|name| (name.to_string(), FieldSpec::text(name)))
            .collect();
        Self::new(data_path, None, FieldMap::new(fields))
    }

    pub fn filter_column(&self) -> &str {
        self.filter_column
            .as_deref()
            .unwrap_or(DEFAULT_FILTER_COLUMN)
    }
}

/// Whether a raw config node is a leaf group.
///
/// Only the marker key is consulted, so a container that happens to define a
/// `data_path` entry is treated as a leaf.
pub fn is_leaf_node(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key(LEAF_MARKER))
}
