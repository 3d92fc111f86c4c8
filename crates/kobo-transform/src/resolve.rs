//! Repeat-group configuration resolution.
//!
//! Walks the raw `repeat_groups` tree, loads every leaf's table and keeps the
//! nesting of containers. Problems never fail the run: the offending branch
//! is omitted, logged and returned as a [`ResolveIssue`].

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use polars::prelude::DataFrame;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

use kobo_ingest::{IngestError, TableLoader, any_to_string_non_missing, missing_columns};
use kobo_model::{FieldMap, LEGACY_GROUP_NAME, LeafSpec, is_leaf_node};

/// A leaf group with its child table loaded and indexed by filter value.
#[derive(Debug, Clone)]
pub struct LeafGroup {
    data: DataFrame,
    filter_column: String,
    fields: FieldMap,
    rows_by_key: HashMap<String, Vec<usize>>,
}

impl LeafGroup {
    /// Attach a loaded table to a leaf spec.
    ///
    /// The table must carry the filter column and every mapped column.
    pub fn new(spec: LeafSpec, data: DataFrame) -> Result<Self, ResolveIssueKind> {
        let filter_column = spec.filter_column().to_string();
        let required = std::iter::once(filter_column.as_str()).chain(spec.fields.source_columns());
        let missing = missing_columns(&data, required);
        if !missing.is_empty() {
            return Err(ResolveIssueKind::MissingColumns(missing));
        }

        let mut rows_by_key: HashMap<String, Vec<usize>> = HashMap::new();
        let column = data
            .column(&filter_column)
            .map_err(|e| ResolveIssueKind::InvalidLeaf(e.to_string()))?;
        for idx in 0..data.height() {
            let Some(key) = column.get(idx).ok().and_then(any_to_string_non_missing) else {
                continue;
            };
            rows_by_key.entry(key).or_default().push(idx);
        }

        Ok(Self {
            data,
            filter_column,
            fields: spec.fields,
            rows_by_key,
        })
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn filter_column(&self) -> &str {
        &self.filter_column
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Row indices whose filter value equals `key`, in table order.
    pub fn matching_rows(&self, key: &str) -> &[usize] {
        self.rows_by_key.get(key).map_or(&[], Vec::as_slice)
    }
}

/// One node of the resolved repeat-group tree.
#[derive(Debug, Clone)]
pub enum GroupNode {
    Leaf(LeafGroup),
    Container(ResolvedGroups),
}

/// Resolved groups in configuration key order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGroups {
    entries: Vec<(String, GroupNode)>,
}

impl ResolvedGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, node: GroupNode) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = node,
            None => self.entries.push((name, node)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&GroupNode> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, node)| node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GroupNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of leaf groups at any depth.
    pub fn leaf_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, node)| match node {
                GroupNode::Leaf(_) => 1,
                GroupNode::Container(children) => children.leaf_count(),
            })
            .sum()
    }
}

/// Why a branch of the config was dropped.
#[derive(Debug, Error)]
pub enum ResolveIssueKind {
    #[error("failed to load repeat group data: {0}")]
    Load(#[source] IngestError),

    #[error("invalid leaf configuration: {0}")]
    InvalidLeaf(String),

    #[error("missing column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("expected an object, found {0}")]
    InvalidShape(&'static str),

    #[error("container has no valid groups")]
    EmptyContainer,
}

/// A dropped branch, identified by its dotted key path.
#[derive(Debug)]
pub struct ResolveIssue {
    pub path: String,
    pub kind: ResolveIssueKind,
}

impl fmt::Display for ResolveIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

impl std::error::Error for ResolveIssue {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Outcome of resolving a `repeat_groups` tree.
#[derive(Debug, Default)]
pub struct Resolution {
    pub groups: ResolvedGroups,
    pub issues: Vec<ResolveIssue>,
}

/// Resolve a raw `repeat_groups` tree, loading each leaf through `loader`.
pub fn resolve_repeat_groups<L>(config: &Map<String, Value>, loader: &L) -> Resolution
where
    L: TableLoader + ?Sized,
{
    let mut issues = Vec::new();
    let groups = resolve_level(config, "", loader, &mut issues);
    debug!(
        groups = groups.len(),
        leaves = groups.leaf_count(),
        issues = issues.len(),
        "resolved repeat groups"
    );
    Resolution { groups, issues }
}

/// Build the single `repeat_group` leaf used when no tree is configured.
pub fn resolve_legacy_group<L>(path: &Path, loader: &L) -> Result<ResolvedGroups, ResolveIssue>
where
    L: TableLoader + ?Sized,
{
    let issue = |kind| ResolveIssue {
        path: LEGACY_GROUP_NAME.to_string(),
        kind,
    };
    let data = loader
        .load(path)
        .map_err(|e| issue(ResolveIssueKind::Load(e)))?;
    let leaf = LeafGroup::new(LeafSpec::legacy(path), data).map_err(issue)?;
    let mut groups = ResolvedGroups::new();
    groups.insert(LEGACY_GROUP_NAME, GroupNode::Leaf(leaf));
    Ok(groups)
}

fn resolve_level<L>(
    config: &Map<String, Value>,
    prefix: &str,
    loader: &L,
    issues: &mut Vec<ResolveIssue>,
) -> ResolvedGroups
where
    L: TableLoader + ?Sized,
{
    let mut resolved = ResolvedGroups::new();
    for (key, value) in config {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        let Some(object) = value.as_object() else {
            warn!(group = %path, "skipping invalid repeat group configuration");
            issues.push(ResolveIssue {
                path,
                kind: ResolveIssueKind::InvalidShape(json_kind(value)),
            });
            continue;
        };

        if is_leaf_node(value) {
            match resolve_leaf(value, loader) {
                Ok(leaf) => resolved.insert(key.clone(), GroupNode::Leaf(leaf)),
                Err(kind) => {
                    error!(group = %path, error = %kind, "failed to load repeat group");
                    issues.push(ResolveIssue { path, kind });
                }
            }
            continue;
        }

        let nested = resolve_level(object, &path, loader, issues);
        if nested.is_empty() {
            debug!(group = %path, "omitting empty repeat group container");
            issues.push(ResolveIssue {
                path,
                kind: ResolveIssueKind::EmptyContainer,
            });
        } else {
            resolved.insert(key.clone(), GroupNode::Container(nested));
        }
    }
    resolved
}

fn resolve_leaf<L>(value: &Value, loader: &L) -> Result<LeafGroup, ResolveIssueKind>
where
    L: TableLoader + ?Sized,
{
    let spec =
        LeafSpec::from_value(value).map_err(|e| ResolveIssueKind::InvalidLeaf(e.to_string()))?;
    let data = loader.load(&spec.data_path).map_err(ResolveIssueKind::Load)?;
    LeafGroup::new(spec, data)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
