//! Submission payload building.
//!
//! The group payload mirrors the resolved tree: containers become nested
//! objects, leaves become arrays with one object per matching child row.

use polars::prelude::DataFrame;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use kobo_ingest::column_value;
use kobo_model::{FAMILY_ID_COLUMN, FieldKind, ID_COLUMN, SubmissionMeta};

use crate::resolve::{GroupNode, LeafGroup, ResolvedGroups};
use crate::values::{format_date, safe_str};

/// The identifying values of one parent row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRecord {
    pub id: String,
    pub family_id: String,
}

impl ParentRecord {
    pub fn from_row(df: &DataFrame, row: usize) -> Self {
        Self {
            id: safe_str(column_value(df, ID_COLUMN, row)),
            family_id: safe_str(column_value(df, FAMILY_ID_COLUMN, row)),
        }
    }
}

/// One object per child row whose filter column equals `parent_id`.
///
/// No matches gives an empty array.
pub fn create_repeat_group_payload(parent_id: &str, group: &LeafGroup) -> Vec<Value> {
    let data = group.data();
    group
        .matching_rows(parent_id)
        .iter()
        .map(|&idx| {
            let entry: Map<String, Value> = group
                .fields()
                .iter()
                .map(|(name, field)| {
                    let cell = column_value(data, &field.column, idx);
                    let rendered = match field.kind {
                        FieldKind::Text => safe_str(cell),
                        FieldKind::Date => format_date(cell),
                    };
                    (name.to_string(), Value::String(rendered))
                })
                .collect();
            Value::Object(entry)
        })
        .collect()
}

/// Build the nested group payload for one parent.
pub fn build_groups_payload(parent_id: &str, groups: &ResolvedGroups) -> Map<String, Value> {
    groups
        .iter()
        .map(|(name, node)| {
            let value = match node {
                GroupNode::Leaf(leaf) => Value::Array(create_repeat_group_payload(parent_id, leaf)),
                GroupNode::Container(children) => {
                    Value::Object(build_groups_payload(parent_id, children))
                }
            };
            (name.to_string(), value)
        })
        .collect()
}

/// A fresh `uuid:`-prefixed instance identifier.
pub fn new_instance_id() -> String {
    format!("uuid:{}", Uuid::new_v4())
}

/// Build the complete submission document for one parent row.
///
/// Group payloads sit next to `ID` and `Family_ID`. Keys are written in this
/// order: `formhub`, `ID`, `Family_ID`, groups, `__version__`, `meta`. A later
/// key with the same name replaces the value but keeps the first position.
pub fn create_payload(
    parent: &ParentRecord,
    groups: &ResolvedGroups,
    meta: &SubmissionMeta,
) -> Value {
    let mut submission = Map::new();
    submission.insert("formhub".to_string(), json!({ "uuid": meta.formhub_uuid }));
    submission.insert(ID_COLUMN.to_string(), Value::String(parent.id.clone()));
    submission.insert(
        FAMILY_ID_COLUMN.to_string(),
        Value::String(parent.family_id.clone()),
    );
    for (name, value) in build_groups_payload(&parent.id, groups) {
        submission.insert(name, value);
    }
    submission.insert(
        "__version__".to_string(),
        Value::String(meta.form_version.clone()),
    );
    submission.insert(
        "meta".to_string(),
        json!({ "instanceID": new_instance_id() }),
    );

    json!({
        "id": meta.project_uuid,
        "submission": submission,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, IntoColumn, NamedFrom, Series};

    #[test]
    fn parent_record_stringifies_missing_keys() {
        let columns: Vec<Column> = vec![
            Series::new("ID".into(), vec![Some("P1"), None]).into_column(),
            Series::new("Family_ID".into(), vec![Some("F1"), Some("F2")]).into_column(),
        ];
        let df = DataFrame::new(columns).unwrap();
        assert_eq!(
            ParentRecord::from_row(&df, 0),
            ParentRecord {
                id: "P1".to_string(),
                family_id: "F1".to_string(),
            }
        );
        assert_eq!(ParentRecord::from_row(&df, 1).id, "");
    }

    #[test]
    fn instance_ids_are_prefixed_uuids() {
        let id = new_instance_id();
        let uuid = id.strip_prefix("uuid:").unwrap();
        assert!(Uuid::parse_str(uuid).is_ok());
    }
}
