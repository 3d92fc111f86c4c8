//! Tests for submission payload building.

use std::collections::HashSet;

use kobo_model::{FieldMap, FieldSpec, LeafSpec, SubmissionMeta};
use kobo_transform::{
    GroupNode, LeafGroup, ParentRecord, ResolvedGroups, build_groups_payload, create_payload,
    format_date, safe_str,
};
use polars::prelude::{AnyValue, Column, DataFrame, IntoColumn, NamedFrom, Series};
use proptest::prelude::*;
use serde_json::{Value, json};

fn frame(columns: Vec<Column>) -> DataFrame {
    DataFrame::new(columns).expect("frame")
}

fn col(name: &str, values: &[Option<&str>]) -> Column {
    Series::new(name.into(), values.to_vec()).into_column()
}

fn fields(entries: &[(&str, FieldSpec)]) -> FieldMap {
    FieldMap::new(
        entries
            .iter()
            .map(|(name, spec)| ((*name).to_string(), spec.clone()))
            .collect(),
    )
}

fn leaf(data: DataFrame, fields: FieldMap) -> GroupNode {
    let spec = LeafSpec::new("child.csv", None, fields);
    GroupNode::Leaf(LeafGroup::new(spec, data).expect("leaf"))
}

fn children() -> DataFrame {
    frame(vec![
        col("Parent_ID", &[Some("P1"), Some("P2"), Some("P1")]),
        col("Name", &[Some("Amina"), Some("Omar"), None]),
        col("Age", &[Some("7"), Some("9"), Some("3")]),
        col("DOB", &[Some("15/01/2017"), Some("2015-03-02"), Some("unknown")]),
    ])
}

fn meta() -> SubmissionMeta {
    SubmissionMeta {
        project_uuid: "proj-123".to_string(),
        formhub_uuid: "fh-456".to_string(),
        form_version: "vABC".to_string(),
    }
}

fn parent(id: &str) -> ParentRecord {
    ParentRecord {
        id: id.to_string(),
        family_id: "F1".to_string(),
    }
}

fn child_groups() -> ResolvedGroups {
    let mut groups = ResolvedGroups::new();
    groups.insert(
        "child",
        leaf(
            children(),
            fields(&[("name", FieldSpec::text("Name")), ("age", FieldSpec::text("Age"))]),
        ),
    );
    groups
}

#[test]
fn parent_with_two_children() {
    let payload = create_payload(&parent("P1"), &child_groups(), &meta());
    let submission = &payload["submission"];

    assert_eq!(payload["id"], "proj-123");
    assert_eq!(submission["ID"], "P1");
    assert_eq!(submission["Family_ID"], "F1");
    assert_eq!(
        submission["child"],
        json!([
            {"name": "Amina", "age": "7"},
            {"name": "", "age": "3"}
        ])
    );
}

#[test]
fn no_matching_children_gives_empty_list() {
    let payload = create_payload(&parent("P9"), &child_groups(), &meta());
    assert_eq!(payload["submission"]["child"], json!([]));
}

#[test]
fn nested_containers_keep_their_shape() {
    let mut livelihood = ResolvedGroups::new();
    livelihood.insert(
        "members",
        leaf(children(), fields(&[("name", FieldSpec::text("Name"))])),
    );
    let mut household = ResolvedGroups::new();
    household.insert("livelihood", GroupNode::Container(livelihood));
    let mut groups = ResolvedGroups::new();
    groups.insert("household", GroupNode::Container(household));

    let payload = build_groups_payload("P2", &groups);
    assert_eq!(
        Value::Object(payload),
        json!({"household": {"livelihood": {"members": [{"name": "Omar"}]}}})
    );
}

#[test]
fn date_fields_are_normalised() {
    let mut groups = ResolvedGroups::new();
    groups.insert(
        "visits",
        leaf(children(), fields(&[("dob", FieldSpec::date("DOB"))])),
    );

    let payload = build_groups_payload("P1", &groups);
    assert_eq!(
        payload["visits"],
        json!([{"dob": "2017-01-15"}, {"dob": ""}])
    );
}

#[test]
fn instance_ids_are_unique() {
    let groups = ResolvedGroups::new();
    let ids: HashSet<String> = (0..1000)
        .map(|_| {
            let payload = create_payload(&parent("P1"), &groups, &meta());
            payload["submission"]["meta"]["instanceID"]
                .as_str()
                .expect("instance id")
                .to_string()
        })
        .collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn submission_document_shape() {
    let mut payload = create_payload(&parent("P1"), &child_groups(), &meta());
    let instance = payload["submission"]["meta"]["instanceID"]
        .as_str()
        .expect("instance id");
    assert!(instance.starts_with("uuid:"));
    payload["submission"]["meta"]["instanceID"] = json!("uuid:[random]");

    insta::assert_json_snapshot!(payload, @r#"
    {
      "id": "proj-123",
      "submission": {
        "formhub": {
          "uuid": "fh-456"
        },
        "ID": "P1",
        "Family_ID": "F1",
        "child": [
          {
            "name": "Amina",
            "age": "7"
          },
          {
            "name": "",
            "age": "3"
          }
        ],
        "__version__": "vABC",
        "meta": {
          "instanceID": "uuid:[random]"
        }
      }
    }
    "#);
}

proptest! {
    #[test]
    fn safe_str_is_idempotent_for_text(text in ".*") {
        let once = safe_str(AnyValue::String(&text));
        let twice = safe_str(AnyValue::String(&once));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn safe_str_is_idempotent_for_numbers(int in any::<i64>(), float in any::<f64>()) {
        let once = safe_str(AnyValue::Int64(int));
        prop_assert_eq!(&safe_str(AnyValue::String(&once)), &once);

        let once = safe_str(AnyValue::Float64(float));
        prop_assert_eq!(&safe_str(AnyValue::String(&once)), &once);
    }

    #[test]
    fn formatted_dates_are_empty_or_iso(text in ".{0,24}") {
        let formatted = format_date(AnyValue::String(&text));
        prop_assert!(formatted.is_empty() || formatted.len() == 10);
    }

    #[test]
    fn valid_dates_always_format(year in 1i32..=9999, month in 1u32..=12, day in 1u32..=28) {
        let text = format!("{day:02}/{month:02}/{year:04}");
        let formatted = format_date(AnyValue::String(&text));
        prop_assert_eq!(formatted.len(), 10);
    }
}
