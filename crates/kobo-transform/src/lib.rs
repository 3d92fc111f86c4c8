//! Turning parent and child tables into Kobo submission documents.
//!
//! - **values**: safe-string and date rendering of cells
//! - **resolve**: repeat-group config tree into loaded, indexed groups
//! - **payload**: per-parent nested group payloads and the submission wrapper

pub mod payload;
pub mod resolve;
pub mod values;

pub use payload::{
    ParentRecord, build_groups_payload, create_payload, create_repeat_group_payload,
    new_instance_id,
};
pub use resolve::{
    GroupNode, LeafGroup, Resolution, ResolveIssue, ResolveIssueKind, ResolvedGroups,
    resolve_legacy_group, resolve_repeat_groups,
};
pub use values::{format_date, parse_date, safe_str};
