//! Shared types for Kobo survey submission runs.

pub mod config;
pub mod error;
pub mod failure;
pub mod groups;

pub use config::{
    DEFAULT_API_ENDPOINT, GroupSource, SubmissionConfig, SubmissionMeta, load_config,
};
pub use error::{ConfigError, Result};
pub use failure::FailureRecord;
pub use groups::{
    DEFAULT_FILTER_COLUMN, FAMILY_ID_COLUMN, FieldKind, FieldMap, FieldSpec, ID_COLUMN,
    LEAF_MARKER, LEGACY_GROUP_NAME, LeafSpec, is_leaf_node,
};
