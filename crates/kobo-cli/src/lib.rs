//! CLI library components for the Kobo submission loader.

pub mod logging;
pub mod pipeline;
