//! Source table loading seam.

use std::path::Path;

use polars::prelude::DataFrame;

use crate::error::Result;
use crate::reader::read_table;

/// Loads a table referenced from the config.
///
/// The resolver only sees this trait, so tests can hand it in-memory frames.
pub trait TableLoader {
    fn load(&self, path: &Path) -> Result<DataFrame>;
}

/// Loads tables from the local filesystem with [`read_table`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTableLoader;

impl TableLoader for FileTableLoader {
    fn load(&self, path: &Path) -> Result<DataFrame> {
        read_table(path)
    }
}

impl<F> TableLoader for F
where
    F: Fn(&Path) -> Result<DataFrame>,
{
    fn load(&self, path: &Path) -> Result<DataFrame> {
        self(path)
    }
}
