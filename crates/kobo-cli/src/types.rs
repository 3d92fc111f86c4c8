use std::path::PathBuf;

#[derive(Debug)]
pub struct RunSummary {
    pub config: PathBuf,
    pub endpoint: String,
    pub rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Repeat groups dropped during resolution, as `path: reason`.
    pub issues: Vec<String>,
    pub failure_log: Option<PathBuf>,
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || !self.errors.is_empty()
    }
}
