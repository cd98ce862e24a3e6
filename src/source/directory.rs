use super::{ExportFile, ExportSource, GradeSheet};
use crate::config::MergeConfig;
use crate::error::{MergeError, Result};
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::{debug, info};

/// Reads every `*.csv` file of a download folder as one export.
pub struct DirectorySource {
    dir: PathBuf,
    file_suffix: String,
    excluded: Option<String>,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, config: &MergeConfig) -> Self {
        Self {
            dir: dir.into(),
            file_suffix: config.file_suffix.clone(),
            excluded: None,
        }
    }

    /// Skips a file with this exact name, typically a previous merge result
    /// written into the same folder.
    pub fn excluding(mut self, file_name: impl Into<String>) -> Self {
        self.excluded = Some(file_name.into());
        self
    }
}

impl ExportSource for DirectorySource {
    /// Lists exports in file-name order.
    fn list_exports(&self) -> Result<Vec<ExportFile>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| MergeError::io(&self.dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MergeError::io(&self.dir, e))?;
            let path = entry.path();

            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let file_name = entry.file_name();
            if self.excluded.is_some() && self.excluded.as_deref() == file_name.to_str() {
                debug!(path = %path.display(), "Skipping previous merge result");
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        info!(dir = %self.dir.display(), exports = paths.len(), "Grade exports listed");

        Ok(paths
            .into_iter()
            .map(|p| ExportFile::new(p, &self.file_suffix))
            .collect())
    }

    fn read_sheet(&self, export: &ExportFile, config: &MergeConfig) -> Result<GradeSheet> {
        let file = File::open(&export.path).map_err(|e| MergeError::io(&export.path, e))?;
        GradeSheet::from_reader(&export.path, file, config)
    }
}
