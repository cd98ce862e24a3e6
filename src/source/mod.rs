//! Where grade exports come from.
//!
//! [`ExportSource`] lists the per-exercise export files of a run and decodes
//! each one into a [`GradeSheet`]. [`DirectorySource`] implements it over a
//! local folder of CSV downloads.

mod directory;
mod sheet;

pub use directory::DirectorySource;
pub use sheet::{GradeSheet, SheetRow};

use crate::config::MergeConfig;
use crate::error::Result;
use std::path::PathBuf;

/// One export file, which maps 1:1 to one exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub path: PathBuf,
    pub exercise: String,
}

impl ExportFile {
    /// Builds an export entry, deriving the exercise name from the file name.
    pub fn new(path: impl Into<PathBuf>, file_suffix: &str) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let exercise = exercise_name(&file_name, file_suffix);
        Self { path, exercise }
    }
}

/// Derives an exercise name from an export's file name.
///
/// Downloads escape `&` as `&amp;`, sometimes with the `&` itself lost to
/// a bare `amp;`. Both are undone before `file_suffix` is
/// stripped. A name without the suffix is kept whole.
pub fn exercise_name(file_name: &str, file_suffix: &str) -> String {
    let unescaped = file_name.replace("&amp;", "&").replace("amp;", "&");
    match unescaped.strip_suffix(file_suffix) {
        Some(stem) => stem.to_string(),
        None => unescaped,
    }
}

/// Abstraction over a provider of grade exports.
pub trait ExportSource {
    /// Returns every export of the run, in processing order.
    fn list_exports(&self) -> Result<Vec<ExportFile>>;

    /// Decodes one export into its identity and grade columns.
    fn read_sheet(&self, export: &ExportFile, config: &MergeConfig) -> Result<GradeSheet>;
}
