use crate::config::MergeConfig;
use crate::error::{MergeError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The columns of one data row that the merge cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based line number in the source file.
    pub line: u64,
    pub email: String,
    pub given_name: String,
    pub surname: String,
    /// Raw grade token, not yet normalized.
    pub grade: String,
}

/// A decoded export file.
#[derive(Debug, Clone)]
pub struct GradeSheet {
    pub path: PathBuf,
    pub rows: Vec<SheetRow>,
}

struct ColumnIndices {
    email: usize,
    given_name: usize,
    surname: usize,
    grade: usize,
}

/// Returns the first header column whose name contains `fragment`.
fn find_column(path: &Path, headers: &StringRecord, fragment: &str) -> Result<usize> {
    headers
        .iter()
        .position(|name| name.contains(fragment))
        .ok_or_else(|| MergeError::MissingColumn {
            path: path.to_path_buf(),
            fragment: fragment.to_string(),
        })
}

impl GradeSheet {
    /// Decodes a comma-delimited export with a leading header row.
    ///
    /// Short rows read their missing cells as empty strings.
    pub fn from_reader<R: Read>(path: &Path, reader: R, config: &MergeConfig) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().map_err(|e| MergeError::csv(path, e))?.clone();
        let columns = ColumnIndices {
            email: find_column(path, &headers, &config.email_column)?,
            given_name: find_column(path, &headers, &config.given_name_column)?,
            surname: find_column(path, &headers, &config.surname_column)?,
            grade: find_column(path, &headers, &config.grade_column)?,
        };

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| MergeError::csv(path, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let cell = |i: usize| record.get(i).unwrap_or("").to_string();

            rows.push(SheetRow {
                line,
                email: cell(columns.email),
                given_name: cell(columns.given_name),
                surname: cell(columns.surname),
                grade: cell(columns.grade),
            });
        }

        debug!(path = %path.display(), rows = rows.len(), "Export decoded");

        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    /// Rows that carry a student identifier. Rows without one are skipped.
    pub fn student_rows(&self) -> impl Iterator<Item = &SheetRow> {
        self.rows.iter().filter(|r| !r.email.is_empty())
    }
}
