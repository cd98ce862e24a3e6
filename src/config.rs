use crate::error::{MergeError, Result};
use serde::Deserialize;
use std::path::Path;

/// Column fragments and file-name conventions of the grade exports.
///
/// The defaults match the Catalan Moodle export. Any subset can be overridden
/// from a JSON file:
/// ```json
/// {
///   "email_column": "Email address",
///   "given_name_column": "First name",
///   "surname_column": "Surname",
///   "grade_column": "Grade",
///   "file_suffix": "-grades.csv"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    pub email_column: String,
    pub given_name_column: String,
    pub surname_column: String,
    pub grade_column: String,
    /// Stripped from an export's file name to obtain the exercise name.
    pub file_suffix: String,
    /// Grade token meaning "no submission".
    pub ungraded_marker: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            email_column: "Adreça electrònica".to_string(),
            given_name_column: "Nom".to_string(),
            surname_column: "Cognoms".to_string(),
            grade_column: "Qualificació".to_string(),
            file_suffix: "-qualificacions.csv".to_string(),
            ungraded_marker: "-".to_string(),
        }
    }
}

impl MergeConfig {
    /// Loads overrides from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: MergeConfig = serde_json::from_str(content)
            .map_err(|e| MergeError::Config(format!("invalid column overrides: {e}")))?;

        let fragments = [
            ("email_column", &config.email_column),
            ("given_name_column", &config.given_name_column),
            ("surname_column", &config.surname_column),
            ("grade_column", &config.grade_column),
        ];
        // An empty fragment would match the first header cell.
        if let Some((key, _)) = fragments.iter().find(|(_, v)| v.is_empty()) {
            return Err(MergeError::Config(format!("{key} must not be empty")));
        }

        Ok(config)
    }
}
