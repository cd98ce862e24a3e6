//! Error kinds raised while merging grade exports.

use std::path::PathBuf;
use thiserror::Error;

/// Anything that aborts a merge run. There is no partial-success mode.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A grade cell that is neither the ungraded marker nor a decimal number.
    #[error("unparseable grade token {token:?}")]
    Format { token: String },

    /// A grade cell failed to parse at a known location in an export file.
    #[error("{}:{row}: {source}", path.display())]
    FormatAt {
        path: PathBuf,
        row: u64,
        #[source]
        source: Box<MergeError>,
    },

    /// A required column fragment did not match any header cell.
    #[error("{}: no header column contains {fragment:?}", path.display())]
    MissingColumn { path: PathBuf, fragment: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// An attempt for a student or exercise that was never registered.
    #[error("unregistered {kind} {key:?}")]
    Unregistered { kind: &'static str, key: String },

    /// Invalid column overrides or an out-of-range weighting value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MergeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MergeError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        MergeError::Csv {
            path: path.into(),
            source,
        }
    }

    /// Attaches a file location to a bare [`MergeError::Format`].
    pub fn at(self, path: impl Into<PathBuf>, row: u64) -> Self {
        match self {
            MergeError::Format { .. } => MergeError::FormatAt {
                path: path.into(),
                row,
                source: Box::new(self),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_gains_location() {
        let err = MergeError::Format {
            token: "abc".to_string(),
        }
        .at("ex-qualificacions.csv", 4);

        assert!(matches!(err, MergeError::FormatAt { row: 4, .. }));
        assert_eq!(
            err.to_string(),
            "ex-qualificacions.csv:4: unparseable grade token \"abc\""
        );
    }

    #[test]
    fn test_at_leaves_other_kinds_alone() {
        let err = MergeError::Config("bad".to_string()).at("x.csv", 1);
        assert!(matches!(err, MergeError::Config(_)));
    }
}
