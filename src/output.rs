//! Output projection and persistence of the merged roster.
//!
//! The whole table is rendered in memory before the result file is touched.

use crate::error::{MergeError, Result};
use crate::roster::Roster;
use crate::score::format_grade;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

pub const EMAIL_HEADER: &str = "Correu electrònic";
pub const NAME_HEADER: &str = "Nom";

/// Lays the roster out as rows of cells, header rows first.
///
/// Best-only: one column per exercise. Multi-attempt: per exercise one
/// `intent N` column per attempt slot plus a `total` column, with the
/// exercise name on the first header row and the sub-labels on the second.
pub fn project(roster: &Roster) -> Vec<Vec<String>> {
    let multi = roster.policy().is_multi_attempt();
    let mut rows = Vec::with_capacity(roster.students().len() + 2);

    let mut header = vec![EMAIL_HEADER.to_string(), NAME_HEADER.to_string()];
    if multi {
        let mut sub_header = vec![String::new(), String::new()];
        for exercise in roster.exercises() {
            let n = roster.attempt_columns(exercise);
            header.push(exercise.clone());
            header.extend(std::iter::repeat_n(String::new(), n));
            sub_header.extend((1..=n).map(|i| format!("intent {i}")));
            sub_header.push("total".to_string());
        }
        rows.push(header);
        rows.push(sub_header);
    } else {
        header.extend(roster.exercises().iter().cloned());
        rows.push(header);
    }

    for student in roster.students() {
        let mut row = vec![student.email.clone(), student.display_name.clone()];
        for exercise in roster.exercises() {
            if multi {
                row.extend(student.attempts(exercise).iter().map(|v| format_grade(*v)));
            }
            row.push(format_grade(roster.published_grade(student, exercise)));
        }
        rows.push(row);
    }

    rows
}

/// Writes `rows` to `path`, replacing any previous contents.
pub fn write_table(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing merged roster");

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| MergeError::csv(path, e))?;

    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| MergeError::csv(path, e))?;
    }
    writer.flush().map_err(|e| MergeError::io(path, e))?;

    info!(path = %path.display(), "Merged roster written");
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ExerciseSummary {
    pub name: String,
    pub attempt_columns: usize,
}

/// What one merge run produced.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub policy: crate::roster::Policy,
    pub students: usize,
    pub exercises: Vec<ExerciseSummary>,
}

impl RunSummary {
    pub fn from_roster(roster: &Roster) -> Self {
        Self {
            generated_at: Utc::now(),
            policy: roster.policy(),
            students: roster.students().len(),
            exercises: roster
                .exercises()
                .iter()
                .map(|e| ExerciseSummary {
                    name: e.clone(),
                    attempt_columns: roster.attempt_columns(e),
                })
                .collect(),
        }
    }
}

/// Logs a run summary as pretty-printed JSON.
pub fn print_json(summary: &RunSummary) -> serde_json::Result<()> {
    info!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}
