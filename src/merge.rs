//! The merge pipeline: list exports, register, record, finalize.

use crate::config::MergeConfig;
use crate::error::Result;
use crate::roster::{AttemptLedger, ExerciseCatalog, Policy, Roster, RosterBuilder};
use crate::score::normalize;
use crate::source::{ExportFile, ExportSource, GradeSheet};
use tracing::info;

/// Every student of every sheet, before any exercise exists.
fn register_students(policy: Policy, sheets: &[GradeSheet]) -> ExerciseCatalog {
    let mut builder = RosterBuilder::new(policy);
    for sheet in sheets {
        for row in sheet.student_rows() {
            builder.register_student(&row.email, &row.given_name, &row.surname);
        }
    }
    builder.close_students()
}

/// One exercise per export, seeded for the full student set.
fn register_exercises(mut catalog: ExerciseCatalog, exports: &[ExportFile]) -> AttemptLedger {
    for export in exports {
        catalog.register_exercise(&export.exercise);
    }
    catalog.open_ledger()
}

fn record_grades(
    ledger: &mut AttemptLedger,
    exports: &[ExportFile],
    sheets: &[GradeSheet],
    config: &MergeConfig,
) -> Result<usize> {
    let mut recorded = 0usize;
    for (export, sheet) in exports.iter().zip(sheets) {
        for row in sheet.student_rows() {
            let score = normalize(&row.grade, &config.ungraded_marker)
                .map_err(|e| e.at(&sheet.path, row.line))?;
            ledger.record_attempt(&row.email, &export.exercise, score)?;
            recorded += 1;
        }
    }
    Ok(recorded)
}

/// Builds the roster for every export `source` lists.
///
/// # Errors
///
/// Fails on the first unreadable export, missing column or bad grade token.
#[tracing::instrument(skip_all, fields(policy = %policy))]
pub fn merge<S: ExportSource>(source: &S, config: &MergeConfig, policy: Policy) -> Result<Roster> {
    let exports = source.list_exports()?;
    let sheets = exports
        .iter()
        .map(|export| source.read_sheet(export, config))
        .collect::<Result<Vec<_>>>()?;

    let catalog = register_students(policy, &sheets);
    let mut ledger = register_exercises(catalog, &exports);
    let recorded = record_grades(&mut ledger, &exports, &sheets, config)?;

    let roster = ledger.finalize();
    info!(
        exports = exports.len(),
        students = roster.students().len(),
        attempts = recorded,
        "Grades merged"
    );
    Ok(roster)
}
