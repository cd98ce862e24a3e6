//! Attempt ledger and grade reduction.
//!
//! The roster is built in phases (see [`ledger`]) and, once finalized, is a
//! read-only student × exercise matrix whose published grades are reduced
//! on demand under the run's [`Policy`].

pub mod ledger;
pub mod reduce;

pub use ledger::{AttemptLedger, ExerciseCatalog, RosterBuilder, Student};
pub use reduce::{Policy, reduce};

use std::collections::HashMap;

/// The finalized matrix of one merge run.
#[derive(Debug)]
pub struct Roster {
    policy: Policy,
    exercises: Vec<String>,
    max_attempts: HashMap<String, usize>,
    students: Vec<Student>,
}

impl Roster {
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Exercises in output order. A name registered twice appears twice.
    pub fn exercises(&self) -> &[String] {
        &self.exercises
    }

    /// Students in output order.
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    #[cfg(test)]
    pub(crate) fn student(&self, email: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.email == email)
    }

    /// Number of per-attempt columns for `exercise`: its max attempt count,
    /// or 1 under best-only.
    pub fn attempt_columns(&self, exercise: &str) -> usize {
        if !self.policy.is_multi_attempt() {
            return 1;
        }
        self.max_attempts.get(exercise).copied().unwrap_or(1)
    }

    pub fn published_grade(&self, student: &Student, exercise: &str) -> f64 {
        reduce(student.attempts(exercise), self.policy)
    }
}
