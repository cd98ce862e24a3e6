//! Registration and attempt recording, one type per phase.
//!
//! ```text
//! RosterBuilder ──close_students──▶ ExerciseCatalog ──open_ledger──▶ AttemptLedger ──finalize──▶ Roster
//!  register_student                  register_exercise                record_attempt
//! ```
//!
//! Exercise registration must see every student, and recording must see
//! every exercise, so each phase only exposes its own operation.

use super::Roster;
use super::reduce::Policy;
use crate::collate::strip_accents;
use crate::error::{MergeError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Per (student, exercise) storage, seeded from the policy.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    /// Best-only: the running maximum.
    Best(f64),
    /// Multi-attempt: every attempt in ingestion order.
    Attempts(Vec<f64>),
}

impl Slot {
    fn seed(policy: Policy) -> Self {
        match policy {
            Policy::BestOnly => Slot::Best(0.0),
            Policy::Weighted { .. } => Slot::Attempts(Vec::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Student {
    pub email: String,
    /// `"Surname, GivenName"` as first seen.
    pub display_name: String,
    slots: HashMap<String, Slot>,
}

impl Student {
    /// Recorded attempts for `exercise`. Under best-only this is the single
    /// running maximum.
    pub fn attempts(&self, exercise: &str) -> &[f64] {
        match self.slots.get(exercise) {
            Some(Slot::Best(v)) => std::slice::from_ref(v),
            Some(Slot::Attempts(list)) => list,
            None => &[],
        }
    }
}

/// Phase 1: collects every student of the run.
pub struct RosterBuilder {
    policy: Policy,
    students: BTreeMap<String, Student>,
}

impl RosterBuilder {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            students: BTreeMap::new(),
        }
    }

    /// Registers a student by email. Returns `true` if the student is new.
    ///
    /// The display name is fixed on first registration; later spellings are
    /// ignored.
    pub fn register_student(&mut self, email: &str, given_name: &str, surname: &str) -> bool {
        let display_name = format!("{surname}, {given_name}");

        if let Some(existing) = self.students.get(email) {
            if existing.display_name != display_name {
                debug!(
                    email,
                    kept = %existing.display_name,
                    ignored = %display_name,
                    "Student name differs between exports"
                );
            }
            return false;
        }

        self.students.insert(
            email.to_string(),
            Student {
                email: email.to_string(),
                display_name,
                slots: HashMap::new(),
            },
        );
        true
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    /// Ends student registration.
    pub fn close_students(self) -> ExerciseCatalog {
        info!(students = self.student_count(), "Student registration closed");
        ExerciseCatalog {
            policy: self.policy,
            students: self.students,
            exercises: Vec::new(),
            max_attempts: HashMap::new(),
        }
    }
}

/// Phase 2: registers exercises against the closed student set.
pub struct ExerciseCatalog {
    policy: Policy,
    students: BTreeMap<String, Student>,
    exercises: Vec<String>,
    max_attempts: HashMap<String, usize>,
}

impl ExerciseCatalog {
    /// Adds an exercise and seeds an empty slot for every student.
    ///
    /// Names are not deduplicated: a second registration re-seeds the slots
    /// and adds another output column for the same exercise.
    pub fn register_exercise(&mut self, name: &str) {
        if self.max_attempts.contains_key(name) {
            warn!(exercise = name, "Exercise registered more than once");
        }

        self.exercises.push(name.to_string());
        self.max_attempts.insert(name.to_string(), 1);

        let seed = Slot::seed(self.policy);
        for student in self.students.values_mut() {
            student.slots.insert(name.to_string(), seed.clone());
        }
    }

    /// Ends exercise registration.
    pub fn open_ledger(self) -> AttemptLedger {
        info!(exercises = self.exercises.len(), "Exercise registration closed");
        AttemptLedger {
            policy: self.policy,
            students: self.students,
            exercises: self.exercises,
            max_attempts: self.max_attempts,
        }
    }
}

/// Phase 3: accumulates attempt scores.
pub struct AttemptLedger {
    policy: Policy,
    students: BTreeMap<String, Student>,
    exercises: Vec<String>,
    max_attempts: HashMap<String, usize>,
}

impl AttemptLedger {
    /// Records one attempt.
    ///
    /// Best-only keeps the maximum. Multi-attempt appends and raises the
    /// exercise's max attempt count when this list becomes the longest.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Unregistered`] for an unknown student or exercise.
    pub fn record_attempt(&mut self, email: &str, exercise: &str, score: f64) -> Result<()> {
        let unknown_exercise = || MergeError::Unregistered {
            kind: "exercise",
            key: exercise.to_string(),
        };

        let max = self
            .max_attempts
            .get_mut(exercise)
            .ok_or_else(unknown_exercise)?;
        let student = self
            .students
            .get_mut(email)
            .ok_or_else(|| MergeError::Unregistered {
                kind: "student",
                key: email.to_string(),
            })?;
        let slot = student
            .slots
            .get_mut(exercise)
            .ok_or_else(unknown_exercise)?;

        match slot {
            Slot::Best(best) => {
                if score > *best {
                    *best = score;
                }
            }
            Slot::Attempts(list) => {
                list.push(score);
                if list.len() > *max {
                    *max = list.len();
                }
            }
        }

        Ok(())
    }

    pub fn max_attempts(&self, exercise: &str) -> Option<usize> {
        self.max_attempts.get(exercise).copied()
    }

    /// Pads every short attempt list of `exercise` with zeros.
    fn backfill_missing(&mut self, exercise: &str) {
        let Some(max) = self.max_attempts(exercise) else {
            return;
        };

        let mut padded = 0usize;
        for student in self.students.values_mut() {
            if let Some(Slot::Attempts(list)) = student.slots.get_mut(exercise) {
                if list.len() < max {
                    list.resize(max, 0.0);
                    padded += 1;
                }
            }
        }

        debug!(exercise, max_attempts = max, padded, "Missing attempts backfilled");
    }

    /// Ends recording. Backfills under multi-attempt and sorts for output:
    /// exercises by name, students by accent-stripped display name.
    pub fn finalize(mut self) -> Roster {
        if self.policy.is_multi_attempt() {
            let names: Vec<String> = {
                let mut seen = HashSet::new();
                self.exercises
                    .iter()
                    .filter(|e| seen.insert(e.as_str()))
                    .cloned()
                    .collect()
            };
            for name in &names {
                self.backfill_missing(name);
            }
        }

        let mut exercises = self.exercises;
        exercises.sort();

        let mut students: Vec<Student> = self.students.into_values().collect();
        students.sort_by_cached_key(|s| (strip_accents(&s.display_name), s.email.clone()));

        Roster {
            policy: self.policy,
            exercises,
            max_attempts: self.max_attempts,
            students,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEIGHTED: Policy = Policy::Weighted { high_pct: 0.6 };

    fn ledger(policy: Policy, students: &[&str], exercises: &[&str]) -> AttemptLedger {
        let mut builder = RosterBuilder::new(policy);
        for email in students {
            builder.register_student(email, "Given", email);
        }
        let mut catalog = builder.close_students();
        for ex in exercises {
            catalog.register_exercise(ex);
        }
        catalog.open_ledger()
    }

    #[test]
    fn test_display_name_first_write_wins() {
        let mut builder = RosterBuilder::new(Policy::BestOnly);
        assert!(builder.register_student("a@x.cat", "Anna", "Puig"));
        assert!(!builder.register_student("a@x.cat", "Ana", "Puig i Soler"));
        assert_eq!(builder.student_count(), 1);

        let roster = builder.close_students().open_ledger().finalize();
        assert_eq!(roster.students()[0].display_name, "Puig, Anna");
    }

    #[test]
    fn test_registration_seeds_every_student() {
        let roster = ledger(Policy::BestOnly, &["a", "b"], &["e1"]).finalize();
        for s in roster.students() {
            assert_eq!(s.attempts("e1"), &[0.0]);
        }

        let roster = ledger(WEIGHTED, &["a", "b"], &["e1"]).finalize();
        for s in roster.students() {
            // one backfilled zero: max attempts starts at one
            assert_eq!(s.attempts("e1"), &[0.0]);
        }
    }

    #[test]
    fn test_best_only_keeps_max() {
        let mut l = ledger(Policy::BestOnly, &["a"], &["e1"]);
        l.record_attempt("a", "e1", 4.0).unwrap();
        l.record_attempt("a", "e1", 9.0).unwrap();
        l.record_attempt("a", "e1", 6.0).unwrap();
        assert_eq!(l.max_attempts("e1"), Some(1));

        let roster = l.finalize();
        assert_eq!(roster.students()[0].attempts("e1"), &[9.0]);
    }

    #[test]
    fn test_multi_attempt_raises_max() {
        let mut l = ledger(WEIGHTED, &["a", "b"], &["e1"]);
        l.record_attempt("a", "e1", 5.0).unwrap();
        assert_eq!(l.max_attempts("e1"), Some(1));
        l.record_attempt("a", "e1", 7.0).unwrap();
        l.record_attempt("a", "e1", 3.0).unwrap();
        assert_eq!(l.max_attempts("e1"), Some(3));
        l.record_attempt("b", "e1", 8.0).unwrap();
        assert_eq!(l.max_attempts("e1"), Some(3));
    }

    #[test]
    fn test_backfill_equalizes_lengths() {
        let mut l = ledger(WEIGHTED, &["a", "b", "c"], &["e1", "e2"]);
        for score in [5.0, 7.0, 3.0] {
            l.record_attempt("a", "e1", score).unwrap();
        }
        l.record_attempt("b", "e1", 8.0).unwrap();
        l.record_attempt("b", "e2", 2.0).unwrap();

        let roster = l.finalize();
        assert_eq!(roster.attempt_columns("e1"), 3);
        assert_eq!(roster.attempt_columns("e2"), 1);

        let a = roster.student("a").unwrap();
        let b = roster.student("b").unwrap();
        let c = roster.student("c").unwrap();
        assert_eq!(a.attempts("e1"), &[5.0, 7.0, 3.0]);
        assert_eq!(b.attempts("e1"), &[8.0, 0.0, 0.0]);
        assert_eq!(c.attempts("e1"), &[0.0, 0.0, 0.0]);
        assert_eq!(c.attempts("e2"), &[0.0]);
    }

    #[test]
    fn test_unregistered_keys_rejected() {
        let mut l = ledger(Policy::BestOnly, &["a"], &["e1"]);
        assert!(matches!(
            l.record_attempt("zz", "e1", 1.0).unwrap_err(),
            MergeError::Unregistered { kind: "student", .. }
        ));
        assert!(matches!(
            l.record_attempt("a", "nope", 1.0).unwrap_err(),
            MergeError::Unregistered { kind: "exercise", .. }
        ));
    }

    #[test]
    fn test_duplicate_exercise_keeps_both_columns_and_merges_attempts() {
        let mut l = ledger(WEIGHTED, &["a"], &["e1", "e1"]);
        l.record_attempt("a", "e1", 4.0).unwrap();
        l.record_attempt("a", "e1", 6.0).unwrap();

        let roster = l.finalize();
        assert_eq!(roster.exercises(), &["e1".to_string(), "e1".to_string()]);
        assert_eq!(roster.students()[0].attempts("e1"), &[4.0, 6.0]);
    }

    #[test]
    fn test_output_order() {
        let mut builder = RosterBuilder::new(Policy::BestOnly);
        builder.register_student("z@x.cat", "Zoe", "Ávila");
        builder.register_student("b@x.cat", "Bernat", "Bosch");
        builder.register_student("a@x.cat", "Aina", "Alba");
        let mut catalog = builder.close_students();
        catalog.register_exercise("t2");
        catalog.register_exercise("T1");
        catalog.register_exercise("t1");
        let roster = catalog.open_ledger().finalize();

        let names: Vec<_> = roster.students().iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alba, Aina", "Ávila, Zoe", "Bosch, Bernat"]);
        assert_eq!(roster.exercises(), &["T1", "t1", "t2"]);
    }

    #[test]
    fn test_same_stripped_name_ordered_by_email() {
        let mut builder = RosterBuilder::new(Policy::BestOnly);
        builder.register_student("zeta@x.cat", "Núria", "Puig");
        builder.register_student("alfa@x.cat", "Nuria", "Puig");
        let roster = builder.close_students().open_ledger().finalize();

        let emails: Vec<_> = roster.students().iter().map(|s| s.email.as_str()).collect();
        assert_eq!(emails, vec!["alfa@x.cat", "zeta@x.cat"]);
    }
}
