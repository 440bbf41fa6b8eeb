//! Domain model: `Student`, `Class`, `School` and their invariants.
//!
//! Enforces entity invariants and provides O(1) lookups plus O(|class|)
//! aggregate queries. `Class`/`School` are kept in `class_id`-sorted maps so
//! every aggregation downstream (the scorer in particular) accumulates in a
//! fixed order, per the floating-point-reproducibility guidance: unordered
//! container iteration would make repeated runs produce different rounding.

use crate::error::{SolverError, SolverResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type StudentId = String;
pub type ClassId = String;
pub type GroupId = String;

/// Student gender, used only by the class-layer gender-balance metric.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    M,
    F,
}

/// Behavior / studentiality rank. Maps to 1..4 for averaging (A is best).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    A,
    B,
    C,
    D,
}

impl Rank {
    pub fn numeric(self) -> f64 {
        match self {
            Rank::A => 1.0,
            Rank::B => 2.0,
            Rank::C => 3.0,
            Rank::D => 4.0,
        }
    }
}

/// A student, immutable except for `class_id` which is mutated only through
/// `School::move_student`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Student {
    pub student_id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub academic_score: f64,
    pub behavior_rank: Rank,
    pub studentiality_rank: Rank,
    pub assistance_package: bool,
    pub school_of_origin: Option<String>,
    /// Up to three preferred-friend ids; self-references and duplicates are
    /// expected to already be removed by the loader, but `preferred_friends()`
    /// re-derives defensively so the invariant holds regardless of caller.
    pub preferred_friends: Vec<StudentId>,
    /// Up to five disliked-peer ids; same defensive dedup as above.
    pub disliked_peers: Vec<StudentId>,
    pub force_class: Option<ClassId>,
    pub force_friend_group: Option<GroupId>,
    /// `None` means unassigned.
    pub class_id: Option<ClassId>,
}

impl Student {
    /// Preferred-friend ids with self-references and duplicates removed.
    pub fn preferred_friends(&self) -> Vec<StudentId> {
        dedup_excluding_self(&self.student_id, &self.preferred_friends)
    }

    /// Disliked-peer ids with self-references and duplicates removed.
    pub fn disliked_peers(&self) -> Vec<StudentId> {
        dedup_excluding_self(&self.student_id, &self.disliked_peers)
    }
}

fn dedup_excluding_self(self_id: &str, ids: &[StudentId]) -> Vec<StudentId> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        if id == self_id {
            continue;
        }
        if seen.insert(id.clone()) {
            out.push(id.clone());
        }
    }
    out
}

/// A class roster. Student ids are kept in insertion order; ordering within a
/// class carries no meaning (the scorer is order-insensitive over members).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Class {
    pub class_id: ClassId,
    pub student_ids: Vec<StudentId>,
}

impl Class {
    pub fn size(&self) -> usize {
        self.student_ids.len()
    }
}

/// The full school: all students and all classes, with the invariant that
/// every student's `class_id` agrees with exactly one class's roster, and
/// every unassigned student (`class_id = None`) appears in no roster.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct School {
    students: BTreeMap<StudentId, Student>,
    classes: BTreeMap<ClassId, Class>,
}

impl School {
    pub fn new() -> Self {
        School::default()
    }

    pub fn from_parts(
        students: impl IntoIterator<Item = Student>,
        classes: impl IntoIterator<Item = Class>,
    ) -> Self {
        let mut school = School::new();
        for class in classes {
            school.classes.insert(class.class_id.clone(), class);
        }
        for student in students {
            school.students.insert(student.student_id.clone(), student);
        }
        school
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn get_student(&self, id: &str) -> Option<&Student> {
        self.students.get(id)
    }

    pub fn get_class(&self, id: &str) -> Option<&Class> {
        self.classes.get(id)
    }

    /// Inserts an empty class if it does not already exist. Never removes a
    /// class, even an empty one produced by a prior call.
    pub fn ensure_class(&mut self, class_id: &str) {
        self.classes
            .entry(class_id.to_string())
            .or_insert_with(|| Class {
                class_id: class_id.to_string(),
                student_ids: Vec::new(),
            });
    }

    pub fn unassigned_students(&self) -> impl Iterator<Item = &Student> {
        self.students.values().filter(|s| s.class_id.is_none())
    }

    /// Atomically relocates a student: removes them from their current class
    /// roster (if any), inserts them into `target_class_id`'s roster, and
    /// updates `class_id`. Consults no constraints — callers that need
    /// feasibility checks must run them first (see `neighborhood` and
    /// `constraints`).
    pub fn move_student(&mut self, student_id: &str, target_class_id: &str) -> SolverResult<()> {
        if !self.classes.contains_key(target_class_id) {
            return Err(SolverError::UnknownClass(target_class_id.to_string()));
        }
        let previous_class = {
            let student = self
                .students
                .get(student_id)
                .ok_or_else(|| SolverError::UnknownStudent(student_id.to_string()))?;
            student.class_id.clone()
        };

        if let Some(prev) = &previous_class {
            if let Some(class) = self.classes.get_mut(prev) {
                class.student_ids.retain(|id| id != student_id);
            }
        }

        self.classes
            .get_mut(target_class_id)
            .expect("existence checked above")
            .student_ids
            .push(student_id.to_string());

        self.students
            .get_mut(student_id)
            .expect("existence checked above")
            .class_id = Some(target_class_id.to_string());

        Ok(())
    }

    /// Removes a student from whatever class roster they currently occupy,
    /// leaving them unassigned. A no-op if the student is already unassigned.
    pub fn unassign_student(&mut self, student_id: &str) -> SolverResult<()> {
        let previous_class = {
            let student = self
                .students
                .get(student_id)
                .ok_or_else(|| SolverError::UnknownStudent(student_id.to_string()))?;
            student.class_id.clone()
        };
        if let Some(prev) = previous_class {
            if let Some(class) = self.classes.get_mut(&prev) {
                class.student_ids.retain(|id| id != student_id);
            }
            self.students.get_mut(student_id).unwrap().class_id = None;
        }
        Ok(())
    }

    /// Force-friend groups derived from `Student::force_friend_group`, keyed
    /// by group id, in first-seen order.
    pub fn force_friend_groups(&self) -> BTreeMap<GroupId, Vec<StudentId>> {
        let mut groups: BTreeMap<GroupId, Vec<StudentId>> = BTreeMap::new();
        for student in self.students.values() {
            if let Some(group) = &student.force_friend_group {
                groups
                    .entry(group.clone())
                    .or_default()
                    .push(student.student_id.clone());
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, class_id: Option<&str>) -> Student {
        Student {
            student_id: id.to_string(),
            first_name: "F".to_string(),
            last_name: "L".to_string(),
            gender: Gender::M,
            academic_score: 80.0,
            behavior_rank: Rank::B,
            studentiality_rank: Rank::B,
            assistance_package: false,
            school_of_origin: None,
            preferred_friends: vec![],
            disliked_peers: vec![],
            force_class: None,
            force_friend_group: None,
            class_id: class_id.map(|c| c.to_string()),
        }
    }

    fn two_class_school() -> School {
        School::from_parts(
            vec![student("s1", Some("c1")), student("s2", Some("c2"))],
            vec![
                Class {
                    class_id: "c1".into(),
                    student_ids: vec!["s1".into()],
                },
                Class {
                    class_id: "c2".into(),
                    student_ids: vec!["s2".into()],
                },
            ],
        )
    }

    #[test]
    fn move_student_is_atomic() {
        let mut school = two_class_school();
        school.move_student("s1", "c2").unwrap();
        assert_eq!(school.get_student("s1").unwrap().class_id.as_deref(), Some("c2"));
        assert!(!school.get_class("c1").unwrap().student_ids.contains(&"s1".to_string()));
        assert!(school.get_class("c2").unwrap().student_ids.contains(&"s1".to_string()));
    }

    #[test]
    fn move_student_round_trip_is_idempotent() {
        let mut school = two_class_school();
        school.move_student("s1", "c2").unwrap();
        school.move_student("s1", "c1").unwrap();
        assert_eq!(school.get_student("s1").unwrap().class_id.as_deref(), Some("c1"));
        assert_eq!(school.get_class("c1").unwrap().student_ids, vec!["s1".to_string()]);
        assert_eq!(school.get_class("c2").unwrap().student_ids, Vec::<String>::new());
    }

    #[test]
    fn move_student_rejects_unknown_ids() {
        let mut school = two_class_school();
        assert!(matches!(
            school.move_student("nope", "c1"),
            Err(SolverError::UnknownStudent(_))
        ));
        assert!(matches!(
            school.move_student("s1", "nope"),
            Err(SolverError::UnknownClass(_))
        ));
    }

    #[test]
    fn unassigned_students_are_found() {
        let mut school = two_class_school();
        school.unassign_student("s1").unwrap();
        let ids: Vec<_> = school.unassigned_students().map(|s| s.student_id.clone()).collect();
        assert_eq!(ids, vec!["s1".to_string()]);
    }

    #[test]
    fn preferred_friends_drop_self_and_duplicates() {
        let mut s = student("s1", None);
        s.preferred_friends = vec!["s1".into(), "s2".into(), "s2".into()];
        assert_eq!(s.preferred_friends(), vec!["s2".to_string()]);
    }
}
