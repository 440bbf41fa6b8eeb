//! Initialization strategies that produce a feasible starting assignment.
//!
//! There is no teacher analog for this module (the group-scheduling source
//! always received a pre-built schedule); grounded directly on spec.md §4.D.
//! Force-friend groups are placed as a single unit straight off
//! `School::force_friend_groups()`, since each student carries at most one
//! group tag and there is no transitive merge to compute.

use crate::domain::School;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Random,
    Balanced,
    ConstraintAware,
    AcademicBalanced,
}

/// Derives a target class count from a student count per the spec's table,
/// used only when the caller does not supply one explicitly and the school
/// has no classes already holding students.
pub fn derive_target_classes(student_count: usize) -> usize {
    match student_count {
        0..=25 => 1,
        26..=50 => 2,
        51..=75 => 3,
        76..=100 => 4,
        n => {
            let scaled = (n as f64 / 25.0).ceil() as usize;
            scaled.clamp(4, 8)
        }
    }
}

fn classes_with_students(school: &School) -> usize {
    school.classes().filter(|c| c.size() > 0).count()
}

fn resolve_target_classes(school: &School, target_classes: Option<usize>) -> usize {
    if let Some(n) = target_classes {
        return n.max(1);
    }
    let existing = classes_with_students(school);
    if existing > 0 {
        existing
    } else {
        derive_target_classes(school.student_count())
    }
}

/// Fills in unassigned students per `strategy`, creating classes up to
/// `target_classes` (or the spec's derivation table) if needed. Post-condition:
/// no student is unassigned, and force-class/force-friend invariants hold.
pub fn initialize<R: Rng>(school: &mut School, strategy: Strategy, target_classes: Option<usize>, rng: &mut R) {
    let target = resolve_target_classes(school, target_classes);
    for i in 1..=target {
        school.ensure_class(&format!("class_{i}"));
    }
    let class_ids: Vec<String> = school.classes().map(|c| c.class_id.clone()).collect();
    if class_ids.is_empty() {
        return;
    }

    // Common first pass: honor force_class for everyone it applies to.
    let force_targets: Vec<(String, String)> = school
        .unassigned_students()
        .filter_map(|s| {
            s.force_class.as_ref().and_then(|fc| {
                if class_ids.contains(fc) {
                    Some((s.student_id.clone(), fc.clone()))
                } else {
                    None
                }
            })
        })
        .collect();
    if !matches!(strategy, Strategy::Random) {
        for (student_id, class_id) in force_targets {
            school.move_student(&student_id, &class_id).expect("class exists");
        }
    }

    match strategy {
        Strategy::Random => place_random(school, &class_ids, rng),
        Strategy::Balanced => place_round_robin(school, &class_ids, rng, false),
        Strategy::ConstraintAware => {
            place_force_friend_groups(school, &class_ids, rng);
            place_round_robin(school, &class_ids, rng, false);
        }
        Strategy::AcademicBalanced => place_round_robin(school, &class_ids, rng, true),
    }
}

fn place_random<R: Rng>(school: &mut School, class_ids: &[String], rng: &mut R) {
    let remaining: Vec<String> = school
        .unassigned_students()
        .map(|s| s.student_id.clone())
        .collect();
    for student_id in remaining {
        let class_id = class_ids.choose(rng).expect("non-empty class_ids").clone();
        school.move_student(&student_id, &class_id).expect("class exists");
    }
}

/// Round-robins remaining unassigned students across classes. When
/// `by_academic_score` is set, students are sorted by descending academic
/// score first (snake distribution is equivalent at this granularity, per
/// spec.md §4.D); otherwise they are shuffled.
fn place_round_robin<R: Rng>(school: &mut School, class_ids: &[String], rng: &mut R, by_academic_score: bool) {
    let mut remaining: Vec<(String, f64)> = school
        .unassigned_students()
        .map(|s| (s.student_id.clone(), s.academic_score))
        .collect();
    if by_academic_score {
        remaining.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    } else {
        remaining.shuffle(rng);
    }
    for (i, (student_id, _)) in remaining.into_iter().enumerate() {
        let class_id = &class_ids[i % class_ids.len()];
        school.move_student(&student_id, class_id).expect("class exists");
    }
}

fn place_force_friend_groups<R: Rng>(school: &mut School, class_ids: &[String], rng: &mut R) {
    let groups = school.force_friend_groups();
    for (_, members) in groups {
        let unassigned: Vec<String> = members
            .into_iter()
            .filter(|id| {
                school
                    .get_student(id)
                    .map(|s| s.class_id.is_none())
                    .unwrap_or(false)
            })
            .collect();
        if unassigned.is_empty() {
            continue;
        }
        let class_id = class_ids.choose(rng).expect("non-empty class_ids").clone();
        for student_id in unassigned {
            school.move_student(&student_id, &class_id).expect("class exists");
        }
    }
}
