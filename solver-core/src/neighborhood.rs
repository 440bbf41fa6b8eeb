//! Neighborhood move primitives shared by every local-search-style solver.
//!
//! Grounded on `solver/moves/{transfer.rs,clique_swap.rs}`'s feasibility-gate
//! structure: a move is generated, checked against force constraints, and
//! only applied if it passes (or if the caller explicitly overrides the
//! gate with a small probability, per spec.md §4.E).

use crate::domain::{ClassId, GroupId, School, StudentId};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone)]
pub enum Move {
    /// Swap the class assignments of two students.
    Swap(StudentId, StudentId),
    /// Move a single student into a (possibly different) class.
    MoveOne(StudentId, ClassId),
    /// Move every member of a force-friend group into a class together.
    GroupMove(Vec<StudentId>, ClassId),
}

/// Returns `false` if applying `mv` would break a `force_class` pin or split a
/// currently-cohesive `force_friend_group`, unless `override_probability`
/// fires (used by Simulated Annealing ≤0.1 and the Genetic operators ≤0.3 to
/// occasionally explore infeasible intermediate states, per spec.md §4.E).
pub fn is_feasible<R: Rng>(school: &School, mv: &Move, override_probability: f64, rng: &mut R) -> bool {
    let feasible = match mv {
        Move::Swap(a, b) => force_class_allows(school, a, school.get_student(b).and_then(|s| s.class_id.clone()))
            && force_class_allows(school, b, school.get_student(a).and_then(|s| s.class_id.clone())),
        Move::MoveOne(student_id, target) => force_class_allows(school, student_id, Some(target.clone())),
        Move::GroupMove(members, target) => members
            .iter()
            .all(|id| force_class_allows(school, id, Some(target.clone()))),
    } && force_friend_group_allows(school, mv);
    if feasible {
        return true;
    }
    override_probability > 0.0 && rng.random::<f64>() < override_probability
}

fn force_class_allows(school: &School, student_id: &str, target_class: Option<ClassId>) -> bool {
    match school.get_student(student_id).and_then(|s| s.force_class.clone()) {
        None => true,
        Some(required) => target_class.as_deref() == Some(required.as_str()),
    }
}

/// Returns the class `student_id` would end up in if `mv` were applied, or
/// its current class if `mv` doesn't touch it.
fn class_after_move(school: &School, mv: &Move, student_id: &str) -> Option<ClassId> {
    match mv {
        Move::Swap(a, b) if student_id == a => school.get_student(b).and_then(|s| s.class_id.clone()),
        Move::Swap(a, b) if student_id == b => school.get_student(a).and_then(|s| s.class_id.clone()),
        Move::MoveOne(s, target) if student_id == s => Some(target.clone()),
        Move::GroupMove(members, target) if members.iter().any(|m| m == student_id) => Some(target.clone()),
        _ => school.get_student(student_id).and_then(|s| s.class_id.clone()),
    }
}

/// Rejects `mv` only if it would newly split a force-friend group that is
/// currently together. A group that is already split is not this check's
/// responsibility to repair.
fn force_friend_group_allows(school: &School, mv: &Move) -> bool {
    let touched: Vec<&StudentId> = match mv {
        Move::Swap(a, b) => vec![a, b],
        Move::MoveOne(s, _) => vec![s],
        Move::GroupMove(members, _) => members.iter().collect(),
    };
    let groups = school.force_friend_groups();
    let mut checked: std::collections::BTreeSet<&GroupId> = std::collections::BTreeSet::new();
    for student_id in touched {
        let Some(group_id) = school.get_student(student_id).and_then(|s| s.force_friend_group.as_ref()) else {
            continue;
        };
        if !checked.insert(group_id) {
            continue;
        }
        let Some(members) = groups.get(group_id) else {
            continue;
        };
        let before: Vec<Option<ClassId>> = members.iter().map(|m| school.get_student(m).and_then(|s| s.class_id.clone())).collect();
        let was_together = before.windows(2).all(|w| w[0] == w[1]);
        if !was_together {
            continue;
        }
        let after: Vec<Option<ClassId>> = members.iter().map(|m| class_after_move(school, mv, m)).collect();
        if !after.windows(2).all(|w| w[0] == w[1]) {
            return false;
        }
    }
    true
}

/// Applies `mv` unconditionally. Callers are expected to have already
/// consulted `is_feasible`.
pub fn apply(school: &mut School, mv: &Move) -> crate::error::SolverResult<()> {
    match mv {
        Move::Swap(a, b) => {
            let class_a = school
                .get_student(a)
                .and_then(|s| s.class_id.clone())
                .ok_or_else(|| crate::error::SolverError::UnknownStudent(a.clone()))?;
            let class_b = school
                .get_student(b)
                .and_then(|s| s.class_id.clone())
                .ok_or_else(|| crate::error::SolverError::UnknownStudent(b.clone()))?;
            school.move_student(a, &class_b)?;
            school.move_student(b, &class_a)?;
            Ok(())
        }
        Move::MoveOne(student_id, target) => school.move_student(student_id, target),
        Move::GroupMove(members, target) => {
            for student_id in members {
                school.move_student(student_id, target)?;
            }
            Ok(())
        }
    }
}

/// Picks a uniformly random swap between two assigned students in different
/// classes. Returns `None` if fewer than two classes are populated.
pub fn random_swap<R: Rng>(school: &School, rng: &mut R) -> Option<Move> {
    let assigned: Vec<&StudentId> = school
        .students()
        .filter(|s| s.class_id.is_some())
        .map(|s| &s.student_id)
        .collect();
    if assigned.len() < 2 {
        return None;
    }
    for _ in 0..20 {
        let a = *assigned.choose(rng)?;
        let b = *assigned.choose(rng)?;
        if a == b {
            continue;
        }
        let class_a = school.get_student(a).unwrap().class_id.clone();
        let class_b = school.get_student(b).unwrap().class_id.clone();
        if class_a != class_b {
            return Some(Move::Swap(a.clone(), b.clone()));
        }
    }
    None
}

/// Picks a uniformly random single-student relocation into a different class.
pub fn random_move_one<R: Rng>(school: &School, rng: &mut R) -> Option<Move> {
    let class_ids: Vec<ClassId> = school.classes().map(|c| c.class_id.clone()).collect();
    if class_ids.len() < 2 {
        return None;
    }
    let assigned: Vec<&StudentId> = school
        .students()
        .filter(|s| s.class_id.is_some())
        .map(|s| &s.student_id)
        .collect();
    let student_id = (*assigned.choose(rng)?).clone();
    let current = school.get_student(&student_id).unwrap().class_id.clone();
    for _ in 0..20 {
        let target = class_ids.choose(rng)?.clone();
        if Some(&target) != current.as_ref() {
            return Some(Move::MoveOne(student_id, target));
        }
    }
    None
}

/// Picks a uniformly random force-friend group and a uniformly random target
/// class for it to move into together. Returns `None` if the school has no
/// force-friend groups or fewer than two classes.
pub fn random_group_move<R: Rng>(school: &School, rng: &mut R) -> Option<Move> {
    let class_ids: Vec<ClassId> = school.classes().map(|c| c.class_id.clone()).collect();
    if class_ids.len() < 2 {
        return None;
    }
    let groups = school.force_friend_groups();
    let group_ids: Vec<&GroupId> = groups.keys().collect();
    let group_id = *group_ids.choose(rng)?;
    let members = groups.get(group_id)?.clone();
    let target = class_ids.choose(rng)?.clone();
    Some(Move::GroupMove(members, target))
}

/// Every pairwise swap between students in different classes, for
/// exhaustive-neighborhood solvers (Greedy Local Search).
pub fn all_swaps(school: &School) -> Vec<Move> {
    let assigned: Vec<&StudentId> = school
        .students()
        .filter(|s| s.class_id.is_some())
        .map(|s| &s.student_id)
        .collect();
    let mut moves = Vec::new();
    for (i, a) in assigned.iter().enumerate() {
        let class_a = school.get_student(a).unwrap().class_id.clone();
        for b in &assigned[i + 1..] {
            let class_b = school.get_student(b).unwrap().class_id.clone();
            if class_a != class_b {
                moves.push(Move::Swap((*a).clone(), (*b).clone()));
            }
        }
    }
    moves
}
