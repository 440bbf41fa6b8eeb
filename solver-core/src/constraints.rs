//! Hard-constraint enumeration.
//!
//! Soft constraints are not modeled here at all — they only ever show up as
//! score contributions (see `scorer`). `validate` enumerates every violation
//! without short-circuiting, mirroring the teacher's
//! `validate_no_duplicate_assignments` idiom of reporting everything found
//! rather than bailing on the first problem.

use crate::config::Config;
use crate::domain::{ClassId, School, StudentId};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Violation {
    /// A student has no class assignment.
    Unassigned { student_id: StudentId },
    /// A student's `force_class` was not honored.
    ForceClassViolated {
        student_id: StudentId,
        required: ClassId,
        actual: Option<ClassId>,
    },
    /// A force-friend group is split across more than one class.
    ForceFriendGroupSplit {
        group_id: String,
        classes: Vec<ClassId>,
    },
    /// A class falls outside `[min_class_size, max_class_size]`.
    ClassSizeOutOfBand {
        class_id: ClassId,
        size: usize,
        min: usize,
        max: usize,
    },
    /// A student with at least one friend preference has fewer than
    /// `min_friends_required` preferred friends in their class.
    MinFriendsNotMet {
        student_id: StudentId,
        required: usize,
        actual: usize,
    },
}

/// Enumerates every hard-constraint violation in `school`. `min_friends_required`
/// is checked here as a reportable condition regardless of which solver is
/// running; whether a given solver treats it as a hard gate during search or
/// only checks it at termination is a per-solver policy (see `solver::*`).
pub fn validate(school: &School, config: &Config) -> (bool, Vec<Violation>) {
    validate_with_min_friends(school, config, 0)
}

/// Same as `validate`, but lets the caller supply `min_friends_required`
/// explicitly — solvers pass their own configured value rather than relying
/// on a value threaded through `Config`.
pub fn validate_with_min_friends(
    school: &School,
    config: &Config,
    min_friends_required: usize,
) -> (bool, Vec<Violation>) {
    let mut violations = Vec::new();

    for student in school.students() {
        match &student.class_id {
            None => violations.push(Violation::Unassigned {
                student_id: student.student_id.clone(),
            }),
            Some(class_id) => {
                if let Some(force_class) = &student.force_class {
                    if force_class != class_id {
                        violations.push(Violation::ForceClassViolated {
                            student_id: student.student_id.clone(),
                            required: force_class.clone(),
                            actual: Some(class_id.clone()),
                        });
                    }
                }
            }
        }
        if student.force_class.is_some() && student.class_id.is_none() {
            violations.push(Violation::ForceClassViolated {
                student_id: student.student_id.clone(),
                required: student.force_class.clone().unwrap(),
                actual: None,
            });
        }
    }

    for (group_id, members) in school.force_friend_groups() {
        let classes: Vec<ClassId> = members
            .iter()
            .filter_map(|id| school.get_student(id).and_then(|s| s.class_id.clone()))
            .collect();
        let unique: std::collections::BTreeSet<&str> =
            classes.iter().map(String::as_str).collect();
        if unique.len() > 1 || classes.len() != members.len() {
            violations.push(Violation::ForceFriendGroupSplit {
                group_id,
                classes: unique.into_iter().map(str::to_string).collect(),
            });
        }
    }

    if config.class_config.enforce_size_band {
        let min = config.class_config.min_class_size;
        let max = config.class_config.max_class_size;
        for class in school.classes() {
            let size = class.size();
            if size < min || size > max {
                violations.push(Violation::ClassSizeOutOfBand {
                    class_id: class.class_id.clone(),
                    size,
                    min,
                    max,
                });
            }
        }
    }

    if min_friends_required > 0 {
        for student in school.students() {
            let preferred = student.preferred_friends();
            if preferred.is_empty() {
                continue;
            }
            let Some(class_id) = &student.class_id else {
                continue;
            };
            let Some(class) = school.get_class(class_id) else {
                continue;
            };
            let placed = preferred
                .iter()
                .filter(|id| class.student_ids.contains(id))
                .count();
            if placed < min_friends_required {
                violations.push(Violation::MinFriendsNotMet {
                    student_id: student.student_id.clone(),
                    required: min_friends_required,
                    actual: placed,
                });
            }
        }
    }

    (violations.is_empty(), violations)
}
