//! Shared test utilities for solver-core integration tests.

use solver_core::domain::{Class, Gender, Rank, School, Student};

#[allow(dead_code)]
pub fn student(id: &str, class_id: Option<&str>) -> Student {
    let trailing_digit = id.chars().rev().find(|c| c.is_ascii_digit());
    let gender = match trailing_digit.and_then(|c| c.to_digit(10)) {
        Some(d) if d % 2 == 0 => Gender::F,
        _ => Gender::M,
    };
    Student {
        student_id: id.to_string(),
        first_name: "F".to_string(),
        last_name: "L".to_string(),
        gender,
        academic_score: 70.0,
        behavior_rank: Rank::B,
        studentiality_rank: Rank::B,
        assistance_package: false,
        school_of_origin: None,
        preferred_friends: vec![],
        disliked_peers: vec![],
        force_class: None,
        force_friend_group: None,
        class_id: class_id.map(str::to_string),
    }
}

/// Builds a school of `num_students` students distributed round-robin across
/// `num_classes` classes, all unpinned, with no friend/dislike preferences.
#[allow(dead_code)]
pub fn simple_school(num_students: usize, num_classes: usize) -> School {
    let class_ids: Vec<String> = (0..num_classes).map(|i| format!("class_{i}")).collect();
    let students = (0..num_students).map(|i| {
        let class_id = &class_ids[i % num_classes];
        student(&format!("s{i}"), Some(class_id))
    });
    let classes = class_ids.iter().enumerate().map(|(ci, class_id)| Class {
        class_id: class_id.clone(),
        student_ids: (0..num_students)
            .filter(|i| i % num_classes == ci)
            .map(|i| format!("s{i}"))
            .collect(),
    });
    School::from_parts(students, classes)
}
