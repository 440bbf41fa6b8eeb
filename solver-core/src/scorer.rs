//! The three-layer scoring function.
//!
//! Called on the order of 10^5-10^7 times per solver run, so `score` is the
//! primary hot path. It is a full O(|students| + |classes|) recomputation on
//! every call rather than an incremental per-move delta (see `DESIGN.md`,
//! item B) — simpler to keep correct, and fast enough at this domain's scale.
//! Per-class aggregates are accumulated in `class_id` order (the `School`
//! stores classes in a `BTreeMap`) so repeated runs round floating point the
//! same way every time.

use crate::config::Config;
use crate::domain::{ClassId, Gender, School, Student, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Per-student breakdown of the student layer.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StudentScoreDetail {
    pub friend_satisfaction: f64,
    pub friends_requested: usize,
    pub friends_placed: usize,
    pub missing_friends: Vec<StudentId>,
    pub conflict_avoidance: f64,
    pub dislikes_total: usize,
    pub dislikes_avoided: usize,
    pub conflicts_present: Vec<StudentId>,
    /// Weighted combination of `friend_satisfaction` and `conflict_avoidance`.
    pub overall: f64,
}

/// Per-class breakdown of the class layer.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClassScoreDetail {
    pub size: usize,
    pub male_count: usize,
    pub female_count: usize,
    pub male_ratio: f64,
    pub female_ratio: f64,
    pub balance_difference: f64,
    pub gender_balance: f64,
    /// The class layer currently has a single metric (gender balance), so
    /// `overall` mirrors `gender_balance`; kept distinct so a future second
    /// class metric only changes this combination, not every call site.
    pub overall: f64,
}

/// A stdev-based balance metric computed over one value per class.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BalanceMetric {
    pub score: f64,
    pub std_dev: f64,
    pub mean: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub range: f64,
    pub class_values: BTreeMap<ClassId, f64>,
}

/// The school layer: cross-class balance across six metrics.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SchoolScoreDetail {
    pub academic_balance: BalanceMetric,
    pub behavior_balance: BalanceMetric,
    pub studentiality_balance: BalanceMetric,
    pub size_balance: BalanceMetric,
    pub assistance_balance: BalanceMetric,
    pub school_origin_balance: BalanceMetric,
    pub overall: f64,
}

/// Immutable snapshot produced by `score`. Consumed read-only by reporters
/// and the portfolio manager.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScoringResult {
    pub students: BTreeMap<StudentId, StudentScoreDetail>,
    pub classes: BTreeMap<ClassId, ClassScoreDetail>,
    pub school: SchoolScoreDetail,
    pub student_layer_score: f64,
    pub class_layer_score: f64,
    pub school_layer_score: f64,
    pub final_score: f64,
}

/// Students sharing `student.class_id`'s roster, excluding the student
/// themself. Empty if the student is unassigned or their `class_id` does not
/// resolve to an existing class.
fn classmates<'a>(school: &'a School, student: &Student) -> HashSet<&'a str> {
    let Some(class_id) = &student.class_id else {
        return HashSet::new();
    };
    let Some(class) = school.get_class(class_id) else {
        return HashSet::new();
    };
    class
        .student_ids
        .iter()
        .map(String::as_str)
        .filter(|id| *id != student.student_id)
        .collect()
}

fn has_resolvable_class(school: &School, student: &Student) -> bool {
    student
        .class_id
        .as_deref()
        .is_some_and(|id| school.get_class(id).is_some())
}

fn friend_satisfaction(school: &School, student: &Student) -> StudentScoreDetail {
    let preferred: Vec<StudentId> = student
        .preferred_friends()
        .into_iter()
        .filter(|id| school.get_student(id).is_some())
        .collect();

    if preferred.is_empty() {
        return StudentScoreDetail {
            friend_satisfaction: 100.0,
            friends_requested: 0,
            friends_placed: 0,
            missing_friends: Vec::new(),
            conflict_avoidance: 0.0,
            dislikes_total: 0,
            dislikes_avoided: 0,
            conflicts_present: Vec::new(),
            overall: 0.0,
        };
    }

    if !has_resolvable_class(school, student) {
        return StudentScoreDetail {
            friend_satisfaction: 0.0,
            friends_requested: preferred.len(),
            friends_placed: 0,
            missing_friends: preferred,
            conflict_avoidance: 0.0,
            dislikes_total: 0,
            dislikes_avoided: 0,
            conflicts_present: Vec::new(),
            overall: 0.0,
        };
    }

    let mates = classmates(school, student);
    let mut placed = 0usize;
    let mut missing = Vec::new();
    for friend in &preferred {
        if mates.contains(friend.as_str()) {
            placed += 1;
        } else {
            missing.push(friend.clone());
        }
    }
    let requested = preferred.len();
    StudentScoreDetail {
        friend_satisfaction: 100.0 * placed as f64 / requested as f64,
        friends_requested: requested,
        friends_placed: placed,
        missing_friends: missing,
        conflict_avoidance: 0.0,
        dislikes_total: 0,
        dislikes_avoided: 0,
        conflicts_present: Vec::new(),
        overall: 0.0,
    }
}

fn conflict_avoidance(school: &School, student: &Student) -> (f64, usize, usize, Vec<StudentId>) {
    let disliked: Vec<StudentId> = student
        .disliked_peers()
        .into_iter()
        .filter(|id| school.get_student(id).is_some())
        .collect();

    if disliked.is_empty() {
        return (100.0, 0, 0, Vec::new());
    }

    if !has_resolvable_class(school, student) {
        let total = disliked.len();
        return (100.0, total, total, Vec::new());
    }

    let mates = classmates(school, student);
    let mut conflicts = Vec::new();
    for peer in &disliked {
        if mates.contains(peer.as_str()) {
            conflicts.push(peer.clone());
        }
    }
    let total = disliked.len();
    let avoided = total - conflicts.len();
    (100.0 * avoided as f64 / total as f64, total, avoided, conflicts)
}

fn student_score(school: &School, config: &Config, student: &Student) -> StudentScoreDetail {
    let mut detail = friend_satisfaction(school, student);
    let (conflict, dislikes_total, dislikes_avoided, conflicts_present) =
        conflict_avoidance(school, student);
    detail.conflict_avoidance = conflict;
    detail.dislikes_total = dislikes_total;
    detail.dislikes_avoided = dislikes_avoided;
    detail.conflicts_present = conflicts_present;

    let w = &config.weights;
    let total_weight = w.friends + w.dislikes;
    detail.overall = if total_weight == 0.0 {
        0.0
    } else {
        (detail.friend_satisfaction * w.friends + detail.conflict_avoidance * w.dislikes)
            / total_weight
    };
    detail
}

fn gender_balance(class_students: &[&Student]) -> ClassScoreDetail {
    if class_students.is_empty() {
        return ClassScoreDetail {
            size: 0,
            male_count: 0,
            female_count: 0,
            male_ratio: 0.0,
            female_ratio: 0.0,
            balance_difference: 0.0,
            gender_balance: 100.0,
            overall: 100.0,
        };
    }
    let size = class_students.len();
    let male_count = class_students.iter().filter(|s| s.gender == Gender::M).count();
    let female_count = size - male_count;
    let male_ratio = male_count as f64 / size as f64;
    let female_ratio = female_count as f64 / size as f64;
    let balance_difference = (male_ratio - female_ratio).abs();
    let score = 100.0 - balance_difference * 100.0;
    ClassScoreDetail {
        size,
        male_count,
        female_count,
        male_ratio,
        female_ratio,
        balance_difference,
        gender_balance: score,
        overall: score,
    }
}

/// Population standard deviation, or 0 for fewer than one value.
fn population_stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn balance_metric(class_values: BTreeMap<ClassId, f64>, normalization_factor: f64) -> BalanceMetric {
    if class_values.is_empty() {
        return BalanceMetric {
            score: 100.0,
            std_dev: 0.0,
            mean: 0.0,
            min_value: 0.0,
            max_value: 0.0,
            range: 0.0,
            class_values,
        };
    }
    let values: Vec<f64> = class_values.values().copied().collect();
    let std_dev = population_stdev(&values);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let min_value = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_value = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let score = (100.0 - std_dev * normalization_factor).clamp(0.0, 100.0);
    BalanceMetric {
        score,
        std_dev,
        mean,
        min_value,
        max_value,
        range: max_value - min_value,
        class_values,
    }
}

/// Shannon diversity of `school_of_origin` values within a class, normalized
/// to [0, 100]. An empty class, a class with no `school_of_origin` data, or a
/// class where every student shares one origin has nothing to penalize —
/// each scores a perfect 100, same as every other per-class metric's
/// empty/degenerate case.
fn shannon_diversity(class_students: &[&Student]) -> f64 {
    if class_students.is_empty() {
        return 100.0;
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for s in class_students {
        let origin = s.school_of_origin.as_deref().unwrap_or("");
        *counts.entry(origin).or_insert(0) += 1;
    }
    if counts.len() <= 1 {
        return 100.0;
    }
    let n = class_students.len() as f64;
    let entropy: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / n;
            -p * p.ln()
        })
        .sum();
    let max_entropy = (counts.len() as f64).ln();
    100.0 * entropy / max_entropy
}

/// Computes the full scoring breakdown for `school` under `config`.
pub fn score(school: &School, config: &Config) -> ScoringResult {
    let mut students = BTreeMap::new();
    for student in school.students() {
        students.insert(student.student_id.clone(), student_score(school, config, student));
    }
    let student_layer_score = if students.is_empty() {
        0.0
    } else {
        students.values().map(|d| d.overall).sum::<f64>() / students.len() as f64
    };

    let mut classes = BTreeMap::new();
    let mut academic_values = BTreeMap::new();
    let mut behavior_values = BTreeMap::new();
    let mut studentiality_values = BTreeMap::new();
    let mut size_values = BTreeMap::new();
    let mut assistance_values = BTreeMap::new();
    let mut origin_values = BTreeMap::new();

    for class in school.classes() {
        let members: Vec<&Student> = class
            .student_ids
            .iter()
            .filter_map(|id| school.get_student(id))
            .collect();

        classes.insert(class.class_id.clone(), gender_balance(&members));

        let size = members.len();
        size_values.insert(class.class_id.clone(), size as f64);
        if size > 0 {
            let academic_mean = members.iter().map(|s| s.academic_score).sum::<f64>() / size as f64;
            let behavior_mean =
                members.iter().map(|s| s.behavior_rank.numeric()).sum::<f64>() / size as f64;
            let studentiality_mean = members
                .iter()
                .map(|s| s.studentiality_rank.numeric())
                .sum::<f64>()
                / size as f64;
            let assistance_count =
                members.iter().filter(|s| s.assistance_package).count() as f64;
            academic_values.insert(class.class_id.clone(), academic_mean);
            behavior_values.insert(class.class_id.clone(), behavior_mean);
            studentiality_values.insert(class.class_id.clone(), studentiality_mean);
            assistance_values.insert(class.class_id.clone(), assistance_count);
        }
        origin_values.insert(class.class_id.clone(), shannon_diversity(&members));
    }

    let class_layer_score = if classes.is_empty() {
        0.0
    } else {
        classes.values().map(|c| c.overall).sum::<f64>() / classes.len() as f64
    };

    let norm = &config.normalization;
    let school_detail = SchoolScoreDetail {
        academic_balance: balance_metric(academic_values, norm.academic_score_factor),
        behavior_balance: balance_metric(behavior_values, norm.behavior_rank_factor),
        studentiality_balance: balance_metric(studentiality_values, norm.studentiality_rank_factor),
        size_balance: balance_metric(size_values, norm.class_size_factor),
        assistance_balance: balance_metric(assistance_values, norm.assistance_count_factor),
        school_origin_balance: balance_metric(origin_values, norm.school_origin_factor),
        overall: 0.0,
    };

    let w = &config.weights;
    let school_weight_sum = w.academic_balance
        + w.behavior_balance
        + w.studentiality_balance
        + w.size_balance
        + w.assistance_balance
        + w.school_origin_balance;
    let school_layer_score = if school_weight_sum == 0.0 {
        0.0
    } else {
        (school_detail.academic_balance.score * w.academic_balance
            + school_detail.behavior_balance.score * w.behavior_balance
            + school_detail.studentiality_balance.score * w.studentiality_balance
            + school_detail.size_balance.score * w.size_balance
            + school_detail.assistance_balance.score * w.assistance_balance
            + school_detail.school_origin_balance.score * w.school_origin_balance)
            / school_weight_sum
    };
    let school_detail = SchoolScoreDetail {
        overall: school_layer_score,
        ..school_detail
    };

    let layer_weight_sum = w.student_layer + w.class_layer + w.school_layer;
    let final_score = if layer_weight_sum == 0.0 {
        0.0
    } else {
        (student_layer_score * w.student_layer
            + class_layer_score * w.class_layer
            + school_layer_score * w.school_layer)
            / layer_weight_sum
    };

    ScoringResult {
        students,
        classes,
        school: school_detail,
        student_layer_score,
        class_layer_score,
        school_layer_score,
        final_score,
    }
}

/// Computes only the final composite score, skipping the per-student/class
/// breakdown allocations. Intended for hot inner loops (e.g. simulated
/// annealing's per-candidate evaluation) that only need the scalar.
pub fn score_quick(school: &School, config: &Config) -> f64 {
    score(school, config).final_score
}
