//! Configuration tree recognized by the scorer, constraint model, initializer
//! and solvers.
//!
//! Numeric defaults below are not invented: they are the values shipped by the
//! reference implementation's `DEFAULT_CONFIG` (see `DESIGN.md` item J), carried
//! forward so a caller who supplies no configuration gets the same behavior.

use serde::{Deserialize, Serialize};

/// Top-level configuration threaded by value through every public entry point.
///
/// There is no module-level/global configuration state anywhere in this crate;
/// every function that needs scoring weights, normalization factors, or class
/// sizing takes a `&Config` explicitly.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub normalization: NormalizationFactors,
    #[serde(default)]
    pub class_config: ClassConfig,
}

/// Per-layer and per-metric scoring weights.
///
/// All weights are non-negative; weight groups are renormalized by their own
/// sum wherever they're combined (a group summing to zero yields a score of
/// zero for that combination, not a panic or NaN).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScoringWeights {
    /// Student layer: weight on friend satisfaction.
    #[serde(default = "default_w_friends")]
    pub friends: f64,
    /// Student layer: weight on conflict avoidance.
    #[serde(default = "default_w_dislikes")]
    pub dislikes: f64,

    /// Class layer: weight on gender balance.
    #[serde(default = "default_w_gender_balance")]
    pub gender_balance: f64,

    /// School layer: weight on academic-score balance.
    #[serde(default = "default_w_academic_balance")]
    pub academic_balance: f64,
    /// School layer: weight on behavior-rank balance.
    #[serde(default = "default_w_behavior_balance")]
    pub behavior_balance: f64,
    /// School layer: weight on studentiality-rank balance.
    #[serde(default = "default_w_studentiality_balance")]
    pub studentiality_balance: f64,
    /// School layer: weight on class-size balance.
    #[serde(default)]
    pub size_balance: f64,
    /// School layer: weight on assistance-package balance.
    #[serde(default = "default_w_assistance_balance")]
    pub assistance_balance: f64,
    /// School layer: weight on school-of-origin diversity balance.
    #[serde(default)]
    pub school_origin_balance: f64,

    /// Top-level layer weight: student layer.
    #[serde(default = "default_w_student_layer")]
    pub student_layer: f64,
    /// Top-level layer weight: class layer.
    #[serde(default = "default_w_class_layer")]
    pub class_layer: f64,
    /// Top-level layer weight: school layer.
    #[serde(default = "default_w_school_layer")]
    pub school_layer: f64,
}

fn default_w_friends() -> f64 {
    0.7
}
fn default_w_dislikes() -> f64 {
    0.3
}
fn default_w_gender_balance() -> f64 {
    1.0
}
fn default_w_academic_balance() -> f64 {
    0.05
}
fn default_w_behavior_balance() -> f64 {
    0.4
}
fn default_w_studentiality_balance() -> f64 {
    0.4
}
fn default_w_assistance_balance() -> f64 {
    0.15
}
fn default_w_student_layer() -> f64 {
    0.75
}
fn default_w_class_layer() -> f64 {
    0.05
}
fn default_w_school_layer() -> f64 {
    0.2
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            friends: default_w_friends(),
            dislikes: default_w_dislikes(),
            gender_balance: default_w_gender_balance(),
            academic_balance: default_w_academic_balance(),
            behavior_balance: default_w_behavior_balance(),
            studentiality_balance: default_w_studentiality_balance(),
            size_balance: 0.0,
            assistance_balance: default_w_assistance_balance(),
            school_origin_balance: 0.0,
            student_layer: default_w_student_layer(),
            class_layer: default_w_class_layer(),
            school_layer: default_w_school_layer(),
        }
    }
}

/// Factors converting a per-class metric's population standard deviation into
/// a 0-100 score deduction: `score = clamp(100 - stdev * factor, 0, 100)`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NormalizationFactors {
    #[serde(default = "default_academic_factor")]
    pub academic_score_factor: f64,
    #[serde(default = "default_behavior_factor")]
    pub behavior_rank_factor: f64,
    #[serde(default = "default_studentiality_factor")]
    pub studentiality_rank_factor: f64,
    #[serde(default = "default_class_size_factor")]
    pub class_size_factor: f64,
    #[serde(default = "default_assistance_factor")]
    pub assistance_count_factor: f64,
    #[serde(default = "default_school_origin_factor")]
    pub school_origin_factor: f64,
}

fn default_academic_factor() -> f64 {
    2.0
}
fn default_behavior_factor() -> f64 {
    35.0
}
fn default_studentiality_factor() -> f64 {
    35.0
}
fn default_class_size_factor() -> f64 {
    5.0
}
fn default_assistance_factor() -> f64 {
    10.0
}
fn default_school_origin_factor() -> f64 {
    20.0
}

impl Default for NormalizationFactors {
    fn default() -> Self {
        NormalizationFactors {
            academic_score_factor: default_academic_factor(),
            behavior_rank_factor: default_behavior_factor(),
            studentiality_rank_factor: default_studentiality_factor(),
            class_size_factor: default_class_size_factor(),
            assistance_count_factor: default_assistance_factor(),
            school_origin_factor: default_school_origin_factor(),
        }
    }
}

/// Class-organization parameters consumed by the initializer and the
/// class-size hard constraint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClassConfig {
    #[serde(default = "default_target_classes")]
    pub target_classes: usize,
    #[serde(default = "default_min_class_size")]
    pub min_class_size: usize,
    #[serde(default = "default_max_class_size")]
    pub max_class_size: usize,
    #[serde(default = "default_preferred_class_size")]
    pub preferred_class_size: usize,
    #[serde(default = "default_allow_uneven")]
    pub allow_uneven_classes: bool,
    /// Hard class-size band is off by default; per Open Question 1, only
    /// solvers that can honor it (and the CP-SAT encoding) enforce it.
    #[serde(default)]
    pub enforce_size_band: bool,
}

fn default_target_classes() -> usize {
    5
}
fn default_min_class_size() -> usize {
    15
}
fn default_max_class_size() -> usize {
    30
}
fn default_preferred_class_size() -> usize {
    25
}
fn default_allow_uneven() -> bool {
    true
}

impl Default for ClassConfig {
    fn default() -> Self {
        ClassConfig {
            target_classes: default_target_classes(),
            min_class_size: default_min_class_size(),
            max_class_size: default_max_class_size(),
            preferred_class_size: default_preferred_class_size(),
            allow_uneven_classes: default_allow_uneven(),
            enforce_size_band: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_match_reference_implementation() {
        let w = ScoringWeights::default();
        assert_eq!(w.friends, 0.7);
        assert_eq!(w.dislikes, 0.3);
        assert_eq!(w.student_layer, 0.75);
        assert_eq!(w.class_layer, 0.05);
        assert_eq!(w.school_layer, 0.2);
    }

    #[test]
    fn default_class_config_bounds_are_consistent() {
        let c = ClassConfig::default();
        assert!(c.min_class_size <= c.preferred_class_size);
        assert!(c.preferred_class_size <= c.max_class_size);
    }

    #[test]
    fn deserializes_from_empty_json_using_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.weights.friends, 0.7);
        assert_eq!(cfg.class_config.target_classes, 5);
    }
}
