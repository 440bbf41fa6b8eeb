//! Hill-climbing random swap solver.
//!
//! Grounded on the teacher's random-restart move loop in
//! `solver/moves/swap.rs` (pick-two-classes / pick-student / evaluate idiom),
//! generalized to the feasibility-gated `neighborhood::Move::Swap` primitive.

use super::{finalize, seeded_rng, should_continue, OptimizationResult, SolverConfig};
use crate::config::Config;
use crate::domain::School;
use crate::neighborhood::{self, Move};
use crate::scorer::score_quick;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RandomSwapParams {
    #[serde(default = "default_max_swap_attempts")]
    pub max_swap_attempts: u32,
}

fn default_max_swap_attempts() -> u32 {
    50
}

impl Default for RandomSwapParams {
    fn default() -> Self {
        RandomSwapParams {
            max_swap_attempts: default_max_swap_attempts(),
        }
    }
}

/// Picks one movable student (no `force_class`, when constraints are
/// respected) from each of two distinct classes that both have at least one.
fn pick_two_movable_students(school: &School, respect_force_constraints: bool) -> Vec<(String, String)> {
    let mut by_class: std::collections::BTreeMap<&str, Vec<&str>> = std::collections::BTreeMap::new();
    for s in school.students() {
        if s.class_id.is_none() {
            continue;
        }
        if respect_force_constraints && s.force_class.is_some() {
            continue;
        }
        by_class
            .entry(s.class_id.as_deref().unwrap())
            .or_default()
            .push(&s.student_id);
    }
    let mut pairs = Vec::new();
    let classes: Vec<&str> = by_class.keys().copied().collect();
    for (i, &c1) in classes.iter().enumerate() {
        for &c2 in &classes[i + 1..] {
            for &a in &by_class[c1] {
                for &b in &by_class[c2] {
                    pairs.push((a.to_string(), b.to_string()));
                }
            }
        }
    }
    pairs
}

pub fn optimize(
    initial: &School,
    config: &Config,
    solver_config: &SolverConfig,
    params: &RandomSwapParams,
    max_iterations: u64,
) -> OptimizationResult {
    let start = std::time::Instant::now();
    let mut rng = seeded_rng(solver_config);

    let mut current = initial.clone();
    let initial_score = score_quick(&current, config);
    let mut best = current.clone();
    let mut best_score = initial_score;

    let mut score_history = vec![initial_score];
    let mut best_score_history = vec![best_score];
    let mut best_iteration = Some(0u64);

    let mut iter = 0u64;
    let mut no_improvement = 0u64;

    while should_continue(iter, max_iterations, no_improvement, solver_config.early_stop_threshold) {
        let candidates = pick_two_movable_students(&current, solver_config.respect_force_constraints);
        let mut accepted = false;
        if !candidates.is_empty() {
            for _ in 0..params.max_swap_attempts {
                let (a, b) = candidates.choose(&mut rng).unwrap().clone();
                let mv = Move::Swap(a, b);
                if !neighborhood::is_feasible(&current, &mv, 0.0, &mut rng) {
                    continue;
                }
                let mut candidate = current.clone();
                neighborhood::apply(&mut candidate, &mv).expect("feasible move");
                let candidate_score = score_quick(&candidate, config);
                let improves = candidate_score > best_score
                    || (solver_config.accept_neutral_moves && candidate_score >= best_score);
                if improves {
                    current = candidate;
                    if candidate_score > best_score {
                        best_score = candidate_score;
                        best = current.clone();
                        best_iteration = Some(iter + 1);
                    }
                    accepted = true;
                    break;
                }
            }
        }

        if accepted {
            no_improvement = 0;
        } else {
            no_improvement += 1;
        }
        iter += 1;
        score_history.push(score_quick(&current, config));
        best_score_history.push(best_score);
    }

    finalize(
        "RandomSwap",
        best,
        config,
        solver_config.min_friends_required,
        initial_score,
        best_score,
        start.elapsed().as_secs_f64(),
        max_iterations,
        iter,
        score_history,
        best_score_history,
        best_iteration,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Class, Gender, Rank, Student};

    fn student(id: &str, class_id: &str) -> Student {
        Student {
            student_id: id.to_string(),
            first_name: "F".into(),
            last_name: "L".into(),
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
            class_id: Some(class_id.to_string()),
        }
    }

    fn sample_school() -> School {
        School::from_parts(
            (0..8).map(|i| student(&format!("s{i}"), if i % 2 == 0 { "c1" } else { "c2" })),
            vec![
                Class { class_id: "c1".into(), student_ids: (0..8).step_by(2).map(|i| format!("s{i}")).collect() },
                Class { class_id: "c2".into(), student_ids: (1..8).step_by(2).map(|i| format!("s{i}")).collect() },
            ],
        )
    }

    #[test]
    fn never_decreases_best_score() {
        let school = sample_school();
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(1), ..SolverConfig::default() };
        let result = optimize(&school, &config, &solver_config, &RandomSwapParams::default(), 50);
        assert!(result.final_score >= result.initial_score);
        for window in result.best_score_history.windows(2) {
            assert!(window[1] >= window[0]);
        }
    }

    #[test]
    fn deterministic_given_same_seed() {
        let school = sample_school();
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(99), ..SolverConfig::default() };
        let r1 = optimize(&school, &config, &solver_config, &RandomSwapParams::default(), 30);
        let r2 = optimize(&school, &config, &solver_config, &RandomSwapParams::default(), 30);
        assert_eq!(r1.final_score, r2.final_score);
        assert_eq!(r1.score_history, r2.score_history);
    }

    #[test]
    fn respects_force_class_during_search() {
        let school = sample_school();
        let pinned = School::from_parts(
            school.students().cloned().map(|mut s| {
                if s.student_id == "s0" {
                    s.force_class = Some("c1".into());
                }
                s
            }),
            school.classes().cloned(),
        );
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(5), ..SolverConfig::default() };
        let result = optimize(&pinned, &config, &solver_config, &RandomSwapParams::default(), 40);
        assert_eq!(result.school.get_student("s0").unwrap().class_id.as_deref(), Some("c1"));
    }
}
