//! Greedy local search: pass-structured first-improvement hill climbing.
//!
//! Grounded on the teacher's pass/sub-budget structure in
//! `solver/moves/transfer.rs`'s per-pass move-sampling loop, generalized to
//! the shared `neighborhood` primitives.

use super::{finalize, seeded_rng, should_continue, OptimizationResult, SolverConfig};
use crate::config::Config;
use crate::domain::School;
use crate::neighborhood::{self, Move};
use crate::scorer::score_quick;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocalSearchParams {
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,
    #[serde(default = "default_min_improvement")]
    pub min_improvement: f64,
    #[serde(default = "default_min_passes")]
    pub min_passes: u32,
}

fn default_max_passes() -> u32 {
    20
}
fn default_min_improvement() -> f64 {
    0.01
}
fn default_min_passes() -> u32 {
    2
}

impl Default for LocalSearchParams {
    fn default() -> Self {
        LocalSearchParams {
            max_passes: default_max_passes(),
            min_improvement: default_min_improvement(),
            min_passes: default_min_passes(),
        }
    }
}

pub fn optimize(
    initial: &School,
    config: &Config,
    solver_config: &SolverConfig,
    params: &LocalSearchParams,
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

    let per_pass_budget = (max_iterations / params.max_passes.max(1) as u64).max(1);
    let class_ids: Vec<String> = current.classes().map(|c| c.class_id.clone()).collect();

    let mut iter = 0u64;
    let mut no_improvement = 0u64;
    let mut pass = 0u32;

    'passes: while pass < params.max_passes {
        let pass_start_score = best_score;
        let mut student_ids: Vec<String> = current.students().map(|s| s.student_id.clone()).collect();
        student_ids.shuffle(&mut rng);

        let mut used_in_pass = 0u64;
        for student_id in student_ids {
            if !should_continue(iter, max_iterations, no_improvement, solver_config.early_stop_threshold) {
                break 'passes;
            }
            if used_in_pass >= per_pass_budget {
                break;
            }

            let mut accepted = false;
            let mut targets = class_ids.clone();
            targets.shuffle(&mut rng);
            for target in &targets {
                let mv = Move::MoveOne(student_id.clone(), target.clone());
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

            if accepted {
                no_improvement = 0;
            } else {
                no_improvement += 1;
            }
            iter += 1;
            used_in_pass += 1;
            score_history.push(score_quick(&current, config));
            best_score_history.push(best_score);
        }

        pass += 1;
        let pass_improvement = best_score - pass_start_score;
        if pass_improvement < params.min_improvement && pass >= params.min_passes {
            break;
        }
    }

    finalize(
        "LocalSearch",
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
        let solver_config = SolverConfig { seed: Some(3), ..SolverConfig::default() };
        let result = optimize(&school, &config, &solver_config, &LocalSearchParams::default(), 100);
        assert!(result.final_score >= result.initial_score);
    }

    #[test]
    fn stops_within_requested_passes_budget() {
        let school = sample_school();
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(3), ..SolverConfig::default() };
        let params = LocalSearchParams { max_passes: 2, min_passes: 2, min_improvement: 0.0 };
        let result = optimize(&school, &config, &solver_config, &params, 1000);
        assert!(result.iterations_executed <= 1000);
    }
}
