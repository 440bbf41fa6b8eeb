//! Simulated annealing with pluggable cooling schedules.
//!
//! Field shape grounded directly on the teacher's `SimulatedAnnealingParams`
//! (`initial_temperature`, `cooling_schedule`, reheat fields); the reheat
//! machinery itself is dropped since the spec's cooling contract (§4.F.3)
//! does not call for it — documented in DESIGN.md.

use super::{finalize, seeded_rng, should_continue, OptimizationResult, SolverConfig};
use crate::config::Config;
use crate::domain::School;
use crate::neighborhood::{self, Move};
use crate::scorer::score_quick;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoolingSchedule {
    Linear,
    Exponential,
    Logarithmic,
    Adaptive,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SimulatedAnnealingParams {
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,
    #[serde(default = "default_min_temperature")]
    pub min_temperature: f64,
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    #[serde(default = "default_cooling_schedule")]
    pub cooling_schedule: CoolingSchedule,
    #[serde(default = "default_iterations_per_temperature")]
    pub iterations_per_temperature: u64,
    #[serde(default = "default_swap_probability")]
    pub swap_probability: f64,
    /// Probability of overriding the force-friend-group feasibility gate,
    /// per spec.md §4.E ("≤0.1").
    #[serde(default = "default_override_probability")]
    pub group_override_probability: f64,
}

fn default_initial_temperature() -> f64 {
    100.0
}
fn default_min_temperature() -> f64 {
    0.1
}
fn default_cooling_rate() -> f64 {
    0.95
}
fn default_cooling_schedule() -> CoolingSchedule {
    CoolingSchedule::Exponential
}
fn default_iterations_per_temperature() -> u64 {
    50
}
fn default_swap_probability() -> f64 {
    0.7
}
fn default_override_probability() -> f64 {
    0.1
}

impl Default for SimulatedAnnealingParams {
    fn default() -> Self {
        SimulatedAnnealingParams {
            initial_temperature: default_initial_temperature(),
            min_temperature: default_min_temperature(),
            cooling_rate: default_cooling_rate(),
            cooling_schedule: default_cooling_schedule(),
            iterations_per_temperature: default_iterations_per_temperature(),
            swap_probability: default_swap_probability(),
            group_override_probability: default_override_probability(),
        }
    }
}

const BEST_SCORE_STOP_THRESHOLD: f64 = 99.0;

fn cool(schedule: CoolingSchedule, t: f64, t_init: f64, cooling_rate: f64, iter: u64, max_iterations: u64) -> f64 {
    match schedule {
        CoolingSchedule::Linear => t_init * (1.0 - iter as f64 / max_iterations.max(1) as f64),
        CoolingSchedule::Exponential => t * cooling_rate,
        CoolingSchedule::Logarithmic => t_init / (2.0 + iter as f64).ln(),
        CoolingSchedule::Adaptive => t * cooling_rate,
    }
}

pub fn optimize(
    initial: &School,
    config: &Config,
    solver_config: &SolverConfig,
    params: &SimulatedAnnealingParams,
    max_iterations: u64,
) -> OptimizationResult {
    let start = std::time::Instant::now();
    let mut rng = seeded_rng(solver_config);

    let mut current = initial.clone();
    let initial_score = score_quick(&current, config);
    let mut current_score = initial_score;
    let mut best = current.clone();
    let mut best_score = initial_score;

    let mut score_history = vec![initial_score];
    let mut best_score_history = vec![best_score];
    let mut best_iteration = Some(0u64);

    let mut temperature = params.initial_temperature;
    let mut iter = 0u64;
    let mut no_improvement = 0u64;

    while should_continue(iter, max_iterations, no_improvement, solver_config.early_stop_threshold)
        && temperature >= params.min_temperature
        && best_score < BEST_SCORE_STOP_THRESHOLD
    {
        let mv = if rng.random::<f64>() < params.swap_probability {
            neighborhood::random_swap(&current, &mut rng)
        } else {
            neighborhood::random_move_one(&current, &mut rng)
        };

        if let Some(mv) = mv {
            if neighborhood::is_feasible(&current, &mv, params.group_override_probability, &mut rng) {
                let mut candidate = current.clone();
                neighborhood::apply(&mut candidate, &mv).expect("feasible move");
                let candidate_score = score_quick(&candidate, config);
                let delta = candidate_score - current_score;
                let accept = delta > 0.0 || rng.random::<f64>() < (delta / temperature.max(1e-9)).exp();
                if accept {
                    current = candidate;
                    current_score = candidate_score;
                    if current_score > best_score {
                        best_score = current_score;
                        best = current.clone();
                        best_iteration = Some(iter + 1);
                        no_improvement = 0;
                    } else {
                        no_improvement += 1;
                    }
                } else {
                    no_improvement += 1;
                }
            } else {
                no_improvement += 1;
            }
        } else {
            no_improvement += 1;
        }

        iter += 1;
        if iter % params.iterations_per_temperature == 0 {
            temperature = cool(
                params.cooling_schedule,
                temperature,
                params.initial_temperature,
                params.cooling_rate,
                iter,
                max_iterations,
            );
        }
        score_history.push(current_score);
        best_score_history.push(best_score);
    }

    finalize(
        "SimulatedAnnealing",
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
    fn best_score_history_is_monotonic() {
        let school = sample_school();
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(11), ..SolverConfig::default() };
        let result = optimize(&school, &config, &solver_config, &SimulatedAnnealingParams::default(), 200);
        for window in result.best_score_history.windows(2) {
            assert!(window[1] >= window[0]);
        }
    }

    #[test]
    fn exponential_cooling_decreases_temperature() {
        let t0 = 100.0;
        let t1 = cool(CoolingSchedule::Exponential, t0, t0, 0.9, 50, 1000);
        assert!(t1 < t0);
    }

    #[test]
    fn linear_cooling_reaches_zero_at_max_iterations() {
        let t = cool(CoolingSchedule::Linear, 100.0, 100.0, 0.9, 1000, 1000);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn stops_early_once_best_score_crosses_threshold() {
        let school = School::from_parts(
            vec![student("a", "c1")],
            vec![Class { class_id: "c1".into(), student_ids: vec!["a".into()] }],
        );
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(1), ..SolverConfig::default() };
        let result = optimize(&school, &config, &solver_config, &SimulatedAnnealingParams::default(), 10_000);
        assert!(result.iterations_executed < 10_000);
    }
}
