//! Solver contract, shared configuration, and the closed dispatch enum.
//!
//! Each algorithm lives in its own submodule behind the same
//! `optimize(School, max_iterations) -> OptimizationResult` shape, grounded on
//! the teacher's single-contract `State`-driven solvers. `dsu` is kept
//! verbatim from the teacher — the clique/group-merge algorithm is
//! domain-agnostic and is reused unchanged by the initializer.

pub mod cp_sat;
pub mod genetic;
pub mod local_search;
pub mod random_swap;
pub mod simulated_annealing;

use crate::config::Config;
use crate::domain::School;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration shared by every solver. Algorithm-specific fields live in
/// each submodule's own `*Params` type, merged alongside this one.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SolverConfig {
    #[serde(default)]
    pub min_friends_required: usize,
    #[serde(default = "default_true")]
    pub respect_force_constraints: bool,
    #[serde(default)]
    pub accept_neutral_moves: bool,
    /// Consecutive no-improvement iterations after which the solver stops.
    #[serde(default = "default_early_stop_threshold")]
    pub early_stop_threshold: u64,
    #[serde(default)]
    pub log_level: LogLevel,
    /// Seeds the run's RNG. Absent means seed from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_true() -> bool {
    true
}
fn default_early_stop_threshold() -> u64 {
    500
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            min_friends_required: 0,
            respect_force_constraints: true,
            accept_neutral_moves: false,
            early_stop_threshold: default_early_stop_threshold(),
            log_level: LogLevel::default(),
            seed: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Builds the one RNG a solver run owns for its entire lifetime, per the
/// seeded-per-run determinism contract.
pub fn seeded_rng(config: &SolverConfig) -> ChaCha8Rng {
    match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}

/// Cooperative cancellation check consulted before every iteration.
pub fn should_continue(iter: u64, max_iterations: u64, no_improvement_streak: u64, early_stop_threshold: u64) -> bool {
    iter < max_iterations && no_improvement_streak < early_stop_threshold
}

/// Shared tail end of every solver run: validate the best-ever school found
/// and assemble the result record. Kept here so every solver reports
/// `constraints_satisfied`/`violations` the same way.
#[allow(clippy::too_many_arguments)]
pub(crate) fn finalize(
    algorithm: &str,
    best_school: School,
    config: &Config,
    min_friends_required: usize,
    initial_score: f64,
    final_score: f64,
    elapsed_seconds: f64,
    iterations_requested: u64,
    iterations_executed: u64,
    score_history: Vec<f64>,
    best_score_history: Vec<f64>,
    best_iteration: Option<u64>,
) -> OptimizationResult {
    let (constraints_satisfied, violations) =
        crate::constraints::validate_with_min_friends(&best_school, config, min_friends_required);
    OptimizationResult {
        school: best_school,
        algorithm: algorithm.to_string(),
        initial_score,
        final_score,
        improvement: final_score - initial_score,
        elapsed_seconds,
        iterations_requested,
        iterations_executed,
        score_history,
        best_score_history,
        constraints_satisfied,
        violations,
        best_iteration,
    }
}

/// Outcome of a single solver run, reported regardless of where search
/// currently stood — always the best-ever feasible solution seen.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OptimizationResult {
    pub school: School,
    pub algorithm: String,
    pub initial_score: f64,
    pub final_score: f64,
    pub improvement: f64,
    pub elapsed_seconds: f64,
    pub iterations_requested: u64,
    pub iterations_executed: u64,
    pub score_history: Vec<f64>,
    pub best_score_history: Vec<f64>,
    pub constraints_satisfied: bool,
    pub violations: Vec<crate::constraints::Violation>,
    pub best_iteration: Option<u64>,
}

/// Closed enum over every solver this crate knows how to dispatch and name.
/// `CpSat` is a deliberate dispatch-complete stub (see `cp_sat`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    RandomSwap,
    LocalSearch,
    SimulatedAnnealing,
    Genetic,
    CpSat,
}

impl Solver {
    pub fn name(self) -> &'static str {
        match self {
            Solver::RandomSwap => "RandomSwap",
            Solver::LocalSearch => "LocalSearch",
            Solver::SimulatedAnnealing => "SimulatedAnnealing",
            Solver::Genetic => "Genetic",
            Solver::CpSat => "CpSat",
        }
    }

    /// Runs the solver with its default algorithm parameters. Callers who
    /// need non-default parameters should call the submodule's `optimize`
    /// directly (e.g. `simulated_annealing::optimize`).
    pub fn optimize(
        self,
        school: &School,
        config: &Config,
        solver_config: &SolverConfig,
        max_iterations: u64,
    ) -> OptimizationResult {
        match self {
            Solver::RandomSwap => {
                random_swap::optimize(school, config, solver_config, &Default::default(), max_iterations)
            }
            Solver::LocalSearch => {
                local_search::optimize(school, config, solver_config, &Default::default(), max_iterations)
            }
            Solver::SimulatedAnnealing => simulated_annealing::optimize(
                school,
                config,
                solver_config,
                &Default::default(),
                max_iterations,
            ),
            Solver::Genetic => {
                genetic::optimize(school, config, solver_config, &Default::default(), max_iterations)
            }
            Solver::CpSat => cp_sat::optimize(school, config, solver_config, max_iterations),
        }
    }
}
