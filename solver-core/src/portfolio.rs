//! Portfolio manager: detects assignment status, routes to the initializer,
//! and composes solver runs (sequential / parallel / best-of / comparison).
//!
//! Grounded on spec.md §4.G; no single teacher file owns this responsibility,
//! but the thread-per-run / `JoinHandle::join` concurrency shape is grounded
//! on the corpus's absence of `rayon`/async (see DESIGN.md item G) — the
//! contract (independent deep copies, no shared mutable state, block until
//! all finish) maps directly onto `std::thread::spawn`.

use crate::config::Config;
use crate::domain::School;
use crate::initializer::{self, Strategy};
use crate::scorer::score_quick;
use crate::solver::{OptimizationResult, Solver, SolverConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStatus {
    FullyAssigned,
    PartiallyAssigned,
    Unassigned,
    Mixed,
}

/// `Mixed` vs `PartiallyAssigned` is not pinned down precisely by the spec
/// beyond "based on how many students have a non-empty class_id"; this
/// implementation resolves it (see DESIGN.md) as: partial fill is students
/// missing from otherwise-populated classes, while mixed fill additionally
/// has at least one class that is completely empty alongside others that
/// already hold students — a sign the caller is handing in an inconsistent
/// partial roster rather than a simple "some students not yet placed" input.
pub fn assignment_status(school: &School) -> AssignmentStatus {
    let total = school.student_count();
    if total == 0 {
        return AssignmentStatus::FullyAssigned;
    }
    let assigned = total - school.unassigned_students().count();
    if assigned == total {
        AssignmentStatus::FullyAssigned
    } else if assigned == 0 {
        AssignmentStatus::Unassigned
    } else {
        let populated = school.classes().filter(|c| c.size() > 0).count();
        let empty = school.class_count() - populated;
        if populated > 0 && empty > 0 {
            AssignmentStatus::Mixed
        } else {
            AssignmentStatus::PartiallyAssigned
        }
    }
}

/// Single-solver entry point: auto-initializes if requested and not fully
/// assigned, then dispatches to the named solver.
pub fn optimize(
    school: &School,
    config: &Config,
    solver: Solver,
    max_iterations: u64,
    solver_config: &SolverConfig,
    initialization_strategy: Strategy,
    auto_initialize: bool,
    target_classes: Option<usize>,
) -> OptimizationResult {
    let mut working = school.clone();
    if auto_initialize && assignment_status(&working) != AssignmentStatus::FullyAssigned {
        let mut rng = seed_or_entropy(solver_config);
        initializer::initialize(&mut working, initialization_strategy, target_classes, &mut rng);
    }
    solver.optimize(&working, config, solver_config, max_iterations)
}

fn seed_or_entropy(solver_config: &SolverConfig) -> ChaCha8Rng {
    match solver_config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}

/// Runs `solvers` in sequence, each starting from the previous step's
/// optimized output; the iteration budget is split evenly. Returns the
/// per-step results plus a final combined result (the last step's output).
pub fn sequential(
    school: &School,
    config: &Config,
    solvers: &[Solver],
    total_iterations: u64,
    solver_config: &SolverConfig,
) -> (Vec<OptimizationResult>, OptimizationResult) {
    assert!(!solvers.is_empty(), "sequential portfolio requires at least one solver");
    let per_step = (total_iterations / solvers.len() as u64).max(1);
    let mut current = school.clone();
    let mut steps = Vec::with_capacity(solvers.len());
    for &solver in solvers {
        let result = solver.optimize(&current, config, solver_config, per_step);
        current = result.school.clone();
        steps.push(result);
    }
    let combined = steps.last().expect("non-empty solvers").clone();
    (steps, combined)
}

/// One run's statistics relative to the rest of a parallel batch.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ComparisonStats {
    pub best_score: f64,
    pub worst_score: f64,
    pub average_score: f64,
    pub score_range: f64,
}

fn comparison_stats(results: &[OptimizationResult]) -> ComparisonStats {
    let scores: Vec<f64> = results.iter().map(|r| r.final_score).collect();
    let best = scores.iter().cloned().fold(f64::MIN, f64::max);
    let worst = scores.iter().cloned().fold(f64::MAX, f64::min);
    let average = scores.iter().sum::<f64>() / scores.len().max(1) as f64;
    ComparisonStats {
        best_score: best,
        worst_score: worst,
        average_score: average,
        score_range: best - worst,
    }
}

/// Runs `solvers` in parallel, each on an independent deep copy of `school`
/// (fair start). Warns (via `log::warn`) if the copies' initial scores
/// diverge beyond floating-point tolerance, which would indicate the caller
/// passed solvers whose configs disagree about what "initial" means.
pub fn parallel(
    school: &School,
    config: &Config,
    solvers: &[Solver],
    max_iterations: u64,
    solver_config: &SolverConfig,
) -> Vec<OptimizationResult> {
    let initial_score = score_quick(school, config);

    let handles: Vec<_> = solvers
        .iter()
        .copied()
        .map(|solver| {
            let school = school.clone();
            let config = config.clone();
            let solver_config = solver_config.clone();
            std::thread::spawn(move || solver.optimize(&school, &config, &solver_config, max_iterations))
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.join() {
            Ok(result) => {
                if (result.initial_score - initial_score).abs() > 1e-6 {
                    log::warn!(
                        "parallel portfolio run {} started from a different initial score ({} vs {})",
                        result.algorithm,
                        result.initial_score,
                        initial_score
                    );
                }
                results.push(result);
            }
            Err(_) => log::warn!("a parallel portfolio solver thread panicked; dropping its run"),
        }
    }
    results
}

/// Parallel portfolio, reduced to the single best result plus summary stats.
pub fn best_of(
    school: &School,
    config: &Config,
    solvers: &[Solver],
    max_iterations: u64,
    solver_config: &SolverConfig,
) -> Option<(OptimizationResult, ComparisonStats)> {
    let results = parallel(school, config, solvers, max_iterations, solver_config);
    if results.is_empty() {
        return None;
    }
    let stats = comparison_stats(&results);
    let best = results
        .into_iter()
        .max_by(|a, b| a.final_score.partial_cmp(&b.final_score).unwrap())
        .expect("non-empty results");
    Some((best, stats))
}

/// Algorithm comparison: parallel run, ranked by final score / improvement /
/// execution time, with summary statistics.
pub fn compare_algorithms(
    school: &School,
    config: &Config,
    solvers: &[Solver],
    max_iterations: u64,
    solver_config: &SolverConfig,
) -> (Vec<OptimizationResult>, ComparisonStats) {
    let mut results = parallel(school, config, solvers, max_iterations, solver_config);
    results.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap());
    let stats = comparison_stats(&results);
    (results, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Class, Gender, Rank, Student};

    fn student(id: &str, class_id: Option<&str>) -> Student {
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
            class_id: class_id.map(str::to_string),
        }
    }

    fn sample_school() -> School {
        School::from_parts(
            (0..8).map(|i| student(&format!("s{i}"), Some(if i % 2 == 0 { "c1" } else { "c2" }))),
            vec![
                Class { class_id: "c1".into(), student_ids: (0..8).step_by(2).map(|i| format!("s{i}")).collect() },
                Class { class_id: "c2".into(), student_ids: (1..8).step_by(2).map(|i| format!("s{i}")).collect() },
            ],
        )
    }

    #[test]
    fn detects_fully_assigned() {
        assert_eq!(assignment_status(&sample_school()), AssignmentStatus::FullyAssigned);
    }

    #[test]
    fn detects_unassigned() {
        let school = School::from_parts(vec![student("a", None)], Vec::<Class>::new());
        assert_eq!(assignment_status(&school), AssignmentStatus::Unassigned);
    }

    #[test]
    fn auto_initialize_fills_before_optimizing() {
        let school = School::from_parts(vec![student("a", None), student("b", None)], Vec::<Class>::new());
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(1), ..SolverConfig::default() };
        let result = optimize(
            &school,
            &config,
            Solver::RandomSwap,
            20,
            &solver_config,
            Strategy::Balanced,
            true,
            Some(2),
        );
        assert_eq!(result.school.unassigned_students().count(), 0);
    }

    #[test]
    fn sequential_chains_solvers_and_returns_steps() {
        let school = sample_school();
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(2), ..SolverConfig::default() };
        let (steps, combined) = sequential(
            &school,
            &config,
            &[Solver::RandomSwap, Solver::LocalSearch],
            40,
            &solver_config,
        );
        assert_eq!(steps.len(), 2);
        assert_eq!(combined.final_score, steps[1].final_score);
    }

    #[test]
    fn best_of_picks_the_highest_scoring_run() {
        let school = sample_school();
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(3), ..SolverConfig::default() };
        let (best, stats) = best_of(
            &school,
            &config,
            &[Solver::RandomSwap, Solver::LocalSearch],
            30,
            &solver_config,
        )
        .unwrap();
        assert!(best.final_score <= stats.best_score + 1e-9);
        assert!(stats.best_score >= stats.worst_score);
    }
}
