//! Genetic algorithm: population-based search with elitism.
//!
//! No direct teacher analog (the source repo has no population-based
//! solver); grounded on spec.md §4.F.4's explicit generation loop and on the
//! teacher's `SimulatedAnnealingParams`-style serde param struct shape.

use super::{finalize, seeded_rng, should_continue, OptimizationResult, SolverConfig};
use crate::config::Config;
use crate::domain::School;
use crate::neighborhood::{self, Move};
use crate::scorer::score_quick;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMethod {
    Tournament,
    Roulette,
    Rank,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneticParams {
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    #[serde(default = "default_elite_size")]
    pub elite_size: usize,
    #[serde(default = "default_max_generations")]
    pub max_generations: u64,
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    #[serde(default = "default_selection_method")]
    pub selection_method: SelectionMethod,
    #[serde(default = "default_convergence_generations")]
    pub convergence_generations: u64,
    #[serde(default = "default_min_improvement")]
    pub min_improvement: f64,
    /// Probability of overriding the force-friend-group feasibility gate,
    /// per spec.md §4.E ("≤0.3" for the genetic mutator).
    #[serde(default = "default_override_probability")]
    pub group_override_probability: f64,
}

fn default_population_size() -> usize {
    50
}
fn default_elite_size() -> usize {
    5
}
fn default_max_generations() -> u64 {
    200
}
fn default_crossover_rate() -> f64 {
    0.8
}
fn default_mutation_rate() -> f64 {
    0.1
}
fn default_tournament_size() -> usize {
    3
}
fn default_selection_method() -> SelectionMethod {
    SelectionMethod::Tournament
}
fn default_convergence_generations() -> u64 {
    30
}
fn default_min_improvement() -> f64 {
    0.01
}
fn default_override_probability() -> f64 {
    0.3
}

impl Default for GeneticParams {
    fn default() -> Self {
        GeneticParams {
            population_size: default_population_size(),
            elite_size: default_elite_size(),
            max_generations: default_max_generations(),
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            tournament_size: default_tournament_size(),
            selection_method: default_selection_method(),
            convergence_generations: default_convergence_generations(),
            min_improvement: default_min_improvement(),
            group_override_probability: default_override_probability(),
        }
    }
}

/// Reduces `population_size` for large instances, per spec.md §4.F.4's
/// explicit performance contract: `max(20, N/4)` above ~100 students.
fn scaled_population_size(requested: usize, student_count: usize) -> usize {
    if student_count > 100 {
        requested.min((student_count / 4).max(20))
    } else {
        requested
    }
}

const OFFSPRING_ATTEMPT_MULTIPLIER: usize = 3;
const MAX_RANDOM_MODIFICATIONS: u32 = 5;

fn random_modifications<R: Rng>(school: &mut School, count: u32, override_probability: f64, rng: &mut R) -> bool {
    for _ in 0..count {
        let mv = match rng.random_range(0..3) {
            0 => neighborhood::random_swap(school, rng),
            1 => neighborhood::random_move_one(school, rng),
            _ => neighborhood::random_group_move(school, rng),
        };
        let Some(mv) = mv else { continue };
        if !neighborhood::is_feasible(school, &mv, override_probability, rng) {
            continue;
        }
        if neighborhood::apply(school, &mv).is_err() {
            return false;
        }
    }
    true
}

fn random_individual<R: Rng>(base: &School, override_probability: f64, rng: &mut R) -> School {
    for _ in 0..10 {
        let mut candidate = base.clone();
        let count = rng.random_range(1..=MAX_RANDOM_MODIFICATIONS);
        if random_modifications(&mut candidate, count, override_probability, rng) {
            return candidate;
        }
    }
    base.clone()
}

fn select_parent<'a, R: Rng>(
    population: &'a [School],
    fitness: &[f64],
    method: SelectionMethod,
    tournament_size: usize,
    rng: &mut R,
) -> &'a School {
    match method {
        SelectionMethod::Tournament => {
            let indices: Vec<usize> = (0..population.len()).collect();
            let sampled = indices.choose_multiple(rng, tournament_size.min(population.len()));
            let winner = sampled.max_by(|&&a, &&b| fitness[a].partial_cmp(&fitness[b]).unwrap()).unwrap();
            &population[*winner]
        }
        SelectionMethod::Roulette => {
            let total: f64 = fitness.iter().sum();
            if total <= 0.0 {
                return population.choose(rng).unwrap();
            }
            let mut pick = rng.random::<f64>() * total;
            for (school, &f) in population.iter().zip(fitness) {
                if pick <= f {
                    return school;
                }
                pick -= f;
            }
            population.last().unwrap()
        }
        SelectionMethod::Rank => {
            let mut order: Vec<usize> = (0..population.len()).collect();
            order.sort_by(|&a, &b| fitness[a].partial_cmp(&fitness[b]).unwrap());
            let total_weight = order.len() * (order.len() + 1) / 2;
            let mut pick = rng.random_range(1..=total_weight.max(1));
            for (rank, &idx) in order.iter().enumerate() {
                let weight = rank + 1;
                if pick <= weight {
                    return &population[idx];
                }
                pick -= weight;
            }
            &population[*order.last().unwrap()]
        }
    }
}

fn crossover<R: Rng>(parent1: &School, parent2: &School, override_probability: f64, rng: &mut R) -> School {
    let mut child = parent1.clone();
    let student_ids: Vec<String> = parent1.students().map(|s| s.student_id.clone()).collect();
    for student_id in student_ids {
        if rng.random::<f64>() < 0.5 {
            continue;
        }
        let Some(target) = parent2.get_student(&student_id).and_then(|s| s.class_id.clone()) else {
            continue;
        };
        let mv = Move::MoveOne(student_id, target);
        if neighborhood::is_feasible(&child, &mv, override_probability, rng) {
            let _ = neighborhood::apply(&mut child, &mv);
        }
    }
    child
}

fn mutate<R: Rng>(school: &mut School, mutation_rate: f64, override_probability: f64, rng: &mut R) {
    let n = school.student_count().max(1);
    let count = ((mutation_rate * n as f64).round() as u32).clamp(0, MAX_RANDOM_MODIFICATIONS);
    random_modifications(school, count, override_probability, rng);
}

pub fn optimize(
    initial: &School,
    config: &Config,
    solver_config: &SolverConfig,
    params: &GeneticParams,
    max_iterations: u64,
) -> OptimizationResult {
    let start = std::time::Instant::now();
    let mut rng = seeded_rng(solver_config);

    let initial_score = score_quick(initial, config);
    let population_size = scaled_population_size(params.population_size, initial.student_count()).max(1);
    let max_generations = max_iterations.min(params.max_generations);

    let mut population: Vec<School> = Vec::with_capacity(population_size);
    population.push(initial.clone());
    for _ in 1..population_size {
        population.push(random_individual(initial, params.group_override_probability, &mut rng));
    }

    let mut best = initial.clone();
    let mut best_score = initial_score;
    let mut best_iteration = Some(0u64);
    let mut score_history = vec![initial_score];
    let mut best_score_history = vec![best_score];

    let mut generation = 0u64;
    let mut no_improvement = 0u64;

    while should_continue(generation, max_generations, no_improvement, params.convergence_generations) {
        let fitness: Vec<f64> = population.iter().map(|s| score_quick(s, config)).collect();

        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| fitness[b].partial_cmp(&fitness[a]).unwrap());
        let elite_size = params.elite_size.min(population.len());
        let elites: Vec<School> = ranked[..elite_size].iter().map(|&i| population[i].clone()).collect();

        let generation_best_idx = ranked[0];
        let generation_best_score = fitness[generation_best_idx];
        if generation_best_score > best_score + params.min_improvement {
            best_score = generation_best_score;
            best = population[generation_best_idx].clone();
            best_iteration = Some(generation + 1);
            no_improvement = 0;
        } else {
            if generation_best_score > best_score {
                best_score = generation_best_score;
                best = population[generation_best_idx].clone();
            }
            no_improvement += 1;
        }

        let mut next_generation = elites.clone();
        let mut attempts = 0usize;
        while next_generation.len() < population_size && attempts < OFFSPRING_ATTEMPT_MULTIPLIER * population_size {
            attempts += 1;
            let parent1 = select_parent(&population, &fitness, params.selection_method, params.tournament_size, &mut rng);
            let parent2 = select_parent(&population, &fitness, params.selection_method, params.tournament_size, &mut rng);

            let mut child = if rng.random::<f64>() < params.crossover_rate {
                crossover(parent1, parent2, params.group_override_probability, &mut rng)
            } else {
                parent1.clone()
            };

            if rng.random::<f64>() < params.mutation_rate {
                mutate(&mut child, params.mutation_rate, params.group_override_probability, &mut rng);
            }

            next_generation.push(child);
        }
        while next_generation.len() < population_size {
            let pick = elites.choose(&mut rng).unwrap_or(&population[0]);
            next_generation.push(pick.clone());
        }

        population = next_generation;
        generation += 1;
        score_history.push(fitness.iter().cloned().fold(f64::MIN, f64::max));
        best_score_history.push(best_score);
    }

    finalize(
        "Genetic",
        best,
        config,
        solver_config.min_friends_required,
        initial_score,
        best_score,
        start.elapsed().as_secs_f64(),
        max_iterations,
        generation,
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
            (0..12).map(|i| student(&format!("s{i}"), if i % 2 == 0 { "c1" } else { "c2" })),
            vec![
                Class { class_id: "c1".into(), student_ids: (0..12).step_by(2).map(|i| format!("s{i}")).collect() },
                Class { class_id: "c2".into(), student_ids: (1..12).step_by(2).map(|i| format!("s{i}")).collect() },
            ],
        )
    }

    #[test]
    fn never_decreases_best_score() {
        let school = sample_school();
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(8), ..SolverConfig::default() };
        let params = GeneticParams { population_size: 10, max_generations: 15, ..GeneticParams::default() };
        let result = optimize(&school, &config, &solver_config, &params, 100);
        assert!(result.final_score >= result.initial_score);
    }

    #[test]
    fn population_size_is_scaled_down_for_large_instances() {
        assert_eq!(scaled_population_size(50, 200), 50.min(50));
        assert_eq!(scaled_population_size(200, 400), 100);
        assert_eq!(scaled_population_size(10, 400), 10);
    }

    #[test]
    fn every_offspring_keeps_every_student_assigned() {
        let school = sample_school();
        let config = Config::default();
        let solver_config = SolverConfig { seed: Some(2), ..SolverConfig::default() };
        let params = GeneticParams { population_size: 6, max_generations: 5, ..GeneticParams::default() };
        let result = optimize(&school, &config, &solver_config, &params, 50);
        assert_eq!(result.school.unassigned_students().count(), 0);
    }
}
