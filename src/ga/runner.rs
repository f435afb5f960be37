//! GA evolutionary loop execution.
//!
//! [`GeneticAlgorithm`] orchestrates the complete evolutionary process:
//! seeding → evaluation → elitism → selection → crossover → mutation → repeat.

use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::GeneticConfig;
use super::selection::{adaptive_mutation_rate, diversity, tournament};
use super::types::{fittest, mean_fitness, Individual};
use crate::optimizer::{OptimizerError, OptimizerResult};
use crate::problem::{create_rng, improvement, SearchOutcome, SearchProblem, SearchStats};

/// Snapshot of the population at the end of a generation.
///
/// Generation 0 describes the seeded population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,

    /// Best fitness in this generation's population.
    pub best_fitness: f64,

    pub average_fitness: f64,

    /// Normalized fitness spread, see [`diversity`](super::diversity).
    pub diversity: f64,

    /// Mutation rate used to breed this generation.
    pub mutation_rate: f64,

    pub population_size: usize,
}

/// Statistics of a Genetic Algorithm run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticStats {
    /// Generations executed (excluding the seeded population).
    pub generations: usize,

    /// Candidates evaluated, including ones rejected as infeasible.
    pub evaluations: usize,

    /// Candidates discarded by the feasibility check.
    pub rejected_candidates: usize,

    /// Slots filled with a clone after regeneration attempts ran out.
    pub fallback_clones: usize,

    /// Whether the run stopped on `max_no_improvement`.
    pub stagnated: bool,

    pub final_mutation_rate: f64,

    pub history: Vec<GenerationStats>,

    pub elapsed_ms: u64,
}

/// Genetic Algorithm over any [`SearchProblem`].
///
/// # Usage
///
/// ```
/// use league_opt::ga::{GeneticAlgorithm, GeneticConfig};
/// use league_opt::problem::FnProblem;
/// use rand::Rng;
///
/// let problem = FnProblem::new(
///     |x: &f64| -(x - 1.0).abs(),
///     |rng| rng.random_range(-10.0..10.0),
///     |x, rng| x + rng.random_range(-0.5..0.5),
/// )
/// .with_crossover(|a, b, _| ((a + b) / 2.0, *b));
///
/// let ga = GeneticAlgorithm::new(GeneticConfig::default().with_seed(42)).unwrap();
/// let outcome = ga.optimize(8.0, &problem).unwrap();
/// assert!(outcome.fitness >= outcome.initial_fitness);
/// ```
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    config: GeneticConfig,
}

impl GeneticAlgorithm {
    /// Creates an engine after validating `config`.
    pub fn new(config: GeneticConfig) -> OptimizerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Runs the GA seeded with `initial`.
    pub fn optimize<S, P>(&self, initial: S, problem: &P) -> OptimizerResult<SearchOutcome<S>>
    where
        S: Clone + Send + Sync,
        P: SearchProblem<S> + ?Sized,
    {
        self.optimize_with_observer(initial, problem, |_| {})
    }

    /// Runs the GA and reports every generation to `observer`.
    pub fn optimize_with_observer<S, P, O>(
        &self,
        initial: S,
        problem: &P,
        mut observer: O,
    ) -> OptimizerResult<SearchOutcome<S>>
    where
        S: Clone + Send + Sync,
        P: SearchProblem<S> + ?Sized,
        O: FnMut(&GenerationStats),
    {
        let config = &self.config;
        let started = Instant::now();
        let mut rng = create_rng(config.seed);

        let initial_fitness = problem.fitness(&initial);
        if !initial_fitness.is_finite() {
            return Err(OptimizerError::Execution(format!(
                "initial solution has non-finite fitness {initial_fitness}"
            )));
        }
        debug!(
            event = "ga.started",
            initial_fitness,
            population_size = config.population_size
        );

        let mut rejected_candidates = 0usize;
        let mut fallback_clones = 0usize;

        // 1. Seed: the initial solution plus fresh feasible candidates
        let mut seeds = Vec::with_capacity(config.population_size - 1);
        for _ in 1..config.population_size {
            let mut attempts = 0usize;
            loop {
                let candidate = problem.create_candidate(&mut rng);
                if problem.is_valid(&candidate) {
                    seeds.push(candidate);
                    break;
                }
                rejected_candidates += 1;
                attempts += 1;
                if attempts >= config.max_regeneration_attempts {
                    fallback_clones += 1;
                    seeds.push(initial.clone());
                    break;
                }
            }
        }

        let mut population = Vec::with_capacity(config.population_size);
        population.push(Individual::new(initial, initial_fitness));
        population.extend(evaluate(problem, seeds, config.parallel));
        let mut evaluations = config.population_size + rejected_candidates;

        // 2. Track best
        let mut best = best_of(&population)?.clone();
        let mut history = Vec::with_capacity(config.max_generations + 1);
        let seeded = generation_stats(0, &population, config.mutation_rate);
        observer(&seeded);
        history.push(seeded);

        let mut mutation_rate = config.mutation_rate;
        let mut stagnation_counter = 0usize;
        let mut stagnated = false;
        let mut generations = 0usize;

        // 3. Evolutionary loop
        for generation in 1..=config.max_generations {
            population.sort_by(Individual::best_first);

            mutation_rate = if config.adaptive_mutation {
                adaptive_mutation_rate(config.mutation_rate, diversity(&population))
            } else {
                config.mutation_rate
            };

            let target = config.population_size - config.elite_count;
            let mut offspring: Vec<S> = Vec::with_capacity(target);
            let mut slot_failures = 0usize;

            while offspring.len() < target {
                let i1 = tournament(&population, config.tournament_size, &mut rng);
                let i2 = tournament(&population, config.tournament_size, &mut rng);
                let p1 = &population[i1].candidate;
                let p2 = &population[i2].candidate;

                let (c1, c2) = if rng.random_range(0.0..1.0) < config.crossover_rate {
                    problem
                        .crossover(p1, p2, &mut rng)
                        .unwrap_or_else(|| (p1.clone(), p2.clone()))
                } else {
                    (p1.clone(), p2.clone())
                };

                for child in [c1, c2] {
                    if offspring.len() >= target {
                        break;
                    }
                    let child = if rng.random_range(0.0..1.0) < mutation_rate {
                        problem.mutate(&child, &mut rng)
                    } else {
                        child
                    };

                    if problem.is_valid(&child) {
                        offspring.push(child);
                        slot_failures = 0;
                        continue;
                    }

                    rejected_candidates += 1;
                    evaluations += 1;
                    slot_failures += 1;
                    if slot_failures >= config.max_regeneration_attempts {
                        let fitter = if population[i1].fitness >= population[i2].fitness {
                            i1
                        } else {
                            i2
                        };
                        offspring.push(population[fitter].candidate.clone());
                        fallback_clones += 1;
                        slot_failures = 0;
                    }
                }
            }

            // Elites are carried over unchanged and never re-evaluated.
            evaluations += offspring.len();
            let mut next_gen: Vec<Individual<S>> = population[..config.elite_count].to_vec();
            next_gen.extend(evaluate(problem, offspring, config.parallel));
            population = next_gen;
            generations = generation;

            let gen_best = best_of(&population)?;
            if gen_best.fitness > best.fitness {
                best = gen_best.clone();
                stagnation_counter = 0;
            } else {
                stagnation_counter += 1;
            }

            let stats = generation_stats(generation, &population, mutation_rate);
            observer(&stats);
            history.push(stats);

            if stagnation_counter >= config.max_no_improvement {
                stagnated = true;
                break;
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(
            event = "ga.finished",
            generations,
            evaluations,
            stagnated,
            best_fitness = best.fitness,
            elapsed_ms
        );

        Ok(SearchOutcome {
            fitness: best.fitness,
            improvement: improvement(initial_fitness, best.fitness),
            solution: best.candidate,
            initial_fitness,
            stats: SearchStats::Genetic(GeneticStats {
                generations,
                evaluations,
                rejected_candidates,
                fallback_clones,
                stagnated,
                final_mutation_rate: mutation_rate,
                history,
                elapsed_ms,
            }),
        })
    }
}

/// Scores candidates, in parallel when enabled. NaN scores rank last.
fn evaluate<S, P>(problem: &P, candidates: Vec<S>, parallel: bool) -> Vec<Individual<S>>
where
    S: Send + Sync,
    P: SearchProblem<S> + ?Sized,
{
    let score = |candidate: S| {
        let fitness = problem.fitness(&candidate);
        let fitness = if fitness.is_nan() {
            f64::NEG_INFINITY
        } else {
            fitness
        };
        Individual::new(candidate, fitness)
    };

    #[cfg(feature = "parallel")]
    {
        if parallel {
            use rayon::prelude::*;
            return candidates.into_par_iter().map(score).collect();
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    candidates.into_iter().map(score).collect()
}

fn best_of<S>(population: &[Individual<S>]) -> OptimizerResult<&Individual<S>> {
    fittest(population)
        .map(|i| &population[i])
        .ok_or_else(|| OptimizerError::Execution("population is empty".into()))
}

fn generation_stats<S>(
    generation: usize,
    population: &[Individual<S>],
    mutation_rate: f64,
) -> GenerationStats {
    GenerationStats {
        generation,
        best_fitness: fittest(population)
            .map(|i| population[i].fitness)
            .unwrap_or(f64::NEG_INFINITY),
        average_fitness: mean_fitness(population),
        diversity: diversity(population),
        mutation_rate,
        population_size: population.len(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::FnProblem;
    use rand::RngCore;

    fn stats(outcome: &SearchOutcome<Vec<bool>>) -> &GeneticStats {
        match &outcome.stats {
            SearchStats::Genetic(s) => s,
            other => panic!("unexpected stats {other:?}"),
        }
    }

    // ---- OneMax problem: maximize the number of set bits ----

    fn one_max(n: usize) -> FnProblem<Vec<bool>> {
        FnProblem::new(
            |bits: &Vec<bool>| bits.iter().filter(|&&b| b).count() as f64,
            move |rng: &mut dyn RngCore| (0..n).map(|_| rng.random_bool(0.5)).collect(),
            move |bits: &Vec<bool>, rng: &mut dyn RngCore| {
                let mut bits = bits.clone();
                let idx = rng.random_range(0..bits.len());
                bits[idx] = !bits[idx];
                bits
            },
        )
        .with_crossover(|p1: &Vec<bool>, p2: &Vec<bool>, rng: &mut dyn RngCore| {
            // Single-point crossover
            let point = rng.random_range(0..p1.len());
            let mut c1 = p1[..point].to_vec();
            c1.extend_from_slice(&p2[point..]);
            let mut c2 = p2[..point].to_vec();
            c2.extend_from_slice(&p1[point..]);
            (c1, c2)
        })
    }

    #[test]
    fn test_onemax_convergence() {
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_population_size(50)
                .with_max_generations(200)
                .with_max_no_improvement(50)
                .with_mutation_rate(0.3)
                .with_seed(42),
        )
        .unwrap();

        let outcome = ga.optimize(vec![false; 20], &one_max(20)).unwrap();

        assert!(
            outcome.fitness >= 16.0,
            "expected fitness >= 16 for 20-bit OneMax, got {}",
            outcome.fitness
        );
        assert!(outcome.fitness >= outcome.initial_fitness);
    }

    #[test]
    fn test_stagnation_termination() {
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_population_size(20)
                .with_max_generations(1000)
                .with_max_no_improvement(10)
                .with_seed(42),
        )
        .unwrap();

        let outcome = ga.optimize(vec![false; 5], &one_max(5)).unwrap();
        let stats = stats(&outcome);

        assert!(stats.stagnated);
        assert!(stats.generations < 1000);
    }

    #[test]
    fn test_elite_preservation() {
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_population_size(20)
                .with_max_generations(50)
                .with_max_no_improvement(50)
                .with_elite_count(2)
                .with_mutation_rate(0.5)
                .with_seed(42),
        )
        .unwrap();

        let outcome = ga.optimize(vec![false; 10], &one_max(10)).unwrap();

        for window in stats(&outcome).history.windows(2) {
            assert!(
                window[1].best_fitness >= window[0].best_fitness,
                "best fitness should be non-decreasing with elitism: {} < {}",
                window[1].best_fitness,
                window[0].best_fitness
            );
        }
    }

    #[test]
    fn test_population_size_is_invariant() {
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_population_size(17)
                .with_elite_count(3)
                .with_max_generations(30)
                .with_seed(9),
        )
        .unwrap();

        let mut sizes = Vec::new();
        ga.optimize_with_observer(vec![false; 8], &one_max(8), |s| {
            sizes.push(s.population_size)
        })
        .unwrap();

        assert!(!sizes.is_empty());
        assert!(sizes.iter().all(|&n| n == 17));
    }

    #[test]
    fn test_initial_solution_is_kept_when_best() {
        // The seed is already optimal; no generation can beat it.
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_population_size(10)
                .with_max_no_improvement(5)
                .with_seed(1),
        )
        .unwrap();

        let outcome = ga.optimize(vec![true; 6], &one_max(6)).unwrap();

        assert!((outcome.fitness - 6.0).abs() < 1e-12);
        assert!((outcome.improvement).abs() < 1e-12);
        assert!(stats(&outcome).stagnated);
    }

    #[test]
    fn test_invalid_candidates_are_regenerated() {
        // Reject any candidate whose first bit is set.
        let problem = one_max(10).with_validity(|bits: &Vec<bool>| !bits[0]);
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_population_size(30)
                .with_max_generations(40)
                .with_mutation_rate(0.5)
                .with_seed(4),
        )
        .unwrap();

        let outcome = ga.optimize(vec![false; 10], &problem).unwrap();
        let stats = stats(&outcome);

        assert!(!outcome.solution[0]);
        assert!(stats.rejected_candidates > 0);
        assert!(stats.evaluations > stats.rejected_candidates);
    }

    #[test]
    fn test_fallback_when_nothing_is_valid() {
        // Only the initial solution is feasible.
        let problem = one_max(4).with_validity(|bits: &Vec<bool>| bits.iter().all(|b| !b));
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_population_size(5)
                .with_elite_count(1)
                .with_max_generations(3)
                .with_mutation_rate(1.0)
                .with_max_regeneration_attempts(3)
                .with_seed(2),
        )
        .unwrap();

        let outcome = ga.optimize(vec![false; 4], &problem).unwrap();
        let stats = stats(&outcome);

        assert!(stats.fallback_clones > 0);
        assert_eq!(outcome.solution, vec![false; 4]);
    }

    #[test]
    fn test_zero_elites_still_returns_best_ever() {
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_population_size(10)
                .with_elite_count(0)
                .with_max_generations(20)
                .with_seed(8),
        )
        .unwrap();

        let outcome = ga.optimize(vec![true; 12], &one_max(12)).unwrap();

        assert!((outcome.fitness - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_without_crossover_operator() {
        let problem = FnProblem::new(
            |x: &f64| -x.abs(),
            |rng: &mut dyn RngCore| rng.random_range(-10.0..10.0),
            |x: &f64, rng: &mut dyn RngCore| x + rng.random_range(-0.5..0.5),
        );
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_crossover_rate(1.0)
                .with_seed(42),
        )
        .unwrap();

        let outcome = ga.optimize(9.0, &problem).unwrap();

        assert!(outcome.fitness > -9.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_gives_same_quality() {
        let ga = GeneticAlgorithm::new(
            GeneticConfig::default()
                .with_population_size(50)
                .with_max_generations(100)
                .with_mutation_rate(0.3)
                .with_parallel(true)
                .with_seed(42),
        )
        .unwrap();

        let outcome = ga.optimize(vec![false; 20], &one_max(20)).unwrap();

        assert!(
            outcome.fitness >= 12.0,
            "parallel should find reasonable solution, got {}",
            outcome.fitness
        );
    }
}
