//! SA execution loop.

use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::AnnealingConfig;
use crate::optimizer::{OptimizerError, OptimizerResult};
use crate::problem::{create_rng, improvement, SearchOutcome, SearchProblem, SearchStats};

/// Why an SA run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MinTemperature,
    MaxIterations,
    EarlyStopping,
}

/// Statistics of a Simulated Annealing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealingStats {
    /// Total proposals (neighbor evaluations).
    pub iterations: usize,

    /// Temperature levels completed.
    pub temperature_levels: usize,

    /// Accepted moves, including improvements.
    pub accepted_moves: usize,

    /// Proposals that produced a new best-ever fitness.
    pub improving_moves: usize,

    /// Neighbors discarded as infeasible.
    pub rejected_candidates: usize,

    /// Jumps back to the best-ever solution with reheating.
    pub restarts: usize,

    pub final_temperature: f64,
    pub stop_reason: StopReason,

    /// Best-ever fitness at the end of every temperature level.
    pub best_fitness_history: Vec<f64>,

    pub elapsed_ms: u64,
}

/// Simulated Annealing over any [`SearchProblem`].
///
/// Keeps a `current` solution that follows the Metropolis criterion and a
/// separately tracked best-ever solution, which is what gets returned.
///
/// # Examples
///
/// ```
/// use league_opt::problem::FnProblem;
/// use league_opt::sa::{AnnealingConfig, SimulatedAnnealing};
/// use rand::Rng;
///
/// let problem = FnProblem::new(
///     |x: &f64| -(x - 3.0).powi(2),
///     |rng| rng.random_range(-10.0..10.0),
///     |x, rng| x + rng.random_range(-0.5..0.5),
/// );
/// let sa = SimulatedAnnealing::new(AnnealingConfig::default().with_seed(42)).unwrap();
/// let outcome = sa.optimize(-8.0, &problem).unwrap();
/// assert!(outcome.fitness >= outcome.initial_fitness);
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    config: AnnealingConfig,
}

impl SimulatedAnnealing {
    /// Creates an engine after validating `config`.
    pub fn new(config: AnnealingConfig) -> OptimizerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    /// Runs SA starting from `initial`.
    ///
    /// All search state is local to this call, so one engine may be shared
    /// by concurrent callers.
    pub fn optimize<S, P>(&self, initial: S, problem: &P) -> OptimizerResult<SearchOutcome<S>>
    where
        S: Clone,
        P: SearchProblem<S> + ?Sized,
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
            event = "sa.started",
            initial_fitness,
            initial_temperature = config.initial_temperature
        );

        let mut current = initial.clone();
        let mut current_fitness = initial_fitness;
        let mut best = initial;
        let mut best_fitness = initial_fitness;

        let mut temperature = config.initial_temperature;
        let mut iterations = 0usize;
        let mut levels = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut rejected_candidates = 0usize;
        let mut restarts = 0usize;
        let mut since_improvement = 0usize;
        let mut stagnant_levels = 0usize;
        let mut history = vec![best_fitness];

        let stop_reason = loop {
            if temperature < config.min_temperature {
                break StopReason::MinTemperature;
            }

            let mut level_accepted = 0usize;
            let mut level_proposals = 0usize;
            let mut improved_this_level = false;
            let mut budget_hit = None;

            for _ in 0..config.iterations_per_temp {
                if iterations >= config.max_iterations {
                    budget_hit = Some(StopReason::MaxIterations);
                    break;
                }
                if since_improvement >= config.early_stopping_threshold {
                    budget_hit = Some(StopReason::EarlyStopping);
                    break;
                }

                iterations += 1;
                level_proposals += 1;

                let neighbor = problem.mutate(&current, &mut rng);
                if !problem.is_valid(&neighbor) {
                    rejected_candidates += 1;
                    since_improvement += 1;
                    continue;
                }
                let neighbor_fitness = problem.fitness(&neighbor);
                if neighbor_fitness.is_nan() {
                    rejected_candidates += 1;
                    since_improvement += 1;
                    continue;
                }

                // Best-ever is tracked independently of acceptance.
                if neighbor_fitness > best_fitness {
                    best = neighbor.clone();
                    best_fitness = neighbor_fitness;
                    improving_moves += 1;
                    since_improvement = 0;
                    improved_this_level = true;
                } else {
                    since_improvement += 1;
                }

                // Metropolis acceptance criterion
                let accept = if neighbor_fitness > current_fitness {
                    true
                } else {
                    let probability = ((neighbor_fitness - current_fitness) / temperature).exp();
                    rng.random_range(0.0..1.0) < probability
                };

                if accept {
                    current = neighbor;
                    current_fitness = neighbor_fitness;
                    accepted_moves += 1;
                    level_accepted += 1;
                }
            }

            if level_proposals > 0 {
                levels += 1;
                history.push(best_fitness);
            }
            if let Some(reason) = budget_hit {
                break reason;
            }

            stagnant_levels = if improved_this_level {
                0
            } else {
                stagnant_levels + 1
            };

            if stagnant_levels >= config.restart_threshold {
                current = best.clone();
                current_fitness = best_fitness;
                temperature = (config.initial_temperature * config.reheat_factor)
                    .max(config.min_temperature);
                stagnant_levels = 0;
                restarts += 1;
                debug!(event = "sa.restart", restarts, best_fitness, temperature);
                continue;
            }

            let rate = if config.adaptive_cooling {
                adaptive_rate(config.cooling_rate, level_accepted, level_proposals)
            } else {
                config.cooling_rate
            };
            temperature *= rate;
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(
            event = "sa.finished",
            ?stop_reason,
            iterations,
            best_fitness,
            elapsed_ms
        );

        Ok(SearchOutcome {
            solution: best,
            fitness: best_fitness,
            initial_fitness,
            improvement: improvement(initial_fitness, best_fitness),
            stats: SearchStats::Annealing(AnnealingStats {
                iterations,
                temperature_levels: levels,
                accepted_moves,
                improving_moves,
                rejected_candidates,
                restarts,
                final_temperature: temperature,
                stop_reason,
                best_fitness_history: history,
                elapsed_ms,
            }),
        })
    }
}

/// Cooling rate adjusted from the acceptance ratio of the last level.
///
/// Cools faster while most moves are accepted and slower once the search
/// is mostly rejecting.
fn adaptive_rate(base: f64, accepted: usize, proposals: usize) -> f64 {
    if proposals == 0 {
        return base;
    }
    let ratio = accepted as f64 / proposals as f64;
    if ratio > 0.6 {
        base * 0.95
    } else if ratio < 0.1 {
        (base + (1.0 - base) / 2.0).min(0.999)
    } else {
        base
    }
}
