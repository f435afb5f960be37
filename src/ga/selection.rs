//! Parent selection and mutation-rate control.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Eiben, Hinterding & Michalewicz (1999), "Parameter Control in
//!   Evolutionary Algorithms"

use rand::Rng;

use super::types::Individual;

/// Diversity below this doubles the mutation rate.
pub const LOW_DIVERSITY: f64 = 0.1;
/// Diversity above this halves the mutation rate.
pub const HIGH_DIVERSITY: f64 = 0.5;
/// Upper bound of a doubled mutation rate.
pub const MAX_ADAPTIVE_RATE: f64 = 0.5;
/// Lower bound of a halved mutation rate.
pub const MIN_ADAPTIVE_RATE: f64 = 0.05;

/// Tournament selection: pick `k` random individuals, return the fittest.
///
/// Higher `k` means stronger selection pressure.
///
/// # Panics
/// Panics if `population` is empty.
pub fn tournament<S, R: Rng + ?Sized>(population: &[Individual<S>], k: usize, rng: &mut R) -> usize {
    assert!(
        !population.is_empty(),
        "cannot select from empty population"
    );
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if population[idx].fitness > population[best_idx].fitness {
            best_idx = idx;
        }
    }
    best_idx
}

/// Normalized standard deviation of fitness, clamped to [0, 1].
///
/// The standard deviation is divided by the absolute mean (coefficient of
/// variation). A zero mean with any spread counts as fully diverse.
pub fn diversity<S>(population: &[Individual<S>]) -> f64 {
    let n = population.len();
    if n < 2 {
        return 0.0;
    }
    let mean = population.iter().map(|ind| ind.fitness).sum::<f64>() / n as f64;
    let variance = population
        .iter()
        .map(|ind| (ind.fitness - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    let std_dev = variance.sqrt();

    if mean.abs() < f64::EPSILON {
        return if std_dev > f64::EPSILON { 1.0 } else { 0.0 };
    }
    (std_dev / mean.abs()).clamp(0.0, 1.0)
}

/// Mutation rate for the next generation.
///
/// A converged population (low diversity) mutates more, a scattered one
/// mutates less.
pub fn adaptive_mutation_rate(base: f64, diversity: f64) -> f64 {
    if diversity < LOW_DIVERSITY {
        (base * 2.0).min(MAX_ADAPTIVE_RATE)
    } else if diversity > HIGH_DIVERSITY {
        (base / 2.0).max(MIN_ADAPTIVE_RATE)
    } else {
        base
    }
}
