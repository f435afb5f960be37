//! Simulated Annealing (SA).
//!
//! A single-solution trajectory metaheuristic inspired by the physical
//! annealing process. Accepts worsening moves with a probability that
//! decreases with temperature, allowing the search to escape local optima.
//! Stagnation triggers a restart from the best-ever solution with reheating.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Cerny (1985), "Thermodynamical Approach to the Travelling Salesman Problem"

mod config;
mod runner;

pub use config::AnnealingConfig;
pub use runner::{AnnealingStats, SimulatedAnnealing, StopReason};
