//! Schedule-aware search operators.
//!
//! Bridges the league model to the generic [`SearchProblem`] contract so
//! that both engines can optimize a [`Schedule`].

use std::sync::Arc;

use rand::{Rng, RngCore};

use super::model::Schedule;
use super::scoring::ScheduleEvaluator;
use super::weights::ConstraintWeights;
use crate::problem::SearchProblem;

/// Move kinds applied by [`ScheduleProblem::mutate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMove {
    /// Move one game to another day slot.
    Reschedule,
    /// Exchange the day slots of two games.
    SwapDays,
    /// Exchange home and away of one game.
    SwapVenue,
}

impl ScheduleMove {
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.random_range(0..3) {
            0 => ScheduleMove::Reschedule,
            1 => ScheduleMove::SwapDays,
            _ => ScheduleMove::SwapVenue,
        }
    }
}

/// Search problem over schedules derived from a base schedule.
///
/// All candidates share the base's game list (same ids in the same order);
/// only day slots and venues change.
pub struct ScheduleProblem {
    base: Schedule,
    weights: ConstraintWeights,
    evaluator: Arc<dyn ScheduleEvaluator>,
}

impl ScheduleProblem {
    pub fn new(base: Schedule, weights: ConstraintWeights, evaluator: Arc<dyn ScheduleEvaluator>) -> Self {
        Self {
            base,
            weights,
            evaluator,
        }
    }

    /// The schedule every candidate is derived from.
    pub fn base(&self) -> &Schedule {
        &self.base
    }

    pub fn weights(&self) -> &ConstraintWeights {
        &self.weights
    }

    /// Applies one move in place. No-op on an empty schedule.
    pub fn apply_move<R: Rng + ?Sized>(&self, schedule: &mut Schedule, kind: ScheduleMove, rng: &mut R) {
        let n = schedule.games.len();
        if n == 0 {
            return;
        }
        match kind {
            ScheduleMove::Reschedule => {
                let days = self.base.day_count().max(schedule.day_count());
                let i = rng.random_range(0..n);
                schedule.games[i].day = rng.random_range(0..days);
            }
            ScheduleMove::SwapDays => {
                let i = rng.random_range(0..n);
                let j = rng.random_range(0..n);
                let day = schedule.games[i].day;
                schedule.games[i].day = schedule.games[j].day;
                schedule.games[j].day = day;
            }
            ScheduleMove::SwapVenue => {
                let game = &mut schedule.games[rng.random_range(0..n)];
                std::mem::swap(&mut game.home, &mut game.away);
            }
        }
    }
}

impl SearchProblem<Schedule> for ScheduleProblem {
    fn fitness(&self, candidate: &Schedule) -> f64 {
        self.evaluator.evaluate(candidate, &self.weights)
    }

    /// A perturbed copy of the base schedule.
    fn create_candidate(&self, rng: &mut dyn RngCore) -> Schedule {
        let mut candidate = self.base.clone();
        let moves = 1 + candidate.games.len() / 5;
        for _ in 0..moves {
            let kind = ScheduleMove::random(rng);
            self.apply_move(&mut candidate, kind, rng);
        }
        candidate
    }

    fn mutate(&self, candidate: &Schedule, rng: &mut dyn RngCore) -> Schedule {
        let mut neighbor = candidate.clone();
        let kind = ScheduleMove::random(rng);
        self.apply_move(&mut neighbor, kind, rng);
        neighbor
    }

    /// One-point crossover on the per-game (day, home, away) assignment.
    fn crossover(
        &self,
        parent1: &Schedule,
        parent2: &Schedule,
        rng: &mut dyn RngCore,
    ) -> Option<(Schedule, Schedule)> {
        let n = parent1.games.len();
        if n < 2 || n != parent2.games.len() {
            return None;
        }
        let cut = rng.random_range(1..n);
        let mut child1 = parent1.clone();
        let mut child2 = parent2.clone();
        child1.games[cut..].clone_from_slice(&parent2.games[cut..]);
        child2.games[cut..].clone_from_slice(&parent1.games[cut..]);
        Some((child1, child2))
    }

    fn is_valid(&self, candidate: &Schedule) -> bool {
        candidate.is_feasible()
    }
}
