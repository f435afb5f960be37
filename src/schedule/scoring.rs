//! Schedule fitness.
//!
//! The fitness function is an external collaborator: anything implementing
//! [`ScheduleEvaluator`] can score candidates, including a plain closure.
//! [`WeightedConstraintEvaluator`] is the built-in baseline.

use super::model::Schedule;
use super::weights::ConstraintWeights;

/// Scores a schedule. Higher is better.
pub trait ScheduleEvaluator: Send + Sync {
    fn evaluate(&self, schedule: &Schedule, weights: &ConstraintWeights) -> f64;
}

impl<F> ScheduleEvaluator for F
where
    F: Fn(&Schedule, &ConstraintWeights) -> f64 + Send + Sync,
{
    fn evaluate(&self, schedule: &Schedule, weights: &ConstraintWeights) -> f64 {
        self(schedule, weights)
    }
}

/// Raw constraint violations of a schedule, before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Violations {
    /// Games played on consecutive days by the same team.
    pub back_to_back: f64,
    /// Consecutive away games (road trips without a home stop).
    pub away_legs: f64,
    /// Sum over teams of |home games - away games|.
    pub home_away_imbalance: f64,
    /// Missing days below the rivalry spacing, summed over rivalry pairs.
    pub rivalry_crowding: f64,
    /// Teams booked twice on one day.
    pub conflicts: f64,
}

/// Baseline evaluator: `base_score - Σ weight × violation`.
#[derive(Debug, Clone)]
pub struct WeightedConstraintEvaluator {
    pub base_score: f64,
    /// Minimum days between two rivalry games of the same team.
    pub min_rivalry_gap: u32,
    /// Penalty per double booking, applied regardless of weights.
    pub conflict_penalty: f64,
}

impl Default for WeightedConstraintEvaluator {
    fn default() -> Self {
        Self {
            base_score: 1000.0,
            min_rivalry_gap: 7,
            conflict_penalty: 100.0,
        }
    }
}

impl WeightedConstraintEvaluator {
    pub fn violations(&self, schedule: &Schedule) -> Violations {
        let mut v = Violations {
            conflicts: schedule.conflicts() as f64,
            ..Violations::default()
        };

        for games in schedule.team_sequences().values() {
            let home = games.iter().filter(|(_, at_home)| *at_home).count() as f64;
            v.home_away_imbalance += (2.0 * home - games.len() as f64).abs();

            for pair in games.windows(2) {
                let (d0, home0) = pair[0];
                let (d1, home1) = pair[1];
                if d0.checked_add(1) == Some(d1) {
                    v.back_to_back += 1.0;
                }
                if !home0 && !home1 {
                    v.away_legs += 1.0;
                }
            }
        }

        let mut rivalry: Vec<_> = schedule.games.iter().filter(|g| g.rivalry).collect();
        rivalry.sort_by_key(|g| g.day);
        for (i, a) in rivalry.iter().enumerate() {
            for b in &rivalry[i + 1..] {
                let shares_team = b.involves(&a.home) || b.involves(&a.away);
                let gap = b.day - a.day;
                if shares_team && gap < self.min_rivalry_gap {
                    v.rivalry_crowding += f64::from(self.min_rivalry_gap - gap);
                }
            }
        }
        v
    }
}

impl ScheduleEvaluator for WeightedConstraintEvaluator {
    fn evaluate(&self, schedule: &Schedule, weights: &ConstraintWeights) -> f64 {
        let v = self.violations(schedule);
        self.base_score
            - weights.rest_days * v.back_to_back
            - weights.travel_distance * v.away_legs
            - weights.home_away_balance * v.home_away_imbalance
            - weights.rivalry_games * v.rivalry_crowding
            - self.conflict_penalty * v.conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::model::Game;

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_schedule_scores_base() {
        let s = Schedule::new(
            teams(&["A", "B"]),
            vec![Game::new("g1", "A", "B", 0), Game::new("g2", "B", "A", 2)],
        );
        let score = WeightedConstraintEvaluator::default().evaluate(&s, &ConstraintWeights::default());
        assert!((score - 1000.0).abs() < 1e-12);
    }

    #[test]
    fn test_violations_counted() {
        let s = Schedule::new(
            teams(&["A", "B", "C"]),
            vec![
                Game::new("g1", "B", "A", 0).with_rivalry(true),
                Game::new("g2", "C", "A", 1).with_rivalry(true),
            ],
        );
        let v = WeightedConstraintEvaluator::default().violations(&s);
        // A: away, away on consecutive days
        assert!((v.back_to_back - 1.0).abs() < 1e-12);
        assert!((v.away_legs - 1.0).abs() < 1e-12);
        // A: 0 home / 2 away, B: 1/0, C: 1/0
        assert!((v.home_away_imbalance - 4.0).abs() < 1e-12);
        // gap 1 < 7
        assert!((v.rivalry_crowding - 6.0).abs() < 1e-12);
        assert!(v.conflicts.abs() < 1e-12);
    }

    #[test]
    fn test_weights_change_score() {
        let s = Schedule::new(
            teams(&["A", "B", "C"]),
            vec![Game::new("g1", "B", "A", 0), Game::new("g2", "C", "A", 1)],
        );
        let eval = WeightedConstraintEvaluator::default();
        let light = eval.evaluate(&s, &ConstraintWeights::for_sport("basketball").unwrap());
        let heavy = eval.evaluate(&s, &ConstraintWeights::for_sport("football").unwrap());
        assert!(heavy < light);
    }

    #[test]
    fn test_conflicts_penalized() {
        let s = Schedule::new(
            teams(&["A", "B", "C"]),
            vec![Game::new("g1", "A", "B", 0), Game::new("g2", "A", "C", 0)],
        );
        let eval = WeightedConstraintEvaluator::default();
        assert!(eval.evaluate(&s, &ConstraintWeights::default()) < 900.0);
    }

    #[test]
    fn test_last_day_slot_does_not_overflow() {
        let s = Schedule::new(
            teams(&["A", "B", "C"]),
            vec![
                Game::new("g1", "B", "A", u32::MAX - 1),
                Game::new("g2", "C", "A", u32::MAX),
            ],
        );
        assert_eq!(s.day_count(), u32::MAX);
        let v = WeightedConstraintEvaluator::default().violations(&s);
        assert!((v.back_to_back - 1.0).abs() < 1e-12);
        assert!(v.conflicts.abs() < 1e-12);
    }

    #[test]
    fn test_closure_as_evaluator() {
        let eval = |s: &Schedule, _: &ConstraintWeights| s.games.len() as f64;
        let s = Schedule::new(teams(&["A", "B"]), vec![Game::new("g", "A", "B", 0)]);
        assert!((eval.evaluate(&s, &ConstraintWeights::default()) - 1.0).abs() < 1e-12);
    }
}
