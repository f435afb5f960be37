//! Initial schedule generation.
//!
//! Generation is an external collaborator as far as the optimizer is
//! concerned: it only needs *some* candidate to start from.
//! [`RoundRobinGenerator`] is the built-in baseline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::{ScheduleError, ScheduleResult};
use super::model::{Game, Schedule};
use super::weights::ConstraintWeights;

/// Knobs for schedule generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationOptions {
    pub sport: Option<String>,
    pub season: Option<String>,
    /// Full round robins to play; the second one mirrors home/away.
    pub rounds: u32,
    /// Day slots between two consecutive matchdays.
    pub days_between_matchdays: u32,
    /// Team pairs whose games are flagged as rivalry fixtures.
    pub rivalries: Vec<(String, String)>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            sport: None,
            season: None,
            rounds: 2,
            days_between_matchdays: 2,
            rivalries: Vec::new(),
        }
    }
}

/// Produces an initial candidate schedule.
pub trait ScheduleGenerator: Send + Sync {
    fn generate(
        &self,
        teams: &[String],
        constraints: &ConstraintWeights,
        options: &GenerationOptions,
    ) -> ScheduleResult<Schedule>;
}

/// Circle-method round robin.
///
/// With an odd number of teams a bye is inserted. Every matchday lands on
/// its own day slot, so the result is always feasible.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinGenerator;

impl ScheduleGenerator for RoundRobinGenerator {
    fn generate(
        &self,
        teams: &[String],
        constraints: &ConstraintWeights,
        options: &GenerationOptions,
    ) -> ScheduleResult<Schedule> {
        if teams.len() < 2 {
            return Err(ScheduleError::NotEnoughTeams(teams.len()));
        }
        let mut seen = HashSet::new();
        for team in teams {
            if !seen.insert(team.as_str()) {
                return Err(ScheduleError::DuplicateTeam(team.clone()));
            }
        }

        let mut slots: Vec<Option<&String>> = teams.iter().map(Some).collect();
        if slots.len() % 2 == 1 {
            slots.push(None);
        }
        let n = slots.len();
        let spacing = options.days_between_matchdays.max(1);
        let rounds = options.rounds.max(1);

        let is_rivalry = |a: &str, b: &str| {
            options
                .rivalries
                .iter()
                .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
        };

        let mut games = Vec::new();
        let mut matchday = 0u32;
        for round in 0..rounds {
            let mut rotation = slots.clone();
            for md in 0..n - 1 {
                for i in 0..n / 2 {
                    if let (Some(a), Some(b)) = (rotation[i], rotation[n - 1 - i]) {
                        // Alternate the fixed team's venue, mirror on even rounds.
                        let flip = (i == 0 && md % 2 == 1) ^ (round % 2 == 1);
                        let (home, away) = if flip { (b, a) } else { (a, b) };
                        games.push(
                            Game::new(format!("g{}", games.len() + 1), home, away, matchday * spacing)
                                .with_rivalry(is_rivalry(home.as_str(), away.as_str())),
                        );
                    }
                }
                rotation[1..].rotate_right(1);
                matchday += 1;
            }
        }

        let days = matchday * spacing;
        Ok(Schedule {
            sport: options.sport.clone(),
            season: options.season.clone(),
            teams: teams.to_vec(),
            games,
            days,
            constraint_weights: Some(*constraints),
        })
    }
}
