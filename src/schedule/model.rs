//! League schedule model.
//!
//! A [`Schedule`] is a flat list of [`Game`]s placed on integer day slots
//! (`0..day_count`). Dates are the caller's concern; the optimizer only
//! moves games between slots and swaps home/away.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::weights::ConstraintWeights;

/// A single fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub home: String,
    pub away: String,
    /// Day slot, zero-based.
    pub day: u32,
    /// Marks a rivalry fixture, which should be spaced out.
    #[serde(default)]
    pub rivalry: bool,
}

impl Game {
    pub fn new(id: impl Into<String>, home: impl Into<String>, away: impl Into<String>, day: u32) -> Self {
        Self {
            id: id.into(),
            home: home.into(),
            away: away.into(),
            day,
            rivalry: false,
        }
    }

    pub fn with_rivalry(mut self, rivalry: bool) -> Self {
        self.rivalry = rivalry;
        self
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home == team || self.away == team
    }
}

/// A candidate league schedule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub sport: Option<String>,

    #[serde(default)]
    pub season: Option<String>,

    pub teams: Vec<String>,

    pub games: Vec<Game>,

    /// Number of playable day slots. Zero means "last used day + 1".
    #[serde(default)]
    pub days: u32,

    /// Weights the schedule was generated under, if the generator recorded
    /// them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_weights: Option<ConstraintWeights>,
}

impl Schedule {
    pub fn new(teams: Vec<String>, games: Vec<Game>) -> Self {
        Self {
            teams,
            games,
            ..Self::default()
        }
    }

    pub fn with_sport(mut self, sport: impl Into<String>) -> Self {
        self.sport = Some(sport.into());
        self
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    /// Number of day slots games may be moved across.
    pub fn day_count(&self) -> u32 {
        let used = self.games.iter().map(|g| g.day.saturating_add(1)).max().unwrap_or(0);
        self.days.max(used).max(1)
    }

    /// Days each team plays on, sorted ascending.
    pub fn team_days(&self) -> HashMap<&str, Vec<u32>> {
        let mut days: HashMap<&str, Vec<u32>> = HashMap::new();
        for game in &self.games {
            days.entry(game.home.as_str()).or_default().push(game.day);
            days.entry(game.away.as_str()).or_default().push(game.day);
        }
        for list in days.values_mut() {
            list.sort_unstable();
        }
        days
    }

    /// Games of each team in day order, paired with "played at home".
    pub fn team_sequences(&self) -> BTreeMap<&str, Vec<(u32, bool)>> {
        let mut seq: BTreeMap<&str, Vec<(u32, bool)>> = BTreeMap::new();
        for game in &self.games {
            seq.entry(game.home.as_str()).or_default().push((game.day, true));
            seq.entry(game.away.as_str()).or_default().push((game.day, false));
        }
        for list in seq.values_mut() {
            list.sort_unstable();
        }
        seq
    }

    /// Number of (team, day) slots holding more than one game.
    pub fn conflicts(&self) -> usize {
        let mut seen: HashSet<(&str, u32)> = HashSet::new();
        let mut conflicts = 0;
        for game in &self.games {
            for team in [game.home.as_str(), game.away.as_str()] {
                if !seen.insert((team, game.day)) {
                    conflicts += 1;
                }
            }
        }
        conflicts
    }

    /// No team plays twice on one day and no team plays itself.
    pub fn is_feasible(&self) -> bool {
        self.games.iter().all(|g| g.home != g.away) && self.conflicts() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams() -> Vec<String> {
        ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_day_count() {
        let s = Schedule::new(teams(), vec![Game::new("g1", "A", "B", 4)]);
        assert_eq!(s.day_count(), 5);
        assert_eq!(s.clone().with_days(10).day_count(), 10);
        assert_eq!(Schedule::default().day_count(), 1);
    }

    #[test]
    fn test_conflicts() {
        let s = Schedule::new(
            teams(),
            vec![
                Game::new("g1", "A", "B", 0),
                Game::new("g2", "A", "C", 0),
                Game::new("g3", "C", "D", 1),
            ],
        );
        assert_eq!(s.conflicts(), 1);
        assert!(!s.is_feasible());
    }

    #[test]
    fn test_team_sequences_sorted() {
        let s = Schedule::new(
            teams(),
            vec![Game::new("g1", "A", "B", 3), Game::new("g2", "C", "A", 1)],
        );
        let seq = s.team_sequences();
        assert_eq!(seq["A"], vec![(1, false), (3, true)]);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let s = Schedule::new(teams(), vec![Game::new("g1", "A", "B", 0).with_rivalry(true)])
            .with_sport("football");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["sport"], "football");
        assert_eq!(json["games"][0]["rivalry"], true);

        let back: Schedule = serde_json::from_value(serde_json::json!({
            "teams": ["A", "B"],
            "games": [{"id": "g", "home": "A", "away": "B", "day": 2}]
        }))
        .unwrap();
        assert!(!back.games[0].rivalry);
        assert_eq!(back.days, 0);
    }
}
