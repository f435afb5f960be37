//! Constraint weights and the sport overlay table.

use serde::{Deserialize, Serialize};

/// Relative importance of each soft constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintWeights {
    pub rest_days: f64,
    pub travel_distance: f64,
    pub home_away_balance: f64,
    pub rivalry_games: f64,
}

impl Default for ConstraintWeights {
    /// Baseline weights used when neither the caller nor the sport table
    /// supplies any.
    fn default() -> Self {
        Self {
            rest_days: 10.0,
            travel_distance: 5.0,
            home_away_balance: 5.0,
            rivalry_games: 3.0,
        }
    }
}

impl ConstraintWeights {
    /// Sport-specific overlay. `None` for sports without an entry.
    pub fn for_sport(sport: &str) -> Option<Self> {
        match sport.trim().to_ascii_lowercase().as_str() {
            "basketball" => Some(Self {
                rest_days: 12.0,
                travel_distance: 6.0,
                home_away_balance: 4.0,
                rivalry_games: 3.0,
            }),
            "football" => Some(Self {
                rest_days: 15.0,
                travel_distance: 4.0,
                home_away_balance: 5.0,
                rivalry_games: 5.0,
            }),
            _ => None,
        }
    }
}
