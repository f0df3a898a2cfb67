use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One on-ball event with its VAEP contributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub game_id: i64,
    pub original_event_id: Option<String>,
    pub period_id: u8,
    pub time_seconds: f64,
    pub start_x: f64,
    pub end_x: f64,
    pub start_y: f64,
    pub end_y: f64,
    pub type_id: u16,
    pub bodypart_id: u16,
    pub result_id: u16,
    pub player_name: String,
    pub team_name: String,
    pub vaep_value: f64,
    pub offensive_value: f64,
    pub defensive_value: f64,
}

impl Action {
    /// Match clock as (minute, second), assuming 45 minute halves.
    pub fn clock(&self) -> (u32, u32) {
        let period = u32::from(self.period_id.max(1)) - 1;
        let secs = self.time_seconds.max(0.0);
        let minute = period * 45 + (secs / 60.0).floor() as u32;
        let second = (secs % 60.0).floor() as u32;
        (minute, second)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub game_id: i64,
    pub season_id: Option<i64>,
    pub competition_id: Option<i64>,
    pub game_day: Option<i64>,
    pub game_date: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub duration: Option<i32>,
    pub referee: Option<String>,
    pub venue: Option<String>,
    pub attendance: Option<i64>,
    pub home_manager: Option<String>,
    pub away_manager: Option<String>,
    pub home_team: String,
    pub away_team: String,
}

impl Game {
    pub fn scoreline(&self) -> String {
        let score = |s: Option<i32>| s.map_or_else(|| "?".to_string(), |s| s.to_string());
        format!(
            "{} {}-{} {}",
            self.home_team,
            score(self.home_score),
            score(self.away_score),
            self.away_team
        )
    }
}

/// One player's appearance in one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGame {
    pub game_id: i64,
    pub team_id: i64,
    pub is_starter: bool,
    pub minutes_played: u32,
    pub starting_position: String,
    pub player_name: String,
}

pub const SUB_POSITION: &str = "Sub";

/// Season minutes and the most common starting position of a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMinutes {
    pub player_name: String,
    pub minutes_played: u32,
    pub most_common_position: String,
}

/// One row of a `{league}_{season}_stats_z` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_name: String,
    pub team_name: String,
    pub position: String,
    pub minutes_played: u32,
    pub z_scores: BTreeMap<String, f64>,
}

impl PlayerProfile {
    pub fn z(&self, attribute: &str) -> Option<f64> {
        self.z_scores.get(attribute).copied()
    }
}

/// An action joined with its dimension names, the actor's minutes and per-90 ratings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedAction {
    pub action: Action,
    pub actiontype_name: Option<&'static str>,
    pub bodypart_name: Option<&'static str>,
    pub result_name: Option<&'static str>,
    pub minutes_played: u32,
    pub most_common_position: String,
    pub vaep_rating: f64,
    pub offensive_rating: f64,
    pub defensive_rating: f64,
}

/// Per-player totals over a filtered set of rated actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRating {
    pub player_name: String,
    pub team_name: String,
    pub most_common_position: String,
    pub minutes_played: u32,
    pub actions: usize,
    pub vaep_rating: f64,
    pub offensive_rating: f64,
    pub defensive_rating: f64,
    pub vaep_value: f64,
    pub offensive_value: f64,
    pub defensive_value: f64,
    /// VAEP of successful actions per 90.
    pub success: f64,
    /// VAEP of failed actions per 90.
    pub fail: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRating {
    pub team_name: String,
    pub players: usize,
    pub vaep_value: f64,
    pub offensive_value: f64,
    pub defensive_value: f64,
    pub vaep_rating: f64,
}

/// Actions per 90 against average value per action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantityQuality {
    pub player_name: String,
    pub team_name: String,
    pub actions_per_90: f64,
    pub avg_vaep_rating: f64,
}

/// A player ranked by composite quality score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPlayer {
    pub rank: usize,
    pub player_name: String,
    pub team_name: String,
    pub position: String,
    pub minutes_played: u32,
    pub score: f64,
}
