use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{self, Zone};
use crate::model::{
    Action, Game, PlayerGame, PlayerMinutes, PlayerRating, QuantityQuality, RatedAction,
    SUB_POSITION, TeamRating,
};

/// Minutes in a full match; ratings are expressed per this many minutes.
pub const PER_MINUTES: f64 = 90.0;

/// `value * 90 / minutes`. `None` for a player without minutes.
pub fn per_90(value: f64, minutes_played: u32) -> Option<f64> {
    if minutes_played == 0 {
        return None;
    }
    Some(value * PER_MINUTES / f64::from(minutes_played))
}

/// Left join of actions onto games by `game_id`.
pub fn join_with_games<'a>(
    actions: &'a [Action],
    games: &'a [Game],
) -> Vec<(&'a Action, Option<&'a Game>)> {
    let by_id: HashMap<i64, &Game> = games.iter().map(|g| (g.game_id, g)).collect();
    actions
        .iter()
        .map(|a| (a, by_id.get(&a.game_id).copied()))
        .collect()
}

/// `"2024-03-02 Home 2-1 Away 57'"` style line for an action.
pub fn action_context(action: &Action, game: Option<&Game>) -> String {
    let (minute, second) = action.clock();
    match game {
        Some(g) => format!("{} {} {}'", g.game_date, g.scoreline(), minute + 1),
        None => format!("game {} {minute}m{second}s", action.game_id),
    }
}

/// Group appearances by player: minutes are summed, and the most common
/// starting position ignores "Sub" unless the player never started.
/// Output is sorted by player name.
pub fn player_minutes(player_games: &[PlayerGame]) -> Vec<PlayerMinutes> {
    let mut grouped: BTreeMap<&str, (u32, Vec<&str>)> = BTreeMap::new();
    for pg in player_games {
        let entry = grouped.entry(pg.player_name.as_str()).or_default();
        entry.0 = entry.0.saturating_add(pg.minutes_played);
        entry.1.push(pg.starting_position.as_str());
    }

    grouped
        .into_iter()
        .map(|(name, (minutes, positions))| PlayerMinutes {
            player_name: name.to_string(),
            minutes_played: minutes,
            most_common_position: most_common_position(&positions),
        })
        .collect()
}

/// Ties go to the position seen first.
pub fn most_common_position(positions: &[&str]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for pos in positions.iter().copied().filter(|p| *p != SUB_POSITION) {
        match counts.iter_mut().find(|(p, _)| *p == pos) {
            Some((_, n)) => *n += 1,
            None => counts.push((pos, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (pos, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((pos, n));
        }
    }
    best.map(|(pos, _)| pos.to_string())
        .unwrap_or_else(|| SUB_POSITION.to_string())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RatedActions {
    pub rows: Vec<RatedAction>,
    /// Actions whose player has no minutes record.
    pub skipped_unmatched: usize,
    /// Actions whose player has zero minutes; per-90 is undefined for them.
    pub skipped_zero_minutes: usize,
}

/// Attach dimension names and player minutes to every action and normalize
/// its values per 90 minutes. Players missing from `minutes` are dropped
/// (inner join), as are players with zero minutes.
pub fn rate_actions(actions: &[Action], minutes: &[PlayerMinutes]) -> RatedActions {
    let by_player: HashMap<&str, &PlayerMinutes> = minutes
        .iter()
        .map(|m| (m.player_name.as_str(), m))
        .collect();

    let mut out = RatedActions::default();
    for action in actions {
        let Some(pm) = by_player.get(action.player_name.as_str()) else {
            out.skipped_unmatched += 1;
            continue;
        };
        let mins = pm.minutes_played;
        let (Some(vaep_rating), Some(offensive_rating), Some(defensive_rating)) = (
            per_90(action.vaep_value, mins),
            per_90(action.offensive_value, mins),
            per_90(action.defensive_value, mins),
        ) else {
            out.skipped_zero_minutes += 1;
            continue;
        };
        out.rows.push(RatedAction {
            action: action.clone(),
            actiontype_name: catalog::action_type_name(action.type_id),
            bodypart_name: catalog::body_part_name(action.bodypart_id),
            result_name: catalog::result_name(action.result_id),
            minutes_played: mins,
            most_common_position: pm.most_common_position.clone(),
            vaep_rating,
            offensive_rating,
            defensive_rating,
        });
    }

    if out.skipped_zero_minutes > 0 {
        warn!(
            skipped = out.skipped_zero_minutes,
            "dropped actions of players with zero minutes"
        );
    }
    debug!(
        rated = out.rows.len(),
        unmatched = out.skipped_unmatched,
        "rated actions"
    );
    out
}

/// Row filter for rated actions. Empty lists place no constraint; zones are
/// OR-combined over the action's start location.
///
/// An empty action type or body part list means every named value. Actions
/// whose type or body part id has no SPADL name never pass.
#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    pub minutes: Option<(u32, u32)>,
    pub teams: Vec<String>,
    pub positions: Vec<String>,
    pub action_types: Vec<String>,
    pub body_parts: Vec<String>,
    pub zones: Vec<Zone>,
}

impl ActionFilter {
    pub fn matches(&self, row: &RatedAction) -> bool {
        if let Some((lo, hi)) = self.minutes {
            if row.minutes_played < lo || row.minutes_played > hi {
                return false;
            }
        }
        if !in_set(&self.teams, Some(row.action.team_name.as_str())) {
            return false;
        }
        if !in_set(&self.positions, Some(row.most_common_position.as_str())) {
            return false;
        }
        if !in_set(&self.action_types, row.actiontype_name) {
            return false;
        }
        if !in_set(&self.body_parts, row.bodypart_name) {
            return false;
        }
        if !self.zones.is_empty()
            && !self
                .zones
                .iter()
                .any(|z| z.contains(row.action.start_x, row.action.start_y))
        {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, rows: &'a [RatedAction]) -> Vec<&'a RatedAction> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}

fn in_set(set: &[String], value: Option<&str>) -> bool {
    match value {
        Some(v) => set.is_empty() || set.iter().any(|s| s == v),
        None => false,
    }
}

/// Descending by `key`, NaN last, equal keys keep their input order.
fn cmp_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Per-player sums over filtered actions, sorted by VAEP rating descending.
///
/// Team and minutes come from the player's first row. `success` and `fail`
/// hold the VAEP of successful and failed actions per 90 minutes.
pub fn player_ratings(rows: &[&RatedAction]) -> Vec<PlayerRating> {
    let mut grouped: BTreeMap<&str, PlayerRating> = BTreeMap::new();
    for row in rows {
        let a = &row.action;
        let entry = grouped
            .entry(a.player_name.as_str())
            .or_insert_with(|| PlayerRating {
                player_name: a.player_name.clone(),
                team_name: a.team_name.clone(),
                most_common_position: row.most_common_position.clone(),
                minutes_played: row.minutes_played,
                actions: 0,
                vaep_rating: 0.0,
                offensive_rating: 0.0,
                defensive_rating: 0.0,
                vaep_value: 0.0,
                offensive_value: 0.0,
                defensive_value: 0.0,
                success: 0.0,
                fail: 0.0,
            });
        entry.actions += 1;
        entry.vaep_rating += row.vaep_rating;
        entry.offensive_rating += row.offensive_rating;
        entry.defensive_rating += row.defensive_rating;
        entry.vaep_value += a.vaep_value;
        entry.offensive_value += a.offensive_value;
        entry.defensive_value += a.defensive_value;
        match row.result_name {
            Some(catalog::RESULT_SUCCESS) => entry.success += a.vaep_value,
            Some(catalog::RESULT_FAIL) => entry.fail += a.vaep_value,
            _ => {}
        }
    }

    let mut out: Vec<PlayerRating> = grouped
        .into_values()
        .map(|mut r| {
            r.success = per_90(r.success, r.minutes_played).unwrap_or(0.0);
            r.fail = per_90(r.fail, r.minutes_played).unwrap_or(0.0);
            r
        })
        .collect();
    out.sort_by(|a, b| cmp_desc(a.vaep_rating, b.vaep_rating));
    out
}

/// Actions per 90 and mean per-action rating for each player, sorted by name.
pub fn quantity_quality(rows: &[&RatedAction]) -> Vec<QuantityQuality> {
    let mut grouped: BTreeMap<&str, (&str, u32, usize, f64)> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry(row.action.player_name.as_str())
            .or_insert((row.action.team_name.as_str(), row.minutes_played, 0, 0.0));
        entry.2 += 1;
        entry.3 += row.vaep_rating;
    }
    grouped
        .into_iter()
        .filter_map(|(name, (team, minutes, count, rating_sum))| {
            Some(QuantityQuality {
                player_name: name.to_string(),
                team_name: team.to_string(),
                actions_per_90: per_90(count as f64, minutes)?,
                avg_vaep_rating: rating_sum / count as f64,
            })
        })
        .collect()
}

/// Mean x and y of a point cloud, used for the dashed reference lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceLines {
    pub x: f64,
    pub y: f64,
}

pub fn reference_lines(points: impl IntoIterator<Item = (f64, f64)>) -> Option<ReferenceLines> {
    let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
    for (x, y) in points {
        sx += x;
        sy += y;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some(ReferenceLines {
        x: sx / n as f64,
        y: sy / n as f64,
    })
}

/// Risk/reward reference lines: x = mean `fail`, y = mean `success`.
pub fn risk_reference(ratings: &[PlayerRating]) -> Option<ReferenceLines> {
    reference_lines(ratings.iter().map(|r| (r.fail, r.success)))
}

pub fn quantity_reference(rows: &[QuantityQuality]) -> Option<ReferenceLines> {
    reference_lines(rows.iter().map(|r| (r.actions_per_90, r.avg_vaep_rating)))
}

/// Team totals over player ratings, sorted by VAEP value descending.
pub fn team_ratings(ratings: &[PlayerRating]) -> Vec<TeamRating> {
    let mut grouped: BTreeMap<&str, TeamRating> = BTreeMap::new();
    for r in ratings {
        let entry = grouped
            .entry(r.team_name.as_str())
            .or_insert_with(|| TeamRating {
                team_name: r.team_name.clone(),
                players: 0,
                vaep_value: 0.0,
                offensive_value: 0.0,
                defensive_value: 0.0,
                vaep_rating: 0.0,
            });
        entry.players += 1;
        entry.vaep_value += r.vaep_value;
        entry.offensive_value += r.offensive_value;
        entry.defensive_value += r.defensive_value;
        entry.vaep_rating += r.vaep_rating;
    }
    let mut out: Vec<TeamRating> = grouped.into_values().collect();
    out.sort_by(|a, b| cmp_desc(a.vaep_value, b.vaep_value));
    out
}

/// The `n` highest valued actions with their game context line.
pub fn top_actions<'a>(
    rows: &[&'a RatedAction],
    games: &[Game],
    n: usize,
) -> Vec<(&'a RatedAction, String)> {
    let mut sorted: Vec<&'a RatedAction> = rows.to_vec();
    sorted.sort_by(|a, b| cmp_desc(a.action.vaep_value, b.action.vaep_value));
    sorted.truncate(n);

    let actions: Vec<Action> = sorted.iter().map(|r| r.action.clone()).collect();
    join_with_games(&actions, games)
        .into_iter()
        .zip(sorted)
        .map(|((action, game), r)| (r, action_context(action, game)))
        .collect()
}
