use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use tracing::info;

use crate::aggregate;
use crate::catalog::{self, PositionGroup};
use crate::model::{Action, Game, PlayerGame, PlayerProfile, SUB_POSITION};
use crate::scoring::zscore_column;
use crate::warehouse::{
    self, ActionRow, GameRow, PlayerGameRow, ProfileRow, create_league_tables, init_schema,
};

const TEAM_NAMES: &[&str] = &[
    "Nordhafen SV",
    "FC Lindenau",
    "Rheinberg 04",
    "Sportfreunde Talheim",
    "VfR Ostwald",
    "Union Kesselbach",
    "TSV Eichenried",
    "Borussia Steinfeld",
    "1. FC Wendel",
    "SC Mühlbach",
];

const FIRST_NAMES: &[&str] = &[
    "Jonas", "Luca", "Mats", "Noah", "Elias", "Felix", "Leon", "Timo", "Jannik", "Kai", "Nico",
    "Paul", "Emil", "Ben", "Milan", "Moritz", "Theo", "Oskar",
];

const LAST_NAMES: &[&str] = &[
    "Albers", "Brandt", "Claasen", "Dressler", "Ebert", "Falk", "Gerlach", "Hahn", "Imhof",
    "Jost", "Kessler", "Lorenz", "Mertens", "Nowak", "Oltmanns", "Pohl", "Rieger", "Seidel",
    "Thiel", "Vogt", "Winter", "Zander",
];

/// Starting XI shape; slot `i` is the usual position of squad member `i`.
const FORMATION: [&str; 11] = [
    "GK", "DL", "DC", "DC", "DR", "DMC", "MC", "AML", "AMC", "AMR", "FW",
];

/// Start date of the synthetic fixture list.
const SEASON_START: (i32, u32, u32) = (2023, 8, 12);

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub league: String,
    pub season: String,
    pub teams: usize,
    pub squad_size: usize,
    /// Mean actions per player per full 90 minutes.
    pub actions_per_90: usize,
    pub seed: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            league: "bundesliga".to_string(),
            season: "2023_2024".to_string(),
            teams: 6,
            squad_size: 15,
            actions_per_90: 40,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemoData {
    pub teams: Vec<(i64, String)>,
    pub players: Vec<(i64, String)>,
    pub games: Vec<GameRow>,
    pub player_games: Vec<PlayerGameRow>,
    pub actions: Vec<ActionRow>,
    pub profiles: Vec<ProfileRow>,
}

impl DemoData {
    pub fn player_games(&self) -> Vec<PlayerGame> {
        self.player_games
            .iter()
            .map(|r| r.player_game.clone())
            .collect()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.iter().map(|r| r.action.clone()).collect()
    }

    pub fn profiles(&self) -> Vec<PlayerProfile> {
        self.profiles.iter().map(|r| r.profile.clone()).collect()
    }
}

/// Position group of a starting position code. Goalkeepers and subs have none.
pub fn position_group(code: &str) -> Option<PositionGroup> {
    match code {
        "DC" => Some(PositionGroup::Defender),
        "DL" | "DR" | "DML" | "DMR" => Some(PositionGroup::FullBack),
        "DMC" | "MC" | "AMC" | "ML" | "MR" => Some(PositionGroup::Midfielder),
        "AML" | "AMR" => Some(PositionGroup::Winger),
        "FW" | "FWL" | "FWR" => Some(PositionGroup::Forward),
        _ => None,
    }
}

struct Squad {
    team_id: i64,
    team_name: String,
    players: Vec<(i64, String)>,
}

/// Same config, same data.
pub fn generate(cfg: &DemoConfig) -> DemoData {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let team_count = cfg.teams.clamp(2, TEAM_NAMES.len());
    let squad_size = cfg.squad_size.clamp(FORMATION.len() + 1, 30);

    let mut data = DemoData::default();
    let mut squads = Vec::with_capacity(team_count);
    let mut name_idx = 0usize;
    for (t, team_name) in TEAM_NAMES.iter().take(team_count).enumerate() {
        let team_id = t as i64 + 1;
        data.teams.push((team_id, team_name.to_string()));
        let mut players = Vec::with_capacity(squad_size);
        for k in 0..squad_size {
            let first = FIRST_NAMES[name_idx % FIRST_NAMES.len()];
            let last = LAST_NAMES[(name_idx / FIRST_NAMES.len() + name_idx * 7) % LAST_NAMES.len()];
            name_idx += 1;
            let player = (team_id * 100 + k as i64, format!("{first} {last}"));
            data.players.push(player.clone());
            players.push(player);
        }
        squads.push(Squad {
            team_id,
            team_name: team_name.to_string(),
            players,
        });
    }

    let start = NaiveDate::from_ymd_opt(SEASON_START.0, SEASON_START.1, SEASON_START.2)
        .unwrap_or_default();
    let mut game_id = 1000i64;
    let mut round = 0u64;
    for home in 0..team_count {
        for away in 0..team_count {
            if home == away {
                continue;
            }
            game_id += 1;
            round += 1;
            let date = start
                .checked_add_days(Days::new(round / 3 * 7))
                .unwrap_or(start);
            let mut goals = [0i32; 2];
            for (side, squad_idx) in [home, away].into_iter().enumerate() {
                let squad = &squads[squad_idx];
                for (player_id, player_game) in lineup(&mut rng, game_id, squad) {
                    let actions = player_actions(&mut rng, cfg, game_id, squad, &player_game);
                    goals[side] += actions
                        .iter()
                        .filter(|a| a.action.type_id == 11 && a.action.result_id == 1)
                        .count() as i32;
                    data.actions.extend(actions);
                    data.player_games.push(PlayerGameRow {
                        player_id,
                        player_game,
                    });
                }
            }
            data.games.push(GameRow {
                home_team_id: squads[home].team_id,
                away_team_id: squads[away].team_id,
                game: Game {
                    game_id,
                    season_id: Some(2023),
                    competition_id: Some(1),
                    game_day: Some((round / 3 + 1) as i64),
                    game_date: date.format("%Y-%m-%d").to_string(),
                    home_score: Some(goals[0]),
                    away_score: Some(goals[1]),
                    duration: Some(96),
                    referee: None,
                    venue: Some(format!("{} Stadion", squads[home].team_name)),
                    attendance: Some(rng.gen_range(8_000..60_000)),
                    home_manager: None,
                    away_manager: None,
                    home_team: squads[home].team_name.clone(),
                    away_team: squads[away].team_name.clone(),
                },
            });
        }
    }

    data.profiles = profiles(&mut rng, &data);
    data
}

/// Starters keep their formation slot unless rotated out; bench players
/// may come on. The last squad member never plays.
fn lineup(rng: &mut StdRng, game_id: i64, squad: &Squad) -> Vec<(i64, PlayerGame)> {
    let bench_end = squad.players.len() - 1;
    let mut starters: Vec<usize> = (0..FORMATION.len()).collect();
    let mut bench: Vec<usize> = (FORMATION.len()..bench_end).collect();
    if !bench.is_empty() && rng.gen_bool(0.3) {
        let slot = rng.gen_range(1..FORMATION.len());
        let b = rng.gen_range(0..bench.len());
        std::mem::swap(&mut starters[slot], &mut bench[b]);
    }

    let mut out = Vec::with_capacity(squad.players.len());
    for (slot, &idx) in starters.iter().enumerate() {
        let (player_id, name) = &squad.players[idx];
        let minutes = if slot > 0 && rng.gen_bool(0.25) { rng.gen_range(55..85) } else { 90 };
        out.push((
            *player_id,
            PlayerGame {
                game_id,
                team_id: squad.team_id,
                is_starter: true,
                minutes_played: minutes,
                starting_position: FORMATION[slot].to_string(),
                player_name: name.clone(),
            },
        ));
    }
    for &idx in bench.iter().chain(std::iter::once(&bench_end)) {
        let (player_id, name) = &squad.players[idx];
        let minutes = if idx != bench_end && rng.gen_bool(0.6) { rng.gen_range(5..35) } else { 0 };
        out.push((
            *player_id,
            PlayerGame {
                game_id,
                team_id: squad.team_id,
                is_starter: false,
                minutes_played: minutes,
                starting_position: SUB_POSITION.to_string(),
                player_name: name.clone(),
            },
        ));
    }
    out
}

fn player_actions(
    rng: &mut StdRng,
    cfg: &DemoConfig,
    game_id: i64,
    squad: &Squad,
    pg: &PlayerGame,
) -> Vec<ActionRow> {
    if pg.minutes_played == 0 {
        return Vec::new();
    }
    let Some((player_id, _)) = squad.players.iter().find(|(_, n)| *n == pg.player_name) else {
        return Vec::new();
    };
    let attacking = matches!(pg.starting_position.as_str(), "AML" | "AMR" | "AMC" | "FW");
    let count = cfg.actions_per_90 * pg.minutes_played as usize / 90;
    let mut out = Vec::with_capacity(count);
    for n in 0..count {
        let (type_id, _) = *catalog::ACTION_TYPES[..22]
            .choose(rng)
            .unwrap_or(&catalog::ACTION_TYPES[0]);
        let success = rng.gen_bool(if attacking { 0.7 } else { 0.8 });
        let start_x = if attacking { rng.gen_range(40.0..105.0) } else { rng.gen_range(0.0..80.0) };
        let start_y = rng.gen_range(0.0..68.0);
        let end_x = (start_x + rng.gen_range(-15.0..25.0f64)).clamp(0.0, 105.0);
        let end_y = (start_y + rng.gen_range(-15.0..15.0f64)).clamp(0.0, 68.0);
        let offensive_value = if success {
            rng.gen_range(0.0..0.04) * if type_id == 11 { 8.0 } else { 1.0 }
        } else {
            -rng.gen_range(0.0..0.02)
        };
        let defensive_value = rng.gen_range(-0.01..0.015);
        let period_id = if n < count / 2 { 1 } else { 2 };
        out.push(ActionRow {
            player_id: *player_id,
            team_id: squad.team_id,
            action: Action {
                game_id,
                original_event_id: Some(format!("{game_id}-{player_id}-{n}")),
                period_id,
                time_seconds: rng.gen_range(0.0..2700.0),
                start_x,
                end_x,
                start_y,
                end_y,
                type_id,
                bodypart_id: if rng.gen_bool(0.1) { 1 } else { 0 },
                result_id: u16::from(success),
                player_name: pg.player_name.clone(),
                team_name: squad.team_name.clone(),
                vaep_value: offensive_value + defensive_value,
                offensive_value,
                defensive_value,
            },
        });
    }
    out
}

/// One stats row per outfield player who played, z-scored column by column
/// within the whole league.
fn profiles(rng: &mut StdRng, data: &DemoData) -> Vec<ProfileRow> {
    let minutes = aggregate::player_minutes(&data.player_games());
    let ids: HashMap<&str, (i64, i64)> = data
        .player_games
        .iter()
        .map(|r| (r.player_game.player_name.as_str(), (r.player_id, r.player_game.team_id)))
        .collect();
    let team_names: HashMap<i64, &str> = data
        .teams
        .iter()
        .map(|(id, name)| (*id, name.as_str()))
        .collect();

    let eligible: Vec<_> = minutes
        .iter()
        .filter(|m| m.minutes_played > 0)
        .filter_map(|m| position_group(&m.most_common_position).map(|g| (m, g)))
        .collect();

    let columns = warehouse::z_columns();
    let mut raw: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for col in &columns {
        let values = eligible
            .iter()
            .map(|_| (0..3).map(|_| rng.gen_range(0.0..1.0)).sum::<f64>())
            .collect();
        raw.insert(*col, values);
    }
    let z: BTreeMap<&str, Vec<f64>> = raw
        .into_iter()
        .map(|(col, values)| (col, zscore_column(&values)))
        .collect();

    eligible
        .iter()
        .enumerate()
        .filter_map(|(i, (m, group))| {
            let (player_id, team_id) = *ids.get(m.player_name.as_str())?;
            let z_scores = z
                .iter()
                .map(|(col, values)| (col.to_string(), values[i]))
                .collect();
            let team_name = team_names.get(&team_id).copied().unwrap_or_default();
            Some(ProfileRow {
                player_id,
                team_id,
                profile: PlayerProfile {
                    player_name: m.player_name.clone(),
                    team_name: team_name.to_string(),
                    position: group.label().to_string(),
                    minutes_played: m.minutes_played,
                    z_scores,
                },
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub teams: usize,
    pub players: usize,
    pub games: usize,
    pub player_games: usize,
    pub actions: usize,
    pub profiles: usize,
}

/// Write a generated league/season into `conn`, creating tables as needed.
/// Existing rows of that league season are replaced.
pub fn seed(conn: &mut Connection, cfg: &DemoConfig) -> Result<SeedReport> {
    let data = generate(cfg);
    write(conn, &cfg.league, &cfg.season, &data)
}

pub fn write(
    conn: &mut Connection,
    league: &str,
    season: &str,
    data: &DemoData,
) -> Result<SeedReport> {
    init_schema(conn)?;
    let columns = warehouse::z_columns();
    create_league_tables(conn, league, season, &columns)?;

    let tx = conn.transaction().context("begin demo transaction")?;
    warehouse::clear_league_tables(&tx, league, season)?;
    for (id, name) in &data.teams {
        warehouse::upsert_team(&tx, *id, name)?;
    }
    for (id, name) in &data.players {
        warehouse::upsert_player(&tx, *id, name)?;
    }
    let report = SeedReport {
        teams: data.teams.len(),
        players: data.players.len(),
        games: warehouse::insert_games(&tx, league, season, &data.games)?,
        player_games: warehouse::insert_player_games(&tx, league, season, &data.player_games)?,
        actions: warehouse::insert_actions(&tx, league, season, &data.actions)?,
        profiles: warehouse::insert_profiles(&tx, league, season, &columns, &data.profiles)?,
    };
    tx.commit().context("commit demo transaction")?;
    info!(
        league,
        season,
        games = report.games,
        actions = report.actions,
        profiles = report.profiles,
        "demo data written"
    );
    Ok(report)
}
