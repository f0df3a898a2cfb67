use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, params, params_from_iter};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::error::ScoutError;
use crate::model::{Action, Game, PlayerGame, PlayerProfile};

const MAX_KEY_LEN: usize = 64;

/// Table keys are interpolated into SQL, so only `[a-z0-9_]` is accepted.
pub fn is_table_key(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_KEY_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn is_column_name(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_KEY_LEN
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !raw.starts_with(|c: char| c.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Actions,
    Games,
    PlayerGames,
    StatsZ,
}

impl TableKind {
    fn suffix(self) -> &'static str {
        match self {
            TableKind::Actions => "actions",
            TableKind::Games => "games",
            TableKind::PlayerGames => "player_games",
            TableKind::StatsZ => "stats_z",
        }
    }
}

/// `{league}_{season}_{kind}`, validated.
pub fn table_name(league: &str, season: &str, kind: TableKind) -> Result<String, ScoutError> {
    if !is_table_key(league) {
        return Err(ScoutError::InvalidTableKey(league.to_string()));
    }
    if !is_table_key(season) {
        return Err(ScoutError::InvalidTableKey(season.to_string()));
    }
    Ok(format!("{league}_{season}_{}", kind.suffix()))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

fn open_read_only(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("open sqlite db read-only {}", path.display()))
}

/// Shared dimension tables.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS teams (
            team_id INTEGER PRIMARY KEY,
            team_name TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY,
            player_name TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Every z-score column the quality catalog refers to, sorted and deduplicated.
pub fn z_columns() -> Vec<&'static str> {
    let mut cols: Vec<&'static str> = Vec::new();
    for def in catalog::QUALITY_DEFINITIONS {
        cols.push(def.key);
        cols.extend(def.stats.iter().copied());
    }
    cols.sort_unstable();
    cols.dedup();
    cols
}

/// Create the four per-league/season tables. `stats_columns` become REAL columns
/// of the stats table.
pub fn create_league_tables(
    conn: &Connection,
    league: &str,
    season: &str,
    stats_columns: &[&str],
) -> Result<()> {
    let actions = table_name(league, season, TableKind::Actions)?;
    let games = table_name(league, season, TableKind::Games)?;
    let player_games = table_name(league, season, TableKind::PlayerGames)?;
    let stats = table_name(league, season, TableKind::StatsZ)?;

    let mut stats_cols = String::new();
    for col in stats_columns {
        if !is_column_name(col) {
            return Err(ScoutError::InvalidTableKey(col.to_string()).into());
        }
        stats_cols.push_str(&format!(",\n            \"{col}\" REAL NULL"));
    }

    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{actions}" (
            game_id INTEGER NOT NULL,
            original_event_id TEXT NULL,
            period_id INTEGER NOT NULL,
            time_seconds REAL NOT NULL,
            start_x REAL NOT NULL,
            end_x REAL NOT NULL,
            start_y REAL NOT NULL,
            end_y REAL NOT NULL,
            type_id INTEGER NOT NULL,
            bodypart_id INTEGER NOT NULL,
            result_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            vaep_value REAL NOT NULL,
            offensive_value REAL NOT NULL,
            defensive_value REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS "idx_{actions}_player" ON "{actions}"(player_id);

        CREATE TABLE IF NOT EXISTS "{games}" (
            game_id INTEGER PRIMARY KEY,
            season_id INTEGER NULL,
            competition_id INTEGER NULL,
            game_day INTEGER NULL,
            game_date TEXT NOT NULL,
            home_team_id INTEGER NOT NULL,
            away_team_id INTEGER NOT NULL,
            home_score INTEGER NULL,
            away_score INTEGER NULL,
            duration INTEGER NULL,
            referee TEXT NULL,
            venue TEXT NULL,
            attendance INTEGER NULL,
            home_manager TEXT NULL,
            away_manager TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS "{player_games}" (
            game_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            is_starter INTEGER NOT NULL,
            minutes_played REAL NOT NULL,
            starting_position TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS "{stats}" (
            player_id INTEGER NOT NULL,
            player_name TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            position TEXT NOT NULL,
            minutes_played REAL NOT NULL{stats_cols}
        );
        "#
    ))
    .with_context(|| format!("create tables for {league} {season}"))?;
    Ok(())
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .context("query sqlite_master")?;
    Ok(found.is_some())
}

pub fn upsert_team(conn: &Connection, team_id: i64, team_name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO teams(team_id, team_name) VALUES (?1, ?2)
         ON CONFLICT(team_id) DO UPDATE SET team_name = excluded.team_name",
        params![team_id, team_name],
    )
    .context("upsert team")?;
    Ok(())
}

pub fn upsert_player(conn: &Connection, player_id: i64, player_name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO players(player_id, player_name) VALUES (?1, ?2)
         ON CONFLICT(player_id) DO UPDATE SET player_name = excluded.player_name",
        params![player_id, player_name],
    )
    .context("upsert player")?;
    Ok(())
}

/// Storage shape of an action: names are resolved through `players` and `teams`.
#[derive(Debug, Clone)]
pub struct ActionRow {
    pub player_id: i64,
    pub team_id: i64,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub struct GameRow {
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub game: Game,
}

#[derive(Debug, Clone)]
pub struct PlayerGameRow {
    pub player_id: i64,
    pub player_game: PlayerGame,
}

#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub player_id: i64,
    pub team_id: i64,
    pub profile: PlayerProfile,
}

/// Delete every action of the given games, so that a re-import replaces
/// them instead of appending a second copy.
pub fn delete_game_actions(
    tx: &Transaction<'_>,
    league: &str,
    season: &str,
    game_ids: &[i64],
) -> Result<usize> {
    let table = table_name(league, season, TableKind::Actions)?;
    let mut stmt = tx
        .prepare(&format!(r#"DELETE FROM "{table}" WHERE game_id = ?1"#))
        .context("prepare delete game actions")?;
    let mut deleted = 0;
    for game_id in game_ids {
        deleted += stmt
            .execute(params![game_id])
            .context("delete game actions")?;
    }
    Ok(deleted)
}

/// Empty the four tables of a league season.
pub fn clear_league_tables(tx: &Transaction<'_>, league: &str, season: &str) -> Result<()> {
    for kind in [
        TableKind::Actions,
        TableKind::Games,
        TableKind::PlayerGames,
        TableKind::StatsZ,
    ] {
        let table = table_name(league, season, kind)?;
        tx.execute(&format!(r#"DELETE FROM "{table}""#), [])
            .with_context(|| format!("clear {table}"))?;
    }
    Ok(())
}

pub fn insert_actions(
    tx: &Transaction<'_>,
    league: &str,
    season: &str,
    rows: &[ActionRow],
) -> Result<usize> {
    let table = table_name(league, season, TableKind::Actions)?;
    let mut stmt = tx
        .prepare(&format!(
            r#"INSERT INTO "{table}" (
                game_id, original_event_id, period_id, time_seconds,
                start_x, end_x, start_y, end_y, type_id, bodypart_id, result_id,
                player_id, team_id, vaep_value, offensive_value, defensive_value
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"#
        ))
        .context("prepare insert actions")?;
    for row in rows {
        let a = &row.action;
        stmt.execute(params![
            a.game_id,
            a.original_event_id,
            a.period_id,
            a.time_seconds,
            a.start_x,
            a.end_x,
            a.start_y,
            a.end_y,
            a.type_id,
            a.bodypart_id,
            a.result_id,
            row.player_id,
            row.team_id,
            a.vaep_value,
            a.offensive_value,
            a.defensive_value,
        ])
        .context("insert action")?;
    }
    Ok(rows.len())
}

pub fn insert_games(
    tx: &Transaction<'_>,
    league: &str,
    season: &str,
    rows: &[GameRow],
) -> Result<usize> {
    let table = table_name(league, season, TableKind::Games)?;
    let mut stmt = tx
        .prepare(&format!(
            r#"INSERT OR REPLACE INTO "{table}" (
                game_id, season_id, competition_id, game_day, game_date,
                home_team_id, away_team_id, home_score, away_score, duration,
                referee, venue, attendance, home_manager, away_manager
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"#
        ))
        .context("prepare insert games")?;
    for row in rows {
        let g = &row.game;
        stmt.execute(params![
            g.game_id,
            g.season_id,
            g.competition_id,
            g.game_day,
            g.game_date,
            row.home_team_id,
            row.away_team_id,
            g.home_score,
            g.away_score,
            g.duration,
            g.referee,
            g.venue,
            g.attendance,
            g.home_manager,
            g.away_manager,
        ])
        .context("insert game")?;
    }
    Ok(rows.len())
}

pub fn insert_player_games(
    tx: &Transaction<'_>,
    league: &str,
    season: &str,
    rows: &[PlayerGameRow],
) -> Result<usize> {
    let table = table_name(league, season, TableKind::PlayerGames)?;
    let mut stmt = tx
        .prepare(&format!(
            r#"INSERT INTO "{table}" (
                game_id, player_id, team_id, is_starter, minutes_played, starting_position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#
        ))
        .context("prepare insert player games")?;
    for row in rows {
        let pg = &row.player_game;
        stmt.execute(params![
            pg.game_id,
            row.player_id,
            pg.team_id,
            pg.is_starter as i64,
            f64::from(pg.minutes_played),
            pg.starting_position,
        ])
        .context("insert player game")?;
    }
    Ok(rows.len())
}

/// Insert stats rows. Only the columns named in `stats_columns` are written;
/// a profile lacking one of them stores NULL.
pub fn insert_profiles(
    tx: &Transaction<'_>,
    league: &str,
    season: &str,
    stats_columns: &[&str],
    rows: &[ProfileRow],
) -> Result<usize> {
    let table = table_name(league, season, TableKind::StatsZ)?;
    let mut columns = vec![
        "player_id".to_string(),
        "player_name".to_string(),
        "team_id".to_string(),
        "position".to_string(),
        "minutes_played".to_string(),
    ];
    for col in stats_columns {
        if !is_column_name(col) {
            return Err(ScoutError::InvalidTableKey(col.to_string()).into());
        }
        columns.push(format!("\"{col}\""));
    }
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = tx
        .prepare(&format!(
            r#"INSERT INTO "{table}" ({}) VALUES ({placeholders})"#,
            columns.join(", ")
        ))
        .context("prepare insert stats")?;

    for row in rows {
        let p = &row.profile;
        let mut values: Vec<SqlValue> = vec![
            SqlValue::Integer(row.player_id),
            SqlValue::Text(p.player_name.clone()),
            SqlValue::Integer(row.team_id),
            SqlValue::Text(p.position.clone()),
            SqlValue::Real(f64::from(p.minutes_played)),
        ];
        for col in stats_columns {
            values.push(match p.z(col) {
                Some(v) if v.is_finite() => SqlValue::Real(v),
                _ => SqlValue::Null,
            });
        }
        stmt.execute(params_from_iter(values.iter()))
            .context("insert stats row")?;
    }
    Ok(rows.len())
}

/// Minutes may be stored as REAL upstream. Negative or non-finite values read as 0.
fn minutes_from_sql(raw: f64) -> u32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    raw.round().min(f64::from(u32::MAX)) as u32
}

fn small_id(raw: i64) -> u16 {
    u16::try_from(raw).unwrap_or(u16::MAX)
}

pub fn load_actions(conn: &Connection, league: &str, season: &str) -> Result<Vec<Action>> {
    let table = table_name(league, season, TableKind::Actions)?;
    let mut stmt = conn
        .prepare(&format!(
            r#"
            SELECT ba.game_id, ba.original_event_id, ba.period_id, ba.time_seconds,
                   ba.start_x, ba.end_x, ba.start_y, ba.end_y,
                   ba.type_id, ba.bodypart_id, ba.result_id,
                   p.player_name, t.team_name,
                   ba.vaep_value, ba.offensive_value, ba.defensive_value
            FROM "{table}" ba
            INNER JOIN teams t ON t.team_id = ba.team_id
            INNER JOIN players p ON p.player_id = ba.player_id
            ORDER BY ba.rowid
            "#
        ))
        .with_context(|| format!("prepare load actions {table}"))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Action {
                game_id: row.get(0)?,
                original_event_id: row.get(1)?,
                period_id: u8::try_from(row.get::<_, i64>(2)?).unwrap_or(1),
                time_seconds: row.get(3)?,
                start_x: row.get(4)?,
                end_x: row.get(5)?,
                start_y: row.get(6)?,
                end_y: row.get(7)?,
                type_id: small_id(row.get(8)?),
                bodypart_id: small_id(row.get(9)?),
                result_id: small_id(row.get(10)?),
                player_name: row.get(11)?,
                team_name: row.get(12)?,
                vaep_value: row.get(13)?,
                offensive_value: row.get(14)?,
                defensive_value: row.get(15)?,
            })
        })
        .context("query load actions")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode action row")?);
    }
    debug!(table = %table, rows = out.len(), "loaded actions");
    Ok(out)
}

pub fn load_games(conn: &Connection, league: &str, season: &str) -> Result<Vec<Game>> {
    let table = table_name(league, season, TableKind::Games)?;
    let mut stmt = conn
        .prepare(&format!(
            r#"
            SELECT bg.game_id, bg.season_id, bg.competition_id, bg.game_day, bg.game_date,
                   bg.home_score, bg.away_score, bg.duration, bg.referee, bg.venue,
                   bg.attendance, bg.home_manager, bg.away_manager,
                   t.team_name AS home_team, t1.team_name AS away_team
            FROM "{table}" bg
            INNER JOIN teams t ON t.team_id = bg.home_team_id
            INNER JOIN teams t1 ON t1.team_id = bg.away_team_id
            ORDER BY bg.game_date ASC, bg.game_id ASC
            "#
        ))
        .with_context(|| format!("prepare load games {table}"))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Game {
                game_id: row.get(0)?,
                season_id: row.get(1)?,
                competition_id: row.get(2)?,
                game_day: row.get(3)?,
                game_date: row.get(4)?,
                home_score: row.get(5)?,
                away_score: row.get(6)?,
                duration: row.get(7)?,
                referee: row.get(8)?,
                venue: row.get(9)?,
                attendance: row.get(10)?,
                home_manager: row.get(11)?,
                away_manager: row.get(12)?,
                home_team: row.get(13)?,
                away_team: row.get(14)?,
            })
        })
        .context("query load games")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode game row")?);
    }
    Ok(out)
}

pub fn load_player_games(conn: &Connection, league: &str, season: &str) -> Result<Vec<PlayerGame>> {
    let table = table_name(league, season, TableKind::PlayerGames)?;
    let mut stmt = conn
        .prepare(&format!(
            r#"
            SELECT bpg.game_id, bpg.team_id, bpg.is_starter, bpg.minutes_played,
                   bpg.starting_position, p.player_name
            FROM "{table}" bpg
            INNER JOIN players p ON p.player_id = bpg.player_id
            ORDER BY bpg.rowid
            "#
        ))
        .with_context(|| format!("prepare load player games {table}"))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PlayerGame {
                game_id: row.get(0)?,
                team_id: row.get(1)?,
                is_starter: row.get::<_, i64>(2)? != 0,
                minutes_played: minutes_from_sql(row.get(3)?),
                starting_position: row.get(4)?,
                player_name: row.get(5)?,
            })
        })
        .context("query load player games")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player game row")?);
    }
    Ok(out)
}

/// Load the z-score table. Every column ending in `_z` lands in `z_scores`;
/// NULL cells are left out of the map.
pub fn load_profiles(conn: &Connection, league: &str, season: &str) -> Result<Vec<PlayerProfile>> {
    let table = table_name(league, season, TableKind::StatsZ)?;
    let mut stmt = conn
        .prepare(&format!(
            r#"
            SELECT s.*, t.team_name AS joined_team_name
            FROM "{table}" s
            LEFT JOIN teams t ON s.team_id = t.team_id
            "#
        ))
        .with_context(|| format!("prepare load stats {table}"))?;

    let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let idx = |wanted: &str| names.iter().position(|n| n == wanted);
    let player_idx = idx("player_name").context("stats table lacks player_name")?;
    let position_idx = idx("position").context("stats table lacks position")?;
    let minutes_idx = idx("minutes_played").context("stats table lacks minutes_played")?;
    let team_idx = idx("joined_team_name").context("stats query lacks team name")?;
    let z_idx: Vec<(usize, String)> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.ends_with("_z"))
        .map(|(i, n)| (i, n.clone()))
        .collect();

    let rows = stmt
        .query_map([], |row| {
            let mut z_scores = BTreeMap::new();
            for (i, name) in &z_idx {
                if let Some(v) = row.get::<_, Option<f64>>(*i)? {
                    z_scores.insert(name.clone(), v);
                }
            }
            Ok(PlayerProfile {
                player_name: row.get(player_idx)?,
                team_name: row.get::<_, Option<String>>(team_idx)?.unwrap_or_default(),
                position: row.get(position_idx)?,
                minutes_played: minutes_from_sql(row.get(minutes_idx)?),
                z_scores,
            })
        })
        .context("query load stats")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode stats row")?);
    }
    debug!(table = %table, rows = out.len(), "loaded profiles");
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeagueSeason {
    pub league: String,
    pub season: String,
}

impl LeagueSeason {
    pub fn new(league: impl Into<String>, season: impl Into<String>) -> Self {
        Self {
            league: league.into(),
            season: season.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PreloadReport {
    pub loaded: usize,
    pub rows: usize,
    pub errors: Vec<String>,
}

/// Read access to the warehouse with per league/season memoization.
///
/// Each table kind is loaded at most once per key; callers share the result
/// through `Arc`.
pub struct Warehouse {
    conn: Connection,
    path: Option<PathBuf>,
    actions: HashMap<LeagueSeason, Arc<Vec<Action>>>,
    games: HashMap<LeagueSeason, Arc<Vec<Game>>>,
    player_games: HashMap<LeagueSeason, Arc<Vec<PlayerGame>>>,
    profiles: HashMap<LeagueSeason, Arc<Vec<PlayerProfile>>>,
}

impl Warehouse {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_db(path)?;
        Ok(Self::build(conn, Some(path.to_path_buf())))
    }

    /// Wrap an existing connection, e.g. an in-memory database.
    pub fn from_connection(conn: Connection) -> Self {
        Self::build(conn, None)
    }

    fn build(conn: Connection, path: Option<PathBuf>) -> Self {
        Self {
            conn,
            path,
            actions: HashMap::new(),
            games: HashMap::new(),
            player_games: HashMap::new(),
            profiles: HashMap::new(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn actions(&mut self, league: &str, season: &str) -> Result<Arc<Vec<Action>>> {
        let key = LeagueSeason::new(league, season);
        if let Some(hit) = self.actions.get(&key) {
            return Ok(Arc::clone(hit));
        }
        let rows = Arc::new(load_actions(&self.conn, league, season)?);
        self.actions.insert(key, Arc::clone(&rows));
        Ok(rows)
    }

    pub fn games(&mut self, league: &str, season: &str) -> Result<Arc<Vec<Game>>> {
        let key = LeagueSeason::new(league, season);
        if let Some(hit) = self.games.get(&key) {
            return Ok(Arc::clone(hit));
        }
        let rows = Arc::new(load_games(&self.conn, league, season)?);
        self.games.insert(key, Arc::clone(&rows));
        Ok(rows)
    }

    pub fn player_games(&mut self, league: &str, season: &str) -> Result<Arc<Vec<PlayerGame>>> {
        let key = LeagueSeason::new(league, season);
        if let Some(hit) = self.player_games.get(&key) {
            return Ok(Arc::clone(hit));
        }
        let rows = Arc::new(load_player_games(&self.conn, league, season)?);
        self.player_games.insert(key, Arc::clone(&rows));
        Ok(rows)
    }

    pub fn profiles(&mut self, league: &str, season: &str) -> Result<Arc<Vec<PlayerProfile>>> {
        let key = LeagueSeason::new(league, season);
        if let Some(hit) = self.profiles.get(&key) {
            return Ok(Arc::clone(hit));
        }
        let rows = Arc::new(load_profiles(&self.conn, league, season)?);
        self.profiles.insert(key, Arc::clone(&rows));
        Ok(rows)
    }

    pub fn is_cached(&self, league: &str, season: &str) -> bool {
        self.profiles.contains_key(&LeagueSeason::new(league, season))
    }

    /// Drop every memoized table, e.g. after an ingest.
    pub fn invalidate(&mut self) {
        self.actions.clear();
        self.games.clear();
        self.player_games.clear();
        self.profiles.clear();
    }

    /// Load the stats tables for every pair. File-backed warehouses read in
    /// parallel, one read-only connection per worker. Missing tables and load
    /// failures are collected, not fatal.
    pub fn preload(&mut self, pairs: &[LeagueSeason], threads: usize) -> PreloadReport {
        let pending: Vec<LeagueSeason> = pairs
            .iter()
            .filter(|p| !self.profiles.contains_key(*p))
            .cloned()
            .collect();

        let results: Vec<(LeagueSeason, Result<Vec<PlayerProfile>>)> = match self.path.clone() {
            Some(path) => {
                let load = |pair: &LeagueSeason| {
                    let res = open_read_only(&path)
                        .and_then(|conn| load_existing_profiles(&conn, pair));
                    (pair.clone(), res)
                };
                match rayon::ThreadPoolBuilder::new().num_threads(threads.max(1)).build() {
                    Ok(pool) => pool.install(|| pending.par_iter().map(&load).collect()),
                    Err(err) => {
                        warn!(error = %err, "preload pool unavailable, loading sequentially");
                        pending.iter().map(&load).collect()
                    }
                }
            }
            None => pending
                .iter()
                .map(|pair| (pair.clone(), load_existing_profiles(&self.conn, pair)))
                .collect(),
        };

        let mut report = PreloadReport::default();
        for (pair, res) in results {
            match res {
                Ok(rows) => {
                    info!(
                        league = %pair.league,
                        season = %pair.season,
                        rows = rows.len(),
                        "data preloaded"
                    );
                    report.loaded += 1;
                    report.rows += rows.len();
                    self.profiles.insert(pair, Arc::new(rows));
                }
                Err(err) => {
                    warn!(
                        league = %pair.league,
                        season = %pair.season,
                        error = %err,
                        "preload failed"
                    );
                    report
                        .errors
                        .push(format!("{} {}: {err:#}", pair.league, pair.season));
                }
            }
        }
        report
    }
}

fn load_existing_profiles(conn: &Connection, pair: &LeagueSeason) -> Result<Vec<PlayerProfile>> {
    let table = table_name(&pair.league, &pair.season, TableKind::StatsZ)?;
    if !table_exists(conn, &table)? {
        anyhow::bail!("table {table} does not exist");
    }
    load_profiles(conn, &pair.league, &pair.season)
}
