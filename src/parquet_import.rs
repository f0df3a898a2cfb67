use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Row, RowAccessor};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::model::Action;
use crate::warehouse::{self, ActionRow};

const REQUIRED: [&str; 15] = [
    "game_id",
    "period_id",
    "time_seconds",
    "start_x",
    "end_x",
    "start_y",
    "end_y",
    "type_id",
    "bodypart_id",
    "result_id",
    "player_id",
    "team_id",
    "vaep_value",
    "offensive_value",
    "defensive_value",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rows_read: usize,
    pub inserted: usize,
    /// Previously stored actions of the file's games that were replaced.
    pub replaced: usize,
    pub skipped: usize,
    pub players: usize,
    pub teams: usize,
}

struct Columns(HashMap<String, usize>);

impl Columns {
    fn idx(&self, name: &str) -> Option<usize> {
        self.0.get(name).copied()
    }
}

fn read_f64(row: &Row, idx: usize) -> Option<f64> {
    if let Ok(v) = row.get_double(idx) {
        return Some(v);
    }
    if let Ok(v) = row.get_float(idx) {
        return Some(f64::from(v));
    }
    if let Ok(v) = row.get_long(idx) {
        return Some(v as f64);
    }
    row.get_int(idx).ok().map(f64::from)
}

fn read_i64(row: &Row, idx: usize) -> Option<i64> {
    if let Ok(v) = row.get_long(idx) {
        return Some(v);
    }
    if let Ok(v) = row.get_int(idx) {
        return Some(i64::from(v));
    }
    // float-typed ids show up in pandas exports with nullable columns
    row.get_double(idx)
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i64)
}

fn read_string(row: &Row, idx: usize) -> Option<String> {
    if let Ok(s) = row.get_string(idx) {
        return Some(s.clone());
    }
    read_i64(row, idx).map(|v| v.to_string())
}

struct Decoded {
    row: ActionRow,
    player_name: Option<String>,
    team_name: Option<String>,
}

fn decode(row: &Row, cols: &Columns) -> Option<Decoded> {
    let f = |name: &str| cols.idx(name).and_then(|idx| read_f64(row, idx));
    let i = |name: &str| cols.idx(name).and_then(|idx| read_i64(row, idx));
    let small = |name: &str| i(name).and_then(|v| u16::try_from(v).ok());

    let player_id = i("player_id")?;
    let team_id = i("team_id")?;
    let action = Action {
        game_id: i("game_id")?,
        original_event_id: cols.idx("original_event_id").and_then(|idx| read_string(row, idx)),
        period_id: i("period_id").and_then(|v| u8::try_from(v).ok())?,
        time_seconds: f("time_seconds")?,
        start_x: f("start_x")?,
        end_x: f("end_x")?,
        start_y: f("start_y")?,
        end_y: f("end_y")?,
        type_id: small("type_id")?,
        bodypart_id: small("bodypart_id")?,
        result_id: small("result_id")?,
        player_name: String::new(),
        team_name: String::new(),
        vaep_value: f("vaep_value")?,
        offensive_value: f("offensive_value")?,
        defensive_value: f("defensive_value")?,
    };
    Some(Decoded {
        row: ActionRow {
            player_id,
            team_id,
            action,
        },
        player_name: cols.idx("player_name").and_then(|idx| read_string(row, idx)),
        team_name: cols.idx("team_name").and_then(|idx| read_string(row, idx)),
    })
}

/// Decoded action rows plus the names found in the optional `player_name`
/// and `team_name` columns.
#[derive(Debug, Clone, Default)]
pub struct ParquetActions {
    pub rows: Vec<ActionRow>,
    pub players: BTreeMap<i64, String>,
    pub teams: BTreeMap<i64, String>,
    pub skipped: usize,
}

/// Decode an actions parquet file. Rows with a missing or out-of-range
/// required value are counted and skipped.
pub fn read_actions(path: &Path) -> Result<ParquetActions> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("open parquet reader actions")?;
    let cols = Columns(
        reader
            .metadata()
            .file_metadata()
            .schema()
            .get_fields()
            .iter()
            .enumerate()
            .map(|(idx, field)| (field.name().to_string(), idx))
            .collect(),
    );
    let missing: Vec<&str> = REQUIRED
        .iter()
        .copied()
        .filter(|c| cols.idx(c).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(anyhow!(
            "{} is missing columns: {}",
            path.display(),
            missing.join(", ")
        ));
    }

    let iter = reader.get_row_iter(None).context("iterate action rows")?;
    let mut out = ParquetActions::default();
    for row in iter {
        let Ok(row) = row else {
            out.skipped += 1;
            continue;
        };
        let Some(decoded) = decode(&row, &cols) else {
            out.skipped += 1;
            continue;
        };
        if let Some(name) = decoded.player_name.filter(|n| !n.is_empty()) {
            out.players.entry(decoded.row.player_id).or_insert(name);
        }
        if let Some(name) = decoded.team_name.filter(|n| !n.is_empty()) {
            out.teams.entry(decoded.row.team_id).or_insert(name);
        }
        out.rows.push(decoded.row);
    }
    Ok(out)
}

/// Load a parquet export into `{league}_{season}_actions`, creating the
/// tables if needed. The file replaces any stored actions of the games it
/// contains, so importing it again is a no-op. Names found in the file are
/// upserted into `players` and `teams`.
pub fn import_actions(
    conn: &mut Connection,
    path: &Path,
    league: &str,
    season: &str,
) -> Result<ImportReport> {
    let ParquetActions {
        rows,
        players,
        teams,
        skipped,
    } = read_actions(path)?;
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped undecodable action rows");
    }

    warehouse::init_schema(conn)?;
    warehouse::create_league_tables(conn, league, season, &warehouse::z_columns())?;

    let tx = conn.transaction().context("begin import transaction")?;
    for (id, name) in &teams {
        warehouse::upsert_team(&tx, *id, name)?;
    }
    for (id, name) in &players {
        warehouse::upsert_player(&tx, *id, name)?;
    }
    let game_ids: BTreeSet<i64> = rows.iter().map(|r| r.action.game_id).collect();
    let game_ids: Vec<i64> = game_ids.into_iter().collect();
    let replaced = warehouse::delete_game_actions(&tx, league, season, &game_ids)?;
    let inserted = warehouse::insert_actions(&tx, league, season, &rows)?;
    tx.commit().context("commit import transaction")?;

    info!(
        league,
        season,
        inserted,
        replaced,
        skipped,
        "parquet actions imported"
    );
    Ok(ImportReport {
        rows_read: inserted + skipped,
        inserted,
        replaced,
        skipped,
        players: players.len(),
        teams: teams.len(),
    })
}
