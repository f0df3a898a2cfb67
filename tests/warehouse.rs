use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use vaep_scout::demo::{self, DemoConfig};
use vaep_scout::error::ScoutError;
use vaep_scout::warehouse::{
    self, LeagueSeason, TableKind, Warehouse, is_table_key, table_name,
};

fn small_demo() -> DemoConfig {
    DemoConfig {
        teams: 4,
        squad_size: 13,
        actions_per_90: 12,
        ..DemoConfig::default()
    }
}

fn seeded_memory_warehouse(cfg: &DemoConfig) -> (Warehouse, demo::DemoData) {
    let mut conn = Connection::open_in_memory().expect("in-memory sqlite");
    let data = demo::generate(cfg);
    demo::write(&mut conn, &cfg.league, &cfg.season, &data).expect("demo data written");
    (Warehouse::from_connection(conn), data)
}

fn temp_db(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("vaep_scout_{name}_{}.sqlite", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn table_keys_are_validated() {
    assert!(is_table_key("bundesliga"));
    assert!(is_table_key("2023_2024"));
    assert!(!is_table_key("Bundesliga"));
    assert!(!is_table_key("x; DROP TABLE players"));
    assert!(!is_table_key(""));

    assert_eq!(
        table_name("bundesliga", "2023_2024", TableKind::StatsZ).as_deref(),
        Ok("bundesliga_2023_2024_stats_z")
    );
    assert_eq!(
        table_name("la liga", "2023_2024", TableKind::Actions),
        Err(ScoutError::InvalidTableKey("la liga".to_string()))
    );
}

#[test]
fn demo_tables_round_trip() {
    let cfg = small_demo();
    let (mut wh, data) = seeded_memory_warehouse(&cfg);

    let actions = wh.actions(&cfg.league, &cfg.season).expect("actions load");
    assert_eq!(actions.len(), data.actions.len());
    let first = &data.actions[0].action;
    let loaded = actions
        .iter()
        .find(|a| a.original_event_id == first.original_event_id)
        .expect("first action present");
    assert_eq!(loaded.player_name, first.player_name);
    assert_eq!(loaded.team_name, first.team_name);
    assert_eq!(loaded.vaep_value, first.vaep_value);

    let games = wh.games(&cfg.league, &cfg.season).expect("games load");
    assert_eq!(games.len(), 4 * 3);
    assert!(games.iter().all(|g| g.home_team != g.away_team));

    let player_games = wh.player_games(&cfg.league, &cfg.season).expect("player games load");
    assert_eq!(player_games.len(), data.player_games.len());

    let profiles = wh.profiles(&cfg.league, &cfg.season).expect("profiles load");
    assert_eq!(profiles.len(), data.profiles.len());
    let expected = &data.profiles[0].profile;
    let got = profiles
        .iter()
        .find(|p| p.player_name == expected.player_name)
        .expect("profile present");
    assert_eq!(got.team_name, expected.team_name);
    assert_eq!(got.position, expected.position);
    assert_eq!(got.minutes_played, expected.minutes_played);
    assert_eq!(got.z("finishing_z"), expected.z("finishing_z"));
    assert_eq!(got.z_scores.len(), warehouse::z_columns().len());
}

#[test]
fn loads_are_memoized_until_invalidated() {
    let cfg = small_demo();
    let (mut wh, _) = seeded_memory_warehouse(&cfg);

    assert!(!wh.is_cached(&cfg.league, &cfg.season));
    let a = wh.profiles(&cfg.league, &cfg.season).expect("first load");
    let b = wh.profiles(&cfg.league, &cfg.season).expect("second load");
    assert!(Arc::ptr_eq(&a, &b));
    assert!(wh.is_cached(&cfg.league, &cfg.season));

    wh.invalidate();
    assert!(!wh.is_cached(&cfg.league, &cfg.season));
    let c = wh.profiles(&cfg.league, &cfg.season).expect("reload");
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(a.len(), c.len());
}

#[test]
fn invalid_keys_fail_before_touching_sql() {
    let (mut wh, _) = seeded_memory_warehouse(&small_demo());
    let err = wh.actions("Bundes Liga", "2023_2024").expect_err("bad key");
    assert_eq!(
        err.downcast_ref::<ScoutError>(),
        Some(&ScoutError::InvalidTableKey("Bundes Liga".to_string()))
    );
}

#[test]
fn preload_collects_missing_tables_as_errors() {
    let cfg = small_demo();
    let (mut wh, _) = seeded_memory_warehouse(&cfg);
    let pairs = vec![
        LeagueSeason::new(cfg.league.clone(), cfg.season.clone()),
        LeagueSeason::new("laliga", "2023_2024"),
    ];
    let report = wh.preload(&pairs, 2);
    assert_eq!(report.loaded, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("laliga 2023_2024"));
    assert!(wh.is_cached(&cfg.league, &cfg.season));

    // already cached pairs are skipped
    let again = wh.preload(&pairs[..1], 2);
    assert_eq!(again.loaded, 0);
    assert!(again.errors.is_empty());
}

#[test]
fn file_backed_preload_runs_in_parallel() {
    let path = temp_db("preload");
    let first = small_demo();
    let second = DemoConfig {
        league: "laliga".to_string(),
        seed: 7,
        ..small_demo()
    };
    {
        let mut conn = warehouse::open_db(&path).expect("open file db");
        demo::seed(&mut conn, &first).expect("seed first");
        demo::seed(&mut conn, &second).expect("seed second");
    }

    let mut wh = Warehouse::open(&path).expect("open warehouse");
    let pairs = vec![
        LeagueSeason::new(first.league.clone(), first.season.clone()),
        LeagueSeason::new(second.league.clone(), second.season.clone()),
        LeagueSeason::new("eredivisie", "2022_2023"),
    ];
    let report = wh.preload(&pairs, 3);
    assert_eq!(report.loaded, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.rows > 0);
    assert!(wh.is_cached("laliga", "2023_2024"));

    drop(wh);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn seeding_twice_replaces_the_league_season() {
    let cfg = small_demo();
    let mut conn = Connection::open_in_memory().expect("in-memory sqlite");
    let first = demo::seed(&mut conn, &cfg).expect("first seed");
    let once = warehouse::load_profiles(&conn, &cfg.league, &cfg.season).expect("profiles");
    let second = demo::seed(&mut conn, &cfg).expect("second seed");
    assert_eq!(first, second);

    let twice = warehouse::load_profiles(&conn, &cfg.league, &cfg.season).expect("profiles");
    assert_eq!(once.len(), twice.len());
    let player_games = warehouse::load_player_games(&conn, &cfg.league, &cfg.season)
        .expect("player games");
    assert_eq!(player_games.len(), first.player_games);
    let actions = warehouse::load_actions(&conn, &cfg.league, &cfg.season).expect("actions");
    assert_eq!(actions.len(), first.actions);
}

#[test]
fn file_warehouse_uses_wal_journal() {
    let path = temp_db("wal");
    let wh = Warehouse::open(&path).expect("open warehouse");
    let mode: String = wh
        .connection()
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .expect("journal mode");
    assert_eq!(mode.to_ascii_lowercase(), "wal");

    drop(wh);
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
    let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));
}
