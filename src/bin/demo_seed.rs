use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use vaep_scout::config::{self, AppConfig};
use vaep_scout::demo::{self, DemoConfig};
use vaep_scout::logging;
use vaep_scout::warehouse;

/// Write a synthetic league season into the warehouse.
#[derive(Parser, Debug)]
#[command(name = "demo_seed")]
struct Cli {
    #[arg(long)]
    db: Option<PathBuf>,
    #[arg(long, default_value = "bundesliga")]
    league: String,
    #[arg(long, default_value = "2023_2024")]
    season: String,
    #[arg(long, default_value_t = 6)]
    teams: usize,
    #[arg(long, default_value_t = 15)]
    squad_size: usize,
    #[arg(long, default_value_t = 40)]
    actions_per_90: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let cli = Cli::parse();
    let db_path = cli
        .db
        .or_else(|| AppConfig::from_env().resolved_db_path())
        .context("unable to resolve sqlite path")?;

    let cfg = DemoConfig {
        league: cli.league,
        season: cli.season,
        teams: cli.teams,
        squad_size: cli.squad_size,
        actions_per_90: cli.actions_per_90,
        seed: cli.seed,
    };
    let mut conn = warehouse::open_db(&db_path)?;
    let report = demo::seed(&mut conn, &cfg)?;

    println!("Demo seed complete");
    println!("DB: {}", db_path.display());
    println!("League/season: {} {}", cfg.league, cfg.season);
    println!("Teams: {}  Players: {}", report.teams, report.players);
    println!("Games: {}  Appearances: {}", report.games, report.player_games);
    println!("Actions: {}  Stats rows: {}", report.actions, report.profiles);
    Ok(())
}
