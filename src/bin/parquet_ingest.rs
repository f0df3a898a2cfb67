use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use vaep_scout::config::{self, AppConfig};
use vaep_scout::logging;
use vaep_scout::parquet_import;
use vaep_scout::warehouse;

/// Load VAEP action exports (parquet) into a league season's actions table.
/// Games already stored are replaced.
#[derive(Parser, Debug)]
#[command(name = "parquet_ingest")]
struct Cli {
    #[arg(long)]
    db: Option<PathBuf>,
    #[arg(long)]
    league: String,
    #[arg(long)]
    season: String,
    /// One or more parquet files.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let cli = Cli::parse();
    if !warehouse::is_table_key(&cli.league) || !warehouse::is_table_key(&cli.season) {
        bail!("league and season must be lowercase keys like bundesliga / 2023_2024");
    }
    let db_path = cli
        .db
        .or_else(|| AppConfig::from_env().resolved_db_path())
        .context("unable to resolve sqlite path")?;
    let mut conn = warehouse::open_db(&db_path)?;

    let mut errors = Vec::new();
    let (mut inserted, mut replaced, mut skipped) = (0usize, 0usize, 0usize);
    for file in &cli.files {
        match parquet_import::import_actions(&mut conn, file, &cli.league, &cli.season) {
            Ok(report) => {
                inserted += report.inserted;
                replaced += report.replaced;
                skipped += report.skipped;
            }
            Err(err) => errors.push(format!("{}: {err:#}", file.display())),
        }
    }

    println!("Parquet ingest complete");
    println!("DB: {}", db_path.display());
    println!("Files: {}/{}", cli.files.len() - errors.len(), cli.files.len());
    println!("Actions inserted: {inserted}");
    println!("Actions replaced: {replaced}");
    println!("Rows skipped: {skipped}");
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }
    Ok(())
}
