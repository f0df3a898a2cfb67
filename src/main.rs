use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use vaep_scout::aggregate::{self, ActionFilter};
use vaep_scout::catalog::{self, PositionGroup};
use vaep_scout::config::{self, AppConfig};
use vaep_scout::export::{self, ExportBundle};
use vaep_scout::logging;
use vaep_scout::model::{PlayerRating, RatedAction};
use vaep_scout::persist::{self, SummaryCache};
use vaep_scout::profile::{self, Comparison};
use vaep_scout::scoring::{self, Importance, QualitySelection};
use vaep_scout::summary::{self, CachedGenerator, Language, OpenAiChat};
use vaep_scout::warehouse::{LeagueSeason, Warehouse, is_table_key};

#[derive(Parser, Debug)]
#[command(name = "vaep_scout", about = "VAEP player rankings, searches and profiles")]
struct Cli {
    /// SQLite warehouse; defaults to VAEP_DB or the cache directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct Scope {
    /// League display name or key, e.g. "Bundesliga" or "bundesliga".
    #[arg(long, default_value = "bundesliga")]
    league: String,
    /// Season display name or key, e.g. "2023/24".
    #[arg(long, default_value = "2023_2024")]
    season: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// VAEP per-90 ranking over filtered actions.
    Ranking(RankingArgs),
    /// Rank a position group by weighted qualities.
    Search(SearchArgs),
    /// A team's players against their position group.
    Team(TeamArgs),
    /// One player's profile, optionally with a generated summary.
    Player(PlayerArgs),
    /// Write ranking, search and profile tables to .xlsx or .json.
    Export(ExportArgs),
    /// Load every configured league/season into memory and report.
    Preload,
}

#[derive(Args, Debug)]
struct RankingArgs {
    #[command(flatten)]
    scope: Scope,
    #[arg(long, default_value_t = 60)]
    min_minutes: u32,
    #[arg(long)]
    max_minutes: Option<u32>,
    #[arg(long = "team")]
    teams: Vec<String>,
    #[arg(long = "position")]
    positions: Vec<String>,
    #[arg(long = "action-type")]
    action_types: Vec<String>,
    #[arg(long = "body-part")]
    body_parts: Vec<String>,
    #[arg(long = "zone")]
    zones: Vec<String>,
    #[arg(long, default_value_t = 20)]
    top: usize,
    /// Also list the N most valuable single actions.
    #[arg(long, default_value_t = 0)]
    top_actions: usize,
    /// Show team totals instead of players.
    #[arg(long)]
    by_team: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[command(flatten)]
    scope: Scope,
    #[arg(long)]
    position: String,
    #[arg(long)]
    min_minutes: Option<u32>,
    /// `quality[:weight]` with weight 1, 3 or 5. Up to five.
    #[arg(long = "quality", required = true)]
    qualities: Vec<String>,
    #[arg(long, default_value_t = 10)]
    top: usize,
}

#[derive(Args, Debug)]
struct TeamArgs {
    #[command(flatten)]
    scope: Scope,
    #[arg(long)]
    team: String,
    #[arg(long)]
    position: String,
    #[arg(long, default_value = "Summary")]
    quality: String,
}

#[derive(Args, Debug)]
struct PlayerArgs {
    #[command(flatten)]
    scope: Scope,
    #[arg(long)]
    player: String,
    /// Defaults to the position stored for the player.
    #[arg(long)]
    position: Option<String>,
    #[arg(long, default_value = "Summary")]
    quality: String,
    #[arg(long)]
    summary: bool,
    #[arg(long, default_value = "en")]
    lang: String,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    scope: Scope,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    position: Option<String>,
    #[arg(long = "quality")]
    qualities: Vec<String>,
    #[arg(long)]
    min_minutes: Option<u32>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let cli = Cli::parse();
    let cfg = AppConfig::from_env();
    let db_path = cli
        .db
        .clone()
        .or_else(|| cfg.resolved_db_path())
        .context("unable to resolve sqlite path")?;
    let mut wh = Warehouse::open(&db_path)?;
    info!(db = %db_path.display(), "warehouse opened");

    match cli.command {
        Command::Ranking(args) => run_ranking(&mut wh, &args),
        Command::Search(args) => run_search(&mut wh, &cfg, &args),
        Command::Team(args) => run_team(&mut wh, &args),
        Command::Player(args) => run_player(&mut wh, &cfg, &args),
        Command::Export(args) => run_export(&mut wh, &cfg, &args),
        Command::Preload => run_preload(&mut wh, &cfg),
    }
}

fn resolve_scope(scope: &Scope) -> Result<(String, String)> {
    let league = catalog::league_key(&scope.league)
        .map(str::to_string)
        .or_else(|| is_table_key(&scope.league).then(|| scope.league.clone()))
        .ok_or_else(|| anyhow!("unknown league {}", scope.league))?;
    let season = catalog::season_key(&scope.season)
        .map(str::to_string)
        .or_else(|| is_table_key(&scope.season).then(|| scope.season.clone()))
        .ok_or_else(|| anyhow!("unknown season {}", scope.season))?;
    Ok((league, season))
}

fn rated_actions(wh: &mut Warehouse, league: &str, season: &str) -> Result<Vec<RatedAction>> {
    let actions = wh.actions(league, season)?;
    let player_games = wh.player_games(league, season)?;
    let minutes = aggregate::player_minutes(&player_games);
    let rated = aggregate::rate_actions(&actions, &minutes);
    if rated.skipped_unmatched > 0 {
        warn!(
            skipped = rated.skipped_unmatched,
            "actions without minutes record dropped"
        );
    }
    Ok(rated.rows)
}

fn ranking_filter(args: &RankingArgs) -> Result<ActionFilter> {
    let zones = args
        .zones
        .iter()
        .map(|z| catalog::zone(z).ok_or_else(|| anyhow!("unknown zone {z}")))
        .collect::<Result<Vec<_>>>()?;
    let minutes = match (args.min_minutes, args.max_minutes) {
        (0, None) => None,
        (lo, hi) => Some((lo, hi.unwrap_or(u32::MAX))),
    };
    Ok(ActionFilter {
        minutes,
        teams: args.teams.clone(),
        positions: args.positions.clone(),
        action_types: args.action_types.clone(),
        body_parts: args.body_parts.clone(),
        zones,
    })
}

fn run_ranking(wh: &mut Warehouse, args: &RankingArgs) -> Result<()> {
    let (league, season) = resolve_scope(&args.scope)?;
    let rows = rated_actions(wh, &league, &season)?;
    let filter = ranking_filter(args)?;
    let filtered = filter.apply(&rows);
    let ratings = aggregate::player_ratings(&filtered);

    println!("{league} {season}: {} actions after filters", filtered.len());
    if args.by_team {
        let teams = aggregate::team_ratings(&ratings);
        for (idx, t) in teams.iter().take(args.top).enumerate() {
            println!(
                "{:>3}. {:<24} players {:>3}  vaep {:>7.3}  off {:>7.3}  def {:>7.3}",
                idx + 1,
                t.team_name,
                t.players,
                t.vaep_value,
                t.offensive_value,
                t.defensive_value
            );
        }
    } else {
        print_ratings(&ratings, args.top);
    }

    if let Some(lines) = aggregate::risk_reference(&ratings) {
        println!("risk/reward reference: fail/90 {:.4}  success/90 {:.4}", lines.x, lines.y);
    }
    let qq = aggregate::quantity_quality(&filtered);
    if let Some(lines) = aggregate::quantity_reference(&qq) {
        println!(
            "quantity/quality reference: actions/90 {:.1}  rating/action {:.5}",
            lines.x, lines.y
        );
    }

    if args.top_actions > 0 {
        let games = wh.games(&league, &season)?;
        println!("top actions:");
        for (row, ctx) in aggregate::top_actions(&filtered, &games, args.top_actions) {
            println!(
                "  {:>6.3}  {:<22} {:<14} {ctx}",
                row.action.vaep_value,
                row.action.player_name,
                row.actiontype_name.unwrap_or("?")
            );
        }
    }
    Ok(())
}

fn print_ratings(ratings: &[PlayerRating], top: usize) {
    println!(
        "{:>3}  {:<24} {:<22} {:<5} {:>5} {:>8} {:>8} {:>8}",
        "#", "player", "team", "pos", "min", "vaep/90", "off/90", "def/90"
    );
    for (idx, r) in ratings.iter().take(top).enumerate() {
        println!(
            "{:>3}  {:<24} {:<22} {:<5} {:>5} {:>8.3} {:>8.3} {:>8.3}",
            idx + 1,
            r.player_name,
            r.team_name,
            r.most_common_position,
            r.minutes_played,
            r.vaep_rating,
            r.offensive_rating,
            r.defensive_rating
        );
    }
}

/// `"passing_quality:5"`, `"Finishing"` (medium) or `"Box threat:1"`.
fn parse_quality(raw: &str) -> Result<(&'static str, Importance)> {
    let (name, importance) = match raw.rsplit_once(':') {
        Some((name, weight)) => {
            let weight: u8 = weight
                .trim()
                .parse()
                .with_context(|| format!("bad weight in {raw}"))?;
            (name, Importance::from_weight(weight)?)
        }
        None => (raw, Importance::default()),
    };
    let key = catalog::quality_key(name)?;
    if key == catalog::SUMMARY_QUALITY {
        return Err(anyhow!("the summary view cannot be weighted"));
    }
    Ok((key, importance))
}

fn selection(raw: &[String]) -> Result<QualitySelection> {
    let mut sel = QualitySelection::new();
    for q in raw {
        let (key, importance) = parse_quality(q)?;
        sel.insert(key, importance)?;
    }
    Ok(sel)
}

fn run_search(wh: &mut Warehouse, cfg: &AppConfig, args: &SearchArgs) -> Result<()> {
    let (league, season) = resolve_scope(&args.scope)?;
    let position = PositionGroup::parse(&args.position)?;
    let sel = selection(&args.qualities)?;
    let profiles = wh.profiles(&league, &season)?;
    let min_minutes = args.min_minutes.unwrap_or(cfg.min_minutes);
    let scored = scoring::search_players(&profiles, position, min_minutes, &sel)?;

    let Some(chart) = profile::top_chart(&scored, args.top) else {
        println!("no {} with at least {min_minutes} minutes", position.label());
        return Ok(());
    };
    for (key, importance) in sel.iter() {
        println!(
            "  {} ({})",
            catalog::quality_display(key).unwrap_or(key),
            importance.label()
        );
    }
    for row in &chart.rows {
        println!(
            "{:>3}. {:<24} {:<22} {:>5} min  score {:>6.3}",
            row.rank, row.player_name, row.team_name, row.minutes_played, row.score
        );
    }
    println!(
        "axes: minutes {:.0}..{:.0}  score {:.2}..{:.2}",
        chart.minutes_domain.0, chart.minutes_domain.1, chart.score_domain.0, chart.score_domain.1
    );
    Ok(())
}

fn print_comparison(c: &Comparison) {
    let mut last = "";
    for p in &c.highlighted {
        if p.player_name != last {
            println!("{} ({})", p.player_name, p.team_name);
            last = p.player_name.as_str();
        }
        println!(
            "  {:<32} {:>6.2}  {:<14} {:>7}",
            p.label,
            p.value,
            p.level().label(),
            p.rank_display()
        );
    }
}

fn run_team(wh: &mut Warehouse, args: &TeamArgs) -> Result<()> {
    let (league, season) = resolve_scope(&args.scope)?;
    let position = PositionGroup::parse(&args.position)?;
    let quality = catalog::quality_key(&args.quality)?;
    let attributes = catalog::attribute_details(quality, position);
    let profiles = wh.profiles(&league, &season)?;

    let comparison = profile::team_comparison(&profiles, &args.team, position, attributes)?;
    if comparison.highlighted.is_empty() {
        println!("{} has no {} in {league} {season}", args.team, position.label());
        return Ok(());
    }
    print_comparison(&comparison);
    Ok(())
}

fn run_player(wh: &mut Warehouse, cfg: &AppConfig, args: &PlayerArgs) -> Result<()> {
    let (league, season) = resolve_scope(&args.scope)?;
    let profiles = wh.profiles(&league, &season)?;
    let position = match &args.position {
        Some(raw) => PositionGroup::parse(raw)?,
        None => {
            let stored = profiles
                .iter()
                .find(|p| p.player_name == args.player)
                .map(|p| p.position.as_str())
                .ok_or_else(|| anyhow!("No data found for player {}", args.player))?;
            PositionGroup::parse(stored)?
        }
    };
    let quality = catalog::quality_key(&args.quality)?;
    let attributes = catalog::attribute_details(quality, position);

    let comparison = profile::player_comparison(&profiles, &args.player, position, attributes)?;
    print_comparison(&comparison);

    if args.summary {
        let language = Language::parse(&args.lang)
            .ok_or_else(|| anyhow!("unsupported language {}", args.lang))?;
        let examples = match &cfg.summary_examples {
            Some(path) => summary::load_examples(path).unwrap_or_else(|err| {
                warn!(error = %err, "few-shot examples unusable, continuing without");
                Vec::new()
            }),
            None => Vec::new(),
        };
        let cache = persist::default_summary_cache_path()
            .map(SummaryCache::open)
            .unwrap_or_else(SummaryCache::in_memory);
        let generator = CachedGenerator::new(OpenAiChat::from_config(&cfg.llm)?, cache);
        let text = summary::player_evaluation(
            &generator,
            &profiles,
            &args.player,
            attributes,
            language,
            &examples,
            &cfg.llm.model,
        )?;
        println!();
        println!("{text}");
    }
    Ok(())
}

fn run_export(wh: &mut Warehouse, cfg: &AppConfig, args: &ExportArgs) -> Result<()> {
    let (league, season) = resolve_scope(&args.scope)?;
    let rows = rated_actions(wh, &league, &season)?;
    let all: Vec<&RatedAction> = rows.iter().collect();
    let ratings = aggregate::player_ratings(&all);
    let mut bundle = ExportBundle {
        league: league.clone(),
        season: season.clone(),
        teams: aggregate::team_ratings(&ratings),
        ratings,
        ..ExportBundle::default()
    };

    if let Some(raw) = &args.position {
        let position = PositionGroup::parse(raw)?;
        let profiles = wh.profiles(&league, &season)?;
        if !args.qualities.is_empty() {
            let sel = selection(&args.qualities)?;
            let min_minutes = args.min_minutes.unwrap_or(cfg.min_minutes);
            bundle.search = scoring::search_players(&profiles, position, min_minutes, &sel)?;
        }
        let attributes = position.summary_attributes();
        for team in profile::teams(&profiles) {
            let c = profile::team_comparison(&profiles, &team, position, attributes)?;
            if !c.is_empty() {
                bundle.comparisons.push(c);
            }
        }
    }

    export::export(&args.out, &bundle)?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn run_preload(wh: &mut Warehouse, cfg: &AppConfig) -> Result<()> {
    let pairs: Vec<LeagueSeason> = cfg
        .leagues
        .iter()
        .flat_map(|l| {
            cfg.seasons
                .iter()
                .map(move |s| LeagueSeason::new(l.clone(), s.clone()))
        })
        .collect();
    let report = wh.preload(&pairs, cfg.preload_threads);
    println!(
        "preloaded {}/{} league seasons, {} rows",
        report.loaded,
        pairs.len(),
        report.rows
    );
    for err in report.errors.iter().take(8) {
        println!(" - {err}");
    }
    Ok(())
}
