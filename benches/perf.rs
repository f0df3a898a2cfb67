use criterion::{Criterion, criterion_group, criterion_main};
use rusqlite::Connection;
use std::hint::black_box;

use vaep_scout::aggregate::{self, ActionFilter};
use vaep_scout::catalog::{self, PositionGroup};
use vaep_scout::demo::{self, DemoConfig, DemoData};
use vaep_scout::model::PlayerProfile;
use vaep_scout::profile;
use vaep_scout::scoring::{self, Importance, QualitySelection};
use vaep_scout::warehouse;

fn league() -> DemoData {
    demo::generate(&DemoConfig {
        teams: 10,
        squad_size: 18,
        actions_per_90: 60,
        ..DemoConfig::default()
    })
}

fn bench_rate_actions(c: &mut Criterion) {
    let data = league();
    let actions = data.actions();
    let player_games = data.player_games();

    c.bench_function("rate_actions", |b| {
        b.iter(|| {
            let minutes = aggregate::player_minutes(black_box(&player_games));
            let rated = aggregate::rate_actions(black_box(&actions), &minutes);
            black_box(rated.rows.len());
        })
    });
}

fn bench_filtered_ranking(c: &mut Criterion) {
    let data = league();
    let minutes = aggregate::player_minutes(&data.player_games());
    let rated = aggregate::rate_actions(&data.actions(), &minutes).rows;
    let filter = ActionFilter {
        action_types: vec!["pass".to_string(), "dribble".to_string(), "shot".to_string()],
        zones: vec![
            catalog::zone("Opponent half").unwrap(),
            catalog::zone("Penalty box").unwrap(),
        ],
        ..ActionFilter::default()
    };

    c.bench_function("filtered_ranking", |b| {
        b.iter(|| {
            let rows = filter.apply(black_box(&rated));
            let ratings = aggregate::player_ratings(&rows);
            black_box(ratings.len());
        })
    });
}

fn bench_quality_search(c: &mut Criterion) {
    let profiles: Vec<PlayerProfile> = league().profiles();
    let sel = QualitySelection::new()
        .with("finishing_z", Importance::High)
        .and_then(|s| s.with("poaching_z", Importance::Medium))
        .and_then(|s| s.with("pressing_z", Importance::Low))
        .and_then(|s| s.with("run_quality_z", Importance::Medium))
        .and_then(|s| s.with("aerial_threat_z", Importance::Low))
        .unwrap();

    c.bench_function("quality_search", |b| {
        b.iter(|| {
            let scored =
                scoring::search_players(black_box(&profiles), PositionGroup::Forward, 0, &sel)
                    .unwrap();
            black_box(scored.len());
        })
    });
}

fn bench_team_comparison(c: &mut Criterion) {
    let profiles = league().profiles();
    let team = profiles[0].team_name.clone();
    let attributes =
        catalog::attribute_details(catalog::SUMMARY_QUALITY, PositionGroup::Midfielder);

    c.bench_function("team_comparison", |b| {
        b.iter(|| {
            let cmp = profile::team_comparison(
                black_box(&profiles),
                &team,
                PositionGroup::Midfielder,
                attributes,
            )
            .unwrap();
            black_box(cmp.points.len());
        })
    });
}

fn bench_profile_load(c: &mut Criterion) {
    let cfg = DemoConfig::default();
    let mut conn = Connection::open_in_memory().unwrap();
    demo::seed(&mut conn, &cfg).unwrap();

    c.bench_function("profile_load", |b| {
        b.iter(|| {
            let rows = warehouse::load_profiles(&conn, &cfg.league, &cfg.season).unwrap();
            black_box(rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_rate_actions,
    bench_filtered_ranking,
    bench_quality_search,
    bench_team_comparison,
    bench_profile_load
);
criterion_main!(perf);
