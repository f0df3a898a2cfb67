use std::collections::BTreeMap;

use vaep_scout::catalog::PositionGroup;
use vaep_scout::error::ScoutError;
use vaep_scout::model::PlayerProfile;
use vaep_scout::scoring::{
    Importance, MAX_QUALITIES, QualitySelection, composite_score, composite_scores, rank_min,
    search_players, top_n, zscore_column,
};

fn profile(name: &str, position: &str, minutes: u32, z: &[(&str, f64)]) -> PlayerProfile {
    PlayerProfile {
        player_name: name.to_string(),
        team_name: "Test FC".to_string(),
        position: position.to_string(),
        minutes_played: minutes,
        z_scores: z
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn score_is_weighted_sum_over_five() {
    let p = profile("A", "Forward", 900, &[("finishing_z", 1.0), ("pressing_z", -0.5)]);
    let sel = QualitySelection::new()
        .with("finishing_z", Importance::High)
        .and_then(|s| s.with("pressing_z", Importance::Low))
        .expect("two qualities fit");
    let score = composite_score(&p, &sel).expect("attributes present");
    assert!(close(score, 1.0 * 5.0 / 5.0 + -0.5 * 1.0 / 5.0), "got {score}");
}

#[test]
fn divisor_does_not_depend_on_weight_sum() {
    let p = profile("A", "Forward", 900, &[("finishing_z", 2.0)]);
    let sel = QualitySelection::new()
        .with("finishing_z", Importance::Medium)
        .expect("one quality fits");
    let score = composite_score(&p, &sel).expect("attribute present");
    assert!(close(score, 1.2), "got {score}");
}

#[test]
fn score_is_linear_in_z() {
    let sel = QualitySelection::new()
        .with("finishing_z", Importance::High)
        .and_then(|s| s.with("dribble_z", Importance::Medium))
        .expect("two qualities fit");
    let one = profile("A", "Winger", 900, &[("finishing_z", 0.7), ("dribble_z", -0.3)]);
    let two = profile("B", "Winger", 900, &[("finishing_z", 1.4), ("dribble_z", -0.6)]);
    let s1 = composite_score(&one, &sel).expect("score one");
    let s2 = composite_score(&two, &sel).expect("score two");
    assert!(close(s2, 2.0 * s1));
}

#[test]
fn selection_order_does_not_change_scores() {
    let p = profile("A", "Midfielder", 900, &[("a_z", 0.4), ("b_z", 1.1), ("c_z", -2.0)]);
    let forward = QualitySelection::new()
        .with("a_z", Importance::Low)
        .and_then(|s| s.with("b_z", Importance::High))
        .and_then(|s| s.with("c_z", Importance::Medium))
        .expect("three qualities fit");
    let backward = QualitySelection::new()
        .with("c_z", Importance::Medium)
        .and_then(|s| s.with("b_z", Importance::High))
        .and_then(|s| s.with("a_z", Importance::Low))
        .expect("three qualities fit");
    let a = composite_score(&p, &forward).expect("forward");
    let b = composite_score(&p, &backward).expect("backward");
    assert!(close(a, b));
}

#[test]
fn ranking_is_descending_and_ties_keep_input_order() {
    let sel = QualitySelection::new()
        .with("finishing_z", Importance::High)
        .expect("one quality");
    let low = profile("Low", "Forward", 900, &[("finishing_z", -1.0)]);
    let tie_first = profile("TieFirst", "Forward", 900, &[("finishing_z", 0.5)]);
    let top = profile("Top", "Forward", 900, &[("finishing_z", 2.0)]);
    let tie_second = profile("TieSecond", "Forward", 900, &[("finishing_z", 0.5)]);
    let pool = vec![&low, &tie_first, &top, &tie_second];

    let scored = composite_scores(&pool, &sel).expect("scores");
    let names: Vec<&str> = scored.iter().map(|s| s.player_name.as_str()).collect();
    assert_eq!(names, vec!["Top", "TieFirst", "TieSecond", "Low"]);
    let ranks: Vec<usize> = scored.iter().map(|s| s.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
}

#[test]
fn nan_scores_sort_last() {
    let sel = QualitySelection::new()
        .with("finishing_z", Importance::High)
        .expect("one quality");
    let nan = profile("Nan", "Forward", 900, &[("finishing_z", f64::NAN)]);
    let neg = profile("Neg", "Forward", 900, &[("finishing_z", -3.0)]);
    let scored = composite_scores(&[&nan, &neg], &sel).expect("scores");
    assert_eq!(scored[0].player_name, "Neg");
    assert_eq!(scored[1].player_name, "Nan");
}

#[test]
fn only_weights_one_three_five_are_valid() {
    assert_eq!(Importance::from_weight(1), Ok(Importance::Low));
    assert_eq!(Importance::from_weight(3), Ok(Importance::Medium));
    assert_eq!(Importance::from_weight(5), Ok(Importance::High));
    assert_eq!(Importance::from_weight(2), Err(ScoutError::InvalidWeight(2)));
    assert_eq!(Importance::from_weight(0), Err(ScoutError::InvalidWeight(0)));
    assert_eq!(Importance::default().weight(), 3);
}

#[test]
fn at_most_five_qualities() {
    let mut sel = QualitySelection::new();
    for key in ["a_z", "b_z", "c_z", "d_z", "e_z"] {
        sel.insert(key, Importance::Medium).expect("within limit");
    }
    assert_eq!(sel.len(), MAX_QUALITIES);

    // changing an existing entry is not a new selection
    sel.insert("c_z", Importance::High).expect("update in place");
    assert_eq!(sel.len(), MAX_QUALITIES);

    let err = sel.insert("f_z", Importance::Low).expect_err("sixth quality");
    assert_eq!(err, ScoutError::TooManyQualities { max: 5, got: 6 });
}

#[test]
fn missing_attribute_is_reported() {
    let p = profile("A", "Forward", 900, &[("finishing_z", 1.0)]);
    let sel = QualitySelection::new()
        .with("poaching_z", Importance::Low)
        .expect("one quality");
    let err = composite_score(&p, &sel).expect_err("poaching missing");
    assert_eq!(
        err,
        ScoutError::MissingAttribute {
            player: "A".to_string(),
            attribute: "poaching_z".to_string(),
        }
    );
    assert_eq!(err.to_string(), "Attribute poaching_z not found for player A");
}

#[test]
fn search_filters_position_and_minutes() {
    let profiles = vec![
        profile("Striker", "Forward", 1200, &[("finishing_z", 1.0)]),
        profile("Bench", "Forward", 200, &[("finishing_z", 3.0)]),
        profile("Stopper", "Defender", 2000, &[("finishing_z", 2.0)]),
        profile("Old label", "Angreifer", 900, &[("finishing_z", 0.5)]),
    ];
    let sel = QualitySelection::new()
        .with("finishing_z", Importance::High)
        .expect("one quality");
    let scored = search_players(&profiles, PositionGroup::Forward, 450, &sel).expect("search");
    let names: Vec<&str> = scored.iter().map(|s| s.player_name.as_str()).collect();
    assert_eq!(names, vec!["Striker", "Old label"]);
    assert_eq!(top_n(&scored, 1).len(), 1);
    assert_eq!(top_n(&scored, 10).len(), 2);
}

#[test]
fn rank_min_shares_lowest_rank_on_ties() {
    let ranks = rank_min(&[3.0, 1.0, 3.0, f64::NAN, 2.0]);
    assert_eq!(ranks, vec![Some(1), Some(4), Some(1), None, Some(3)]);
}

#[test]
fn zscore_column_uses_population_std() {
    let z = zscore_column(&[1.0, 2.0, 3.0, f64::NAN]);
    let expected = 1.0 / (2.0f64 / 3.0).sqrt();
    assert!(close(z[0], -expected));
    assert!(close(z[1], 0.0));
    assert!(close(z[2], expected));
    assert!(z[3].is_nan());

    let flat = zscore_column(&[4.0, 4.0, 4.0]);
    assert_eq!(flat, vec![0.0, 0.0, 0.0]);
}
