use rayon::prelude::*;
use serde::Serialize;

use crate::catalog::{self, PositionGroup};
use crate::error::ScoutError;
use crate::model::{PlayerProfile, ScoredPlayer};
use crate::scoring::rank_min;

/// Value axis of the comparison plots.
pub const VALUE_DOMAIN: (f64, f64) = (-3.0, 4.0);

/// Verbal band for a z-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Outstanding,
    Excellent,
    Good,
    Average,
    BelowAverage,
    Poor,
}

impl Level {
    /// NaN compares false everywhere and lands in `Poor`.
    pub fn from_z(z: f64) -> Self {
        if z >= 1.5 {
            Level::Outstanding
        } else if z >= 1.0 {
            Level::Excellent
        } else if z >= 0.5 {
            Level::Good
        } else if z >= -0.5 {
            Level::Average
        } else if z >= -1.0 {
            Level::BelowAverage
        } else {
            Level::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Outstanding => "outstanding",
            Level::Excellent => "excellent",
            Level::Good => "good",
            Level::Average => "average",
            Level::BelowAverage => "below average",
            Level::Poor => "poor",
        }
    }

    pub fn label_de(self) -> &'static str {
        match self {
            Level::Outstanding => "überragend",
            Level::Excellent => "ausgezeichnet",
            Level::Good => "gut",
            Level::Average => "durchschnittlich",
            Level::BelowAverage => "unterdurchschnittlich",
            Level::Poor => "schlecht",
        }
    }
}

/// Tick positions of the value axis and the band they are labelled with.
pub const VALUE_TICKS: [(f64, Level); 6] = [
    (-1.5, Level::Poor),
    (-0.75, Level::BelowAverage),
    (0.0, Level::Average),
    (0.75, Level::Good),
    (1.25, Level::Excellent),
    (1.75, Level::Outstanding),
];

/// One player's value for one attribute within the position pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributePoint {
    pub attribute: String,
    pub label: &'static str,
    pub player_name: String,
    pub team_name: String,
    pub value: f64,
    pub rank: Option<u32>,
    pub total: usize,
}

impl AttributePoint {
    /// `"3/41"`, or `"-/41"` when the value is missing.
    pub fn rank_display(&self) -> String {
        match self.rank {
            Some(r) => format!("{r}/{}", self.total),
            None => format!("-/{}", self.total),
        }
    }

    pub fn level(&self) -> Level {
        Level::from_z(self.value)
    }
}

/// Scatter data for a set of attributes: every player of the position group,
/// plus the highlighted subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub position: PositionGroup,
    pub attributes: Vec<String>,
    pub points: Vec<AttributePoint>,
    pub highlighted: Vec<AttributePoint>,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn highlighted_for<'a>(
        &'a self,
        player_name: &'a str,
    ) -> impl Iterator<Item = &'a AttributePoint> {
        self.highlighted
            .iter()
            .filter(move |p| p.player_name == player_name)
    }
}

fn position_pool(profiles: &[PlayerProfile], position: PositionGroup) -> Vec<&PlayerProfile> {
    profiles
        .iter()
        .filter(|p| PositionGroup::from_label(&p.position) == Some(position))
        .collect()
}

fn attribute_points(
    pool: &[&PlayerProfile],
    attributes: &[&str],
) -> Result<Vec<Vec<AttributePoint>>, ScoutError> {
    let labels: Vec<&'static str> = attributes
        .iter()
        .map(|a| {
            catalog::stat_label(a).ok_or_else(|| ScoutError::UnknownAttribute(a.to_string()))
        })
        .collect::<Result<_, _>>()?;

    Ok(attributes
        .par_iter()
        .zip(labels.par_iter())
        .map(|(attribute, label)| {
            let values: Vec<f64> = pool
                .iter()
                .map(|p| p.z(attribute).unwrap_or(f64::NAN))
                .collect();
            let ranks = rank_min(&values);
            pool.iter()
                .zip(values)
                .zip(ranks)
                .map(|((p, value), rank)| AttributePoint {
                    attribute: attribute.to_string(),
                    label,
                    player_name: p.player_name.clone(),
                    team_name: p.team_name.clone(),
                    value,
                    rank,
                    total: pool.len(),
                })
                .collect()
        })
        .collect())
}

fn build_comparison(
    profiles: &[PlayerProfile],
    position: PositionGroup,
    attributes: &[&str],
    highlight: impl Fn(&AttributePoint) -> bool,
) -> Result<Comparison, ScoutError> {
    let pool = position_pool(profiles, position);
    let per_attribute = attribute_points(&pool, attributes)?;
    let points: Vec<AttributePoint> = per_attribute.into_iter().flatten().collect();
    let highlighted = points.iter().filter(|p| highlight(p)).cloned().collect();
    Ok(Comparison {
        position,
        attributes: attributes.iter().map(|a| a.to_string()).collect(),
        points,
        highlighted,
    })
}

/// Compare one player against the position pool. `PlayerNotFound` when the
/// player is not in that pool.
pub fn player_comparison(
    profiles: &[PlayerProfile],
    player_name: &str,
    position: PositionGroup,
    attributes: &[&str],
) -> Result<Comparison, ScoutError> {
    let present = profiles.iter().any(|p| {
        p.player_name == player_name && PositionGroup::from_label(&p.position) == Some(position)
    });
    if !present {
        return Err(ScoutError::PlayerNotFound(player_name.to_string()));
    }
    build_comparison(profiles, position, attributes, |p| {
        p.player_name == player_name
    })
}

/// Compare a team's players against the position pool. Empty when the team
/// has no player in that position.
pub fn team_comparison(
    profiles: &[PlayerProfile],
    team_name: &str,
    position: PositionGroup,
    attributes: &[&str],
) -> Result<Comparison, ScoutError> {
    let has_team = profiles.iter().any(|p| {
        p.team_name == team_name && PositionGroup::from_label(&p.position) == Some(position)
    });
    if !has_team {
        return Ok(Comparison {
            position,
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            points: Vec::new(),
            highlighted: Vec::new(),
        });
    }
    build_comparison(profiles, position, attributes, |p| p.team_name == team_name)
}

/// Players of a team in a position group, in table order.
pub fn team_players<'a>(
    profiles: &'a [PlayerProfile],
    team_name: &str,
    position: PositionGroup,
) -> Vec<&'a PlayerProfile> {
    profiles
        .iter()
        .filter(|p| p.team_name == team_name)
        .filter(|p| PositionGroup::from_label(&p.position) == Some(position))
        .collect()
}

/// Sorted distinct team names.
pub fn teams(profiles: &[PlayerProfile]) -> Vec<String> {
    let mut out: Vec<String> = profiles.iter().map(|p| p.team_name.clone()).collect();
    out.sort();
    out.dedup();
    out
}

/// Top of a ranked search with axis domains padded around the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopChart {
    pub rows: Vec<ScoredPlayer>,
    pub minutes_domain: (f64, f64),
    pub score_domain: (f64, f64),
}

pub fn top_chart(scored: &[ScoredPlayer], n: usize) -> Option<TopChart> {
    let rows: Vec<ScoredPlayer> = scored.iter().take(n).cloned().collect();
    if rows.is_empty() {
        return None;
    }
    let min_minutes = rows.iter().map(|r| r.minutes_played).min().unwrap_or(0);
    let max_minutes = rows.iter().map(|r| r.minutes_played).max().unwrap_or(0);
    let (min_score, max_score) = rows
        .iter()
        .map(|r| r.score)
        .filter(|s| s.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s), hi.max(s))
        });
    let score_domain = if min_score.is_finite() {
        (min_score - 0.25, max_score + 0.25)
    } else {
        (-0.25, 0.25)
    };
    Some(TopChart {
        minutes_domain: (
            (f64::from(min_minutes) - 150.0).max(0.0),
            f64::from(max_minutes) + 50.0,
        ),
        score_domain,
        rows,
    })
}
