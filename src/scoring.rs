use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::catalog::PositionGroup;
use crate::error::ScoutError;
use crate::model::{PlayerProfile, ScoredPlayer};

/// Most qualities a search may combine.
pub const MAX_QUALITIES: usize = 5;

/// Composite scores are divided by this constant, not by the sum of weights.
pub const SCORE_DIVISOR: f64 = 5.0;

const STD_EPSILON: f64 = 1e-9;

/// How much a selected quality counts towards the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Importance {
    Low,
    #[default]
    Medium,
    High,
}

impl Importance {
    pub fn weight(self) -> u8 {
        match self {
            Importance::Low => 1,
            Importance::Medium => 3,
            Importance::High => 5,
        }
    }

    pub fn from_weight(weight: u8) -> Result<Self, ScoutError> {
        match weight {
            1 => Ok(Importance::Low),
            3 => Ok(Importance::Medium),
            5 => Ok(Importance::High),
            other => Err(ScoutError::InvalidWeight(other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
        }
    }
}

/// Selected attributes and their importance, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySelection {
    entries: Vec<(String, Importance)>,
}

impl QualitySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, or change the importance of one already selected.
    pub fn insert(&mut self, attribute: &str, importance: Importance) -> Result<(), ScoutError> {
        if let Some(entry) = self.entries.iter_mut().find(|(a, _)| a == attribute) {
            entry.1 = importance;
            return Ok(());
        }
        if self.entries.len() >= MAX_QUALITIES {
            return Err(ScoutError::TooManyQualities {
                max: MAX_QUALITIES,
                got: self.entries.len() + 1,
            });
        }
        self.entries.push((attribute.to_string(), importance));
        Ok(())
    }

    pub fn with(mut self, attribute: &str, importance: Importance) -> Result<Self, ScoutError> {
        self.insert(attribute, importance)?;
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Importance)> {
        self.entries.iter().map(|(a, i)| (a.as_str(), *i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `Σ z[attr] * weight[attr] / 5` for one player.
pub fn composite_score(
    profile: &PlayerProfile,
    selection: &QualitySelection,
) -> Result<f64, ScoutError> {
    let mut sum = 0.0;
    for (attribute, importance) in selection.iter() {
        let z = profile
            .z(attribute)
            .ok_or_else(|| ScoutError::MissingAttribute {
                player: profile.player_name.clone(),
                attribute: attribute.to_string(),
            })?;
        sum += z * f64::from(importance.weight()) / SCORE_DIVISOR;
    }
    Ok(sum)
}

/// Score every profile and rank descending. Equal scores keep input order;
/// NaN scores sort last.
pub fn composite_scores(
    profiles: &[&PlayerProfile],
    selection: &QualitySelection,
) -> Result<Vec<ScoredPlayer>, ScoutError> {
    let mut scored = Vec::with_capacity(profiles.len());
    for p in profiles {
        scored.push(ScoredPlayer {
            rank: 0,
            player_name: p.player_name.clone(),
            team_name: p.team_name.clone(),
            position: p.position.clone(),
            minutes_played: p.minutes_played,
            score: composite_score(p, selection)?,
        });
    }
    scored.sort_by(|a, b| cmp_desc_nan_last(a.score, b.score));
    for (idx, row) in scored.iter_mut().enumerate() {
        row.rank = idx + 1;
    }
    Ok(scored)
}

/// Players of one position group with at least `min_minutes`, ranked by
/// composite score.
pub fn search_players(
    profiles: &[PlayerProfile],
    position: PositionGroup,
    min_minutes: u32,
    selection: &QualitySelection,
) -> Result<Vec<ScoredPlayer>, ScoutError> {
    let pool: Vec<&PlayerProfile> = profiles
        .iter()
        .filter(|p| PositionGroup::from_label(&p.position) == Some(position))
        .filter(|p| p.minutes_played >= min_minutes)
        .collect();
    composite_scores(&pool, selection)
}

/// The first `n` rows of an already ranked list.
pub fn top_n(scored: &[ScoredPlayer], n: usize) -> &[ScoredPlayer] {
    &scored[..n.min(scored.len())]
}

fn cmp_desc_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Descending competition ranking: 1 + the number of strictly greater values,
/// so ties share the lowest rank. NaN gets no rank.
pub fn rank_min(values: &[f64]) -> Vec<Option<u32>> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| cmp_desc_nan_last(*a, *b));
    values
        .iter()
        .map(|v| {
            if v.is_nan() {
                return None;
            }
            let greater = sorted.partition_point(|x| x > v);
            Some(greater as u32 + 1)
        })
        .collect()
}

/// Population z-scores. NaN inputs stay NaN; a column without spread maps to 0.
pub fn zscore_column(values: &[f64]) -> Vec<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return values.iter().map(|_| f64::NAN).collect();
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                f64::NAN
            } else if std <= STD_EPSILON {
                0.0
            } else {
                (v - mean) / std
            }
        })
        .collect()
}
