use serde::{Deserialize, Serialize};

use crate::error::ScoutError;

/// Display name → warehouse key.
pub const LEAGUES: &[(&str, &str)] = &[
    ("Bundesliga", "bundesliga"),
    ("Premier League", "premier_league"),
    ("La Liga", "laliga"),
    ("Ligue 1", "ligue_1"),
    ("Serie A", "seria_a"),
    ("Champions League", "champions_league"),
    ("Europa League", "europa_league"),
    ("2. Bundesliga", "bundesliga2"),
    ("Eredivisie", "eredivisie"),
    ("Jupiler Pro League", "jupiler_pro_league"),
    ("Championship", "championship"),
    ("Liga Portugal", "liga_portugal"),
    ("Super Lig", "super_lig"),
];

pub const SEASONS: &[(&str, &str)] = &[("2023/24", "2023_2024"), ("2022/23", "2022_2023")];

pub const SUMMARY_QUALITY: &str = "summary";

/// Display name → quality key. The first entry resolves to the position summary.
pub const QUALITIES: &[(&str, &str)] = &[
    ("Summary", SUMMARY_QUALITY),
    ("Finishing", "finishing_z"),
    ("Poaching", "poaching_z"),
    ("Active defending", "active_defense_z"),
    ("Hold-up play", "hold_up_play_z"),
    ("Progression", "progression_z"),
    ("Defensive heading", "defensive_heading_z"),
    ("Dribbling", "dribble_z"),
    ("Effectiveness", "effectiveness_z"),
    ("Intelligent defending", "intelligent_defense_z"),
    ("Run quality", "run_quality_z"),
    ("Providing teammates", "providing_teammates_z"),
    ("Aerial threat", "aerial_threat_z"),
    ("Passing quality", "passing_quality_z"),
    ("Pressing", "pressing_z"),
    ("Composure", "composure_z"),
    ("Involvement", "involvement_z"),
    ("Box threat", "box_threat_z"),
];

/// A composite attribute and the z-scored sub-statistics it is built from.
#[derive(Debug, Clone, Copy)]
pub struct QualityDefinition {
    pub key: &'static str,
    pub stats: &'static [&'static str],
}

pub const QUALITY_DEFINITIONS: &[QualityDefinition] = &[
    QualityDefinition {
        key: "hold_up_play_z",
        stats: &[
            "link_up_plays_attack_z",
            "long_ball_receptions_z",
            "aerials_won_z",
            "pressure_resistance_z",
            "losses_z",
        ],
    },
    QualityDefinition {
        key: "providing_teammates_z",
        stats: &[
            "assists_z",
            "xA_z",
            "deep_completions_z",
            "count_creative_passes_z",
            "second_assists_z",
            "vaep_created_with_passes_z",
        ],
    },
    QualityDefinition {
        key: "dribble_z",
        stats: &[
            "dribbles_success_z",
            "dribbles_vaep_z",
            "xG_created_with_dribbles_z",
            "pressure_resistance_z",
        ],
    },
    QualityDefinition {
        key: "involvement_z",
        stats: &["aerials_z", "defensive_actions_z", "touches_z", "vaep_buildup_z"],
    },
    QualityDefinition {
        key: "box_threat_z",
        stats: &[
            "touches_in_box_z",
            "box_entries_z",
            "goals_z",
            "vaep_shots_z",
            "penalty_area_receptions_z",
        ],
    },
    QualityDefinition {
        key: "passing_quality_z",
        stats: &[
            "passes_vaep_z",
            "crosses_vaep_z",
            "passes_into_final_third_count_z",
            "passes_in_final_third_count_z",
            "count_creative_passes_z",
        ],
    },
    QualityDefinition {
        key: "poaching_z",
        stats: &["xG_z", "vaep_per_shot_z", "goals_z", "penalty_area_receptions_z"],
    },
    QualityDefinition {
        key: "run_quality_z",
        stats: &[
            "ball_runs_vaep_z",
            "box_entries_z",
            "deep_runs_vaep_z",
            "carries_offensive_value_z",
            "penalty_area_receptions_z",
        ],
    },
    QualityDefinition {
        key: "finishing_z",
        stats: &["goals_z", "shot_conversion_z", "goals_vaep_z"],
    },
    QualityDefinition {
        key: "active_defense_z",
        stats: &[
            "defensive_actions_defensive_value_z",
            "defensive_actions_z",
            "possessions_won_z",
        ],
    },
    QualityDefinition {
        key: "defensive_heading_z",
        stats: &[
            "aerials_won_z",
            "aerials_won_defensive_value_z",
            "defensive_aerials_won_z",
            "defensive_aerials_won_defensive_value_z",
        ],
    },
    QualityDefinition {
        key: "aerial_threat_z",
        stats: &[
            "aerials_won_z",
            "aerials_won_offensive_value_z",
            "attacking_aerials_won_z",
            "attacking_aerials_won_offensive_value_z",
            "headed_plays_z",
        ],
    },
    QualityDefinition {
        key: "composure_z",
        stats: &["high_turnovers_z", "losses_z", "pressure_resistance_z"],
    },
    QualityDefinition {
        key: "progression_z",
        stats: &[
            "ball_progression_vaep_z",
            "passes_into_final_third_vaep_z",
            "passes_in_final_third_count_z",
        ],
    },
    QualityDefinition {
        key: "pressing_z",
        stats: &[
            "defensive_intensity_z",
            "counterpressing_recoveries_z",
            "counterpressing_interceptions_z",
        ],
    },
    QualityDefinition {
        key: "effectiveness_z",
        stats: &[
            "passes_vaep_z",
            "dribbles_vaep_z",
            "high_turnovers_z",
            "ball_recoveries_z",
            "vaep_per_shot_z",
        ],
    },
    QualityDefinition {
        key: "intelligent_defense_z",
        stats: &[
            "ball_recoveries_z",
            "counterpressing_recoveries_z",
            "interceptions_z",
        ],
    },
];

/// Position groups used by the z-score tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionGroup {
    Defender,
    FullBack,
    Midfielder,
    Winger,
    Forward,
}

impl PositionGroup {
    pub const ALL: [PositionGroup; 5] = [
        PositionGroup::Defender,
        PositionGroup::FullBack,
        PositionGroup::Midfielder,
        PositionGroup::Winger,
        PositionGroup::Forward,
    ];

    /// Label stored in the `position` column of the stats tables.
    pub fn label(self) -> &'static str {
        match self {
            PositionGroup::Defender => "Defender",
            PositionGroup::FullBack => "Full-back",
            PositionGroup::Midfielder => "Midfielder",
            PositionGroup::Winger => "Winger",
            PositionGroup::Forward => "Forward",
        }
    }

    /// Accepts English labels, the German labels older tables were written with,
    /// and a few common short forms.
    pub fn from_label(raw: &str) -> Option<Self> {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "defender" | "centre-back" | "center-back" | "cb" | "abwehrspieler" => {
                Some(PositionGroup::Defender)
            }
            "full-back" | "fullback" | "full back" | "fb" | "außenverteidiger"
            | "aussenverteidiger" => Some(PositionGroup::FullBack),
            "midfielder" | "midfield" | "cm" | "mittelfeldspieler" => {
                Some(PositionGroup::Midfielder)
            }
            "winger" | "wing" | "flügelspieler" | "fluegelspieler" => Some(PositionGroup::Winger),
            "forward" | "striker" | "attacker" | "fw" | "angreifer" => {
                Some(PositionGroup::Forward)
            }
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ScoutError> {
        Self::from_label(raw).ok_or_else(|| ScoutError::UnknownPosition(raw.to_string()))
    }

    /// The qualities shown in a position's summary view.
    pub fn summary_attributes(self) -> &'static [&'static str] {
        match self {
            PositionGroup::Defender => &[
                "involvement_z",
                "progression_z",
                "composure_z",
                "aerial_threat_z",
                "defensive_heading_z",
                "active_defense_z",
                "intelligent_defense_z",
            ],
            PositionGroup::Midfielder => &[
                "involvement_z",
                "progression_z",
                "passing_quality_z",
                "providing_teammates_z",
                "box_threat_z",
                "active_defense_z",
                "intelligent_defense_z",
                "effectiveness_z",
            ],
            PositionGroup::Forward => &[
                "involvement_z",
                "pressing_z",
                "run_quality_z",
                "finishing_z",
                "poaching_z",
                "aerial_threat_z",
                "providing_teammates_z",
                "hold_up_play_z",
            ],
            PositionGroup::Winger => &[
                "involvement_z",
                "passing_quality_z",
                "providing_teammates_z",
                "dribble_z",
                "box_threat_z",
                "finishing_z",
                "run_quality_z",
                "pressing_z",
                "effectiveness_z",
            ],
            PositionGroup::FullBack => &[
                "involvement_z",
                "progression_z",
                "passing_quality_z",
                "providing_teammates_z",
                "run_quality_z",
                "active_defense_z",
                "intelligent_defense_z",
            ],
        }
    }
}

pub fn league_key(display_or_key: &str) -> Option<&'static str> {
    lookup_key(LEAGUES, display_or_key)
}

pub fn league_display(key: &str) -> Option<&'static str> {
    LEAGUES.iter().find(|(_, k)| *k == key).map(|(d, _)| *d)
}

pub fn season_key(display_or_key: &str) -> Option<&'static str> {
    lookup_key(SEASONS, display_or_key)
}

pub fn season_display(key: &str) -> Option<&'static str> {
    SEASONS.iter().find(|(_, k)| *k == key).map(|(d, _)| *d)
}

/// Resolve a quality by display name or key.
pub fn quality_key(display_or_key: &str) -> Result<&'static str, ScoutError> {
    lookup_key(QUALITIES, display_or_key)
        .ok_or_else(|| ScoutError::UnknownQuality(display_or_key.to_string()))
}

pub fn quality_display(key: &str) -> Option<&'static str> {
    QUALITIES.iter().find(|(_, k)| *k == key).map(|(d, _)| *d)
}

/// Every selectable quality key except the summary, sorted.
pub fn quality_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = QUALITY_DEFINITIONS.iter().map(|q| q.key).collect();
    keys.sort_unstable();
    keys
}

pub fn quality_definition(key: &str) -> Option<&'static QualityDefinition> {
    QUALITY_DEFINITIONS.iter().find(|q| q.key == key)
}

/// The stats plotted for a quality. The summary view (and anything unknown)
/// falls back to the position's summary attributes.
pub fn attribute_details(quality: &str, position: PositionGroup) -> &'static [&'static str] {
    match quality_definition(quality) {
        Some(def) => def.stats,
        None => position.summary_attributes(),
    }
}

fn lookup_key(table: &[(&'static str, &'static str)], raw: &str) -> Option<&'static str> {
    let needle = raw.trim();
    table
        .iter()
        .find(|(display, key)| *key == needle || display.eq_ignore_ascii_case(needle))
        .map(|(_, key)| *key)
}

/// Human label for a z-score column.
pub fn stat_label(key: &str) -> Option<&'static str> {
    let label = match key {
        "aerials_won_z" => "Aerial duels won",
        "aerials_z" => "Aerial duels",
        "defensive_actions_z" => "Defensive actions",
        "touches_z" => "Touches",
        "ball_progression_vaep_z" => "Ball progression VAEP",
        "ball_progression_count_z" => "Ball progressions",
        "passes_into_final_third_vaep_z" => "Passes into final third VAEP",
        "vaep_buildup_z" => "Build-up VAEP",
        "passes_vaep_z" => "Passes VAEP",
        "crosses_vaep_z" => "Crosses VAEP",
        "passes_into_final_third_count_z" => "Passes into final third",
        "passes_in_final_third_count_z" => "Passes in final third",
        "count_creative_passes_z" => "Creative passes",
        "assists_z" => "Assists",
        "second_assists_z" => "Second assists",
        "vaep_created_with_passes_z" => "VAEP created with passes",
        "deep_completions_z" => "Deep completions",
        "xA_z" => "Assists VAEP",
        "dribbles_success_z" => "Successful dribbles",
        "dribbles_vaep_z" => "Dribbles VAEP",
        "xG_created_with_dribbles_z" => "xG created with dribbles",
        "pressure_resistance_z" => "Pressure resistance",
        "touches_in_box_z" => "Touches in box",
        "box_entries_z" => "Box entries",
        "goals_z" => "Goals",
        "vaep_shots_z" => "Shots VAEP",
        "penalty_area_receptions_z" => "Receptions in box",
        "shot_conversion_z" => "Shot conversion",
        "goals_vaep_z" => "Goals VAEP",
        "ball_recoveries_z" => "Ball recoveries",
        "counterpressing_recoveries_z" => "Counterpressing recoveries",
        "interceptions_z" => "Interceptions",
        "defensive_intensity_z" => "Defensive intensity",
        "counterpressing_interceptions_z" => "Counterpressing interceptions",
        "high_turnovers_z" => "High turnovers",
        "vaep_per_shot_z" => "VAEP per shot",
        "losses_z" => "Losses",
        "aerials_won_offensive_value_z" => "Off. value of aerials won",
        "attacking_aerials_won_offensive_value_z" => "Off. VAEP of attacking aerials",
        "attacking_aerials_won_z" => "Attacking aerials won",
        "headed_plays_z" => "Headed plays",
        "defensive_aerials_won_z" => "Defensive aerials won",
        "defensive_aerials_won_defensive_value_z" => "Def. value of defensive aerials",
        "aerials_won_defensive_value_z" => "Def. value of aerials won",
        "tackles_success_z" => "Successful tackles",
        "defensive_actions_defensive_value_z" => "Def. value of defensive actions",
        "possessions_won_z" => "Possessions won",
        "ball_runs_vaep_z" => "Ball runs VAEP",
        "deep_runs_vaep_z" => "Deep runs VAEP",
        "carries_offensive_value_z" => "Off. value of carries",
        "xG_z" => "Expected goals",
        "link_up_plays_attack_z" => "Link-up plays",
        "long_ball_receptions_z" => "Long ball receptions",
        "involvement_z" => "Involvement",
        "progression_z" => "Progression",
        "composure_z" => "Composure",
        "aerial_threat_z" => "Aerial threat",
        "defensive_heading_z" => "Defensive heading",
        "active_defense_z" => "Active defending",
        "intelligent_defense_z" => "Intelligent defending",
        "passing_quality_z" => "Passing quality",
        "providing_teammates_z" => "Providing teammates",
        "box_threat_z" => "Box threat",
        "effectiveness_z" => "Effectiveness",
        "pressing_z" => "Pressing",
        "run_quality_z" => "Run quality",
        "finishing_z" => "Finishing",
        "poaching_z" => "Poaching",
        "dribble_z" => "Dribbling",
        "hold_up_play_z" => "Hold-up play",
        _ => return None,
    };
    Some(label)
}

// SPADL dimension tables.

pub const ACTION_TYPES: &[(u16, &str)] = &[
    (0, "pass"),
    (1, "cross"),
    (2, "throw_in"),
    (3, "freekick_crossed"),
    (4, "freekick_short"),
    (5, "corner_crossed"),
    (6, "corner_short"),
    (7, "take_on"),
    (8, "foul"),
    (9, "tackle"),
    (10, "interception"),
    (11, "shot"),
    (12, "shot_penalty"),
    (13, "shot_freekick"),
    (14, "keeper_save"),
    (15, "keeper_claim"),
    (16, "keeper_punch"),
    (17, "keeper_pick_up"),
    (18, "clearance"),
    (19, "bad_touch"),
    (20, "non_action"),
    (21, "dribble"),
    (22, "goalkick"),
];

pub const BODY_PARTS: &[(u16, &str)] = &[
    (0, "foot"),
    (1, "head"),
    (2, "other"),
    (3, "head/other"),
    (4, "foot_left"),
    (5, "foot_right"),
];

pub const RESULTS: &[(u16, &str)] = &[
    (0, "fail"),
    (1, "success"),
    (2, "offside"),
    (3, "owngoal"),
    (4, "yellow_card"),
    (5, "red_card"),
];

pub const RESULT_SUCCESS: &str = "success";
pub const RESULT_FAIL: &str = "fail";

pub fn action_type_name(id: u16) -> Option<&'static str> {
    dimension_name(ACTION_TYPES, id)
}

pub fn body_part_name(id: u16) -> Option<&'static str> {
    dimension_name(BODY_PARTS, id)
}

pub fn result_name(id: u16) -> Option<&'static str> {
    dimension_name(RESULTS, id)
}

fn dimension_name(table: &[(u16, &'static str)], id: u16) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == id).map(|(_, name)| *name)
}

/// Rectangular pitch region on a 105 x 68 pitch. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Zone {
    pub name: &'static str,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Zone {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

pub const ZONES: &[Zone] = &[
    Zone {
        name: "Penalty box",
        min_x: 88.5,
        max_x: 105.0,
        min_y: 13.84,
        max_y: 54.16,
    },
    Zone {
        name: "Midfield",
        min_x: 35.0,
        max_x: 70.0,
        min_y: 0.0,
        max_y: 68.0,
    },
    Zone {
        name: "Right wing",
        min_x: 0.0,
        max_x: 105.0,
        min_y: 0.0,
        max_y: 22.7,
    },
    Zone {
        name: "Left wing",
        min_x: 0.0,
        max_x: 105.0,
        min_y: 45.3,
        max_y: 68.0,
    },
    Zone {
        name: "Centre",
        min_x: 0.0,
        max_x: 105.0,
        min_y: 22.7,
        max_y: 45.3,
    },
    Zone {
        name: "Opponent half",
        min_x: 52.5,
        max_x: 105.0,
        min_y: 0.0,
        max_y: 68.0,
    },
    Zone {
        name: "Own half",
        min_x: 0.0,
        max_x: 52.5,
        min_y: 0.0,
        max_y: 68.0,
    },
];

pub fn zone(name: &str) -> Option<Zone> {
    ZONES
        .iter()
        .find(|z| z.name.eq_ignore_ascii_case(name.trim()))
        .copied()
}
