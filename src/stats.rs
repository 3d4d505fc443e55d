use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical statistic names the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKey {
    ShotsOnGoal,
    ShotsOffGoal,
    TotalShots,
    BlockedShots,
    ShotsInsideBox,
    ShotsOutsideBox,
    Fouls,
    CornerKicks,
    Offsides,
    Possession,
    YellowCards,
    RedCards,
    GoalkeeperSaves,
    TotalPasses,
    PassesAccurate,
    PassAccuracy,
}

// API-FOOTBALL labels, matched exactly (the provider is not consistent about casing).
const PROVIDER_LABELS: [(&str, StatKey); 16] = [
    ("Shots on Goal", StatKey::ShotsOnGoal),
    ("Shots off Goal", StatKey::ShotsOffGoal),
    ("Total Shots", StatKey::TotalShots),
    ("Blocked Shots", StatKey::BlockedShots),
    ("Shots insidebox", StatKey::ShotsInsideBox),
    ("Shots outsidebox", StatKey::ShotsOutsideBox),
    ("Fouls", StatKey::Fouls),
    ("Corner Kicks", StatKey::CornerKicks),
    ("Offsides", StatKey::Offsides),
    ("Ball Possession", StatKey::Possession),
    ("Yellow Cards", StatKey::YellowCards),
    ("Red Cards", StatKey::RedCards),
    ("Goalkeeper Saves", StatKey::GoalkeeperSaves),
    ("Total passes", StatKey::TotalPasses),
    ("Passes accurate", StatKey::PassesAccurate),
    ("Passes %", StatKey::PassAccuracy),
];

impl StatKey {
    pub const ALL: [StatKey; 16] = [
        StatKey::ShotsOnGoal,
        StatKey::ShotsOffGoal,
        StatKey::TotalShots,
        StatKey::BlockedShots,
        StatKey::ShotsInsideBox,
        StatKey::ShotsOutsideBox,
        StatKey::Fouls,
        StatKey::CornerKicks,
        StatKey::Offsides,
        StatKey::Possession,
        StatKey::YellowCards,
        StatKey::RedCards,
        StatKey::GoalkeeperSaves,
        StatKey::TotalPasses,
        StatKey::PassesAccurate,
        StatKey::PassAccuracy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatKey::ShotsOnGoal => "shots_on_goal",
            StatKey::ShotsOffGoal => "shots_off_goal",
            StatKey::TotalShots => "total_shots",
            StatKey::BlockedShots => "blocked_shots",
            StatKey::ShotsInsideBox => "shots_inside_box",
            StatKey::ShotsOutsideBox => "shots_outside_box",
            StatKey::Fouls => "fouls",
            StatKey::CornerKicks => "corner_kicks",
            StatKey::Offsides => "offsides",
            StatKey::Possession => "possession",
            StatKey::YellowCards => "yellow_cards",
            StatKey::RedCards => "red_cards",
            StatKey::GoalkeeperSaves => "goalkeeper_saves",
            StatKey::TotalPasses => "total_passes",
            StatKey::PassesAccurate => "passes_accurate",
            StatKey::PassAccuracy => "pass_accuracy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    pub fn from_provider_label(label: &str) -> Option<Self> {
        PROVIDER_LABELS
            .iter()
            .find(|(provider, _)| *provider == label)
            .map(|(_, key)| *key)
    }
}

/// Maps a provider label to the name it is stored under.
///
/// Known labels go through the fixed table; anything else is lower-cased with
/// spaces turned into underscores so new provider stats still show up.
pub fn canonical_stat_name(label: &str) -> String {
    match StatKey::from_provider_label(label) {
        Some(key) => key.as_str().to_string(),
        None => label.to_lowercase().replace(' ', "_"),
    }
}

/// Coerces a raw provider value to a finite, non-negative float.
pub fn clean_stat_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Null => 0.0,
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => parse_stat_str(s),
        Value::Array(_) | Value::Object(_) => 0.0,
    };
    sanitize(parsed)
}

fn parse_stat_str(raw: &str) -> f64 {
    let cleaned = raw.replace('%', "");
    cleaned.trim().parse::<f64>().unwrap_or(0.0)
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Cleaned statistics for one team in one match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

impl StatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut record = Self::new();
        for (name, value) in pairs {
            record.insert(name, value);
        }
        record
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), sanitize(value));
    }

    pub fn get(&self, key: StatKey) -> f64 {
        self.value(key.as_str())
    }

    pub fn value(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// True when no usable signal was recorded (no stats, or all zero).
    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| *v == 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamPair<T> {
    pub home: T,
    pub away: T,
}

pub type TeamStats = TeamPair<StatRecord>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStat {
    #[serde(rename = "type", default)]
    pub label: String,
    #[serde(default)]
    pub value: Value,
}

/// One team's entry in the provider's `/fixtures/statistics` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamStatBlock {
    #[serde(default)]
    pub team: TeamRef,
    #[serde(default)]
    pub statistics: Vec<RawStat>,
}

pub fn parse_stat_blocks(value: &Value) -> Vec<TeamStatBlock> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<TeamStatBlock>(item.clone()) {
            Ok(block) => Some(block),
            Err(err) => {
                warn!("skipping malformed statistics block: {err}");
                None
            }
        })
        .collect()
}

/// Turns the provider's per-team blocks (home first) into cleaned records.
///
/// With fewer than two blocks both records come back empty; callers should
/// read that as "no data" rather than a scoreless, possession-free match.
pub fn normalize_statistics(blocks: &[TeamStatBlock]) -> TeamStats {
    if blocks.len() < 2 {
        warn!(
            "incomplete statistics: expected 2 team blocks, got {}",
            blocks.len()
        );
        return TeamStats::default();
    }
    if blocks.len() > 2 {
        warn!(
            "statistics payload has {} team blocks, using the first two",
            blocks.len()
        );
    }

    TeamPair {
        home: record_from_block(&blocks[0]),
        away: record_from_block(&blocks[1]),
    }
}

fn record_from_block(block: &TeamStatBlock) -> StatRecord {
    let mut record = StatRecord {
        team_name: block.team.name.clone(),
        values: BTreeMap::new(),
    };
    for stat in &block.statistics {
        record.insert(canonical_stat_name(&stat.label), clean_stat_value(&stat.value));
    }
    record
}
