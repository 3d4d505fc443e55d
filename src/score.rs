use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::stats::{StatKey, StatRecord};

const THREAT_STATS: [StatKey; 5] = [
    StatKey::ShotsOnGoal,
    StatKey::ShotsInsideBox,
    StatKey::ShotsOutsideBox,
    StatKey::CornerKicks,
    StatKey::Offsides,
];
const CONTROL_STATS: [StatKey; 3] = [
    StatKey::Possession,
    StatKey::PassAccuracy,
    StatKey::TotalPasses,
];
const FRICTION_STATS: [StatKey; 3] = [StatKey::Fouls, StatKey::YellowCards, StatKey::RedCards];

/// Per-statistic multipliers for the Performance Score. Penalties carry their
/// sign (offsides and every friction weight are negative).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub shots_on_goal: f64,
    pub shots_inside_box: f64,
    pub shots_outside_box: f64,
    pub corner_kicks: f64,
    pub offsides: f64,
    pub possession: f64,
    pub pass_accuracy: f64,
    pub total_passes: f64,
    pub fouls: f64,
    pub yellow_cards: f64,
    pub red_cards: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            shots_on_goal: 3.0,
            shots_inside_box: 2.0,
            shots_outside_box: 0.5,
            corner_kicks: 1.0,
            offsides: -0.3,
            possession: 0.4,
            pass_accuracy: 0.5,
            total_passes: 0.02,
            fouls: -0.5,
            yellow_cards: -3.0,
            red_cards: -10.0,
        }
    }
}

impl Weights {
    pub const KEYS: [StatKey; 11] = [
        StatKey::ShotsOnGoal,
        StatKey::ShotsInsideBox,
        StatKey::ShotsOutsideBox,
        StatKey::CornerKicks,
        StatKey::Offsides,
        StatKey::Possession,
        StatKey::PassAccuracy,
        StatKey::TotalPasses,
        StatKey::Fouls,
        StatKey::YellowCards,
        StatKey::RedCards,
    ];

    /// Defaults with `overrides` merged on top by name. Keys that are not
    /// weighted stats, and non-finite values, are skipped with a warning.
    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Self {
        let mut weights = Self::default();
        let mut names: Vec<&String> = overrides.keys().collect();
        names.sort();
        for name in names {
            let value = overrides[name];
            if !value.is_finite() {
                warn!("ignoring non-finite weight for {name}");
                continue;
            }
            let applied = StatKey::from_name(name)
                .and_then(|key| weights.slot_mut(key))
                .map(|slot| *slot = value)
                .is_some();
            if !applied {
                warn!("ignoring unknown weight key {name}");
            }
        }
        weights
    }

    /// Weight for `key`; stats outside the formula weigh zero.
    pub fn get(&self, key: StatKey) -> f64 {
        match key {
            StatKey::ShotsOnGoal => self.shots_on_goal,
            StatKey::ShotsInsideBox => self.shots_inside_box,
            StatKey::ShotsOutsideBox => self.shots_outside_box,
            StatKey::CornerKicks => self.corner_kicks,
            StatKey::Offsides => self.offsides,
            StatKey::Possession => self.possession,
            StatKey::PassAccuracy => self.pass_accuracy,
            StatKey::TotalPasses => self.total_passes,
            StatKey::Fouls => self.fouls,
            StatKey::YellowCards => self.yellow_cards,
            StatKey::RedCards => self.red_cards,
            _ => 0.0,
        }
    }

    fn slot_mut(&mut self, key: StatKey) -> Option<&mut f64> {
        match key {
            StatKey::ShotsOnGoal => Some(&mut self.shots_on_goal),
            StatKey::ShotsInsideBox => Some(&mut self.shots_inside_box),
            StatKey::ShotsOutsideBox => Some(&mut self.shots_outside_box),
            StatKey::CornerKicks => Some(&mut self.corner_kicks),
            StatKey::Offsides => Some(&mut self.offsides),
            StatKey::Possession => Some(&mut self.possession),
            StatKey::PassAccuracy => Some(&mut self.pass_accuracy),
            StatKey::TotalPasses => Some(&mut self.total_passes),
            StatKey::Fouls => Some(&mut self.fouls),
            StatKey::YellowCards => Some(&mut self.yellow_cards),
            StatKey::RedCards => Some(&mut self.red_cards),
            _ => None,
        }
    }
}

/// Full-precision Performance Score for one team.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub threat: f64,
    pub control: f64,
    pub friction: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn new(threat: f64, control: f64, friction: f64) -> Self {
        Self {
            threat,
            control,
            friction,
            total: threat + control + friction,
        }
    }

    pub fn display(&self) -> DisplayBreakdown {
        DisplayBreakdown {
            threat: round2(self.threat),
            control: round2(self.control),
            friction: round2(self.friction),
            total: round2(self.total),
        }
    }
}

/// Two-decimal form used in reports and the processed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayBreakdown {
    pub threat: f64,
    pub control: f64,
    pub friction: f64,
    pub total: f64,
}

impl From<DisplayBreakdown> for ScoreBreakdown {
    // The rounded total is kept as-is; it can differ from the sum of the
    // rounded parts by a cent.
    fn from(value: DisplayBreakdown) -> Self {
        Self {
            threat: value.threat,
            control: value.control,
            friction: value.friction,
            total: value.total,
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    weights: Weights,
}

impl ScoreEngine {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Self {
        Self::new(Weights::with_overrides(overrides))
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn score(&self, record: &StatRecord) -> ScoreBreakdown {
        ScoreBreakdown::new(
            self.weighted_sum(record, &THREAT_STATS),
            self.weighted_sum(record, &CONTROL_STATS),
            self.weighted_sum(record, &FRICTION_STATS),
        )
    }

    fn weighted_sum(&self, record: &StatRecord, keys: &[StatKey]) -> f64 {
        keys.iter()
            .map(|key| record.get(*key) * self.weights.get(*key))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> StatRecord {
        StatRecord::from_pairs([
            ("shots_on_goal", 6.0),
            ("shots_inside_box", 9.0),
            ("shots_outside_box", 5.0),
            ("corner_kicks", 7.0),
            ("offsides", 2.0),
            ("possession", 58.0),
            ("pass_accuracy", 84.0),
            ("total_passes", 512.0),
            ("fouls", 14.0),
            ("yellow_cards", 3.0),
            ("red_cards", 1.0),
        ])
    }

    #[test]
    fn default_formula_matches_hand_computation() {
        let score = ScoreEngine::default().score(&sample_record());
        // 18 + 18 + 2.5 + 7 - 0.6
        assert!((score.threat - 44.9).abs() < 1e-9);
        // 23.2 + 42 + 10.24
        assert!((score.control - 75.44).abs() < 1e-9);
        // -7 - 9 - 10
        assert!((score.friction + 26.0).abs() < 1e-9);
        assert!((score.total - 94.34).abs() < 1e-9);
    }

    #[test]
    fn total_is_sum_of_components() {
        let score = ScoreEngine::default().score(&sample_record());
        let sum = score.threat + score.control + score.friction;
        assert!((score.total - sum).abs() < 1e-9);
    }

    #[test]
    fn empty_record_scores_zero() {
        let score = ScoreEngine::default().score(&StatRecord::new());
        assert_eq!(score, ScoreBreakdown::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward = StatRecord::from_pairs([
            ("fouls", 10.0),
            ("shots_on_goal", 4.0),
            ("possession", 51.0),
        ]);
        let backward = StatRecord::from_pairs([
            ("possession", 51.0),
            ("shots_on_goal", 4.0),
            ("fouls", 10.0),
        ]);
        let engine = ScoreEngine::default();
        assert_eq!(engine.score(&forward), engine.score(&backward));
    }

    #[test]
    fn single_override_only_moves_its_component() {
        let base = ScoreEngine::default().score(&sample_record());
        let overrides = HashMap::from([("corner_kicks".to_string(), 2.0)]);
        let tuned = ScoreEngine::with_overrides(&overrides).score(&sample_record());
        assert!((tuned.threat - (base.threat + 7.0)).abs() < 1e-9);
        assert_eq!(tuned.control, base.control);
        assert_eq!(tuned.friction, base.friction);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let overrides = HashMap::from([
            ("red_cards".to_string(), -20.0),
            ("not_a_stat".to_string(), 99.0),
        ]);
        let weights = Weights::with_overrides(&overrides);
        assert_eq!(weights.red_cards, -20.0);
        assert_eq!(weights.yellow_cards, -3.0);
        assert_eq!(weights.shots_on_goal, 3.0);
    }

    #[test]
    fn engines_do_not_share_weights() {
        let heavy =
            ScoreEngine::with_overrides(&HashMap::from([("shots_on_goal".to_string(), 10.0)]));
        let plain = ScoreEngine::default();
        assert_eq!(heavy.weights().shots_on_goal, 10.0);
        assert_eq!(plain.weights().shots_on_goal, 3.0);
    }

    #[test]
    fn display_round_trip_keeps_total_to_cents() {
        let score = ScoreBreakdown::new(41.236, 70.118, -12.5);
        let back = ScoreBreakdown::from(score.display());
        assert!((back.total - score.total).abs() <= 0.005 + 1e-9);
        assert_eq!(back.total, round2(score.total));
    }
}
