use serde::{Deserialize, Serialize};

use crate::score::{ScoreBreakdown, round2};

// Strict inequalities: a margin of exactly 5 is only "slight" and exactly 2
// is a technical draw. Verdict text is user-facing, keep these stable.
pub const CLEAR_MARGIN: f64 = 5.0;
pub const SLIGHT_MARGIN: f64 = 2.0;

pub const TIED_LABEL: &str = "Technical draw";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetterPerformer {
    Home,
    Away,
    Tied,
}

impl BetterPerformer {
    pub fn side(self) -> Option<Side> {
        match self {
            BetterPerformer::Home => Some(Side::Home),
            BetterPerformer::Away => Some(Side::Away),
            BetterPerformer::Tied => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dominance {
    None,
    Slight,
    Clear,
}

impl Dominance {
    pub fn label(self) -> &'static str {
        match self {
            Dominance::None => "",
            Dominance::Slight => "slight",
            Dominance::Clear => "clear",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchComparison {
    pub home_total: f64,
    pub away_total: f64,
    /// Absolute gap between the totals.
    pub difference: f64,
    pub better: BetterPerformer,
    pub dominance: Dominance,
}

impl MatchComparison {
    pub fn better_team<'a>(&self, home: &'a str, away: &'a str) -> &'a str {
        match self.better {
            BetterPerformer::Home => home,
            BetterPerformer::Away => away,
            BetterPerformer::Tied => TIED_LABEL,
        }
    }

    pub fn summary(&self, home: &str, away: &str) -> ComparisonSummary {
        ComparisonSummary {
            home_score: round2(self.home_total),
            away_score: round2(self.away_total),
            difference: round2(self.difference),
            better_team: self.better_team(home, away).to_string(),
            dominance: self.dominance.label().to_string(),
        }
    }
}

/// Rounded, name-resolved view of a comparison for reports and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub home_score: f64,
    pub away_score: f64,
    pub difference: f64,
    pub better_team: String,
    pub dominance: String,
}

pub fn compare(home: &ScoreBreakdown, away: &ScoreBreakdown) -> MatchComparison {
    let diff = home.total - away.total;
    let (better, dominance) = if diff > CLEAR_MARGIN {
        (BetterPerformer::Home, Dominance::Clear)
    } else if diff > SLIGHT_MARGIN {
        (BetterPerformer::Home, Dominance::Slight)
    } else if diff < -CLEAR_MARGIN {
        (BetterPerformer::Away, Dominance::Clear)
    } else if diff < -SLIGHT_MARGIN {
        (BetterPerformer::Away, Dominance::Slight)
    } else {
        (BetterPerformer::Tied, Dominance::None)
    };

    MatchComparison {
        home_total: home.total,
        away_total: away.total,
        difference: diff.abs(),
        better,
        dominance,
    }
}

/// The goal-based result of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

impl MatchOutcome {
    pub fn winner(&self) -> Option<Side> {
        match self.home_goals.cmp(&self.away_goals) {
            std::cmp::Ordering::Greater => Some(Side::Home),
            std::cmp::Ordering::Less => Some(Side::Away),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }
}

fn side_total(comparison: &MatchComparison, side: Side) -> f64 {
    match side {
        Side::Home => comparison.home_total,
        Side::Away => comparison.away_total,
    }
}

/// Reconciles the scoreline with the Performance Score comparison.
pub fn verdict(outcome: &MatchOutcome, comparison: &MatchComparison) -> String {
    let diff = comparison.difference;
    match (outcome.winner(), comparison.better.side()) {
        (Some(winner), Some(better)) if winner == better => format!(
            "{} won and deserved it. Their CPS of {:.2} was higher by {:.2} points.",
            outcome.team(winner),
            side_total(comparison, winner),
            diff
        ),
        (Some(winner), None) => format!(
            "Even match. {} took the three points but performance was very similar \
             (a difference of only {:.2} points).",
            outcome.team(winner),
            diff
        ),
        (Some(winner), Some(better)) => format!(
            "Unjust result! {} was the better team with a CPS of {:.2}, higher by {:.2} points, \
             but {} took the win. Football does not always reward the better side.",
            outcome.team(better),
            side_total(comparison, better),
            diff,
            outcome.team(winner)
        ),
        (None, None) => "Fair draw. Both teams performed at a similar level.".to_string(),
        (None, Some(better)) => format!(
            "A draw that undersells {}, who were better by {:.2} CPS points.",
            outcome.team(better),
            diff
        ),
    }
}
