use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::fixture::{Lineup, MatchBundle};
use crate::score::{DisplayBreakdown, ScoreBreakdown, ScoreEngine};
use crate::stats::{StatKey, TeamPair, TeamStats, normalize_statistics};
use crate::verdict::{ComparisonSummary, MatchComparison, MatchOutcome, compare, verdict};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub fixture_id: u64,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub date: String,
    #[serde(default)]
    pub venue: String,
}

impl MatchInfo {
    pub fn from_bundle(bundle: &MatchBundle) -> Self {
        let record = bundle.fixture_record();
        Self {
            fixture_id: bundle.resolved_fixture_id(),
            home_team: record.home_name().to_string(),
            away_team: record.away_name().to_string(),
            home_goals: record.goals.home.unwrap_or(0),
            away_goals: record.goals.away.unwrap_or(0),
            date: record.date().to_string(),
            venue: record.fixture.venue.name.clone().unwrap_or_default(),
        }
    }

    pub fn outcome(&self) -> MatchOutcome {
        MatchOutcome {
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            home_goals: self.home_goals,
            away_goals: self.away_goals,
        }
    }

    pub fn scoreline(&self) -> String {
        format!(
            "{} {}-{} {}",
            self.home_team, self.home_goals, self.away_goals, self.away_team
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    pub match_info: MatchInfo,
    pub stats: TeamStats,
    /// Rounded to two decimals.
    pub scores: TeamPair<DisplayBreakdown>,
    pub raw_scores: TeamPair<ScoreBreakdown>,
    pub comparison: ComparisonSummary,
    pub raw_comparison: MatchComparison,
    pub verdict: String,
    #[serde(default)]
    pub lineups: Vec<Lineup>,
}

impl MatchAnalysis {
    /// True when neither side had usable statistics.
    pub fn lacks_statistics(&self) -> bool {
        self.home_missing() && self.away_missing()
    }

    pub fn home_missing(&self) -> bool {
        self.stats.home.is_empty()
    }

    pub fn away_missing(&self) -> bool {
        self.stats.away.is_empty()
    }

    /// Teams whose record is empty. Their zero scores mean "unknown".
    pub fn teams_without_statistics(&self) -> Vec<&str> {
        teams_without_statistics(&self.match_info, &self.stats)
    }
}

fn teams_without_statistics<'a>(info: &'a MatchInfo, stats: &TeamStats) -> Vec<&'a str> {
    let mut teams = Vec::new();
    if stats.home.is_empty() {
        teams.push(info.home_team.as_str());
    }
    if stats.away.is_empty() {
        teams.push(info.away_team.as_str());
    }
    teams
}

/// Stands in for the verdict when a side has no statistics.
pub fn missing_statistics_verdict(teams: &[&str]) -> Option<String> {
    match teams {
        [] => None,
        [team] => Some(format!("Statistics unavailable for {team}; no performance verdict.")),
        _ => Some("Statistics unavailable for both teams; no performance verdict.".to_string()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Analyst {
    engine: ScoreEngine,
}

impl Analyst {
    pub fn new(engine: ScoreEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    pub fn analyze(&self, bundle: &MatchBundle) -> MatchAnalysis {
        let match_info = MatchInfo::from_bundle(bundle);
        info!("analyzing {}", match_info.scoreline());

        let stats = normalize_statistics(&bundle.stat_blocks());
        let home = self.engine.score(&stats.home);
        let away = self.engine.score(&stats.away);
        debug!("{}: {home:?}", match_info.home_team);
        debug!("{}: {away:?}", match_info.away_team);

        let comparison = compare(&home, &away);
        let missing = teams_without_statistics(&match_info, &stats);
        let text = match missing_statistics_verdict(&missing) {
            Some(note) => {
                warn!("fixture {}: {note}", match_info.fixture_id);
                note
            }
            None => verdict(&match_info.outcome(), &comparison),
        };
        info!("verdict: {text}");

        MatchAnalysis {
            comparison: comparison.summary(&match_info.home_team, &match_info.away_team),
            raw_comparison: comparison,
            scores: TeamPair {
                home: home.display(),
                away: away.display(),
            },
            raw_scores: TeamPair { home, away },
            stats,
            verdict: text,
            lineups: bundle.lineups(),
            match_info,
        }
    }
}

/// One row of the side-by-side comparison table. `None` marks a separator.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub metric: &'static str,
    pub home: Option<f64>,
    pub away: Option<f64>,
}

const TABLE_STATS: [(&str, StatKey); 8] = [
    ("Shots on Goal", StatKey::ShotsOnGoal),
    ("Shots Inside Box", StatKey::ShotsInsideBox),
    ("Total Shots", StatKey::TotalShots),
    ("Possession %", StatKey::Possession),
    ("Pass Accuracy %", StatKey::PassAccuracy),
    ("Corner Kicks", StatKey::CornerKicks),
    ("Fouls", StatKey::Fouls),
    ("Yellow Cards", StatKey::YellowCards),
];

pub fn comparison_table(analysis: &MatchAnalysis) -> Vec<TableRow> {
    let mut rows: Vec<TableRow> = TABLE_STATS
        .iter()
        .map(|&(metric, key)| TableRow {
            metric,
            home: Some(analysis.stats.home.get(key)),
            away: Some(analysis.stats.away.get(key)),
        })
        .collect();

    rows.push(TableRow {
        metric: "--- CPS ---",
        home: None,
        away: None,
    });

    let home = &analysis.scores.home;
    let away = &analysis.scores.away;
    rows.extend([
        ("Threat", home.threat, away.threat),
        ("Control", home.control, away.control),
        ("Friction", home.friction, away.friction),
        ("TOTAL CPS", home.total, away.total),
    ]
    .into_iter()
    .map(|(metric, h, a)| TableRow {
        metric,
        home: Some(h),
        away: Some(a),
    }));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle() -> MatchBundle {
        let mut bundle = MatchBundle::new(100);
        bundle.fixture = Some(json!({
            "fixture": {
                "id": 100,
                "date": "2023-08-12T19:00:00+00:00",
                "venue": {"name": "La Bombonera"}
            },
            "teams": {
                "home": {"id": 451, "name": "Boca Juniors"},
                "away": {"id": 435, "name": "River Plate"}
            },
            "goals": {"home": 0, "away": 1}
        }));
        bundle.statistics = Some(json!([
            {"team": {"id": 451, "name": "Boca Juniors"}, "statistics": [
                {"type": "Shots on Goal", "value": 8},
                {"type": "Ball Possession", "value": "60%"}
            ]},
            {"team": {"id": 435, "name": "River Plate"}, "statistics": [
                {"type": "Shots on Goal", "value": 2},
                {"type": "Ball Possession", "value": "40%"}
            ]}
        ]));
        bundle
    }

    #[test]
    fn analysis_flags_unjust_result() {
        let analysis = Analyst::default().analyze(&bundle());
        assert_eq!(analysis.match_info.venue, "La Bombonera");
        assert_eq!(analysis.match_info.date, "2023-08-12");
        // 24 + 24 vs 6 + 16
        assert_eq!(analysis.scores.home.total, 48.0);
        assert_eq!(analysis.scores.away.total, 22.0);
        assert_eq!(analysis.comparison.better_team, "Boca Juniors");
        assert!(analysis.verdict.starts_with("Unjust result!"));
    }

    #[test]
    fn missing_statistics_produce_zero_scores() {
        let mut b = bundle();
        b.statistics = None;
        let analysis = Analyst::default().analyze(&b);
        assert!(analysis.lacks_statistics());
        assert_eq!(analysis.raw_scores.home.total, 0.0);
        assert_eq!(analysis.comparison.better_team, crate::verdict::TIED_LABEL);
        assert_eq!(
            analysis.verdict,
            "Statistics unavailable for both teams; no performance verdict."
        );
    }

    #[test]
    fn one_empty_side_gets_no_performance_verdict() {
        let mut b = bundle();
        b.statistics = Some(json!([
            {"team": {"name": "Boca Juniors"}, "statistics": [
                {"type": "Shots on Goal", "value": 3}
            ]},
            {"team": {"name": "River Plate"}, "statistics": []}
        ]));
        b.fixture = Some(json!({
            "teams": {"home": {"name": "Boca Juniors"}, "away": {"name": "River Plate"}},
            "goals": {"home": 1, "away": 0}
        }));
        let analysis = Analyst::default().analyze(&b);
        assert!(!analysis.lacks_statistics());
        assert!(!analysis.home_missing());
        assert!(analysis.away_missing());
        assert_eq!(analysis.teams_without_statistics(), vec!["River Plate"]);
        assert_eq!(
            analysis.verdict,
            "Statistics unavailable for River Plate; no performance verdict."
        );
    }

    #[test]
    fn lineups_are_carried_into_the_analysis() {
        let mut b = bundle();
        b.lineups = Some(json!([
            {"team": {"name": "Boca Juniors"}, "formation": "4-3-1-2", "startXI": []}
        ]));
        let analysis = Analyst::default().analyze(&b);
        assert_eq!(analysis.lineups.len(), 1);
        assert_eq!(analysis.lineups[0].formation.as_deref(), Some("4-3-1-2"));
    }

    #[test]
    fn missing_fixture_defaults_names_and_goals() {
        let mut b = bundle();
        b.fixture = None;
        let info = Analyst::default().analyze(&b).match_info;
        assert_eq!(info.home_team, "Home");
        assert_eq!(info.away_team, "Away");
        assert_eq!(info.scoreline(), "Home 0-0 Away");
        assert_eq!(info.fixture_id, 100);
    }

    #[test]
    fn table_has_stats_separator_and_cps_rows() {
        let rows = comparison_table(&Analyst::default().analyze(&bundle()));
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0].metric, "Shots on Goal");
        assert_eq!(rows[0].home, Some(8.0));
        assert_eq!(rows[8].home, None);
        assert_eq!(rows[12].metric, "TOTAL CPS");
        assert_eq!(rows[12].away, Some(22.0));
    }
}
