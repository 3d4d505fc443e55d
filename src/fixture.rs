use chrono::{SecondsFormat, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stats::{TeamRef, TeamStatBlock, parse_stat_blocks};

/// Everything fetched for one fixture. This is the on-disk cache format, so
/// the provider payloads are kept verbatim and only typed on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchBundle {
    #[serde(default)]
    pub fixture_id: u64,
    #[serde(default)]
    pub fetched_at: String,
    #[serde(default)]
    pub fixture: Option<Value>,
    #[serde(default)]
    pub statistics: Option<Value>,
    #[serde(default)]
    pub events: Option<Value>,
    #[serde(default)]
    pub lineups: Option<Value>,
    #[serde(default)]
    pub predictions: Option<Value>,
}

impl MatchBundle {
    pub fn new(fixture_id: u64) -> Self {
        Self {
            fixture_id,
            fetched_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            fixture: None,
            statistics: None,
            events: None,
            lineups: None,
            predictions: None,
        }
    }

    pub fn fixture_record(&self) -> FixtureRecord {
        self.fixture
            .as_ref()
            .and_then(|v| typed_or_warn(v, "fixture"))
            .unwrap_or_default()
    }

    pub fn stat_blocks(&self) -> Vec<TeamStatBlock> {
        self.statistics
            .as_ref()
            .map(parse_stat_blocks)
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<MatchEvent> {
        self.events
            .as_ref()
            .and_then(|v| typed_or_warn::<Vec<MatchEvent>>(v, "events"))
            .unwrap_or_default()
    }

    /// Starting line-ups in provider order (home first). Malformed entries
    /// are skipped.
    pub fn lineups(&self) -> Vec<Lineup> {
        let Some(items) = self.lineups.as_ref().and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| typed_or_warn::<Lineup>(item, "lineup"))
            .collect()
    }

    /// The id stored in the bundle, falling back to the one in the fixture payload.
    pub fn resolved_fixture_id(&self) -> u64 {
        if self.fixture_id != 0 {
            return self.fixture_id;
        }
        self.fixture_record().fixture.id.unwrap_or_default()
    }
}

fn typed_or_warn<T: DeserializeOwned>(value: &Value, what: &str) -> Option<T> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!("cached {what} payload is malformed: {err}");
            None
        }
    }
}

/// One element of the provider's `/fixtures` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureRecord {
    #[serde(default)]
    pub fixture: FixtureMeta,
    #[serde(default)]
    pub league: LeagueRef,
    #[serde(default)]
    pub teams: Teams,
    #[serde(default)]
    pub goals: Goals,
}

impl FixtureRecord {
    pub fn date(&self) -> &str {
        let raw = self.fixture.date.as_deref().unwrap_or_default();
        raw.get(..10).unwrap_or(raw)
    }

    pub fn home_name(&self) -> &str {
        self.teams.home.name.as_deref().unwrap_or("Home")
    }

    pub fn away_name(&self) -> &str {
        self.teams.away.name.as_deref().unwrap_or("Away")
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{}: {} {}-{} {}",
            self.date(),
            self.home_name(),
            self.goals.home.unwrap_or(0),
            self.goals.away.unwrap_or(0),
            self.away_name()
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureMeta {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub venue: Venue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub season: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Teams {
    #[serde(default)]
    pub home: TeamRef,
    #[serde(default)]
    pub away: TeamRef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Goals {
    #[serde(default)]
    pub home: Option<u32>,
    #[serde(default)]
    pub away: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchEvent {
    #[serde(default)]
    pub time: EventTime,
    #[serde(default)]
    pub team: TeamRef,
    #[serde(default)]
    pub player: PlayerRef,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub detail: Option<String>,
}

impl MatchEvent {
    pub fn is_goal(&self) -> bool {
        self.kind.eq_ignore_ascii_case("Goal")
    }

    pub fn is_card(&self, detail: &str) -> bool {
        self.kind.eq_ignore_ascii_case("Card") && self.detail.as_deref() == Some(detail)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(default)]
    pub elapsed: Option<i32>,
    #[serde(default)]
    pub extra: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One element of the provider's `/fixtures/lineups` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    #[serde(default)]
    pub team: TeamRef,
    #[serde(default)]
    pub coach: Option<PlayerRef>,
    #[serde(default)]
    pub formation: Option<String>,
    #[serde(rename = "startXI", default)]
    pub start_xi: Vec<LineupSlot>,
    #[serde(default)]
    pub substitutes: Vec<LineupSlot>,
}

impl Lineup {
    pub fn team_name(&self) -> &str {
        self.team.name.as_deref().unwrap_or("Team")
    }

    pub fn coach_name(&self) -> Option<&str> {
        self.coach.as_ref().and_then(|c| c.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineupSlot {
    #[serde(default)]
    pub player: LineupPlayer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineupPlayer {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub grid: Option<String>,
}

impl LineupPlayer {
    /// `grid` is `"row:column"`, row 1 being the goalkeeper.
    pub fn grid_position(&self) -> Option<(u32, u32)> {
        let (row, col) = self.grid.as_deref()?.split_once(':')?;
        Some((row.trim().parse().ok()?, col.trim().parse().ok()?))
    }

    /// Surname-style label: the last word of the name.
    pub fn short_name(&self) -> &str {
        self.name
            .as_deref()
            .and_then(|n| n.split_whitespace().last())
            .unwrap_or("?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fixture_record_tolerates_missing_fields() {
        let mut bundle = MatchBundle::new(5);
        bundle.fixture = Some(json!({
            "fixture": {"id": 5, "date": "2023-06-04T21:30:00+00:00"},
            "teams": {"home": {"id": 1, "name": "Racing Club"}, "away": {"id": 2}},
            "goals": {"home": 2, "away": null}
        }));
        let record = bundle.fixture_record();
        assert_eq!(record.date(), "2023-06-04");
        assert_eq!(record.home_name(), "Racing Club");
        assert_eq!(record.away_name(), "Away");
        assert_eq!(record.summary_line(), "2023-06-04: Racing Club 2-0 Away");
    }

    #[test]
    fn missing_fixture_id_falls_back_to_payload() {
        let raw = json!({
            "fixture": {"fixture": {"id": 971362}},
            "statistics": null
        });
        let bundle: MatchBundle = serde_json::from_value(raw).unwrap();
        assert_eq!(bundle.resolved_fixture_id(), 971362);
        assert!(bundle.stat_blocks().is_empty());
    }

    #[test]
    fn events_classify_goals_and_cards() {
        let mut bundle = MatchBundle::new(1);
        bundle.events = Some(json!([
            {"time": {"elapsed": 12}, "team": {"name": "A"}, "player": {"name": "X"},
             "type": "Goal", "detail": "Normal Goal"},
            {"time": {"elapsed": 40}, "team": {"name": "B"}, "player": {"name": "Y"},
             "type": "Card", "detail": "Yellow Card"},
            {"time": {"elapsed": 77}, "team": {"name": "B"}, "player": {"name": "Z"},
             "type": "Card", "detail": "Red Card"}
        ]));
        let events = bundle.events();
        assert_eq!(events.len(), 3);
        assert!(events[0].is_goal());
        assert!(events[1].is_card("Yellow Card"));
        assert!(events[2].is_card("Red Card"));
        assert!(!events[2].is_card("Yellow Card"));
    }

    #[test]
    fn lineups_parse_grid_and_coach() {
        let mut bundle = MatchBundle::new(1);
        bundle.lineups = Some(json!([
            {
                "team": {"id": 451, "name": "Boca Juniors"},
                "coach": {"id": 7, "name": "J. Almirón"},
                "formation": "4-4-2",
                "startXI": [
                    {"player": {"id": 1, "name": "S. Romero", "number": 1,
                                "pos": "G", "grid": "1:1"}},
                    {"player": {"id": 2, "name": "L. Advíncula", "number": 17,
                                "pos": "D", "grid": "2:4"}}
                ],
                "substitutes": [
                    {"player": {"id": 3, "name": "J. Briasco", "number": 30,
                                "pos": "F", "grid": null}}
                ]
            },
            {"team": {"name": "River Plate"}, "coach": null, "formation": null, "startXI": []},
            "not a lineup"
        ]));
        let lineups = bundle.lineups();
        assert_eq!(lineups.len(), 2);
        assert_eq!(lineups[0].formation.as_deref(), Some("4-4-2"));
        assert_eq!(lineups[0].coach_name(), Some("J. Almirón"));
        assert_eq!(lineups[0].start_xi[1].player.grid_position(), Some((2, 4)));
        assert_eq!(lineups[0].start_xi[1].player.short_name(), "Advíncula");
        assert_eq!(lineups[0].substitutes[0].player.grid_position(), None);
        assert_eq!(lineups[1].coach_name(), None);
        assert!(bundle.events().is_empty());
    }
}
