use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::Settings;
use crate::fixture::{FixtureRecord, MatchBundle};
use crate::http_client::http_client_with_timeout;

const DEFAULT_HOST: &str = "v3.football.api-sports.io";
const RATE_LIMIT_HEADER: &str = "x-ratelimit-requests-remaining";

// The free plan only serves these seasons.
const FREE_PLAN_SEASONS: std::ops::RangeInclusive<u16> = 2021..=2023;
const FREE_PLAN_FALLBACK_SEASON: u16 = 2023;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API_FOOTBALL_KEY is not configured")]
    MissingKey,
    #[error("http client unavailable: {0}")]
    Client(String),
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned http {status}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("{endpoint} reported errors: {errors}")]
    Provider { endpoint: String, errors: String },
    #[error("invalid json from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueTeam {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Blocking API-FOOTBALL v3 client.
pub struct ApiFootball {
    client: &'static Client,
    base_url: String,
    host: String,
    key: String,
    paid_plan: bool,
}

impl ApiFootball {
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let key = settings.api_key.clone().ok_or(ApiError::MissingKey)?;
        let client = http_client_with_timeout(settings.timeout_secs)
            .map_err(|err| ApiError::Client(format!("{err:#}")))?;
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        let host = Url::parse(&base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        Ok(Self {
            client,
            base_url,
            host,
            key,
            paid_plan: settings.paid_plan,
        })
    }

    pub fn season(&self, requested: u16) -> u16 {
        effective_season(requested, self.paid_plan)
    }

    /// Fetches fixture, statistics, events, lineups and predictions. A failed
    /// part is logged and left empty; only the fixture request itself is fatal.
    pub fn fetch_match_bundle(&self, fixture_id: u64) -> Result<MatchBundle, ApiError> {
        info!("fetching fixture {fixture_id} from API-FOOTBALL");
        let id = fixture_id.to_string();
        let mut bundle = MatchBundle::new(fixture_id);

        let fixture = self.get("/fixtures", &[("id", id.clone())])?;
        bundle.fixture = fixture.into_iter().next();

        bundle.statistics = self.optional_part("/fixtures/statistics", &id);
        bundle.events = self.optional_part("/fixtures/events", &id);
        bundle.lineups = self.optional_part("/fixtures/lineups", &id);
        bundle.predictions = self.optional_part("/predictions", &id);

        if bundle.fixture.is_none() {
            warn!("fixture {fixture_id}: provider returned no fixture record");
        }
        debug!(
            "fixture {fixture_id}: statistics={} events={} lineups={}",
            bundle.statistics.is_some(),
            bundle.events.as_ref().and_then(|v| v.as_array()).map_or(0, Vec::len),
            bundle.lineups.is_some()
        );
        Ok(bundle)
    }

    /// Finished matches for a team, most recent first.
    pub fn last_matches(
        &self,
        team_id: u64,
        league_id: u32,
        season: u16,
        limit: usize,
    ) -> Result<Vec<FixtureRecord>, ApiError> {
        let season = self.season(season);
        let rows = self.get(
            "/fixtures",
            &[
                ("team", team_id.to_string()),
                ("league", league_id.to_string()),
                ("season", season.to_string()),
                ("status", "FT".to_string()),
            ],
        )?;
        let mut fixtures = typed_rows::<FixtureRecord>(rows, "/fixtures");
        sort_most_recent_first(&mut fixtures);
        fixtures.truncate(limit);
        Ok(fixtures)
    }

    pub fn head_to_head(&self, team_a: u64, team_b: u64) -> Result<Vec<FixtureRecord>, ApiError> {
        let rows = self.get(
            "/fixtures/headtohead",
            &[("h2h", format!("{team_a}-{team_b}"))],
        )?;
        let mut fixtures = typed_rows::<FixtureRecord>(rows, "/fixtures/headtohead");
        sort_most_recent_first(&mut fixtures);
        Ok(fixtures)
    }

    pub fn league_teams(&self, league_id: u32, season: u16) -> Result<Vec<LeagueTeam>, ApiError> {
        let season = self.season(season);
        let rows = self.get(
            "/teams",
            &[
                ("league", league_id.to_string()),
                ("season", season.to_string()),
            ],
        )?;
        let mut teams: Vec<LeagueTeam> = rows
            .into_iter()
            .filter_map(|row| row.get("team").cloned())
            .filter_map(|team| serde_json::from_value::<LeagueTeam>(team).ok())
            .collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    fn optional_part(&self, endpoint: &str, fixture_id: &str) -> Option<Value> {
        match self.get(endpoint, &[("fixture", fixture_id.to_string())]) {
            Ok(rows) if rows.is_empty() => None,
            Ok(rows) => Some(Value::Array(rows)),
            Err(err) => {
                warn!("{err}");
                None
            }
        }
    }

    fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<Value>, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {url} {params:?}");

        let resp = self
            .client
            .get(&url)
            .query(params)
            .header("x-rapidapi-key", &self.key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = resp.status();
        if let Some(remaining) = resp
            .headers()
            .get(RATE_LIMIT_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            info!("API-FOOTBALL requests remaining: {remaining}");
        }
        let body = resp.text().map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }
        parse_envelope(endpoint, &body)
    }
}

/// Unwraps `{ errors, results, response }`. `errors` is an empty array on
/// success but an object keyed by field when something is wrong.
pub fn parse_envelope(endpoint: &str, body: &str) -> Result<Vec<Value>, ApiError> {
    let root: Value = serde_json::from_str(body.trim()).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })?;

    let has_errors = match root.get("errors") {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::String(s)) => !s.trim().is_empty(),
        _ => false,
    };
    if has_errors {
        let errors = root.get("errors").map(Value::to_string).unwrap_or_default();
        return Err(ApiError::Provider {
            endpoint: endpoint.to_string(),
            errors,
        });
    }

    Ok(match root.get("response") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    })
}

pub fn effective_season(requested: u16, paid_plan: bool) -> u16 {
    if paid_plan || FREE_PLAN_SEASONS.contains(&requested) {
        return requested;
    }
    warn!(
        "free plan only serves seasons {}-{}; \
         using {FREE_PLAN_FALLBACK_SEASON} instead of {requested}",
        FREE_PLAN_SEASONS.start(),
        FREE_PLAN_SEASONS.end()
    );
    FREE_PLAN_FALLBACK_SEASON
}

fn typed_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>, endpoint: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(v) => Some(v),
            Err(err) => {
                warn!("{endpoint}: skipping malformed row: {err}");
                None
            }
        })
        .collect()
}

fn sort_most_recent_first(fixtures: &mut [FixtureRecord]) {
    // ISO-8601 timestamps sort lexically.
    fixtures.sort_by(|a, b| b.fixture.date.cmp(&a.fixture.date));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_returns_response_rows() {
        let body = r#"{"get":"fixtures","errors":[],"results":2,"response":[{"a":1},{"a":2}]}"#;
        let rows = parse_envelope("/fixtures", body).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn envelope_with_error_object_fails() {
        let body = r#"{"errors":{"token":"Error/Missing application key."},"response":[]}"#;
        let err = parse_envelope("/fixtures", body).unwrap_err();
        assert!(matches!(err, ApiError::Provider { .. }));
        assert!(err.to_string().contains("Missing application key"));
    }

    #[test]
    fn envelope_wraps_object_response() {
        let body = r#"{"errors":[],"response":{"account":{"firstname":"x"}}}"#;
        let rows = parse_envelope("/status", body).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn envelope_rejects_garbage() {
        let err = parse_envelope("/fixtures", "<html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn free_plan_clamps_season() {
        assert_eq!(effective_season(2022, false), 2022);
        assert_eq!(effective_season(2025, false), 2023);
        assert_eq!(effective_season(2025, true), 2025);
    }

    #[test]
    fn fixtures_sort_newest_first() {
        let rows = vec![
            serde_json::json!({"fixture": {"id": 1, "date": "2023-02-01T20:00:00+00:00"}}),
            serde_json::json!({"fixture": {"id": 2, "date": "2023-05-01T20:00:00+00:00"}}),
        ];
        let mut fixtures = typed_rows::<FixtureRecord>(rows, "/fixtures");
        sort_most_recent_first(&mut fixtures);
        assert_eq!(fixtures[0].fixture.id, Some(2));
    }
}
