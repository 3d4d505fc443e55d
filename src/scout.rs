use anyhow::{Context, Result, anyhow};
use log::info;

use crate::api_football::{ApiFootball, LeagueTeam, effective_season};
use crate::config::Settings;
use crate::fixture::{FixtureRecord, MatchBundle};
use crate::match_cache::MatchStore;

/// Data ingestion: cache first, provider second.
pub struct Scout {
    store: MatchStore,
    api: Option<ApiFootball>,
    league_id: u32,
    season: u16,
}

impl Scout {
    /// Works without an API key; only cache reads are possible then.
    pub fn from_settings(settings: &Settings) -> Self {
        let api = match ApiFootball::from_settings(settings) {
            Ok(api) => Some(api),
            Err(err) => {
                info!("running cache-only: {err}");
                None
            }
        };
        Self {
            store: MatchStore::new(settings.data_dir.clone()),
            api,
            league_id: settings.league_id,
            season: effective_season(settings.season, settings.paid_plan),
        }
    }

    /// `season` is used as given for cache keys, so pass the effective one.
    pub fn with_parts(
        store: MatchStore,
        api: Option<ApiFootball>,
        league_id: u32,
        season: u16,
    ) -> Self {
        Self {
            store,
            api,
            league_id,
            season,
        }
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    fn api(&self) -> Result<&ApiFootball> {
        self.api.as_ref().ok_or_else(|| {
            anyhow!("API_FOOTBALL_KEY is not configured and the data is not cached")
        })
    }

    pub fn match_bundle(&self, fixture_id: u64, use_cache: bool) -> Result<MatchBundle> {
        if use_cache {
            if let Some(bundle) = self.store.load_bundle(fixture_id) {
                info!("fixture {fixture_id} loaded from cache");
                return Ok(bundle);
            }
        }
        let bundle = self
            .api()?
            .fetch_match_bundle(fixture_id)
            .with_context(|| format!("failed to fetch fixture {fixture_id}"))?;
        self.store.save_bundle(&bundle)?;
        Ok(bundle)
    }

    pub fn last_matches(
        &self,
        team_id: u64,
        limit: usize,
        use_cache: bool,
    ) -> Result<Vec<FixtureRecord>> {
        let key = format!("matches_team_{team_id}_s{}", self.season);
        if use_cache {
            if let Some(mut cached) = self.store.load_json::<Vec<FixtureRecord>>(&key) {
                cached.truncate(limit);
                return Ok(cached);
            }
        }
        let matches = self
            .api()?
            .last_matches(team_id, self.league_id, self.season, usize::MAX)
            .with_context(|| format!("failed to list matches for team {team_id}"))?;
        self.store.save_json(&key, &matches)?;
        Ok(matches.into_iter().take(limit).collect())
    }

    /// Bundle for the most recent finished match of a team.
    pub fn latest_match_bundle(&self, team_id: u64, use_cache: bool) -> Result<MatchBundle> {
        let latest = self
            .last_matches(team_id, 1, use_cache)?
            .into_iter()
            .next()
            .and_then(|m| m.fixture.id)
            .ok_or_else(|| anyhow!("no finished matches found for team {team_id}"))?;
        self.match_bundle(latest, use_cache)
    }

    pub fn head_to_head(
        &self,
        team_a: u64,
        team_b: u64,
        use_cache: bool,
    ) -> Result<Vec<FixtureRecord>> {
        let key = format!("h2h_{team_a}_vs_{team_b}");
        if use_cache {
            if let Some(cached) = self.store.load_json::<Vec<FixtureRecord>>(&key) {
                return Ok(cached);
            }
        }
        let matches = self
            .api()?
            .head_to_head(team_a, team_b)
            .with_context(|| format!("failed to fetch head-to-head {team_a} vs {team_b}"))?;
        self.store.save_json(&key, &matches)?;
        Ok(matches)
    }

    pub fn league_teams(
        &self,
        league_id: Option<u32>,
        season: Option<u16>,
    ) -> Result<Vec<LeagueTeam>> {
        let league_id = league_id.unwrap_or(self.league_id);
        let season = season.unwrap_or(self.season);
        self.api()?
            .league_teams(league_id, season)
            .with_context(|| format!("failed to list teams for league {league_id}"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::LlmProvider;
    use serde_json::json;

    fn settings(dir: &std::path::Path, paid_plan: bool) -> Settings {
        Settings {
            api_key: None,
            base_url: "https://v3.football.api-sports.io".to_string(),
            paid_plan,
            data_dir: dir.to_path_buf(),
            timeout_secs: 10,
            league_id: 128,
            season: 2025,
            llm_provider: LlmProvider::Groq,
            llm_api_key: None,
            weight_overrides: HashMap::new(),
        }
    }

    fn cache_only(dir: &std::path::Path) -> Scout {
        Scout::with_parts(MatchStore::new(dir), None, 128, 2023)
    }

    #[test]
    fn cached_bundle_needs_no_api() {
        let dir = tempfile::tempdir().unwrap();
        let scout = cache_only(dir.path());
        scout.store().save_bundle(&MatchBundle::new(42)).unwrap();
        let bundle = scout.match_bundle(42, true).unwrap();
        assert_eq!(bundle.fixture_id, 42);
    }

    #[test]
    fn uncached_bundle_without_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let scout = cache_only(dir.path());
        let err = scout.match_bundle(42, true).unwrap_err();
        assert!(err.to_string().contains("API_FOOTBALL_KEY"));
    }

    #[test]
    fn latest_match_uses_cached_listing() {
        let dir = tempfile::tempdir().unwrap();
        let scout = cache_only(dir.path());
        scout
            .store()
            .save_json(
                "matches_team_451_s2023",
                &json!([
                    {"fixture": {"id": 9, "date": "2023-07-01T20:00:00+00:00"}},
                    {"fixture": {"id": 8, "date": "2023-06-01T20:00:00+00:00"}}
                ]),
            )
            .unwrap();
        scout.store().save_bundle(&MatchBundle::new(9)).unwrap();

        let bundle = scout.latest_match_bundle(451, true).unwrap();
        assert_eq!(bundle.fixture_id, 9);
    }

    #[test]
    fn listing_cache_key_uses_the_queried_season() {
        let dir = tempfile::tempdir().unwrap();
        let listing = json!([{"fixture": {"id": 7, "date": "2023-05-01T20:00:00+00:00"}}]);

        let free = Scout::from_settings(&settings(dir.path(), false));
        free.store()
            .save_json("matches_team_451_s2023", &listing)
            .unwrap();
        let matches = free.last_matches(451, 5, true).unwrap();
        assert_eq!(matches[0].fixture.id, Some(7));

        let paid = Scout::from_settings(&settings(dir.path(), true));
        assert!(paid.last_matches(451, 5, true).is_err());
    }
}
