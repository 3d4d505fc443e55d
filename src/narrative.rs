//! Markdown match reports: a deterministic one built from the analysis, and
//! an LLM-written chronicle that falls back to it.

use std::fmt::Write;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::analysis::MatchAnalysis;
use crate::chart::lineups_chart;
use crate::config::{LlmProvider, Settings};
use crate::fixture::MatchEvent;
use crate::http_client::http_client;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1500;
const LLM_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "You are an experienced football journalist covering the \
Argentine league. Write a match chronicle in Markdown.

Style:
- Passionate but objective
- Use the Performance Score (CPS) figures to back up your conclusions
- Mention the scorers and the key moments
- The headline should capture the story of the match

Format:
- Title with #, sections with ##
- Bold for team names and key players
- Include a \"By the numbers\" section citing the CPS figures
- Close with a final verdict

Write between 400 and 600 words.";

pub fn generate_basic_report(analysis: &MatchAnalysis, charts: Option<&str>) -> String {
    let info = &analysis.match_info;
    let home = &analysis.scores.home;
    let away = &analysis.scores.away;
    let venue = if info.venue.is_empty() {
        "Unknown"
    } else {
        info.venue.as_str()
    };

    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", info.scoreline());
    let _ = writeln!(out, "**Date:** {}  ", info.date);
    let _ = writeln!(out, "**Venue:** {venue}\n");
    out.push_str("---\n\n## CPS analysis\n\n");
    let _ = writeln!(out, "| Metric | {} | {} |", info.home_team, info.away_team);
    out.push_str("|--------|------|------|\n");
    let _ = writeln!(out, "| Threat | {:.2} | {:.2} |", home.threat, away.threat);
    let _ = writeln!(out, "| Control | {:.2} | {:.2} |", home.control, away.control);
    let _ = writeln!(out, "| Friction | {:.2} | {:.2} |", home.friction, away.friction);
    let _ = writeln!(
        out,
        "| **TOTAL** | **{:.2}** | **{:.2}** |",
        home.total, away.total
    );
    match analysis.teams_without_statistics().as_slice() {
        [] => {}
        [team] => {
            let _ = writeln!(
                out,
                "\n_No match statistics were available for {team}; its scores are zero._"
            );
        }
        _ => out.push_str("\n_No match statistics were available; all scores are zero._\n"),
    }
    out.push_str("\n---\n\n## Verdict\n\n");
    let _ = writeln!(out, "{}", analysis.verdict);
    if !analysis.lineups.is_empty() {
        out.push_str("\n---\n\n## Lineups\n\n```text\n");
        out.push_str(lineups_chart(&analysis.lineups).trim_end());
        out.push_str("\n```\n");
    }
    if let Some(charts) = charts {
        out.push_str("\n---\n\n## Charts\n\n```text\n");
        out.push_str(charts.trim_end());
        out.push_str("\n```\n");
    }
    let _ = write!(
        out,
        "\n---\n\n*Generated by cps_analyst*  \n*{}*\n",
        Utc::now().format("%Y-%m-%d %H:%M")
    );
    out
}

/// Facts handed to the language model.
pub fn build_context(analysis: &MatchAnalysis, events: &[MatchEvent]) -> String {
    let info = &analysis.match_info;
    let mut ctx = String::from("MATCH\n");
    let _ = writeln!(ctx, "- {}", info.scoreline());
    let _ = writeln!(ctx, "- Date: {}", info.date);
    let _ = writeln!(ctx, "- Venue: {}\n", info.venue);

    let missing = analysis.teams_without_statistics();
    if !missing.is_empty() {
        let _ = writeln!(
            ctx,
            "NO STATISTICS AVAILABLE for {}; their CPS figures are zeros, not a performance.\n",
            missing.join(" and ")
        );
    }

    ctx.push_str("CPS (Performance Score)\n");
    for (name, s) in [
        (&info.home_team, &analysis.scores.home),
        (&info.away_team, &analysis.scores.away),
    ] {
        let _ = writeln!(ctx, "{name}:");
        let _ = writeln!(ctx, "  - Threat (attacking danger): {:.1}", s.threat);
        let _ = writeln!(ctx, "  - Control (dominance): {:.1}", s.control);
        let _ = writeln!(ctx, "  - Friction (negative impact): {:.1}", s.friction);
        let _ = writeln!(ctx, "  - TOTAL CPS: {:.1}", s.total);
    }

    ctx.push_str("\nGOALS\n");
    for goal in events.iter().filter(|e| e.is_goal()) {
        let _ = writeln!(
            ctx,
            "  - {} ({}) - minute {}",
            goal.player.name.as_deref().unwrap_or("Unknown"),
            goal.team.name.as_deref().unwrap_or_default(),
            goal.time.elapsed.unwrap_or(0)
        );
    }
    let yellows = events.iter().filter(|e| e.is_card("Yellow Card")).count();
    let reds = events.iter().filter(|e| e.is_card("Red Card")).count();
    let _ = writeln!(ctx, "\nYELLOW CARDS: {yellows}");
    let _ = writeln!(ctx, "RED CARDS: {reds}");
    for lineup in &analysis.lineups {
        let _ = writeln!(
            ctx,
            "FORMATION {}: {}",
            lineup.team_name(),
            lineup.formation.as_deref().unwrap_or("unknown")
        );
    }
    let _ = write!(ctx, "\nSYSTEM VERDICT: {}", analysis.verdict);
    ctx
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible provider.
pub struct Narrator {
    provider: LlmProvider,
    api_key: String,
}

impl Narrator {
    pub fn new(provider: LlmProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let key = settings.llm_api_key.clone()?;
        Some(Self::new(settings.llm_provider, key))
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn chronicle(&self, context: &str) -> Result<String> {
        info!(
            "requesting chronicle from {} ({})",
            self.provider.name(),
            self.provider.model()
        );
        let prompt = format!("Write the chronicle of this match:\n\n{context}");
        let body = json!({
            "model": self.provider.model(),
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let resp = http_client()?
            .post(self.provider.endpoint())
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
            .json(&body)
            .send()
            .with_context(|| format!("{} request failed", self.provider.name()))?;
        let status = resp.status();
        let text = resp.text().context("failed reading LLM response")?;
        if !status.is_success() {
            return Err(anyhow!("{} returned http {status}: {text}", self.provider.name()));
        }
        parse_chat_content(&text)
    }
}

pub fn parse_chat_content(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).context("invalid chat completion response")?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| anyhow!("chat completion had no content"))
}

/// LLM chronicle when a narrator is available and succeeds, otherwise the
/// basic report.
pub fn write_report(
    analysis: &MatchAnalysis,
    events: &[MatchEvent],
    charts: Option<&str>,
    narrator: Option<&Narrator>,
) -> String {
    let Some(narrator) = narrator else {
        return generate_basic_report(analysis, charts);
    };
    match narrator.chronicle(&build_context(analysis, events)) {
        Ok(text) => {
            info!("chronicle written by {}", narrator.provider().name());
            text
        }
        Err(err) => {
            warn!("{err:#}; falling back to the basic report");
            generate_basic_report(analysis, charts)
        }
    }
}
