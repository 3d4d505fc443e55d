use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

pub const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";
// Liga Profesional Argentina.
pub const DEFAULT_LEAGUE_ID: u32 = 128;
pub const DEFAULT_SEASON: u16 = 2023;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    Gemini,
    GeminiPro,
    OpenAi,
}

impl LlmProvider {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gemini" => LlmProvider::Gemini,
            "gemini-pro" => LlmProvider::GeminiPro,
            "openai" => LlmProvider::OpenAi,
            _ => LlmProvider::Groq,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LlmProvider::Groq => "groq",
            LlmProvider::Gemini => "gemini",
            LlmProvider::GeminiPro => "gemini-pro",
            LlmProvider::OpenAi => "openai",
        }
    }

    pub fn key_var(self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::Gemini | LlmProvider::GeminiPro => "GOOGLE_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn model(self) -> &'static str {
        match self {
            LlmProvider::Groq => "llama-3.3-70b-versatile",
            LlmProvider::Gemini => "gemini-2.0-flash-lite",
            LlmProvider::GeminiPro => "gemini-1.5-pro",
            LlmProvider::OpenAi => "gpt-4o",
        }
    }

    /// OpenAI-compatible chat completions endpoint for the provider.
    pub fn endpoint(self) -> &'static str {
        match self {
            LlmProvider::Groq => "https://api.groq.com/openai/v1/chat/completions",
            LlmProvider::Gemini | LlmProvider::GeminiPro => {
                "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
            }
            LlmProvider::OpenAi => "https://api.openai.com/v1/chat/completions",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub paid_plan: bool,
    pub data_dir: PathBuf,
    pub timeout_secs: u64,
    pub league_id: u32,
    pub season: u16,
    pub llm_provider: LlmProvider,
    pub llm_api_key: Option<String>,
    pub weight_overrides: HashMap<String, f64>,
}

impl Settings {
    /// Loads `.env.local` then `.env` (first value wins) and reads the process env.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let llm_provider = LlmProvider::parse(&env_string("LLM_PROVIDER").unwrap_or_default());
        let weight_overrides = match env_string("CPS_WEIGHTS") {
            Some(raw) => parse_weight_overrides(&raw).context("invalid CPS_WEIGHTS")?,
            None => HashMap::new(),
        };

        let settings = Self {
            api_key: env_string("API_FOOTBALL_KEY"),
            base_url: env_string("API_FOOTBALL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            paid_plan: env_flag("API_FOOTBALL_PAID_PLAN"),
            data_dir: env_string("CPS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            timeout_secs: env_parse("HTTP_TIMEOUT_SECS")
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .max(1),
            league_id: env_parse("CPS_LEAGUE_ID").unwrap_or(DEFAULT_LEAGUE_ID),
            season: env_parse("CPS_SEASON").unwrap_or(DEFAULT_SEASON),
            llm_provider,
            llm_api_key: env_string(llm_provider.key_var()),
            weight_overrides,
        };
        debug!(
            "settings: data_dir={} league={} season={} llm={}",
            settings.data_dir.display(),
            settings.league_id,
            settings.season,
            settings.llm_provider.name()
        );
        Ok(settings)
    }

    /// Merges a weights file over whatever came from the environment.
    pub fn load_weights_file(&mut self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading weights file {}", path.display()))?;
        let overrides = parse_weight_overrides(&raw)
            .with_context(|| format!("invalid weights file {}", path.display()))?;
        self.weight_overrides.extend(overrides);
        Ok(())
    }
}

/// Flat JSON object of `stat name -> weight`.
pub fn parse_weight_overrides(raw: &str) -> Result<HashMap<String, f64>> {
    serde_json::from_str::<HashMap<String, f64>>(raw).context("expected a JSON object of numbers")
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse::<T>().ok())
}

fn env_flag(key: &str) -> bool {
    matches!(
        env_string(key).map(|v| v.to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
