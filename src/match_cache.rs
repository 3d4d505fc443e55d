use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::analysis::MatchAnalysis;
use crate::fixture::MatchBundle;

const RAW_DIR: &str = "raw";
const PROCESSED_DIR: &str = "processed";
const REPORTS_DIR: &str = "reports";
const BUNDLE_PREFIX: &str = "match_full_";

/// Flat JSON files under a data directory, keyed by name. Entries are never
/// invalidated; delete the file to refetch.
#[derive(Debug, Clone)]
pub struct MatchStore {
    root: PathBuf,
}

impl MatchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bundle_key(fixture_id: u64) -> String {
        format!("{BUNDLE_PREFIX}{fixture_id}")
    }

    pub fn bundle_path(&self, fixture_id: u64) -> PathBuf {
        self.raw_path(&Self::bundle_key(fixture_id))
    }

    pub fn load_bundle(&self, fixture_id: u64) -> Option<MatchBundle> {
        self.load_json(&Self::bundle_key(fixture_id))
    }

    pub fn save_bundle(&self, bundle: &MatchBundle) -> Result<PathBuf> {
        self.save_json(&Self::bundle_key(bundle.fixture_id), bundle)
    }

    /// Reads `raw/{name}.json`; unreadable or unparsable entries count as absent.
    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.raw_path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("cache miss: {}", path.display());
                return None;
            }
        };
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                debug!("cache hit: {}", path.display());
                Some(value)
            }
            Err(err) => {
                debug!("ignoring unparsable cache entry {}: {err}", path.display());
                None
            }
        }
    }

    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.raw_path(name);
        write_json_atomic(&path, value)?;
        info!("cached {}", path.display());
        Ok(path)
    }

    /// Lowest fixture id with a cached bundle, if any.
    pub fn first_cached_fixture(&self) -> Option<u64> {
        self.cached_fixtures().into_iter().next()
    }

    pub fn cached_fixtures(&self) -> Vec<u64> {
        let Ok(entries) = fs::read_dir(self.root.join(RAW_DIR)) else {
            return Vec::new();
        };
        let mut ids: Vec<u64> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                name.strip_prefix(BUNDLE_PREFIX)?
                    .strip_suffix(".json")?
                    .parse::<u64>()
                    .ok()
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn save_analysis(&self, analysis: &MatchAnalysis) -> Result<PathBuf> {
        let path = self
            .root
            .join(PROCESSED_DIR)
            .join(format!("analysis_{}.json", analysis.match_info.fixture_id));
        write_json_atomic(&path, analysis)?;
        Ok(path)
    }

    pub fn save_report(&self, fixture_id: u64, markdown: &str) -> Result<PathBuf> {
        let path = self
            .root
            .join(REPORTS_DIR)
            .join(format!("report_{fixture_id}.md"));
        write_atomic(&path, markdown.as_bytes())?;
        Ok(path)
    }

    fn raw_path(&self, name: &str) -> PathBuf {
        self.root.join(RAW_DIR).join(format!("{name}.json"))
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    write_atomic(path, json.as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}
