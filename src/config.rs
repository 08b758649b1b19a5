//! Configuration surface (spec §6, SPEC_FULL.md §10.3).
//!
//! `ResolverConfig` is the top-level knob set, loadable from TOML and
//! overridable by CLI flags the way the teacher's `Args` layers onto its
//! own batch config.

use crate::model::Thresholds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub thresholds: Thresholds,
    /// Provider adapter names in the order they should be tried (spec §4.E).
    pub source_priority: Vec<String>,
    /// Uploader channel names/handles trusted outright (spec §4.B).
    pub curated_uploaders: Vec<String>,
    /// Requests per second, per external host (spec §5).
    pub requests_per_second: u32,
    /// Path to the idempotency ledger's sqlite file.
    pub ledger_path: String,
    /// TTL, in seconds, for the in-memory release cache (spec §5).
    pub release_cache_ttl_seconds: u64,
    /// Per-call timeout, in milliseconds, for catalog/provider requests.
    pub request_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            source_priority: vec!["youtube".into(), "soundcloud".into(), "bandcamp".into()],
            curated_uploaders: Vec::new(),
            requests_per_second: 2,
            ledger_path: "trackbind-ledger.sqlite3".into(),
            release_cache_ttl_seconds: 300,
            request_timeout_ms: 10_000,
        }
    }
}

impl ResolverConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: ResolverConfig = toml::from_str(raw)?;
        Ok(config)
    }

    pub fn load_from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
        Self::from_toml_str(&raw)
    }
}
