// =============================================================================
// Runtime Configuration — operational settings with atomic save
// =============================================================================
//
// Operational knobs only: which endpoints to poll, how often, where to bind,
// and whether alerts start muted.  Signal parameters (indicator periods, RSI
// bands, TP/SL multipliers) are engine constants on purpose — the thresholds
// are tuned as a set and exposing them piecemeal invites broken combinations.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_instrument() -> String {
    "XAU/USD".to_string()
}

fn default_primary_price_url() -> String {
    "https://gold-api.com/api/XAU/USD".to_string()
}

fn default_fallback_price_url() -> String {
    "https://cdn.jsdelivr.net/gh/fawazahmed0/currency-api@1/latest/currencies/usd/xau.json"
        .to_string()
}

fn default_calendar_url() -> String {
    "https://nfs.faireconomy.media/ff_calendar_thisweek.json".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the signal desk.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Display label of the watched instrument.
    #[serde(default = "default_instrument")]
    pub instrument: String,

    /// Primary spot-price endpoint (direct quote JSON).
    #[serde(default = "default_primary_price_url")]
    pub primary_price_url: String,

    /// Fallback spot-price endpoint (inverse quote JSON).
    #[serde(default = "default_fallback_price_url")]
    pub fallback_price_url: String,

    /// Weekly economic-calendar feed.
    #[serde(default = "default_calendar_url")]
    pub calendar_url: String,

    /// Seconds between polls of the price and calendar endpoints.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Address the API server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Whether signal alerts start muted.
    #[serde(default)]
    pub start_muted: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            instrument: default_instrument(),
            primary_price_url: default_primary_price_url(),
            fallback_price_url: default_fallback_price_url(),
            calendar_url: default_calendar_url(),
            poll_interval_secs: default_poll_interval_secs(),
            bind_addr: default_bind_addr(),
            start_muted: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            instrument = %config.instrument,
            poll_interval_secs = config.poll_interval_secs,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.instrument, "XAU/USD");
        assert!(cfg.primary_price_url.starts_with("https://"));
        assert!(cfg.fallback_price_url.contains("currency-api"));
        assert_eq!(cfg.poll_interval_secs, 30);
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
        assert!(!cfg.start_muted);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.instrument, "XAU/USD");
        assert_eq!(cfg.poll_interval_secs, 30);
        assert!(!cfg.start_muted);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "instrument": "XAG/USD", "poll_interval_secs": 10 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.instrument, "XAG/USD");
        assert_eq!(cfg.poll_interval_secs, 10);
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
    }

    #[test]
    fn roundtrip_serialisation() {
        let mut cfg = RuntimeConfig::default();
        cfg.start_muted = true;
        cfg.poll_interval_secs = 5;

        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg2.poll_interval_secs, 5);
        assert!(cfg2.start_muted);
        assert_eq!(cfg.primary_price_url, cfg2.primary_price_url);
    }
}
