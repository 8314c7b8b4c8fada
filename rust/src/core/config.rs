use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppCore;

const DEFAULT_PENDING_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;
const CONFIG_FILE: &str = "pongo_config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    /// Seconds a local send may stay pending before it is marked failed.
    /// `0` keeps pending sends forever.
    pub(crate) pending_timeout_secs: Option<u64>,
    pub(crate) sweep_interval_ms: Option<u64>,
}

impl AppConfig {
    pub(crate) fn pending_timeout_secs(&self) -> Option<i64> {
        match self.pending_timeout_secs.unwrap_or(DEFAULT_PENDING_TIMEOUT_SECS) {
            0 => None,
            secs => Some(i64::try_from(secs).unwrap_or(i64::MAX)),
        }
    }

    pub(crate) fn sweep_interval(&self) -> Duration {
        Duration::from_millis(
            self.sweep_interval_ms
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_MS)
                .max(10),
        )
    }
}

pub(crate) fn load_app_config(data_dir: &str) -> AppConfig {
    let path = Path::new(data_dir).join(CONFIG_FILE);
    let Ok(bytes) = std::fs::read(&path) else {
        return AppConfig::default();
    };
    match serde_json::from_slice::<AppConfig>(&bytes) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(%e, path = %path.display(), "invalid config, using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn default_app_config_json() -> String {
    let defaults = AppConfig {
        pending_timeout_secs: Some(DEFAULT_PENDING_TIMEOUT_SECS),
        sweep_interval_ms: Some(DEFAULT_SWEEP_INTERVAL_MS),
    };
    serde_json::to_string_pretty(&defaults).unwrap_or_else(|_| "{}".to_string())
}

impl AppCore {
    pub fn sweep_interval(&self) -> Duration {
        self.config.sweep_interval()
    }
}
