// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan configuration persisted as JSON in the data directory.

use std::path::{Path, PathBuf};

use labscan_core::ScanConfig;
use labscan_core::error::Result;
use tracing::{debug, info, warn};

pub const CONFIG_FILE: &str = "config.json";

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read the stored config, if there is a readable one.
pub fn load_config(data_dir: &Path) -> Option<ScanConfig> {
    let path = config_path(data_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable config");
            None
        }
    }
}

/// The stored config, or defaults when absent or unreadable.
pub fn effective_config(data_dir: &Path) -> ScanConfig {
    match load_config(data_dir) {
        Some(config) => {
            debug!(path = %config_path(data_dir).display(), "Config loaded");
            config
        }
        None => ScanConfig::default(),
    }
}

/// Write `config`, creating the data directory if needed.
pub fn persist_config(data_dir: &Path, config: &ScanConfig) -> Result<PathBuf> {
    std::fs::create_dir_all(data_dir)?;
    let path = config_path(data_dir);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), "Config written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use labscan_core::BoundaryStrategy;

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_config(dir.path()).is_none());
        assert_eq!(effective_config(dir.path()).upscale_factor, 2.0);
    }

    #[test]
    fn persisted_config_is_loaded_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("labscan");
        let config = ScanConfig {
            upscale_factor: 3.0,
            boundary: BoundaryStrategy::Disabled,
            ..ScanConfig::default()
        };
        let path = persist_config(&nested, &config).expect("persist");
        assert!(path.exists());

        let loaded = load_config(&nested).expect("load");
        assert_eq!(loaded.upscale_factor, 3.0);
        assert_eq!(loaded.boundary, BoundaryStrategy::Disabled);
    }

    #[test]
    fn corrupt_config_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").expect("write");
        assert!(load_config(dir.path()).is_none());
        assert_eq!(effective_config(dir.path()).value_window_chars, 100);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{"upscale_factor": 1.5}"#).expect("write");
        let loaded = load_config(dir.path()).expect("load");
        assert_eq!(loaded.upscale_factor, 1.5);
        assert_eq!(loaded.languages, vec!["vie".to_string(), "eng".to_string()]);
    }
}
