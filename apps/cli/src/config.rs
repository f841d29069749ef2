// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI configuration loaded from environment variables.

use anyhow::Context;
use roomscan_core::{ScanConfig, ScanMode};
use std::path::{Path, PathBuf};

/// Process-level settings. Pipeline thresholds live in [`ScanConfig`].
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Number of rayon worker threads.
    pub worker_threads: usize,
    /// Scan mode used when no config file is given.
    pub mode: ScanMode,
    /// `ScanConfig` JSON file applied to every run.
    pub config_path: Option<PathBuf>,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl CliConfig {
    /// Load configuration from `ROOMSCAN_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_filter: lookup("ROOMSCAN_LOG").unwrap_or_else(|| {
                "info,roomscan_processing=info,roomscan_alignment=info".into()
            }),
            worker_threads: lookup("ROOMSCAN_WORKER_THREADS")
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or_else(num_cpus::get),
            mode: lookup("ROOMSCAN_MODE")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            config_path: lookup("ROOMSCAN_CONFIG")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            pretty: lookup("ROOMSCAN_PRETTY")
                .map(|v| !matches!(v.trim(), "0" | "false" | "no"))
                .unwrap_or(true),
        }
    }

    /// Pipeline configuration: the file named on the command line, else the
    /// one from the environment, else the defaults for the scan mode.
    pub fn scan_config(&self, file: Option<&Path>) -> anyhow::Result<ScanConfig> {
        match file.or(self.config_path.as_deref()) {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("parsing config {}", path.display()))
            }
            None => Ok(ScanConfig::for_mode(self.mode)),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.mode, ScanMode::Room);
        assert!(config.worker_threads > 0);
        assert!(config.pretty);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("ROOMSCAN_MODE", "Detailed"),
            ("ROOMSCAN_WORKER_THREADS", "3"),
            ("ROOMSCAN_PRETTY", "false"),
            ("ROOMSCAN_CONFIG", "scan.json"),
        ]);
        assert_eq!(config.mode, ScanMode::Detailed);
        assert_eq!(config.worker_threads, 3);
        assert!(!config.pretty);
        assert_eq!(config.config_path, Some(PathBuf::from("scan.json")));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config(&[("ROOMSCAN_MODE", "garage"), ("ROOMSCAN_WORKER_THREADS", "0")]);
        assert_eq!(config.mode, ScanMode::Room);
        assert!(config.worker_threads > 0);
    }

    #[test]
    fn test_scan_config_follows_mode() {
        let config = config(&[("ROOMSCAN_MODE", "detailed")]);
        let scan = config.scan_config(None).unwrap();
        assert_eq!(scan.mode, ScanMode::Detailed);
        assert!(scan.effective_classifier().per_face);
    }
}
