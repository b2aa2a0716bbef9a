// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::drivers::ExportSettings;
pub const DEFAULT_CONFIG_FILE: &str = "serial-scope.json";
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub serial_port: String,
    pub baud_rate: u32,
    pub buffer_capacity: usize,
    pub output_folder: PathBuf,
    pub csv_stem: String,
    pub graph_name: String,
    pub poll_interval_ms: u64,
    pub export_timeout_secs: u64,
    pub display_y_max: f64,
}
impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            serial_port: "COM4".into(),
            baud_rate: 115_200,
            buffer_capacity: 5000,
            output_folder: PathBuf::from("captures"),
            csv_stem: "dados".into(),
            graph_name: "Movimento".into(),
            poll_interval_ms: 5,
            export_timeout_secs: 30,
            display_y_max: 1023.0,
        }
    }
}
impl ScopeConfig {
    /// Reads `path`; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config in {}", path.display()))
    }
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            folder: self.output_folder.clone(),
            csv_stem: self.csv_stem.clone(),
            graph_name: self.graph_name.clone(),
        }
    }
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs.max(1))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ScopeConfig::from_json(r#"{"serial_port":"/dev/ttyACM0","buffer_capacity":200}"#)
            .unwrap();
        assert_eq!(cfg.serial_port, "/dev/ttyACM0");
        assert_eq!(cfg.buffer_capacity, 200);
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.export_settings().csv_stem, "dados");
    }
    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ScopeConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg, ScopeConfig::default());
    }
    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(ScopeConfig::load(&path).is_err());
    }
    #[test]
    fn zero_intervals_are_clamped() {
        let cfg = ScopeConfig {
            poll_interval_ms: 0,
            export_timeout_secs: 0,
            ..ScopeConfig::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
        assert_eq!(cfg.export_timeout(), Duration::from_secs(1));
    }
}
