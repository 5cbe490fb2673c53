//! Persistent host settings (JSON file in the app data directory).
//!
//! Precedence, lowest to highest: built-in defaults → settings file →
//! `VOICING_*` environment variables → command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use voicing_core::AnalysisConfig;

/// 100 MB upload ceiling.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AppSettings {
    pub analysis: AnalysisConfig,
    /// Resample to this rate before analysis; `None` keeps the file's rate.
    pub analysis_sample_rate: Option<u32>,
    pub max_file_bytes: u64,
    pub timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            analysis_sample_rate: None,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppSettings {
    /// Clamp host limits into sane ranges.
    ///
    /// Analysis parameters are left alone: out-of-range values are reported
    /// by `AnalysisConfig::validate` instead of being silently corrected.
    pub fn normalize(&mut self) {
        self.timeout_secs = self.timeout_secs.clamp(1, 3_600);
        self.max_file_bytes = self.max_file_bytes.clamp(1_024, 2 * 1024 * 1024 * 1024);
        self.analysis_sample_rate = self
            .analysis_sample_rate
            .filter(|&sr| (4_000..=384_000).contains(&sr));
    }

    /// Apply `VOICING_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparsable values are logged and skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            match raw.trim().parse::<T>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(key, value = raw.as_str(), "ignoring unparsable override");
                    None
                }
            }
        }

        let a = &mut self.analysis;
        if let Some(v) = parse("VOICING_ENERGY_THRESHOLD", lookup("VOICING_ENERGY_THRESHOLD")) {
            a.energy_threshold = v;
        }
        if let Some(v) = parse("VOICING_FRAME_LENGTH", lookup("VOICING_FRAME_LENGTH")) {
            a.frame_length = v;
        }
        if let Some(v) = parse("VOICING_HOP_LENGTH", lookup("VOICING_HOP_LENGTH")) {
            a.hop_length = v;
        }
        if let Some(v) = parse("VOICING_F_MIN", lookup("VOICING_F_MIN")) {
            a.f_min = v;
        }
        if let Some(v) = parse("VOICING_F_MAX", lookup("VOICING_F_MAX")) {
            a.f_max = v;
        }
        if let Some(v) = parse("VOICING_VOICING_CONFIDENCE", lookup("VOICING_VOICING_CONFIDENCE")) {
            a.voicing_confidence = v;
        }
        if let Some(v) = parse("VOICING_TIMEOUT_SECS", lookup("VOICING_TIMEOUT_SECS")) {
            self.timeout_secs = v;
        }
    }
}

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Lattice Labs")
            .join("Voicing")
            .join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("voicing")
            .join("settings.json")
    }
}

/// Load settings from `path`. A missing file yields defaults; a corrupt one
/// is logged and also yields defaults.
pub fn load_settings(path: &Path) -> AppSettings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<AppSettings>(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), "settings file unreadable ({e}), using defaults");
            AppSettings::default()
        }),
        Err(_) => AppSettings::default(),
    };
    settings.normalize();
    settings
}
