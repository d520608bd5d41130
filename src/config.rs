use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::{OnIncomplete, UnpairedPolicy};
use crate::models::Orientation;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub pairing: PairingSettings,
    #[serde(default)]
    pub rounds: RoundSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    /// JSON file holding a `PairingRequest`
    #[serde(default = "default_request_path")]
    pub request: PathBuf,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            request: default_request_path(),
        }
    }
}

fn default_request_path() -> PathBuf { PathBuf::from("preferences.json") }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSettings {
    /// Destination file; stdout when unset
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairingSettings {
    #[serde(default = "default_shuffle_seed")]
    pub shuffle_seed: Option<u64>,
    #[serde(default)]
    pub unpaired: UnpairedPolicy,
    #[serde(default)]
    pub on_incomplete: OnIncomplete,
    /// Ranks better than this count as keen when synthesizing responder preferences
    #[serde(default = "default_rank_cut")]
    pub rank_cut: u32,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            shuffle_seed: default_shuffle_seed(),
            unpaired: UnpairedPolicy::default(),
            on_incomplete: OnIncomplete::default(),
            rank_cut: default_rank_cut(),
        }
    }
}

fn default_shuffle_seed() -> Option<u64> { Some(1234) }
fn default_rank_cut() -> u32 { 5 }

/// Round mode is active when at least one round is requested
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RoundSettings {
    #[serde(default)]
    pub num_pairs: usize,
    #[serde(default)]
    pub num_bonus: usize,
}

impl RoundSettings {
    pub fn enabled(&self) -> bool {
        self.num_pairs + self.num_bonus > 0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "plain".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PAIRING__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PAIRING__ROUNDS__NUM_PAIRS -> rounds.num_pairs
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("PAIRING")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_pairing() {
        let pairing = PairingSettings::default();
        assert_eq!(pairing.shuffle_seed, Some(1234));
        assert_eq!(pairing.unpaired, UnpairedPolicy::Leave);
        assert_eq!(pairing.on_incomplete, OnIncomplete::Warn);
        assert_eq!(pairing.rank_cut, 5);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "plain");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[pairing]\nunpaired = \"reuse_responders\"\non_incomplete = \"fail\"\n\n[rounds]\nnum_pairs = 3\nnum_bonus = 1\n\n[output]\norientation = \"B\""
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.pairing.unpaired, UnpairedPolicy::ReuseResponders);
        assert_eq!(settings.pairing.on_incomplete, OnIncomplete::Fail);
        assert_eq!(settings.rounds.num_pairs, 3);
        assert_eq!(settings.rounds.num_bonus, 1);
        assert!(settings.rounds.enabled());
        assert_eq!(settings.output.orientation, Orientation::B);
        assert_eq!(settings.pairing.shuffle_seed, Some(1234));
    }
}
