//! Configuration loading for the MIDI humanizer.
//!
//! Values are plain data (strings and numbers); the humanize crates turn
//! them into typed options. Keeping this crate free of those dependencies
//! lets any binary load config without pulling in the analysis stack.
//!
//! # Usage
//!
//! ```rust,no_run
//! use humconf::HumConfig;
//!
//! let config = HumConfig::load().expect("Failed to load config");
//! println!("style: {}", config.humanize.style);
//! println!("intensity: {}", config.humanize.intensity);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/humanize/config.toml` (system)
//! 2. `~/.config/humanize/config.toml` (user)
//! 3. `./humanize.toml` (local override, replaced by `--config`)
//! 4. Environment variables (`HUMANIZE_*`)
//!
//! # Example Config
//!
//! ```toml
//! [humanize]
//! style = "jazz"
//! intensity = 1.2
//! seed = 42
//! phrase_detection = "auto"
//!
//! [analysis]
//! chord_window_ticks = 960
//! min_phrase_ms = 500.0
//!
//! [logging]
//! level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{AnalysisSection, HumanizeSection, LoggingSection};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key} in {path}: {message}")]
    InvalidValue {
        path: PathBuf,
        key: String,
        message: String,
    },

    #[error("Invalid value for environment variable {name}: {value:?}")]
    InvalidEnv { name: String, value: String },
}

/// Complete humanizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HumConfig {
    #[serde(default)]
    pub humanize: HumanizeSection,

    #[serde(default)]
    pub analysis: AnalysisSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl HumConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/humanize/config.toml`
    /// 3. `~/.config/humanize/config.toml`
    /// 4. `./humanize.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` standing in for `./humanize.toml`.
    /// System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and return information about sources.
    pub fn load_with_sources() -> Result<(Self, ConfigSources), ConfigError> {
        Self::load_with_sources_from(None)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = HumConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            config = loader::load_from_file(&path, config)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand so an unset seed shows up as a commented hint
        let mut output = String::new();

        output.push_str("# MIDI humanizer configuration\n\n");

        let h = &self.humanize;
        output.push_str("[humanize]\n");
        output.push_str(&format!("style = {}\n", quoted(&h.style)));
        output.push_str(&format!("intensity = {:?}\n", h.intensity));
        match h.seed {
            Some(seed) => output.push_str(&format!("seed = {}\n", seed)),
            None => output.push_str("# seed = 42\n"),
        }
        output.push_str(&format!(
            "phrase_detection = {}\n",
            quoted(&h.phrase_detection)
        ));
        output.push_str(&format!(
            "velocity_variation_scale = {:?}\n",
            h.velocity_variation_scale
        ));
        output.push_str(&format!(
            "timing_variation_scale = {:?}\n",
            h.timing_variation_scale
        ));
        output.push_str(&format!(
            "dynamic_range_scale = {:?}\n",
            h.dynamic_range_scale
        ));

        let a = &self.analysis;
        output.push_str("\n[analysis]\n");
        output.push_str(&format!("chord_window_ticks = {}\n", a.chord_window_ticks));
        output.push_str(&format!(
            "harmonic_stride_ticks = {}\n",
            a.harmonic_stride_ticks
        ));
        output.push_str(&format!("min_phrase_ms = {:?}\n", a.min_phrase_ms));
        output.push_str(&format!(
            "melody_onset_window = {}\n",
            a.melody_onset_window
        ));
        output.push_str(&format!("honor_tempo = {}\n", a.honor_tempo));

        output.push_str("\n[logging]\n");
        output.push_str(&format!("level = {}\n", quoted(&self.logging.level)));

        output
    }
}

fn quoted(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HumConfig::default();
        assert_eq!(config.humanize.style, "default");
        assert_eq!(config.humanize.intensity, 1.0);
        assert_eq!(config.humanize.seed, None);
        assert_eq!(config.humanize.phrase_detection, "auto");
        assert_eq!(config.analysis.min_phrase_ms, 500.0);
        assert!(!config.analysis.honor_tempo);
    }

    #[test]
    fn test_to_toml() {
        let config = HumConfig::default();
        let toml = config.to_toml();
        assert!(toml.contains("[humanize]"));
        assert!(toml.contains("[analysis]"));
        assert!(toml.contains("[logging]"));
        assert!(toml.contains("# seed = 42"));
        assert!(toml.contains("intensity = 1.0"));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = HumConfig::default();
        config.humanize.style = "jazz".to_string();
        config.humanize.seed = Some(-3);
        config.humanize.intensity = 0.75;
        config.analysis.honor_tempo = true;
        config.logging.level = "humanize=debug,warn".to_string();

        let reparsed = loader::parse_toml(
            &config.to_toml(),
            Path::new("roundtrip.toml"),
            HumConfig::default(),
        )
        .unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_serde_defaults_fill_missing_sections() {
        let config: HumConfig = toml::from_str("[humanize]\nstyle = \"pop\"\n").unwrap();
        assert_eq!(config.humanize.style, "pop");
        assert_eq!(config.analysis, AnalysisSection::default());
        assert_eq!(config.logging.level, "info");
    }
}
