//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, HumConfig};
use std::env;
use std::path::{Path, PathBuf};
use toml::Value;

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files
/// that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local `./humanize.toml`. A CLI
/// path that does not exist is still returned so loading reports it.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/humanize/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("humanize/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("humanize.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read `path` and lay its values over `base`.
pub fn load_from_file(path: &Path, base: HumConfig) -> Result<HumConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path, base)
}

/// Lay the values present in a TOML document over `base`. Keys the document
/// leaves out keep their `base` value.
pub fn parse_toml(contents: &str, path: &Path, base: HumConfig) -> Result<HumConfig, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut config = base;
    let field = |section: &str, key: &str| Field {
        path,
        section: section.to_string(),
        key: key.to_string(),
    };

    if let Some(humanize) = table.get("humanize").and_then(|v| v.as_table()) {
        let h = &mut config.humanize;
        if let Some(v) = humanize.get("style") {
            h.style = field("humanize", "style").string(v)?;
        }
        if let Some(v) = humanize.get("intensity") {
            h.intensity = field("humanize", "intensity").float(v)?;
        }
        if let Some(v) = humanize.get("seed") {
            h.seed = Some(field("humanize", "seed").integer(v)?);
        }
        if let Some(v) = humanize.get("phrase_detection") {
            h.phrase_detection = field("humanize", "phrase_detection").string(v)?;
        }
        if let Some(v) = humanize.get("velocity_variation_scale") {
            h.velocity_variation_scale = field("humanize", "velocity_variation_scale").float(v)?;
        }
        if let Some(v) = humanize.get("timing_variation_scale") {
            h.timing_variation_scale = field("humanize", "timing_variation_scale").float(v)?;
        }
        if let Some(v) = humanize.get("dynamic_range_scale") {
            h.dynamic_range_scale = field("humanize", "dynamic_range_scale").float(v)?;
        }
    }

    if let Some(analysis) = table.get("analysis").and_then(|v| v.as_table()) {
        let a = &mut config.analysis;
        if let Some(v) = analysis.get("chord_window_ticks") {
            a.chord_window_ticks = field("analysis", "chord_window_ticks").ticks(v)?;
        }
        if let Some(v) = analysis.get("harmonic_stride_ticks") {
            a.harmonic_stride_ticks = field("analysis", "harmonic_stride_ticks").ticks(v)?;
        }
        if let Some(v) = analysis.get("min_phrase_ms") {
            a.min_phrase_ms = field("analysis", "min_phrase_ms").float(v)?;
        }
        if let Some(v) = analysis.get("melody_onset_window") {
            a.melody_onset_window = field("analysis", "melody_onset_window").ticks(v)?;
        }
        if let Some(v) = analysis.get("honor_tempo") {
            a.honor_tempo = field("analysis", "honor_tempo").boolean(v)?;
        }
    }

    if let Some(logging) = table.get("logging").and_then(|v| v.as_table()) {
        if let Some(v) = logging.get("level") {
            config.logging.level = field("logging", "level").string(v)?;
        }
    }

    Ok(config)
}

/// Names one key in one file, for error messages.
struct Field<'a> {
    path: &'a Path,
    section: String,
    key: String,
}

impl Field<'_> {
    fn invalid(&self, expected: &str, value: &Value) -> ConfigError {
        ConfigError::InvalidValue {
            path: self.path.to_path_buf(),
            key: format!("{}.{}", self.section, self.key),
            message: format!("expected {}, found {}", expected, value.type_str()),
        }
    }

    fn string(&self, value: &Value) -> Result<String, ConfigError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid("a string", value))
    }

    /// Integers are accepted where a float is expected.
    fn float(&self, value: &Value) -> Result<f64, ConfigError> {
        value
            .as_float()
            .or_else(|| value.as_integer().map(|i| i as f64))
            .ok_or_else(|| self.invalid("a number", value))
    }

    fn integer(&self, value: &Value) -> Result<i64, ConfigError> {
        value
            .as_integer()
            .ok_or_else(|| self.invalid("an integer", value))
    }

    fn ticks(&self, value: &Value) -> Result<u64, ConfigError> {
        self.integer(value)?
            .try_into()
            .ok()
            .filter(|&ticks: &u64| ticks > 0)
            .ok_or_else(|| self.invalid("a positive integer", value))
    }

    fn boolean(&self, value: &Value) -> Result<bool, ConfigError> {
        value
            .as_bool()
            .ok_or_else(|| self.invalid("a boolean", value))
    }
}

/// Apply `HUMANIZE_*` environment variable overrides to config.
pub fn apply_env_overrides(
    config: &mut HumConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides_from(config, sources, |name| env::var(name).ok())
}

/// Same as [`apply_env_overrides`] with an injectable variable lookup.
pub fn apply_overrides_from(
    config: &mut HumConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    fn parsed<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
        raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name: name.to_string(),
            value: raw.to_string(),
        })
    }

    let mut take = |name: &str| {
        let value = lookup(name);
        if value.is_some() {
            sources.env_overrides.push(name.to_string());
        }
        value
    };

    if let Some(v) = take("HUMANIZE_STYLE") {
        config.humanize.style = v;
    }
    if let Some(v) = take("HUMANIZE_INTENSITY") {
        config.humanize.intensity = parsed("HUMANIZE_INTENSITY", &v)?;
    }
    if let Some(v) = take("HUMANIZE_SEED") {
        config.humanize.seed = Some(parsed("HUMANIZE_SEED", &v)?);
    }
    if let Some(v) = take("HUMANIZE_PHRASE_DETECTION") {
        config.humanize.phrase_detection = v;
    }
    if let Some(v) = take("HUMANIZE_VELOCITY_SCALE") {
        config.humanize.velocity_variation_scale = parsed("HUMANIZE_VELOCITY_SCALE", &v)?;
    }
    if let Some(v) = take("HUMANIZE_TIMING_SCALE") {
        config.humanize.timing_variation_scale = parsed("HUMANIZE_TIMING_SCALE", &v)?;
    }
    if let Some(v) = take("HUMANIZE_DYNAMIC_SCALE") {
        config.humanize.dynamic_range_scale = parsed("HUMANIZE_DYNAMIC_SCALE", &v)?;
    }
    if let Some(v) = take("HUMANIZE_HONOR_TEMPO") {
        config.analysis.honor_tempo = parsed("HUMANIZE_HONOR_TEMPO", &v)?;
    }
    if let Some(v) = take("HUMANIZE_LOG_LEVEL") {
        config.logging.level = v;
    }

    Ok(())
}
