//! Config file sections.

use serde::{Deserialize, Serialize};

/// `[humanize]` - how the transform behaves.
///
/// Style and phrase detection stay strings here; the consumer parses them so
/// this crate does not depend on the analysis types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanizeSection {
    /// classical, pop, jazz or default
    #[serde(default = "HumanizeSection::default_style")]
    pub style: String,

    #[serde(default = "HumanizeSection::default_intensity")]
    pub intensity: f64,

    /// Unset means a clock-derived seed on every run.
    #[serde(default)]
    pub seed: Option<i64>,

    /// auto, musical, rest or harmonic
    #[serde(default = "HumanizeSection::default_phrase_detection")]
    pub phrase_detection: String,

    #[serde(default = "default_scale")]
    pub velocity_variation_scale: f64,

    #[serde(default = "default_scale")]
    pub timing_variation_scale: f64,

    #[serde(default = "default_scale")]
    pub dynamic_range_scale: f64,
}

impl HumanizeSection {
    fn default_style() -> String {
        "default".to_string()
    }

    fn default_intensity() -> f64 {
        1.0
    }

    fn default_phrase_detection() -> String {
        "auto".to_string()
    }
}

fn default_scale() -> f64 {
    1.0
}

impl Default for HumanizeSection {
    fn default() -> Self {
        Self {
            style: Self::default_style(),
            intensity: Self::default_intensity(),
            seed: None,
            phrase_detection: Self::default_phrase_detection(),
            velocity_variation_scale: default_scale(),
            timing_variation_scale: default_scale(),
            dynamic_range_scale: default_scale(),
        }
    }
}

/// `[analysis]` - structure analyzer tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    #[serde(default = "AnalysisSection::default_chord_window_ticks")]
    pub chord_window_ticks: u64,

    #[serde(default = "AnalysisSection::default_harmonic_stride_ticks")]
    pub harmonic_stride_ticks: u64,

    #[serde(default = "AnalysisSection::default_min_phrase_ms")]
    pub min_phrase_ms: f64,

    #[serde(default = "AnalysisSection::default_melody_onset_window")]
    pub melody_onset_window: u64,

    /// Use the file's first tempo instead of 120 BPM for ms/tick conversion.
    #[serde(default)]
    pub honor_tempo: bool,
}

impl AnalysisSection {
    fn default_chord_window_ticks() -> u64 {
        960
    }

    fn default_harmonic_stride_ticks() -> u64 {
        480
    }

    fn default_min_phrase_ms() -> f64 {
        500.0
    }

    fn default_melody_onset_window() -> u64 {
        50
    }
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            chord_window_ticks: Self::default_chord_window_ticks(),
            harmonic_stride_ticks: Self::default_harmonic_stride_ticks(),
            min_phrase_ms: Self::default_min_phrase_ms(),
            melody_onset_window: Self::default_melody_onset_window(),
            honor_tempo: false,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// tracing EnvFilter directive, e.g. "info" or "humanize=debug"
    #[serde(default = "LoggingSection::default_level")]
    pub level: String,
}

impl LoggingSection {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}
