use midi_analysis::{AnalysisOptions, PhraseDetectionMode, Style};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings for one humanization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizationConfig {
    pub style: Style,
    /// 0 leaves the song untouched; 1 is the nominal amount, 2 is heavy
    pub intensity: f64,
    /// `None` seeds from the clock
    pub seed: Option<i64>,
    pub phrase_detection: PhraseDetectionMode,
    pub velocity_variation_scale: f64,
    pub timing_variation_scale: f64,
    pub dynamic_range_scale: f64,
    /// Analyzer tunables. Style and phrase mode above take precedence over
    /// the copies inside.
    pub analysis: AnalysisOptions,
}

impl Default for HumanizationConfig {
    fn default() -> Self {
        Self {
            style: Style::Default,
            intensity: 1.0,
            seed: None,
            phrase_detection: PhraseDetectionMode::Auto,
            velocity_variation_scale: 1.0,
            timing_variation_scale: 1.0,
            dynamic_range_scale: 1.0,
            analysis: AnalysisOptions::default(),
        }
    }
}

impl HumanizationConfig {
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_phrase_detection(mut self, mode: PhraseDetectionMode) -> Self {
        self.phrase_detection = mode;
        self
    }

    /// Analyzer options with this config's style and phrase mode applied.
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            style: self.style,
            phrase_detection: self.phrase_detection,
            ..self.analysis.clone()
        }
    }

    /// Copy with every numeric knob forced to a finite, non-negative value.
    pub fn sanitized(&self) -> Self {
        Self {
            intensity: non_negative("intensity", self.intensity, 0.0),
            velocity_variation_scale: non_negative(
                "velocity_variation_scale",
                self.velocity_variation_scale,
                1.0,
            ),
            timing_variation_scale: non_negative(
                "timing_variation_scale",
                self.timing_variation_scale,
                1.0,
            ),
            dynamic_range_scale: non_negative(
                "dynamic_range_scale",
                self.dynamic_range_scale,
                1.0,
            ),
            ..self.clone()
        }
    }
}

fn non_negative(name: &str, value: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        warn!(name, value, fallback, "non-finite setting replaced");
        return fallback;
    }
    if value < 0.0 {
        warn!(name, value, "negative setting clamped to 0");
        return 0.0;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HumanizationConfig::default();
        assert_eq!(config.intensity, 1.0);
        assert_eq!(config.seed, None);
        assert_eq!(config.timing_variation_scale, 1.0);
        assert_eq!(config.analysis.chord_window_ticks, 960);
    }

    #[test]
    fn sanitize_clamps_bad_numbers() {
        let config = HumanizationConfig {
            intensity: -3.0,
            timing_variation_scale: f64::NAN,
            dynamic_range_scale: f64::INFINITY,
            velocity_variation_scale: 0.5,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.intensity, 0.0);
        assert_eq!(config.timing_variation_scale, 1.0);
        assert_eq!(config.dynamic_range_scale, 1.0);
        assert_eq!(config.velocity_variation_scale, 0.5);
    }

    #[test]
    fn top_level_style_wins() {
        let config = HumanizationConfig::default()
            .with_style(Style::Jazz)
            .with_phrase_detection(PhraseDetectionMode::Rest);
        let options = config.analysis_options();
        assert_eq!(options.style, Style::Jazz);
        assert_eq!(options.phrase_detection, PhraseDetectionMode::Rest);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: HumanizationConfig =
            serde_json::from_str(r#"{"style":"pop","seed":42}"#).unwrap();
        assert_eq!(config.style, Style::Pop);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.intensity, 1.0);
    }
}
