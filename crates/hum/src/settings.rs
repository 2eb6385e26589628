//! Turn loaded config plus command-line flags into typed humanizer options.

use anyhow::{anyhow, Result};
use clap::Args;
use humanize::{HumanizationConfig, PhraseDetectionMode, Style};
use humconf::HumConfig;
use midi_analysis::AnalysisOptions;

/// Flags that override `[humanize]` and `[analysis]` values.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// classical, pop, jazz or default
    #[arg(short, long)]
    pub style: Option<Style>,

    /// Phrase detection: auto, musical, rest or harmonic
    #[arg(short, long = "phrases")]
    pub phrase_detection: Option<PhraseDetectionMode>,

    /// Use the file's first tempo instead of 120 BPM
    #[arg(long)]
    pub honor_tempo: bool,
}

/// Flags only the humanize command takes.
#[derive(Args, Debug, Clone, Default)]
pub struct HumanizeFlags {
    /// 0 leaves notes untouched, 1 is nominal, 2 is heavy
    #[arg(short, long)]
    pub intensity: Option<f64>,

    /// Seed for repeatable output (defaults to the clock)
    #[arg(long, allow_hyphen_values = true)]
    pub seed: Option<i64>,

    #[arg(long)]
    pub velocity_scale: Option<f64>,

    #[arg(long)]
    pub timing_scale: Option<f64>,

    #[arg(long)]
    pub dynamic_scale: Option<f64>,
}

impl Overrides {
    pub fn apply(&self, config: &mut HumConfig) {
        if let Some(style) = self.style {
            config.humanize.style = style.to_string();
        }
        if let Some(mode) = self.phrase_detection {
            config.humanize.phrase_detection = mode.to_string();
        }
        if self.honor_tempo {
            config.analysis.honor_tempo = true;
        }
    }
}

impl HumanizeFlags {
    pub fn apply(&self, config: &mut HumConfig) {
        let h = &mut config.humanize;
        if let Some(v) = self.intensity {
            h.intensity = v;
        }
        if let Some(v) = self.seed {
            h.seed = Some(v);
        }
        if let Some(v) = self.velocity_scale {
            h.velocity_variation_scale = v;
        }
        if let Some(v) = self.timing_scale {
            h.timing_variation_scale = v;
        }
        if let Some(v) = self.dynamic_scale {
            h.dynamic_range_scale = v;
        }
    }
}

pub fn analysis_options(config: &HumConfig) -> Result<AnalysisOptions> {
    let a = &config.analysis;
    Ok(AnalysisOptions {
        style: parse_style(&config.humanize.style)?,
        phrase_detection: parse_mode(&config.humanize.phrase_detection)?,
        chord_window_ticks: a.chord_window_ticks,
        harmonic_stride_ticks: a.harmonic_stride_ticks,
        min_phrase_ms: a.min_phrase_ms,
        melody_onset_window: a.melody_onset_window,
        honor_tempo: a.honor_tempo,
    })
}

pub fn humanization_config(config: &HumConfig) -> Result<HumanizationConfig> {
    let analysis = analysis_options(config)?;
    let h = &config.humanize;
    Ok(HumanizationConfig {
        style: analysis.style,
        intensity: h.intensity,
        seed: h.seed,
        phrase_detection: analysis.phrase_detection,
        velocity_variation_scale: h.velocity_variation_scale,
        timing_variation_scale: h.timing_variation_scale,
        dynamic_range_scale: h.dynamic_range_scale,
        analysis,
    })
}

fn parse_style(raw: &str) -> Result<Style> {
    raw.parse().map_err(|e: String| anyhow!("humanize.style: {e}"))
}

fn parse_mode(raw: &str) -> Result<PhraseDetectionMode> {
    raw.parse()
        .map_err(|e: String| anyhow!("humanize.phrase_detection: {e}"))
}
