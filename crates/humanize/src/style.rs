use midi_analysis::Style;
use std::f64::consts::PI;

/// Per-style constants for the timing and velocity shapers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleProfile {
    pub style: Style,
    /// Peak random timing deviation in ticks at intensity 1
    pub timing_variation: f64,
    /// Peak random velocity deviation at intensity 1
    pub velocity_variation: f64,
    pub swing: bool,
    pub syncopation: bool,
}

impl StyleProfile {
    pub fn for_style(style: Style) -> Self {
        let (timing_variation, velocity_variation) = match style {
            Style::Classical => (8.0, 10.0),
            Style::Jazz => (12.0, 12.0),
            Style::Pop => (4.0, 6.0),
            Style::Default => (6.0, 8.0),
        };
        Self {
            style,
            timing_variation,
            velocity_variation,
            swing: style.swings(),
            syncopation: style.syncopates(),
        }
    }

    /// How strongly the phrase arc shows at relative position `p`.
    pub fn arc_factor(&self, p: f64) -> f64 {
        match self.style {
            Style::Classical => 1.4,
            Style::Jazz => 1.0 + 0.3 * (4.0 * PI * p).sin(),
            Style::Pop => 0.7,
            Style::Default => 1.0,
        }
    }

    /// Multiplier applied to the summed velocity deviation.
    pub fn deviation_scale(&self) -> f64 {
        match self.style {
            Style::Classical => 1.2,
            Style::Pop => 0.8,
            Style::Jazz | Style::Default => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groove_flags() {
        let jazz = StyleProfile::for_style(Style::Jazz);
        assert!(jazz.swing && jazz.syncopation);
        let pop = StyleProfile::for_style(Style::Pop);
        assert!(!pop.swing && pop.syncopation);
        let classical = StyleProfile::for_style(Style::Classical);
        assert!(!classical.swing && !classical.syncopation);
    }

    #[test]
    fn jazz_arc_is_modulated() {
        let jazz = StyleProfile::for_style(Style::Jazz);
        assert!((jazz.arc_factor(0.0) - 1.0).abs() < 1e-12);
        assert!((jazz.arc_factor(0.125) - 1.3).abs() < 1e-12);
        assert_eq!(StyleProfile::for_style(Style::Pop).arc_factor(0.5), 0.7);
    }
}
