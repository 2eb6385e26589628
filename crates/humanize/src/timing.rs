//! Timing offsets for note onsets and control events.

use crate::rng::MwcRng;
use crate::style::StyleProfile;
use midi_analysis::AnalysisResult;

/// Running groove drift never exceeds this many ticks either way.
pub const MAX_DRIFT: f64 = 50.0;
const DRIFT_DECAY: f64 = 0.9;
const DRIFT_WEIGHT: f64 = 0.1;

const SWING_DELAY: f64 = 8.0;
const SYNCOPATION_ADVANCE: f64 = 3.0;
const PHRASE_RELAX: f64 = 2.0;
const RITARDANDO: f64 = 3.0;
const JAZZ_SUBDIVISION_TICKS: u64 = 48;
const JAZZ_SUBDIVISION_DELAY: f64 = 2.5;
const CONTROL_JITTER: f64 = 0.5;

/// Largest total note offset: 8% of a beat, never more than 40 ticks.
pub fn max_offset(ticks_per_quarter: u16) -> f64 {
    (0.08 * ticks_per_quarter as f64).min(40.0)
}

/// Stateful per-track timing shaper. The drift term carries across notes,
/// so one shaper must see a track's notes in order.
#[derive(Debug, Clone)]
pub struct TimingShaper {
    profile: StyleProfile,
    intensity: f64,
    scale: f64,
    ticks_per_quarter: u64,
    drift: f64,
}

impl TimingShaper {
    pub fn new(profile: StyleProfile, intensity: f64, scale: f64, ticks_per_quarter: u16) -> Self {
        Self {
            profile,
            intensity,
            scale,
            ticks_per_quarter: ticks_per_quarter.max(1) as u64,
            drift: 0.0,
        }
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    /// Whole-tick offset for a note starting at `tick`. Draws exactly one
    /// random value.
    pub fn note_offset(&mut self, tick: u64, analysis: &AnalysisResult, rng: &mut MwcRng) -> i64 {
        let i = self.intensity;
        let mut own = self.profile.timing_variation * i * rng.next_signed();
        own += self.groove(tick);
        own += self.phrase_shape(tick, analysis);
        if self.profile.swing && (tick / JAZZ_SUBDIVISION_TICKS) % 2 == 1 {
            own += i * JAZZ_SUBDIVISION_DELAY;
        }

        self.drift = (self.drift * DRIFT_DECAY + own * DRIFT_WEIGHT).clamp(-MAX_DRIFT, MAX_DRIFT);

        let limit = max_offset(self.ticks_per_quarter as u16);
        ((own + self.drift) * self.scale).clamp(-limit, limit).round() as i64
    }

    /// Small independent jitter for non-note channel events.
    pub fn control_offset(&self, rng: &mut MwcRng) -> i64 {
        (CONTROL_JITTER * self.intensity * rng.next_signed()).round() as i64
    }

    fn groove(&self, tick: u64) -> f64 {
        let tolerance = self.ticks_per_quarter / 16;
        if self.profile.swing {
            let eighth = (self.ticks_per_quarter / 2).max(1);
            match nearest_grid(tick, eighth, tolerance) {
                Some(index) if index % 2 == 1 => self.intensity * SWING_DELAY,
                _ => 0.0,
            }
        } else if self.profile.syncopation {
            // beats 1 and 3 of a 4/4 bar
            match nearest_grid(tick, self.ticks_per_quarter, tolerance) {
                Some(index) if index % 2 == 0 => -self.intensity * SYNCOPATION_ADVANCE,
                _ => 0.0,
            }
        } else {
            0.0
        }
    }

    fn phrase_shape(&self, tick: u64, analysis: &AnalysisResult) -> f64 {
        let Some((_, phrase)) = analysis.phrase_at(tick) else {
            return 0.0;
        };
        let p = phrase.position(tick);
        if p < 0.2 {
            self.intensity * PHRASE_RELAX * (1.0 - p / 0.2)
        } else if p > 0.8 {
            self.intensity * RITARDANDO * ((p - 0.8) / 0.2)
        } else {
            0.0
        }
    }
}

/// Index of the grid line within `tolerance` ticks of `tick`, if any.
fn nearest_grid(tick: u64, spacing: u64, tolerance: u64) -> Option<u64> {
    let index = (tick + spacing / 2) / spacing;
    let line = index * spacing;
    (tick.abs_diff(line) <= tolerance).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_analysis::{
        AnalysisResult, DynamicsSummary, MelodySummary, PhraseSegment, RhythmSummary, Style,
    };

    fn analysis(phrases: Vec<(u64, u64)>) -> AnalysisResult {
        AnalysisResult {
            track_index: 0,
            name: None,
            style: Style::Default,
            note_count: 0,
            phrases: phrases
                .into_iter()
                .map(|(start, end)| PhraseSegment {
                    start,
                    end,
                    events: vec![],
                })
                .collect(),
            chords: vec![],
            melody: MelodySummary::default(),
            rhythm: RhythmSummary::default(),
            dynamics: DynamicsSummary::default(),
        }
    }

    fn shaper(style: Style, intensity: f64) -> TimingShaper {
        TimingShaper::new(StyleProfile::for_style(style), intensity, 1.0, 480)
    }

    #[test]
    fn offset_limit() {
        assert!((max_offset(480) - 38.4).abs() < 1e-9);
        assert_eq!(max_offset(960), 40.0);
        assert!((max_offset(96) - 7.68).abs() < 1e-9);
    }

    #[test]
    fn zero_intensity_never_moves() {
        let a = analysis(vec![(0, 4800)]);
        let mut rng = MwcRng::new(1);
        for style in Style::ALL {
            let mut s = shaper(style, 0.0);
            for tick in (0..4800).step_by(120) {
                assert_eq!(s.note_offset(tick, &a, &mut rng), 0);
                assert_eq!(s.control_offset(&mut rng), 0);
            }
        }
    }

    #[test]
    fn offsets_stay_within_limit() {
        let a = analysis(vec![(0, 9600)]);
        let mut rng = MwcRng::new(77);
        let mut s = TimingShaper::new(StyleProfile::for_style(Style::Jazz), 2.0, 5.0, 480);
        for tick in (0..9600).step_by(60) {
            let offset = s.note_offset(tick, &a, &mut rng);
            assert!(offset.abs() <= 38, "offset {offset} at {tick}");
            assert!(s.drift().abs() <= MAX_DRIFT);
        }
    }

    #[test]
    fn grid_detection() {
        assert_eq!(nearest_grid(240, 240, 30), Some(1));
        assert_eq!(nearest_grid(265, 240, 30), Some(1));
        assert_eq!(nearest_grid(300, 240, 30), None);
        assert_eq!(nearest_grid(470, 240, 30), Some(2));
    }

    #[test]
    fn swing_delays_off_beat_eighths() {
        let s = shaper(Style::Jazz, 1.0);
        assert_eq!(s.groove(240), SWING_DELAY);
        assert_eq!(s.groove(480), 0.0);
    }

    #[test]
    fn pop_pushes_strong_beats() {
        let s = shaper(Style::Pop, 1.0);
        assert_eq!(s.groove(0), -SYNCOPATION_ADVANCE);
        assert_eq!(s.groove(480), 0.0);
        assert_eq!(s.groove(960), -SYNCOPATION_ADVANCE);
        assert_eq!(shaper(Style::Classical, 1.0).groove(0), 0.0);
    }

    #[test]
    fn phrase_edges_are_shaped() {
        let a = analysis(vec![(0, 1000)]);
        let s = shaper(Style::Default, 1.0);
        assert_eq!(s.phrase_shape(0, &a), PHRASE_RELAX);
        assert_eq!(s.phrase_shape(500, &a), 0.0);
        assert!((s.phrase_shape(1000, &a) - RITARDANDO).abs() < 1e-9);
        assert_eq!(s.phrase_shape(5000, &a), 0.0);
    }
}
