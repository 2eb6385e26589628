//! Velocity shaping for note onsets.
//!
//! The deviation added to a NoteOn's velocity is the sum of
//! a random jitter, a chord-role accent, and the phrase dynamics (arc within
//! the phrase plus the phrase's place in the whole track), finished with a
//! style-wide scalar. Every term is proportional to intensity.

use crate::rng::MwcRng;
use crate::style::StyleProfile;
use midi_analysis::{AnalysisResult, ChordQuality, Style, TimeBase};
use std::f64::consts::PI;

const ROOT_ACCENT: f64 = 5.0;
const CHORD_TONE_SPREAD: f64 = 8.0;
const MINOR_SHADE: f64 = 3.0;
const DIMINISHED_SPREAD: f64 = 10.0;

const BREATHING_MIN_SECONDS: f64 = 2.0;
const BREATHING_PERIOD_SECONDS: f64 = 2.0;
const BREATHING_DEPTH: f64 = 4.0;
const ARC_DEPTH: f64 = 6.0;
const RISE_PORTION: f64 = 0.3;
const FALL_PORTION: f64 = 0.2;

const MACRO_LIFT: f64 = 4.0;
const MACRO_DIP: f64 = 2.0;

const JAZZ_ACCENT_CHANCE: f64 = 0.3;
const JAZZ_ACCENT: f64 = 8.0;

#[derive(Debug, Clone)]
pub struct VelocityShaper {
    profile: StyleProfile,
    intensity: f64,
    variation_scale: f64,
    dynamic_scale: f64,
    timebase: TimeBase,
}

impl VelocityShaper {
    pub fn new(
        profile: StyleProfile,
        intensity: f64,
        variation_scale: f64,
        dynamic_scale: f64,
        timebase: TimeBase,
    ) -> Self {
        Self {
            profile,
            intensity,
            variation_scale,
            dynamic_scale,
            timebase,
        }
    }

    /// New velocity for a NoteOn of `pitch` at `tick`, in `1..=127`.
    ///
    /// Random draws, in order: the jitter, a chord-tone spread when the pitch
    /// is a non-root chord tone, a diminished spread when the chord is
    /// diminished, and the jazz accent roll.
    pub fn velocity(
        &self,
        pitch: u8,
        velocity: u8,
        tick: u64,
        analysis: &AnalysisResult,
        rng: &mut MwcRng,
    ) -> u8 {
        let i = self.intensity;
        let mut deviation =
            self.profile.velocity_variation * i * self.variation_scale * rng.next_signed();
        deviation += self.chord_role(pitch, tick, analysis, rng);
        deviation += (self.phrase_arc(tick, analysis) + self.macro_dynamics(tick, analysis))
            * self.dynamic_scale;

        deviation *= self.profile.deviation_scale();
        if self.profile.style == Style::Jazz && rng.chance(JAZZ_ACCENT_CHANCE) {
            deviation += i * JAZZ_ACCENT;
        }

        (velocity as f64 + deviation).round().clamp(1.0, 127.0) as u8
    }

    fn chord_role(&self, pitch: u8, tick: u64, analysis: &AnalysisResult, rng: &mut MwcRng) -> f64 {
        let Some(chord) = analysis.chord_at(tick) else {
            return 0.0;
        };
        let i = self.intensity;
        let pitch_class = pitch % 12;

        let mut adjustment = if pitch_class == chord.root {
            i * ROOT_ACCENT
        } else if chord.contains_pitch_class(pitch_class) {
            i * CHORD_TONE_SPREAD * rng.next_signed()
        } else {
            0.0
        };
        match chord.quality {
            ChordQuality::Minor => adjustment -= i * MINOR_SHADE,
            ChordQuality::Diminished => adjustment += i * DIMINISHED_SPREAD * rng.next_signed(),
            ChordQuality::Major | ChordQuality::Unknown => {}
        }
        adjustment
    }

    /// Rise and fall across the phrase, with slow breathing on long phrases.
    fn phrase_arc(&self, tick: u64, analysis: &AnalysisResult) -> f64 {
        let Some((_, phrase)) = analysis.phrase_at(tick) else {
            return 0.0;
        };
        let i = self.intensity;
        let p = phrase.position(tick);

        let mut arc = if p < RISE_PORTION {
            -i * ARC_DEPTH * (1.0 - p / RISE_PORTION)
        } else if p > 1.0 - FALL_PORTION {
            -i * ARC_DEPTH * ((p - (1.0 - FALL_PORTION)) / FALL_PORTION)
        } else {
            0.0
        };

        if self.timebase.ticks_to_seconds(phrase.duration()) > BREATHING_MIN_SECONDS {
            let elapsed = self
                .timebase
                .ticks_to_seconds(tick.saturating_sub(phrase.start));
            arc += i * BREATHING_DEPTH * (2.0 * PI * elapsed / BREATHING_PERIOD_SECONDS).sin();
        }

        arc * self.profile.arc_factor(p)
    }

    /// Middle phrases of the track louder, outer ones softer.
    fn macro_dynamics(&self, tick: u64, analysis: &AnalysisResult) -> f64 {
        let count = analysis.phrases.len();
        if count < 3 {
            return 0.0;
        }
        let Some((index, _)) = analysis.phrase_at(tick) else {
            return 0.0;
        };
        let center = (index as f64 + 0.5) / count as f64;
        if (1.0 / 3.0..2.0 / 3.0).contains(&center) {
            self.intensity * MACRO_LIFT
        } else {
            -self.intensity * MACRO_DIP
        }
    }
}
