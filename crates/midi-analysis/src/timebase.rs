use serde::{Deserialize, Serialize};
use smf::Song;

pub const DEFAULT_BPM: f64 = 120.0;

/// Tick/wall-clock conversion at a single tempo.
///
/// Tempo events are ignored unless a caller opts in with
/// [`TimeBase::from_song`]; even then only the first tempo applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBase {
    pub ticks_per_quarter: u16,
    pub bpm: f64,
}

impl TimeBase {
    pub fn new(ticks_per_quarter: u16) -> Self {
        Self {
            ticks_per_quarter: ticks_per_quarter.max(1),
            bpm: DEFAULT_BPM,
        }
    }

    pub fn with_bpm(self, bpm: f64) -> Self {
        let bpm = if bpm.is_finite() && bpm > 0.0 {
            bpm
        } else {
            DEFAULT_BPM
        };
        Self { bpm, ..self }
    }

    pub fn from_song(song: &Song, honor_tempo: bool) -> Self {
        let base = Self::new(song.ticks_per_quarter());
        if !honor_tempo {
            return base;
        }
        match song.tempo_changes().first() {
            Some(tempo) => base.with_bpm(tempo.bpm()),
            None => base,
        }
    }

    pub fn seconds_per_tick(&self) -> f64 {
        60.0 / (self.bpm * self.ticks_per_quarter as f64)
    }

    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 * self.seconds_per_tick()
    }

    pub fn seconds_to_ticks(&self, seconds: f64) -> f64 {
        seconds / self.seconds_per_tick()
    }

    /// Milliseconds to whole ticks, rounded.
    pub fn ms_to_ticks(&self, ms: f64) -> u64 {
        self.seconds_to_ticks(ms / 1000.0).round().max(0.0) as u64
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new(smf::FALLBACK_TICKS_PER_QUARTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smf::{Event, EventKind, Format, MetaEvent, Track};

    fn song_at(microseconds_per_quarter: u32) -> Song {
        let tempo = Event::new(
            0,
            EventKind::Meta(MetaEvent::Tempo {
                microseconds_per_quarter,
            }),
        );
        Song::new(Format::SingleTrack, 480, vec![Track::from(vec![tempo])])
    }

    #[test]
    fn default_tempo_conversions() {
        let tb = TimeBase::new(480);
        assert_eq!(tb.ticks_to_seconds(480), 0.5);
        assert_eq!(tb.ms_to_ticks(500.0), 480);
        assert_eq!(TimeBase::new(960).ms_to_ticks(500.0), 960);
    }

    #[test]
    fn tempo_is_opt_in() {
        let song = song_at(1_000_000);
        assert_eq!(TimeBase::from_song(&song, false).bpm, 120.0);

        let honored = TimeBase::from_song(&song, true);
        assert_eq!(honored.bpm, 60.0);
        assert_eq!(honored.ticks_to_seconds(480), 1.0);
        assert_eq!(honored.ms_to_ticks(500.0), 240);
    }

    #[test]
    fn nonsense_bpm_falls_back() {
        assert_eq!(TimeBase::new(480).with_bpm(0.0).bpm, DEFAULT_BPM);
        assert_eq!(TimeBase::new(480).with_bpm(f64::NAN).bpm, DEFAULT_BPM);
    }
}
