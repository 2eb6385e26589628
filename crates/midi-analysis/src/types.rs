use serde::{Deserialize, Serialize};
use smf::Event;
use std::fmt;
use std::str::FromStr;

/// Musical style. Drives rhythm flags here and the humanizer's profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Classical,
    Pop,
    Jazz,
    #[default]
    Default,
}

impl Style {
    pub const ALL: [Style; 4] = [Style::Classical, Style::Pop, Style::Jazz, Style::Default];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Classical => "classical",
            Style::Pop => "pop",
            Style::Jazz => "jazz",
            Style::Default => "default",
        }
    }

    pub fn swings(&self) -> bool {
        matches!(self, Style::Jazz)
    }

    pub fn syncopates(&self) -> bool {
        matches!(self, Style::Jazz | Style::Pop)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classical" => Ok(Style::Classical),
            "pop" => Ok(Style::Pop),
            "jazz" => Ok(Style::Jazz),
            "default" => Ok(Style::Default),
            other => Err(format!(
                "unknown style '{other}' (expected classical, pop, jazz or default)"
            )),
        }
    }
}

/// Which phrase-boundary detectors contribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhraseDetectionMode {
    /// Weighted fusion of all three detectors
    #[default]
    Auto,
    Musical,
    Rest,
    Harmonic,
}

impl PhraseDetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhraseDetectionMode::Auto => "auto",
            PhraseDetectionMode::Musical => "musical",
            PhraseDetectionMode::Rest => "rest",
            PhraseDetectionMode::Harmonic => "harmonic",
        }
    }
}

impl fmt::Display for PhraseDetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhraseDetectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(PhraseDetectionMode::Auto),
            "musical" => Ok(PhraseDetectionMode::Musical),
            "rest" => Ok(PhraseDetectionMode::Rest),
            "harmonic" => Ok(PhraseDetectionMode::Harmonic),
            other => Err(format!(
                "unknown phrase detection mode '{other}' (expected auto, musical, rest or harmonic)"
            )),
        }
    }
}

/// Tunables for one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub style: Style,
    pub phrase_detection: PhraseDetectionMode,
    pub chord_window_ticks: u64,
    pub harmonic_stride_ticks: u64,
    /// Shortest phrase kept after merging, in milliseconds
    pub min_phrase_ms: f64,
    /// Onsets this close to a group's first onset count as simultaneous
    pub melody_onset_window: u64,
    /// Use the first tempo event instead of a fixed 120 BPM
    pub honor_tempo: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            style: Style::Default,
            phrase_detection: PhraseDetectionMode::Auto,
            chord_window_ticks: 960,
            harmonic_stride_ticks: 480,
            min_phrase_ms: 500.0,
            melody_onset_window: 50,
            honor_tempo: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Unknown,
}

impl ChordQuality {
    /// Suffix for chord symbol display
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Unknown => "?",
        }
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "diminished",
            ChordQuality::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Pitch-class content of one fixed analysis window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSegment {
    pub time: u64,
    pub duration: u64,
    /// Sorted, deduplicated, 0–11
    pub pitch_classes: Vec<u8>,
    pub quality: ChordQuality,
    /// Lowest pitch class present
    pub root: u8,
}

impl ChordSegment {
    pub fn end(&self) -> u64 {
        self.time + self.duration
    }

    pub fn contains_tick(&self, tick: u64) -> bool {
        tick >= self.time && tick < self.end()
    }

    pub fn contains_pitch_class(&self, pitch_class: u8) -> bool {
        self.pitch_classes.binary_search(&(pitch_class % 12)).is_ok()
    }

    /// "C", "Am", "Bdim", or "F#?" when the quality is unknown.
    pub fn symbol(&self) -> String {
        format!(
            "{}{}",
            crate::chords::note_name(self.root),
            self.quality.suffix()
        )
    }
}

/// A contiguous span of a track judged to be one musical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseSegment {
    pub start: u64,
    pub end: u64,
    /// Events whose time falls inside the phrase, in track order
    pub events: Vec<Event>,
}

impl PhraseSegment {
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Relative position of `tick` inside the phrase, clamped to `[0, 1]`.
    pub fn position(&self, tick: u64) -> f64 {
        let duration = self.duration();
        if duration == 0 {
            return 0.0;
        }
        (tick.saturating_sub(self.start) as f64 / duration as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contour {
    Up,
    Down,
    Same,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MelodySummary {
    /// Highest pitch of each onset group
    pub pitches: Vec<u8>,
    pub lowest: u8,
    pub highest: u8,
    pub average_pitch: f64,
    pub contour: Vec<Contour>,
}

impl MelodySummary {
    pub fn range(&self) -> u8 {
        self.highest.saturating_sub(self.lowest)
    }

    pub fn count(&self, direction: Contour) -> usize {
        self.contour.iter().filter(|c| **c == direction).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RhythmSummary {
    pub average_duration: f64,
    pub swing: bool,
    pub syncopation: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicTrend {
    Crescendo,
    Diminuendo,
    #[default]
    Stable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicsSummary {
    pub average_velocity: f64,
    pub min_velocity: u8,
    pub max_velocity: u8,
    pub trend: DynamicTrend,
}

/// Structure of one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub track_index: usize,
    pub name: Option<String>,
    pub style: Style,
    pub note_count: usize,
    pub phrases: Vec<PhraseSegment>,
    pub chords: Vec<ChordSegment>,
    pub melody: MelodySummary,
    pub rhythm: RhythmSummary,
    pub dynamics: DynamicsSummary,
}

impl AnalysisResult {
    /// The chord window covering `tick`, if that window held a chord.
    pub fn chord_at(&self, tick: u64) -> Option<&ChordSegment> {
        let idx = self.chords.partition_point(|c| c.time <= tick);
        idx.checked_sub(1)
            .map(|i| &self.chords[i])
            .filter(|c| c.contains_tick(tick))
    }

    /// Index and phrase containing `tick`. The final phrase also owns its end
    /// tick.
    pub fn phrase_at(&self, tick: u64) -> Option<(usize, &PhraseSegment)> {
        let last = self.phrases.len().checked_sub(1)?;
        self.phrases.iter().enumerate().find(|(i, p)| {
            tick >= p.start && (tick < p.end || (*i == last && tick == p.end))
        })
    }
}

/// Per-track analyses of a whole song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongAnalysis {
    pub ticks_per_quarter: u16,
    pub bpm: f64,
    pub tracks: Vec<AnalysisResult>,
}

impl SongAnalysis {
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.note_count).sum()
    }

    pub fn phrase_count(&self) -> usize {
        self.tracks.iter().map(|t| t.phrases.len()).sum()
    }

    pub fn chord_count(&self) -> usize {
        self.tracks.iter().map(|t| t.chords.len()).sum()
    }

    /// One-line description for logs and the CLI.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "{} track{}, {} notes, {} phrases, {} chords",
            self.tracks.len(),
            if self.tracks.len() == 1 { "" } else { "s" },
            self.note_count(),
            self.phrase_count(),
            self.chord_count()
        )];

        let voiced: Vec<String> = self
            .tracks
            .iter()
            .filter(|t| t.note_count > 0)
            .map(|t| match &t.name {
                Some(name) => format!("{name} ({})", t.note_count),
                None => format!("track {} ({})", t.track_index, t.note_count),
            })
            .collect();
        if !voiced.is_empty() {
            parts.push(format!("voiced: {}", voiced.join(", ")));
        }

        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(time: u64, pcs: &[u8], quality: ChordQuality, root: u8) -> ChordSegment {
        ChordSegment {
            time,
            duration: 960,
            pitch_classes: pcs.to_vec(),
            quality,
            root,
        }
    }

    fn result_with(chords: Vec<ChordSegment>, phrases: Vec<PhraseSegment>) -> AnalysisResult {
        AnalysisResult {
            track_index: 0,
            name: None,
            style: Style::Default,
            note_count: 0,
            phrases,
            chords,
            melody: MelodySummary::default(),
            rhythm: RhythmSummary::default(),
            dynamics: DynamicsSummary::default(),
        }
    }

    #[test]
    fn style_parses_case_insensitively() {
        assert_eq!("Jazz".parse::<Style>(), Ok(Style::Jazz));
        assert_eq!(" pop ".parse::<Style>(), Ok(Style::Pop));
        assert!("polka".parse::<Style>().is_err());
        for style in Style::ALL {
            assert_eq!(style.to_string().parse::<Style>(), Ok(style));
        }
    }

    #[test]
    fn style_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Style::Classical).unwrap(),
            "\"classical\""
        );
        let mode: PhraseDetectionMode = serde_json::from_str("\"harmonic\"").unwrap();
        assert_eq!(mode, PhraseDetectionMode::Harmonic);
    }

    #[test]
    fn chord_symbols() {
        assert_eq!(chord(0, &[0, 4, 7], ChordQuality::Major, 0).symbol(), "C");
        assert_eq!(chord(0, &[0, 4, 9], ChordQuality::Minor, 9).symbol(), "Am");
        assert_eq!(
            chord(0, &[2, 5, 11], ChordQuality::Diminished, 11).symbol(),
            "Bdim"
        );
        assert_eq!(chord(0, &[1, 6], ChordQuality::Unknown, 6).symbol(), "F#?");
    }

    #[test]
    fn chord_lookup_respects_gaps() {
        let result = result_with(
            vec![
                chord(0, &[0, 4, 7], ChordQuality::Major, 0),
                chord(1920, &[2, 5, 9], ChordQuality::Minor, 2),
            ],
            vec![],
        );
        assert_eq!(result.chord_at(500).map(|c| c.root), Some(0));
        assert!(result.chord_at(1000).is_none());
        assert_eq!(result.chord_at(1920).map(|c| c.root), Some(2));
        assert!(result.chord_at(2880).is_none());
    }

    #[test]
    fn final_phrase_owns_its_end_tick() {
        let phrase = |start, end| PhraseSegment {
            start,
            end,
            events: vec![],
        };
        let result = result_with(vec![], vec![phrase(0, 960), phrase(960, 1920)]);
        assert_eq!(result.phrase_at(0).map(|(i, _)| i), Some(0));
        assert_eq!(result.phrase_at(960).map(|(i, _)| i), Some(1));
        assert_eq!(result.phrase_at(1920).map(|(i, _)| i), Some(1));
        assert!(result.phrase_at(1921).is_none());
        assert_eq!(phrase(100, 300).position(200), 0.5);
    }
}
