//! Musical structure of decoded MIDI tracks: notes, chords, phrases, and
//! melody/rhythm/dynamics profiles.

pub mod analyze;
pub mod chords;
pub mod note;
pub mod phrases;
pub mod playback;
pub mod profile;
pub mod timebase;
pub mod types;

pub use analyze::{
    analyze_bytes, analyze_song, analyze_song_with, analyze_track, analyze_track_with,
    HeuristicAnalyzer, TrackAnalyzer,
};
pub use chords::{detect_chords, note_name, pitch_name};
pub use note::{extract_notes, Note};
pub use playback::{flatten_notes, PlaybackNote};
pub use timebase::TimeBase;
pub use types::{
    AnalysisOptions, AnalysisResult, ChordQuality, ChordSegment, Contour, DynamicTrend,
    DynamicsSummary, MelodySummary, PhraseDetectionMode, PhraseSegment, RhythmSummary,
    SongAnalysis, Style,
};

/// Errors from MIDI analysis operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI decode error: {0}")]
    Decode(#[from] smf::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
