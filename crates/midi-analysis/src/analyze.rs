use crate::chords::detect_chords;
use crate::note::{extract_notes, Note};
use crate::phrases::{build_phrases, detect_boundaries};
use crate::profile::{dynamics_summary, melody_summary, rhythm_summary};
use crate::timebase::TimeBase;
use crate::types::{
    AnalysisOptions, AnalysisResult, ChordSegment, DynamicsSummary, MelodySummary,
    PhraseSegment, RhythmSummary, SongAnalysis,
};
use crate::Result;
use smf::{Song, Track};
use tracing::{debug, info};

/// Analysis backend seam. [`HeuristicAnalyzer`] is the only implementation;
/// the pipeline is generic so alternatives can be swapped in for testing.
pub trait TrackAnalyzer {
    fn chords(&self, notes: &[Note], options: &AnalysisOptions) -> Vec<ChordSegment>;

    fn phrases(
        &self,
        track: &Track,
        notes: &[Note],
        options: &AnalysisOptions,
        timebase: &TimeBase,
    ) -> Vec<PhraseSegment>;

    fn melody(&self, notes: &[Note], options: &AnalysisOptions) -> MelodySummary;

    fn rhythm(&self, notes: &[Note], options: &AnalysisOptions) -> RhythmSummary;

    fn dynamics(&self, notes: &[Note], options: &AnalysisOptions) -> DynamicsSummary;
}

/// Fixed-window chords, fused boundary detectors, skyline melody.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

impl TrackAnalyzer for HeuristicAnalyzer {
    fn chords(&self, notes: &[Note], options: &AnalysisOptions) -> Vec<ChordSegment> {
        detect_chords(notes, options.chord_window_ticks)
    }

    fn phrases(
        &self,
        track: &Track,
        notes: &[Note],
        options: &AnalysisOptions,
        timebase: &TimeBase,
    ) -> Vec<PhraseSegment> {
        let boundaries =
            detect_boundaries(notes, options.phrase_detection, options.harmonic_stride_ticks);
        build_phrases(
            &track.events,
            &boundaries,
            timebase.ms_to_ticks(options.min_phrase_ms),
        )
    }

    fn melody(&self, notes: &[Note], options: &AnalysisOptions) -> MelodySummary {
        melody_summary(notes, options.melody_onset_window)
    }

    fn rhythm(&self, notes: &[Note], options: &AnalysisOptions) -> RhythmSummary {
        rhythm_summary(notes, options.style)
    }

    fn dynamics(&self, notes: &[Note], _options: &AnalysisOptions) -> DynamicsSummary {
        dynamics_summary(notes)
    }
}

/// Analyze one track.
pub fn analyze_track_with<A: TrackAnalyzer + ?Sized>(
    analyzer: &A,
    track_index: usize,
    track: &Track,
    options: &AnalysisOptions,
    timebase: &TimeBase,
) -> AnalysisResult {
    let notes = extract_notes(&track.events);
    let result = AnalysisResult {
        track_index,
        name: track.name(),
        style: options.style,
        note_count: notes.len(),
        phrases: analyzer.phrases(track, &notes, options, timebase),
        chords: analyzer.chords(&notes, options),
        melody: analyzer.melody(&notes, options),
        rhythm: analyzer.rhythm(&notes, options),
        dynamics: analyzer.dynamics(&notes, options),
    };
    debug!(
        track = track_index,
        notes = result.note_count,
        phrases = result.phrases.len(),
        chords = result.chords.len(),
        "analyzed track"
    );
    result
}

pub fn analyze_track(
    track_index: usize,
    track: &Track,
    options: &AnalysisOptions,
    timebase: &TimeBase,
) -> AnalysisResult {
    analyze_track_with(&HeuristicAnalyzer, track_index, track, options, timebase)
}

/// Analyze every track of a song with the heuristic analyzer.
pub fn analyze_song(song: &Song, options: &AnalysisOptions) -> SongAnalysis {
    analyze_song_with(&HeuristicAnalyzer, song, options)
}

pub fn analyze_song_with<A: TrackAnalyzer + ?Sized>(
    analyzer: &A,
    song: &Song,
    options: &AnalysisOptions,
) -> SongAnalysis {
    let timebase = TimeBase::from_song(song, options.honor_tempo);
    let tracks = song
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| analyze_track_with(analyzer, i, track, options, &timebase))
        .collect();
    let analysis = SongAnalysis {
        ticks_per_quarter: timebase.ticks_per_quarter,
        bpm: timebase.bpm,
        tracks,
    };
    info!(summary = %analysis.summary(), "analysis complete");
    analysis
}

/// Decode and analyze raw SMF bytes.
pub fn analyze_bytes(bytes: &[u8], options: &AnalysisOptions) -> Result<SongAnalysis> {
    let song = smf::decode(bytes)?;
    Ok(analyze_song(&song, options))
}
