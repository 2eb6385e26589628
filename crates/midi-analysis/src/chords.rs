//! Fixed-window chord detection.
//!
//! Every window that has at least two notes sounding in it becomes a
//! [`ChordSegment`]. Quality comes from the intervals above the lowest pitch
//! class present, which is also taken as the root. This is deliberately
//! naive: inversions are reported with the bass-most pitch class as root.

use crate::note::Note;
use crate::types::{ChordQuality, ChordSegment};

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn note_name(pitch_class: u8) -> &'static str {
    NOTE_NAMES[(pitch_class % 12) as usize]
}

/// Scientific pitch name, middle C = "C4".
pub fn pitch_name(pitch: u8) -> String {
    format!("{}{}", note_name(pitch), pitch as i32 / 12 - 1)
}

/// Quality and root for a sorted, deduplicated pitch-class set.
pub fn classify(pitch_classes: &[u8]) -> (ChordQuality, u8) {
    let Some(&root) = pitch_classes.first() else {
        return (ChordQuality::Unknown, 0);
    };
    let has = |interval: u8| {
        pitch_classes
            .iter()
            .any(|&pc| (pc + 12 - root) % 12 == interval)
    };

    let quality = if has(4) && has(7) {
        ChordQuality::Major
    } else if has(3) && has(7) {
        ChordQuality::Minor
    } else if has(3) && has(6) {
        ChordQuality::Diminished
    } else {
        ChordQuality::Unknown
    };
    (quality, root)
}

/// Consecutive windows that all see the same sounding notes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WindowRun {
    pub first: u64,
    /// inclusive
    pub last: u64,
    pub notes: usize,
    pub pitch_classes: Vec<u8>,
}

/// Sweep note spans over `width`-tick windows once, grouping the windows
/// between two enter/leave points into one run. Stretches with no sounding
/// note produce no run, so a long held note costs two entries, not one per
/// window it covers.
pub(crate) fn window_runs(notes: &[Note], width: u64) -> Vec<WindowRun> {
    let width = width.max(1);
    // (window index, pitch class, entering or leaving)
    let mut changes: Vec<(u64, u8, i64)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        // zero-length notes still sound at their onset
        let last_tick = note.end.max(note.start.saturating_add(1)) - 1;
        changes.push((note.start / width, note.pitch_class(), 1));
        changes.push(((last_tick / width).saturating_add(1), note.pitch_class(), -1));
    }
    changes.sort_unstable_by_key(|&(window, _, _)| window);

    let mut counts = [0i64; 12];
    let mut runs = Vec::new();
    let mut i = 0;
    while i < changes.len() {
        let window = changes[i].0;
        while let Some(&(_, pc, delta)) = changes.get(i).filter(|c| c.0 == window) {
            counts[pc as usize] += delta;
            i += 1;
        }

        let active: i64 = counts.iter().sum();
        if active > 0 {
            // every entering note has a later leaving change
            let last = changes.get(i).map_or(window, |&(next, _, _)| next - 1);
            runs.push(WindowRun {
                first: window,
                last,
                notes: active as usize,
                pitch_classes: (0..12u8).filter(|&pc| counts[pc as usize] > 0).collect(),
            });
        }
    }
    runs
}

/// Slice the note timeline into `window_ticks`-wide windows starting at tick 0.
pub fn detect_chords(notes: &[Note], window_ticks: u64) -> Vec<ChordSegment> {
    let window_ticks = window_ticks.max(1);
    let mut chords = Vec::new();

    for run in window_runs(notes, window_ticks) {
        if run.notes < 2 {
            continue;
        }
        let (quality, root) = classify(&run.pitch_classes);
        for index in run.first..=run.last {
            chords.push(ChordSegment {
                time: index * window_ticks,
                duration: window_ticks,
                pitch_classes: run.pitch_classes.clone(),
                quality,
                root,
            });
        }
    }
    chords
}

/// Jaccard distance between two pitch-class sets: `1 - |a ∩ b| / |a ∪ b|`.
pub fn jaccard_distance(a: &[u8], b: &[u8]) -> f64 {
    let mask = |pcs: &[u8]| pcs.iter().fold(0u16, |m, &pc| m | 1 << (pc % 12));
    let (a, b) = (mask(a), mask(b));
    let union = (a | b).count_ones();
    if union == 0 {
        return 0.0;
    }
    1.0 - (a & b).count_ones() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(pitch: u8, start: u64, end: u64) -> Note {
        Note {
            pitch,
            velocity: 80,
            channel: 0,
            start,
            end,
        }
    }

    #[test]
    fn c_major_triad() {
        let notes = [note(60, 0, 960), note(64, 0, 960), note(67, 0, 960)];
        let chords = detect_chords(&notes, 960);
        assert_eq!(
            chords,
            vec![ChordSegment {
                time: 0,
                duration: 960,
                pitch_classes: vec![0, 4, 7],
                quality: ChordQuality::Major,
                root: 0,
            }]
        );
    }

    #[test]
    fn qualities() {
        assert_eq!(classify(&[2, 5, 9]), (ChordQuality::Minor, 2));
        assert_eq!(classify(&[0, 3, 6]), (ChordQuality::Diminished, 0));
        assert_eq!(classify(&[0, 7]), (ChordQuality::Unknown, 0));
        assert_eq!(classify(&[2, 5, 11]), (ChordQuality::Unknown, 2));
        assert_eq!(classify(&[]), (ChordQuality::Unknown, 0));
    }

    #[test]
    fn single_note_windows_are_skipped() {
        let notes = [note(60, 0, 480), note(64, 1000, 1400), note(67, 1200, 1900)];
        let chords = detect_chords(&notes, 960);
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].time, 960);
        assert_eq!(chords[0].pitch_classes, vec![4, 7]);
    }

    #[test]
    fn sustained_notes_span_windows() {
        let notes = [note(48, 0, 2000), note(55, 1500, 1600)];
        let chords = detect_chords(&notes, 960);
        // the held C only pairs with G in the second window
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].time, 960);
    }

    #[test]
    fn note_ending_on_boundary_stays_in_its_window() {
        let notes = [note(60, 0, 960), note(64, 960, 1000)];
        assert!(detect_chords(&notes, 960).is_empty());
    }

    #[test]
    fn octave_doubling_is_one_pitch_class() {
        let notes = [note(60, 0, 100), note(72, 0, 100)];
        let chords = detect_chords(&notes, 960);
        assert_eq!(chords[0].pitch_classes, vec![0]);
        assert_eq!(chords[0].quality, ChordQuality::Unknown);
    }

    #[test]
    fn long_held_note_is_not_walked_window_by_window() {
        let notes = [note(36, 0, 1 << 40), note(60, 0, 100), note(64, 0, 100)];
        let chords = detect_chords(&notes, 1);
        assert_eq!(chords.len(), 100);
        assert!(chords.iter().all(|c| c.pitch_classes == vec![0, 4]));

        let runs = window_runs(&notes, 1);
        assert_eq!(runs.len(), 2);
        assert_eq!((runs[1].first, runs[1].last, runs[1].notes), (100, (1 << 40) - 1, 1));
    }

    #[test]
    fn names() {
        assert_eq!(pitch_name(60), "C4");
        assert_eq!(pitch_name(69), "A4");
        assert_eq!(pitch_name(0), "C-1");
    }

    #[test]
    fn jaccard() {
        assert_eq!(jaccard_distance(&[0, 4, 7], &[0, 4, 7]), 0.0);
        assert_eq!(jaccard_distance(&[0, 4, 7], &[2, 5, 9]), 1.0);
        assert_eq!(jaccard_distance(&[0, 4, 7], &[4, 7, 11]), 0.5);
    }
}
