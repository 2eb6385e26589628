//! Phrase segmentation.
//!
//! Three independent detectors propose boundary ticks:
//!
//! - **musical**: a sliding pitch/duration/direction comparison between the
//!   notes before and after each candidate onset
//! - **rest**: onsets preceded by a silence at least twice the average
//!   inter-note spacing
//! - **harmonic**: fixed-stride windows whose pitch-class sets differ by a
//!   Jaccard distance above one half
//!
//! In [`PhraseDetectionMode::Auto`] the candidates are weighted (3, 2, 1) and
//! a tick needs a total weight of 2 to become a boundary, so the harmonic
//! detector can only confirm the others. The single-detector modes take that
//! detector's candidates as-is.

use crate::chords::{jaccard_distance, window_runs};
use crate::note::Note;
use crate::types::{PhraseDetectionMode, PhraseSegment};
use smf::Event;
use std::collections::BTreeMap;
use tracing::trace;

const MUSICAL_WEIGHT: u32 = 3;
const REST_WEIGHT: u32 = 2;
const HARMONIC_WEIGHT: u32 = 1;
const FUSION_THRESHOLD: u32 = 2;

const MUSICAL_THRESHOLD: f64 = 0.6;
const DURATION_CHANGE_THRESHOLD: f64 = 0.3;
const DIRECTION_REVERSAL_BONUS: f64 = 0.3;
const HARMONIC_THRESHOLD: f64 = 0.5;

/// Onset ticks where the melodic material changes character.
pub fn musical_boundaries(notes: &[Note]) -> Vec<u64> {
    let n = notes.len();
    let w = (n / 4).clamp(3, 8);
    if n < 2 * w {
        return Vec::new();
    }

    let mut boundaries = Vec::new();
    for i in w..=n - w {
        let before = &notes[i - w..i];
        let after = &notes[i..i + w];

        let mut score = (average_pitch(after) - average_pitch(before)).abs() / 12.0;

        let (dur_before, dur_after) = (average_duration(before), average_duration(after));
        let duration_change = (dur_after - dur_before).abs() / dur_before.max(1.0);
        if duration_change > DURATION_CHANGE_THRESHOLD {
            score += duration_change;
        }

        let (dir_before, dir_after) = (direction(before), direction(after));
        if dir_before.abs() > 2 && dir_after.abs() > 2 && dir_before.signum() != dir_after.signum()
        {
            score += DIRECTION_REVERSAL_BONUS;
        }

        if score > MUSICAL_THRESHOLD {
            boundaries.push(notes[i].start);
        }
    }
    dedup_sorted(boundaries)
}

/// Onsets that follow a long silence.
///
/// The threshold is twice the average spacing, i.e. the span from the first
/// onset to the last release divided by the note count.
pub fn rest_boundaries(notes: &[Note]) -> Vec<u64> {
    let (Some(first), Some(last_end)) = (notes.first(), notes.iter().map(|n| n.end).max()) else {
        return Vec::new();
    };
    let span = last_end.saturating_sub(first.start) as f64;
    let threshold = 2.0 * span / notes.len() as f64;

    let mut boundaries = Vec::new();
    let mut latest_end = first.end;
    for note in &notes[1..] {
        let gap = note.start.saturating_sub(latest_end);
        if gap > 0 && gap as f64 >= threshold {
            boundaries.push(note.start);
        }
        latest_end = latest_end.max(note.end);
    }
    dedup_sorted(boundaries)
}

/// Window starts where the harmony shifts.
pub fn harmonic_boundaries(notes: &[Note], stride_ticks: u64) -> Vec<u64> {
    let stride = stride_ticks.max(1);
    let mut boundaries = Vec::new();
    let mut previous: Option<Vec<u8>> = None;
    // windows inside a run repeat its pitch classes, so only run starts can differ
    for run in window_runs(notes, stride) {
        if let Some(prev) = &previous {
            if jaccard_distance(prev, &run.pitch_classes) > HARMONIC_THRESHOLD {
                boundaries.push(run.first * stride);
            }
        }
        previous = Some(run.pitch_classes);
    }
    boundaries
}

/// Sum detector weights per tick and keep ticks reaching the threshold.
pub fn fuse(musical: &[u64], rest: &[u64], harmonic: &[u64]) -> Vec<u64> {
    let mut weights: BTreeMap<u64, u32> = BTreeMap::new();
    for (ticks, weight) in [
        (musical, MUSICAL_WEIGHT),
        (rest, REST_WEIGHT),
        (harmonic, HARMONIC_WEIGHT),
    ] {
        for &tick in ticks {
            *weights.entry(tick).or_default() += weight;
        }
    }
    weights
        .into_iter()
        .filter(|(_, weight)| *weight >= FUSION_THRESHOLD)
        .map(|(tick, _)| tick)
        .collect()
}

/// Sorted boundary ticks for a track's notes.
pub fn detect_boundaries(
    notes: &[Note],
    mode: PhraseDetectionMode,
    harmonic_stride_ticks: u64,
) -> Vec<u64> {
    match mode {
        PhraseDetectionMode::Musical => musical_boundaries(notes),
        PhraseDetectionMode::Rest => rest_boundaries(notes),
        PhraseDetectionMode::Harmonic => harmonic_boundaries(notes, harmonic_stride_ticks),
        PhraseDetectionMode::Auto => {
            let musical = musical_boundaries(notes);
            let rest = rest_boundaries(notes);
            let harmonic = harmonic_boundaries(notes, harmonic_stride_ticks);
            trace!(
                musical = musical.len(),
                rest = rest.len(),
                harmonic = harmonic.len(),
                "phrase boundary candidates"
            );
            fuse(&musical, &rest, &harmonic)
        }
    }
}

/// Partition `events` into phrases at `boundaries`.
///
/// The span runs from the earliest to the latest event time. Boundaries
/// outside the open span are ignored. A phrase shorter than
/// `min_phrase_ticks` is folded into the phrase before it; the first phrase
/// has no predecessor and is folded into the one after it instead. Only a
/// lone phrase may end up shorter than the minimum.
pub fn build_phrases(
    events: &[Event],
    boundaries: &[u64],
    min_phrase_ticks: u64,
) -> Vec<PhraseSegment> {
    let (Some(span_start), Some(span_end)) = (
        events.iter().map(|e| e.time).min(),
        events.iter().map(|e| e.time).max(),
    ) else {
        return Vec::new();
    };
    if span_end <= span_start {
        return Vec::new();
    }

    let mut cuts: Vec<u64> = boundaries
        .iter()
        .copied()
        .filter(|&b| b > span_start && b < span_end)
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut edges = Vec::with_capacity(cuts.len() + 2);
    edges.push(span_start);
    edges.extend(cuts);
    edges.push(span_end);

    let mut spans: Vec<(u64, u64)> = Vec::with_capacity(edges.len() - 1);
    for pair in edges.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        match spans.last_mut() {
            Some(previous) if end - start < min_phrase_ticks => previous.1 = end,
            _ => spans.push((start, end)),
        }
    }
    if spans.len() > 1 && spans[0].1 - spans[0].0 < min_phrase_ticks {
        let first = spans.remove(0);
        spans[0].0 = first.0;
    }

    let last = spans.len() - 1;
    spans
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| PhraseSegment {
            start,
            end,
            events: events
                .iter()
                .filter(|e| e.time >= start && (e.time < end || (i == last && e.time == end)))
                .cloned()
                .collect(),
        })
        .collect()
}

fn average_pitch(notes: &[Note]) -> f64 {
    notes.iter().map(|n| n.pitch as f64).sum::<f64>() / notes.len() as f64
}

fn average_duration(notes: &[Note]) -> f64 {
    notes.iter().map(|n| n.duration() as f64).sum::<f64>() / notes.len() as f64
}

fn direction(notes: &[Note]) -> i32 {
    match (notes.first(), notes.last()) {
        (Some(first), Some(last)) => last.pitch as i32 - first.pitch as i32,
        _ => 0,
    }
}

fn dedup_sorted(mut ticks: Vec<u64>) -> Vec<u64> {
    ticks.sort_unstable();
    ticks.dedup();
    ticks
}
