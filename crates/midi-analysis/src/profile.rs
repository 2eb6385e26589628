use crate::note::Note;
use crate::types::{
    Contour, DynamicTrend, DynamicsSummary, MelodySummary, RhythmSummary, Style,
};

/// Semitone change needed before the contour counts as moving.
const CONTOUR_THRESHOLD: i32 = 2;
/// Average velocity difference between first and last third for a trend.
const TREND_THRESHOLD: f64 = 5.0;

/// Skyline melody: the highest pitch of each onset group.
///
/// A group starts at the first note not yet grouped and takes every later
/// note starting within `onset_window` ticks of it.
pub fn melody_line(notes: &[Note], onset_window: u64) -> Vec<u8> {
    let mut line = Vec::new();
    let mut i = 0;
    while i < notes.len() {
        let group_start = notes[i].start;
        let mut highest = notes[i].pitch;
        i += 1;
        while i < notes.len() && notes[i].start - group_start <= onset_window {
            highest = highest.max(notes[i].pitch);
            i += 1;
        }
        line.push(highest);
    }
    line
}

pub fn contour(pitches: &[u8]) -> Vec<Contour> {
    pitches
        .windows(2)
        .map(|pair| match pair[1] as i32 - pair[0] as i32 {
            d if d > CONTOUR_THRESHOLD => Contour::Up,
            d if d < -CONTOUR_THRESHOLD => Contour::Down,
            _ => Contour::Same,
        })
        .collect()
}

pub fn melody_summary(notes: &[Note], onset_window: u64) -> MelodySummary {
    let pitches = melody_line(notes, onset_window);
    if pitches.is_empty() {
        return MelodySummary::default();
    }
    let average_pitch =
        pitches.iter().map(|&p| p as f64).sum::<f64>() / pitches.len() as f64;
    MelodySummary {
        lowest: pitches.iter().copied().min().unwrap_or(0),
        highest: pitches.iter().copied().max().unwrap_or(0),
        average_pitch,
        contour: contour(&pitches),
        pitches,
    }
}

pub fn rhythm_summary(notes: &[Note], style: Style) -> RhythmSummary {
    let average_duration = if notes.is_empty() {
        0.0
    } else {
        notes.iter().map(|n| n.duration() as f64).sum::<f64>() / notes.len() as f64
    };
    RhythmSummary {
        average_duration,
        swing: style.swings(),
        syncopation: style.syncopates(),
    }
}

pub fn dynamics_summary(notes: &[Note]) -> DynamicsSummary {
    if notes.is_empty() {
        return DynamicsSummary::default();
    }
    let average = |slice: &[Note]| {
        slice.iter().map(|n| n.velocity as f64).sum::<f64>() / slice.len() as f64
    };

    let third = notes.len() / 3;
    let trend = if third == 0 {
        DynamicTrend::Stable
    } else {
        let change = average(&notes[notes.len() - third..]) - average(&notes[..third]);
        if change > TREND_THRESHOLD {
            DynamicTrend::Crescendo
        } else if change < -TREND_THRESHOLD {
            DynamicTrend::Diminuendo
        } else {
            DynamicTrend::Stable
        }
    };

    DynamicsSummary {
        average_velocity: average(notes),
        min_velocity: notes.iter().map(|n| n.velocity).min().unwrap_or(0),
        max_velocity: notes.iter().map(|n| n.velocity).max().unwrap_or(0),
        trend,
    }
}
