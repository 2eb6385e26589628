use crate::note::extract_notes;
use crate::timebase::TimeBase;
use serde::{Deserialize, Serialize};
use smf::Song;

/// One note as a player would schedule it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackNote {
    pub track: usize,
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub start_tick: u64,
    pub duration_ticks: u64,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// Every note of every track, ordered by start tick (track order breaks ties).
pub fn flatten_notes(song: &Song, timebase: &TimeBase) -> Vec<PlaybackNote> {
    let mut notes: Vec<PlaybackNote> = song
        .tracks
        .iter()
        .enumerate()
        .flat_map(|(track, t)| {
            extract_notes(&t.events)
                .into_iter()
                .map(move |n| (track, n))
        })
        .map(|(track, n)| PlaybackNote {
            track,
            channel: n.channel,
            pitch: n.pitch,
            velocity: n.velocity,
            start_tick: n.start,
            duration_ticks: n.duration(),
            start_seconds: timebase.ticks_to_seconds(n.start),
            duration_seconds: timebase.ticks_to_seconds(n.duration()),
        })
        .collect();
    notes.sort_by_key(|n| n.start_tick);
    notes
}
