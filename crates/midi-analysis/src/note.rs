use serde::{Deserialize, Serialize};
use smf::Event;
use std::collections::HashMap;
use tracing::debug;

/// A sounding note recovered from a NoteOn/NoteOff pair, in absolute ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub velocity: u8,
    pub channel: u8,
    pub start: u64,
    pub end: u64,
}

impl Note {
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch % 12
    }

    /// Whether the note sounds anywhere inside `[from, to)`. Zero-length
    /// notes count at their start tick.
    pub fn overlaps(&self, from: u64, to: u64) -> bool {
        self.start < to && self.end.max(self.start + 1) > from
    }
}

struct PendingNote {
    start: u64,
    velocity: u8,
    order: usize,
}

/// Pair NoteOn/NoteOff events of one track into notes.
///
/// Pending NoteOns are keyed by `(pitch, channel)`. A second NoteOn for a key
/// that is still sounding replaces the first one, so the earlier note is
/// lost. NoteOffs with nothing pending and NoteOns never closed before the
/// end of the track produce no note.
///
/// Notes are returned sorted by start tick; notes starting together keep the
/// order of their NoteOn events.
pub fn extract_notes(events: &[Event]) -> Vec<Note> {
    let mut pending: HashMap<(u8, u8), PendingNote> = HashMap::new();
    let mut notes: Vec<(usize, Note)> = Vec::new();
    let mut replaced = 0usize;

    for (order, event) in events.iter().enumerate() {
        let Some(key) = event.note_key() else {
            continue;
        };

        if event.is_note_on() {
            let velocity = match event.kind {
                smf::EventKind::NoteOn { velocity, .. } => velocity,
                _ => 0,
            };
            let previous = pending.insert(
                key,
                PendingNote {
                    start: event.time,
                    velocity,
                    order,
                },
            );
            if previous.is_some() {
                replaced += 1;
            }
        } else if let Some(open) = pending.remove(&key) {
            let (pitch, channel) = key;
            notes.push((
                open.order,
                Note {
                    pitch,
                    velocity: open.velocity,
                    channel,
                    start: open.start,
                    end: event.time.max(open.start),
                },
            ));
        }
    }

    if replaced > 0 || !pending.is_empty() {
        debug!(
            replaced,
            unterminated = pending.len(),
            "dropped notes while pairing note events"
        );
    }

    notes.sort_by_key(|(order, note)| (note.start, *order));
    notes.into_iter().map(|(_, note)| note).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use smf::EventKind;

    fn on(time: u64, note: u8, velocity: u8) -> Event {
        Event::new(
            time,
            EventKind::NoteOn {
                channel: 0,
                note,
                velocity,
            },
        )
    }

    fn off(time: u64, note: u8) -> Event {
        Event::new(
            time,
            EventKind::NoteOff {
                channel: 0,
                note,
                velocity: 0,
            },
        )
    }

    #[test]
    fn pairs_single_note() {
        let notes = extract_notes(&[on(0, 60, 80), off(480, 60)]);
        assert_eq!(
            notes,
            vec![Note {
                pitch: 60,
                velocity: 80,
                channel: 0,
                start: 0,
                end: 480,
            }]
        );
        assert_eq!(notes[0].duration(), 480);
    }

    #[test]
    fn zero_velocity_note_on_closes_note() {
        let notes = extract_notes(&[on(0, 64, 90), on(240, 64, 0)]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].end, 240);
    }

    #[test]
    fn unmatched_note_off_is_discarded() {
        assert!(extract_notes(&[off(100, 62)]).is_empty());
    }

    #[test]
    fn overlapping_same_pitch_keeps_only_latest_note_on() {
        let notes = extract_notes(&[on(0, 60, 70), on(100, 60, 90), off(300, 60), off(400, 60)]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].start, 100);
        assert_eq!(notes[0].velocity, 90);
    }

    #[test]
    fn channels_are_paired_independently() {
        let ch1 = Event::new(
            0,
            EventKind::NoteOn {
                channel: 1,
                note: 60,
                velocity: 50,
            },
        );
        let ch1_off = Event::new(
            200,
            EventKind::NoteOff {
                channel: 1,
                note: 60,
                velocity: 0,
            },
        );
        let notes = extract_notes(&[on(0, 60, 80), ch1, off(100, 60), ch1_off]);
        assert_eq!(notes.len(), 2);
        assert_eq!((notes[0].channel, notes[0].end), (0, 100));
        assert_eq!((notes[1].channel, notes[1].end), (1, 200));
    }

    #[test]
    fn ties_keep_note_on_order() {
        // E closes before C, but C was struck first
        let notes = extract_notes(&[on(0, 60, 80), on(0, 64, 80), off(100, 64), off(200, 60)]);
        let pitches: Vec<u8> = notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 64]);
    }

    #[test]
    fn unterminated_notes_are_dropped() {
        let notes = extract_notes(&[on(0, 60, 80), on(10, 62, 80), off(20, 62)]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].pitch, 62);
    }
}
