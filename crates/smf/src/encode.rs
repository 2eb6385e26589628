//! SMF encoding. Every event is written with an explicit status byte; no
//! running-status compression is applied.

use crate::event::{Event, EventKind, MetaEvent, Song, Track};
use crate::vlq::{write_vlq, MAX_VALUE};
use tracing::warn;

/// Encode a song to Standard MIDI File bytes.
///
/// The header's track count is taken from `song.tracks`, not from the
/// declared header value. Tracks that do not end with End-of-Track get one.
pub fn encode(song: &Song) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&song.header.format.as_u16().to_be_bytes());
    buf.extend_from_slice(&(song.tracks.len() as u16).to_be_bytes());
    buf.extend_from_slice(&song.header.division.as_u16().to_be_bytes());

    for track in &song.tracks {
        let data = encode_track(track);
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&data);
    }

    buf
}

/// Encode the event stream of one track (without chunk framing).
pub fn encode_track(track: &Track) -> Vec<u8> {
    let mut data = Vec::new();
    let mut previous_time = 0u64;

    for event in &track.events {
        write_delta(&mut data, event.time, previous_time);
        write_event(&mut data, event);
        previous_time = previous_time.max(event.time);
    }

    if !track.events.last().is_some_and(Event::is_end_of_track) {
        write_vlq(&mut data, 0);
        data.extend_from_slice(&[0xFF, MetaEvent::END_OF_TRACK, 0x00]);
    }

    data
}

fn write_delta(data: &mut Vec<u8>, time: u64, previous_time: u64) {
    let delta = time.saturating_sub(previous_time);
    if delta > MAX_VALUE as u64 {
        warn!(delta, "delta time exceeds 4-byte VLQ range, saturating");
    }
    write_vlq(data, delta.min(MAX_VALUE as u64) as u32);
}

fn write_event(data: &mut Vec<u8>, event: &Event) {
    let status = event.kind.status_byte();
    match &event.kind {
        EventKind::NoteOff { note, velocity, .. } | EventKind::NoteOn { note, velocity, .. } => {
            data.extend_from_slice(&[status, note & 0x7F, velocity & 0x7F]);
        }
        EventKind::KeyPressure { note, pressure, .. } => {
            data.extend_from_slice(&[status, note & 0x7F, pressure & 0x7F]);
        }
        EventKind::ControlChange {
            controller, value, ..
        } => {
            data.extend_from_slice(&[status, controller & 0x7F, value & 0x7F]);
        }
        EventKind::ProgramChange { program, .. } => {
            data.extend_from_slice(&[status, program & 0x7F]);
        }
        EventKind::ChannelPressure { pressure, .. } => {
            data.extend_from_slice(&[status, pressure & 0x7F]);
        }
        EventKind::PitchBend { value, .. } => {
            let value = value & 0x3FFF;
            data.extend_from_slice(&[status, (value & 0x7F) as u8, (value >> 7) as u8]);
        }
        EventKind::Meta(meta) => write_meta(data, meta),
        EventKind::SysEx { data: payload, .. } => {
            data.push(status);
            write_vlq(data, payload.len() as u32);
            data.extend_from_slice(payload);
        }
    }
}

fn write_meta(data: &mut Vec<u8>, meta: &MetaEvent) {
    data.push(0xFF);
    data.push(meta.meta_type());
    match meta {
        MetaEvent::Tempo {
            microseconds_per_quarter,
        } => {
            let usec = microseconds_per_quarter & 0x00FF_FFFF;
            data.push(3);
            data.extend_from_slice(&usec.to_be_bytes()[1..]);
        }
        MetaEvent::TimeSignature {
            numerator,
            denominator_pow2,
            clocks_per_click,
            thirty_seconds_per_quarter,
        } => {
            data.push(4);
            data.extend_from_slice(&[
                *numerator,
                *denominator_pow2,
                *clocks_per_click,
                *thirty_seconds_per_quarter,
            ]);
        }
        MetaEvent::EndOfTrack => data.push(0),
        MetaEvent::Other { data: payload, .. } => {
            write_vlq(data, payload.len() as u32);
            data.extend_from_slice(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::event::{Division, Format};
    use pretty_assertions::assert_eq;

    fn note(time: u64, on: bool, note: u8, velocity: u8) -> Event {
        let kind = if on {
            EventKind::NoteOn {
                channel: 0,
                note,
                velocity,
            }
        } else {
            EventKind::NoteOff {
                channel: 0,
                note,
                velocity,
            }
        };
        Event::new(time, kind)
    }

    #[test]
    fn appends_end_of_track_when_missing() {
        let track = Track::from(vec![note(0, true, 60, 80), note(480, false, 60, 0)]);
        assert_eq!(
            encode_track(&track),
            vec![
                0x00, 0x90, 60, 80, //
                0x83, 0x60, 0x80, 60, 0, //
                0x00, 0xFF, 0x2F, 0x00,
            ]
        );
    }

    #[test]
    fn existing_end_of_track_is_not_duplicated() {
        let track = Track::from(vec![
            note(0, true, 60, 80),
            Event::new(10, EventKind::Meta(MetaEvent::EndOfTrack)),
        ]);
        let bytes = encode_track(&track);
        assert_eq!(bytes.iter().filter(|&&b| b == 0x2F).count(), 1);
    }

    #[test]
    fn out_of_order_times_write_zero_deltas() {
        let track = Track::from(vec![note(100, true, 60, 80), note(90, false, 60, 0)]);
        let bytes = encode_track(&track);
        // second delta is 0, not negative
        assert_eq!(&bytes[..6], &[0x64, 0x90, 60, 80, 0x00, 0x80]);
    }

    #[test]
    fn semantics_round_trip() {
        let events = vec![
            Event::new(
                0,
                EventKind::Meta(MetaEvent::Tempo {
                    microseconds_per_quarter: 428_571,
                }),
            ),
            Event::new(
                0,
                EventKind::Meta(MetaEvent::Other {
                    meta_type: MetaEvent::TRACK_NAME,
                    data: b"lead".to_vec(),
                }),
            ),
            Event::new(
                0,
                EventKind::ProgramChange {
                    channel: 3,
                    program: 40,
                },
            ),
            note(0, true, 72, 100),
            Event::new(
                120,
                EventKind::PitchBend {
                    channel: 3,
                    value: 0x3FFF,
                },
            ),
            Event::new(
                240,
                EventKind::ControlChange {
                    channel: 3,
                    controller: 64,
                    value: 127,
                },
            ),
            Event::new(
                240,
                EventKind::SysEx {
                    status: 0xF0,
                    data: vec![0x43, 0x12, 0xF7],
                },
            ),
            note(70_000, false, 72, 64),
            Event::new(70_000, EventKind::Meta(MetaEvent::EndOfTrack)),
        ];
        let song = Song {
            header: crate::event::Header {
                format: Format::Parallel,
                track_count: 1,
                division: Division::Metrical(960),
            },
            tracks: vec![Track::from(events)],
        };

        let decoded = decode(&encode(&song)).unwrap();
        assert_eq!(decoded, song);
    }

    #[test]
    fn header_track_count_follows_tracks() {
        let mut song = Song::new(Format::Parallel, 480, vec![Track::new(), Track::new()]);
        song.header.track_count = 7;
        let bytes = encode(&song);
        assert_eq!(u16::from_be_bytes([bytes[10], bytes[11]]), 2);
    }
}
