//! Cross-checks against midly, an independent SMF implementation: files we
//! encode must parse there, and files it writes must decode here.

use midly::num::{u15, u28, u4, u7};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use pretty_assertions::assert_eq;
use smf::{decode, encode, Event, EventKind, Format, MetaEvent, Song, Track};

fn melody() -> Song {
    let mut events = vec![Event::new(
        0,
        EventKind::Meta(MetaEvent::Tempo {
            microseconds_per_quarter: 500_000,
        }),
    )];
    for (i, pitch) in [60u8, 62, 64, 65, 67].iter().enumerate() {
        let start = i as u64 * 480;
        events.push(Event::new(
            start,
            EventKind::NoteOn {
                channel: 0,
                note: *pitch,
                velocity: 90,
            },
        ));
        events.push(Event::new(
            start + 400,
            EventKind::NoteOff {
                channel: 0,
                note: *pitch,
                velocity: 0,
            },
        ));
    }
    Song::new(Format::SingleTrack, 480, vec![Track::from(events)])
}

#[test]
fn midly_parses_our_output() {
    let bytes = encode(&melody());
    let parsed = Smf::parse(&bytes).expect("encoded file should parse with midly");

    assert_eq!(parsed.header.timing, Timing::Metrical(u15::from(480)));
    assert_eq!(parsed.tracks.len(), 1);

    let mut tick = 0u64;
    let mut onsets = Vec::new();
    for event in &parsed.tracks[0] {
        tick += event.delta.as_int() as u64;
        if let TrackEventKind::Midi {
            message: MidiMessage::NoteOn { key, vel },
            ..
        } = event.kind
        {
            if vel.as_int() > 0 {
                onsets.push((tick, key.as_int()));
            }
        }
    }
    assert_eq!(
        onsets,
        vec![(0, 60), (480, 62), (960, 64), (1440, 65), (1920, 67)]
    );
    assert!(matches!(
        parsed.tracks[0].last().map(|e| e.kind),
        Some(TrackEventKind::Meta(MetaMessage::EndOfTrack))
    ));
}

#[test]
fn we_decode_midly_output() {
    let channel = u4::from(2);
    let on = |delta: u32, key: u8| TrackEvent {
        delta: u28::from(delta),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::NoteOn {
                key: u7::from(key),
                vel: u7::from(100),
            },
        },
    };
    let off = |delta: u32, key: u8| TrackEvent {
        delta: u28::from(delta),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::NoteOff {
                key: u7::from(key),
                vel: u7::from(0),
            },
        },
    };

    let track = vec![
        on(0, 48),
        on(0, 52),
        on(0, 55),
        off(960, 48),
        off(0, 52),
        off(0, 55),
        TrackEvent {
            delta: u28::from(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ];
    let smf = Smf {
        header: midly::Header {
            format: midly::Format::SingleTrack,
            timing: Timing::Metrical(u15::from(960)),
        },
        tracks: vec![track],
    };
    let mut bytes = Vec::new();
    smf.write(&mut bytes).expect("midly write");

    let song = decode(&bytes).expect("midly output should decode");
    assert_eq!(song.header.format, Format::SingleTrack);
    assert_eq!(song.ticks_per_quarter(), 960);

    let events = &song.tracks[0].events;
    assert_eq!(events.len(), 7);
    assert_eq!(
        events[2],
        Event::new(
            0,
            EventKind::NoteOn {
                channel: 2,
                note: 55,
                velocity: 100
            }
        )
    );
    assert_eq!(events[5].time, 960);
    assert!(events[6].is_end_of_track());
}

#[test]
fn decode_encode_decode_is_stable() {
    let first = decode(&encode(&melody())).unwrap();
    let second = decode(&encode(&first)).unwrap();
    assert_eq!(first, second);
}
