use serde::{Deserialize, Serialize};

/// Ticks per quarter note assumed when the file uses SMPTE timecode division.
pub const FALLBACK_TICKS_PER_QUARTER: u16 = 480;

/// SMF format field of the header chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Format 0: one multi-channel track
    SingleTrack,
    /// Format 1: simultaneous tracks
    Parallel,
    /// Format 2: independent sequences
    Sequential,
}

impl Format {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Format::SingleTrack),
            1 => Some(Format::Parallel),
            2 => Some(Format::Sequential),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
        }
    }
}

/// Time division of the header chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Division {
    /// Ticks per quarter note
    Metrical(u16),
    /// SMPTE frames per second and ticks per frame
    Timecode {
        frames_per_second: u8,
        ticks_per_frame: u8,
    },
}

impl Division {
    pub fn from_u16(raw: u16) -> Self {
        if raw & 0x8000 == 0 {
            Division::Metrical(raw)
        } else {
            // High byte is the negated frame rate in two's complement
            let fps = (raw >> 8) as u8 as i8;
            Division::Timecode {
                frames_per_second: fps.unsigned_abs(),
                ticks_per_frame: raw as u8,
            }
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Division::Metrical(ticks) => ticks & 0x7FFF,
            Division::Timecode {
                frames_per_second,
                ticks_per_frame,
            } => {
                let high = (frames_per_second as i8).wrapping_neg() as u8;
                ((high as u16) << 8) | ticks_per_frame as u16
            }
        }
    }

    /// Musical resolution. Timecode files fall back to 480 so beat-relative
    /// heuristics still have a grid to work with.
    pub fn ticks_per_quarter(self) -> u16 {
        match self {
            Division::Metrical(ticks) if ticks > 0 => ticks,
            _ => FALLBACK_TICKS_PER_QUARTER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub format: Format,
    /// Track count as declared in the file. Encoding writes the actual count.
    pub track_count: u16,
    pub division: Division,
}

impl Header {
    pub fn ticks_per_quarter(&self) -> u16 {
        self.division.ticks_per_quarter()
    }
}

/// Meta event payloads. Tempo and time signature are parsed; the rest is
/// carried as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetaEvent {
    Tempo {
        microseconds_per_quarter: u32,
    },
    TimeSignature {
        numerator: u8,
        /// Denominator as a power of two (2 means quarter notes)
        denominator_pow2: u8,
        clocks_per_click: u8,
        thirty_seconds_per_quarter: u8,
    },
    EndOfTrack,
    Other {
        meta_type: u8,
        data: Vec<u8>,
    },
}

impl MetaEvent {
    pub const TEMPO: u8 = 0x51;
    pub const TIME_SIGNATURE: u8 = 0x58;
    pub const END_OF_TRACK: u8 = 0x2F;
    pub const TRACK_NAME: u8 = 0x03;

    pub fn meta_type(&self) -> u8 {
        match self {
            MetaEvent::Tempo { .. } => Self::TEMPO,
            MetaEvent::TimeSignature { .. } => Self::TIME_SIGNATURE,
            MetaEvent::EndOfTrack => Self::END_OF_TRACK,
            MetaEvent::Other { meta_type, .. } => *meta_type,
        }
    }
}

/// One decoded track event, without its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    NoteOff {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    KeyPressure {
        channel: u8,
        note: u8,
        pressure: u8,
    },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    ProgramChange {
        channel: u8,
        program: u8,
    },
    ChannelPressure {
        channel: u8,
        pressure: u8,
    },
    /// 14-bit value, 0x2000 is center
    PitchBend {
        channel: u8,
        value: u16,
    },
    Meta(MetaEvent),
    SysEx {
        /// 0xF0 or 0xF7
        status: u8,
        data: Vec<u8>,
    },
}

impl EventKind {
    /// Status byte this event is written with.
    pub fn status_byte(&self) -> u8 {
        match self {
            EventKind::NoteOff { channel, .. } => 0x80 | (channel & 0x0F),
            EventKind::NoteOn { channel, .. } => 0x90 | (channel & 0x0F),
            EventKind::KeyPressure { channel, .. } => 0xA0 | (channel & 0x0F),
            EventKind::ControlChange { channel, .. } => 0xB0 | (channel & 0x0F),
            EventKind::ProgramChange { channel, .. } => 0xC0 | (channel & 0x0F),
            EventKind::ChannelPressure { channel, .. } => 0xD0 | (channel & 0x0F),
            EventKind::PitchBend { channel, .. } => 0xE0 | (channel & 0x0F),
            EventKind::Meta(_) => 0xFF,
            EventKind::SysEx { status, .. } => *status,
        }
    }

    pub fn channel(&self) -> Option<u8> {
        match self {
            EventKind::NoteOff { channel, .. }
            | EventKind::NoteOn { channel, .. }
            | EventKind::KeyPressure { channel, .. }
            | EventKind::ControlChange { channel, .. }
            | EventKind::ProgramChange { channel, .. }
            | EventKind::ChannelPressure { channel, .. }
            | EventKind::PitchBend { channel, .. } => Some(*channel),
            EventKind::Meta(_) | EventKind::SysEx { .. } => None,
        }
    }
}

/// A track event at an absolute tick position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub time: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(time: u64, kind: EventKind) -> Self {
        Self { time, kind }
    }

    /// NoteOn with a non-zero velocity.
    pub fn is_note_on(&self) -> bool {
        matches!(self.kind, EventKind::NoteOn { velocity, .. } if velocity > 0)
    }

    /// Explicit NoteOff, or NoteOn with velocity 0.
    pub fn is_note_off(&self) -> bool {
        matches!(
            self.kind,
            EventKind::NoteOff { .. } | EventKind::NoteOn { velocity: 0, .. }
        )
    }

    pub fn is_end_of_track(&self) -> bool {
        matches!(self.kind, EventKind::Meta(MetaEvent::EndOfTrack))
    }

    /// `(note, channel)` for note-on/off events.
    pub fn note_key(&self) -> Option<(u8, u8)> {
        match self.kind {
            EventKind::NoteOn { channel, note, .. } | EventKind::NoteOff { channel, note, .. } => {
                Some((note, channel))
            }
            _ => None,
        }
    }

    pub fn channel(&self) -> Option<u8> {
        self.kind.channel()
    }

    pub fn with_time(&self, time: u64) -> Self {
        Self {
            time,
            kind: self.kind.clone(),
        }
    }

    /// Copy with a new velocity. Only NoteOn/NoteOff carry one; other kinds
    /// are returned unchanged.
    pub fn with_velocity(&self, new_velocity: u8) -> Self {
        let kind = match self.kind {
            EventKind::NoteOn { channel, note, .. } => EventKind::NoteOn {
                channel,
                note,
                velocity: new_velocity,
            },
            EventKind::NoteOff { channel, note, .. } => EventKind::NoteOff {
                channel,
                note,
                velocity: new_velocity,
            },
            ref other => other.clone(),
        };
        Self {
            time: self.time,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoChange {
    pub tick: u64,
    pub microseconds_per_quarter: u32,
}

impl TempoChange {
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.microseconds_per_quarter.max(1) as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub tick: u64,
    pub numerator: u8,
    pub denominator: u8,
}

/// Ordered event list of one `MTrk` chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub events: Vec<Event>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Latest event time, 0 for an empty track.
    pub fn end_tick(&self) -> u64 {
        self.events.iter().map(|e| e.time).max().unwrap_or(0)
    }

    /// Text of the first track-name meta event, if any.
    pub fn name(&self) -> Option<String> {
        self.events.iter().find_map(|e| match &e.kind {
            EventKind::Meta(MetaEvent::Other { meta_type, data })
                if *meta_type == MetaEvent::TRACK_NAME =>
            {
                Some(String::from_utf8_lossy(data).into_owned())
            }
            _ => None,
        })
    }

    pub fn note_on_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_note_on()).count()
    }
}

impl From<Vec<Event>> for Track {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// A decoded Standard MIDI File. Owns all of its tracks; `clone()` is a full
/// structural copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub header: Header,
    pub tracks: Vec<Track>,
}

impl Song {
    pub fn new(format: Format, ticks_per_quarter: u16, tracks: Vec<Track>) -> Self {
        Self {
            header: Header {
                format,
                track_count: tracks.len() as u16,
                division: Division::Metrical(ticks_per_quarter),
            },
            tracks,
        }
    }

    pub fn ticks_per_quarter(&self) -> u16 {
        self.header.ticks_per_quarter()
    }

    pub fn end_tick(&self) -> u64 {
        self.tracks.iter().map(Track::end_tick).max().unwrap_or(0)
    }

    /// All tempo events across tracks, sorted by tick, duplicates removed.
    pub fn tempo_changes(&self) -> Vec<TempoChange> {
        let mut changes: Vec<TempoChange> = self
            .tracks
            .iter()
            .flat_map(|t| t.events.iter())
            .filter_map(|e| match e.kind {
                EventKind::Meta(MetaEvent::Tempo {
                    microseconds_per_quarter,
                }) => Some(TempoChange {
                    tick: e.time,
                    microseconds_per_quarter,
                }),
                _ => None,
            })
            .collect();
        changes.sort_by_key(|t| t.tick);
        changes.dedup();
        changes
    }

    pub fn time_signatures(&self) -> Vec<TimeSignature> {
        let mut sigs: Vec<TimeSignature> = self
            .tracks
            .iter()
            .flat_map(|t| t.events.iter())
            .filter_map(|e| match e.kind {
                EventKind::Meta(MetaEvent::TimeSignature {
                    numerator,
                    denominator_pow2,
                    ..
                }) => Some(TimeSignature {
                    tick: e.time,
                    numerator,
                    denominator: 1u8.checked_shl(denominator_pow2 as u32).unwrap_or(0),
                }),
                _ => None,
            })
            .collect();
        sigs.sort_by_key(|t| t.tick);
        sigs.dedup_by(|a, b| a.tick == b.tick);
        sigs
    }
}
