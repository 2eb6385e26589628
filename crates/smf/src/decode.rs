//! SMF decoding: header chunk, track chunks, and the event stream inside each
//! track (delta times, running status, meta and sysex payloads).

use crate::event::{Division, Event, EventKind, Format, Header, MetaEvent, Song, Track};
use crate::vlq::{read_vlq, VlqError};
use crate::{Error, Result};
use tracing::debug;

const HEADER_TAG: &[u8; 4] = b"MThd";
const TRACK_TAG: &[u8; 4] = b"MTrk";
const MIN_HEADER_LEN: usize = 6;

/// Decode a complete Standard MIDI File.
///
/// Nothing in the returned [`Song`] borrows from `bytes`. Bytes after the
/// last declared track chunk are ignored.
pub fn decode(bytes: &[u8]) -> Result<Song> {
    let (header, mut pos) = decode_header(bytes)?;

    let mut tracks = Vec::with_capacity(header.track_count as usize);
    for index in 0..header.track_count as usize {
        let body = read_chunk(bytes, &mut pos, TRACK_TAG, index)?;
        let track = decode_track(body, index)?;
        debug!(track = index, events = track.len(), "decoded track");
        tracks.push(track);
    }

    Ok(Song { header, tracks })
}

fn decode_header(bytes: &[u8]) -> Result<(Header, usize)> {
    if bytes.len() < 8 || &bytes[0..4] != HEADER_TAG {
        return Err(Error::Format("missing MThd header chunk".to_string()));
    }

    let len = be_u32(&bytes[4..8]) as usize;
    if len < MIN_HEADER_LEN {
        return Err(Error::Format(format!(
            "MThd length {} is shorter than {}",
            len, MIN_HEADER_LEN
        )));
    }
    let end = 8usize
        .checked_add(len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| Error::Format(format!("MThd length {} overruns the buffer", len)))?;

    let raw_format = be_u16(&bytes[8..10]);
    let format = Format::from_u16(raw_format)
        .ok_or_else(|| Error::Format(format!("unsupported SMF format {}", raw_format)))?;
    let track_count = be_u16(&bytes[10..12]);
    let division = Division::from_u16(be_u16(&bytes[12..14]));

    if let Division::Timecode {
        frames_per_second, ..
    } = division
    {
        tracing::warn!(
            frames_per_second,
            "SMPTE division; beat-relative timing assumes 480 ticks per quarter"
        );
    }

    Ok((
        Header {
            format,
            track_count,
            division,
        },
        end,
    ))
}

/// Read one chunk with the expected tag, returning its body and advancing
/// `pos` past it.
fn read_chunk<'a>(
    bytes: &'a [u8],
    pos: &mut usize,
    tag: &[u8; 4],
    index: usize,
) -> Result<&'a [u8]> {
    let header_end = *pos + 8;
    if header_end > bytes.len() {
        return Err(Error::Format(format!(
            "expected track chunk {} but the file ended",
            index
        )));
    }

    let found = &bytes[*pos..*pos + 4];
    if found != tag {
        return Err(Error::Format(format!(
            "expected {} chunk for track {}, found {:?}",
            String::from_utf8_lossy(tag),
            index,
            String::from_utf8_lossy(found)
        )));
    }

    let len = be_u32(&bytes[*pos + 4..header_end]) as usize;
    let remaining = bytes.len() - header_end;
    if len > remaining {
        return Err(Error::Format(format!(
            "track {} declares {} bytes but only {} remain",
            index, len, remaining
        )));
    }

    *pos = header_end + len;
    Ok(&bytes[header_end..header_end + len])
}

/// Bounded reader over one track chunk body.
struct TrackReader<'a> {
    data: &'a [u8],
    pos: usize,
    track: usize,
}

impl<'a> TrackReader<'a> {
    fn new(data: &'a [u8], track: usize) -> Self {
        Self {
            data,
            pos: 0,
            track,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn truncated(&self, context: &'static str) -> Error {
        Error::TruncatedEvent {
            track: self.track,
            offset: self.pos,
            context,
        }
    }

    fn u8(&mut self, context: &'static str) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or_else(|| self.truncated(context))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Data bytes carry 7 bits; a stray high bit is masked off.
    fn data_byte(&mut self, context: &'static str) -> Result<u8> {
        Ok(self.u8(context)? & 0x7F)
    }

    fn vlq(&mut self, context: &'static str) -> Result<u32> {
        let start = self.pos;
        read_vlq(self.data, &mut self.pos).map_err(|e| match e {
            VlqError::Truncated => {
                self.pos = self.data.len();
                self.truncated(context)
            }
            VlqError::TooLong => Error::Format(format!(
                "track {}: variable-length quantity at byte {} exceeds 4 bytes",
                self.track, start
            )),
        })
    }

    fn bytes(&mut self, len: usize, context: &'static str) -> Result<Vec<u8>> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.truncated(context))?;
        let out = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(out)
    }
}

/// Decode the event stream of one track chunk body.
pub fn decode_track(data: &[u8], index: usize) -> Result<Track> {
    let mut reader = TrackReader::new(data, index);
    let mut events = Vec::new();
    let mut time: u64 = 0;
    let mut running_status: Option<u8> = None;

    while !reader.at_end() {
        time += reader.vlq("delta time")? as u64;

        let first = reader.u8("status byte")?;
        let (status, pending_data) = if first & 0x80 == 0 {
            let status = running_status.ok_or_else(|| {
                Error::Format(format!(
                    "track {}: data byte 0x{:02X} at byte {} with no running status",
                    index,
                    first,
                    reader.pos - 1
                ))
            })?;
            (status, Some(first))
        } else {
            (first, None)
        };

        let kind = match status {
            0x80..=0xEF => {
                running_status = Some(status);
                decode_channel_message(&mut reader, status, pending_data)?
            }
            0xFF => decode_meta(&mut reader)?,
            0xF0 | 0xF7 => {
                let len = reader.vlq("sysex length")? as usize;
                EventKind::SysEx {
                    status,
                    data: reader.bytes(len, "sysex payload")?,
                }
            }
            other => {
                return Err(Error::Format(format!(
                    "track {}: unsupported status byte 0x{:02X} at byte {}",
                    index,
                    other,
                    reader.pos - 1
                )))
            }
        };

        events.push(Event { time, kind });
    }

    Ok(Track { events })
}

fn decode_channel_message(
    reader: &mut TrackReader<'_>,
    status: u8,
    pending_data: Option<u8>,
) -> Result<EventKind> {
    let channel = status & 0x0F;
    let first = match pending_data {
        Some(byte) => byte & 0x7F,
        None => reader.data_byte("channel message data")?,
    };

    let kind = match status & 0xF0 {
        0xC0 => EventKind::ProgramChange {
            channel,
            program: first,
        },
        0xD0 => EventKind::ChannelPressure {
            channel,
            pressure: first,
        },
        high => {
            let second = reader.data_byte("channel message data")?;
            match high {
                0x80 => EventKind::NoteOff {
                    channel,
                    note: first,
                    velocity: second,
                },
                0x90 => EventKind::NoteOn {
                    channel,
                    note: first,
                    velocity: second,
                },
                0xA0 => EventKind::KeyPressure {
                    channel,
                    note: first,
                    pressure: second,
                },
                0xB0 => EventKind::ControlChange {
                    channel,
                    controller: first,
                    value: second,
                },
                _ => EventKind::PitchBend {
                    channel,
                    value: ((second as u16) << 7) | first as u16,
                },
            }
        }
    };
    Ok(kind)
}

fn decode_meta(reader: &mut TrackReader<'_>) -> Result<EventKind> {
    let meta_type = reader.u8("meta type")?;
    let len = reader.vlq("meta length")? as usize;
    let data = reader.bytes(len, "meta payload")?;

    let parsed = match (meta_type, data.as_slice()) {
        (MetaEvent::TEMPO, &[a, b, c]) => Some(MetaEvent::Tempo {
            microseconds_per_quarter: u32::from_be_bytes([0, a, b, c]),
        }),
        (MetaEvent::TIME_SIGNATURE, &[numerator, denominator_pow2, clocks, thirty_seconds]) => {
            Some(MetaEvent::TimeSignature {
                numerator,
                denominator_pow2,
                clocks_per_click: clocks,
                thirty_seconds_per_quarter: thirty_seconds,
            })
        }
        (MetaEvent::END_OF_TRACK, &[]) => Some(MetaEvent::EndOfTrack),
        _ => None,
    };
    let meta = parsed.unwrap_or(MetaEvent::Other { meta_type, data });
    Ok(EventKind::Meta(meta))
}

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
