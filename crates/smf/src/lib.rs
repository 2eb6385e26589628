//! Standard MIDI File codec.
//!
//! Decodes SMF bytes into an owned [`Song`] and encodes it back. Events are
//! kept as a tagged union ([`EventKind`]) with absolute tick times, so higher
//! layers can retime events without thinking about delta encoding.
//!
//! # Example
//!
//! ```
//! use smf::{decode, encode, Event, EventKind, Format, Song, Track};
//!
//! let song = Song::new(
//!     Format::SingleTrack,
//!     480,
//!     vec![Track::from(vec![
//!         Event::new(0, EventKind::NoteOn { channel: 0, note: 60, velocity: 80 }),
//!         Event::new(480, EventKind::NoteOff { channel: 0, note: 60, velocity: 0 }),
//!     ])],
//! );
//!
//! let bytes = encode(&song);
//! let decoded = decode(&bytes).unwrap();
//! assert_eq!(decoded.tracks[0].events[..2], song.tracks[0].events[..]);
//! ```

pub mod decode;
pub mod encode;
pub mod event;
pub mod vlq;

pub use decode::decode;
pub use encode::encode;
pub use event::{
    Division, Event, EventKind, Format, Header, MetaEvent, Song, TempoChange, TimeSignature,
    Track, FALLBACK_TICKS_PER_QUARTER,
};

/// Errors from decoding Standard MIDI Files.
///
/// Both kinds are fatal: a song either decodes completely or not at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Missing or wrong chunk tag, chunk length past the end of the buffer,
    /// or a byte sequence that is not valid SMF.
    #[error("MIDI format error: {0}")]
    Format(String),

    /// An event ran past the end of its track chunk.
    #[error("truncated event in track {track} at byte {offset}: {context}")]
    TruncatedEvent {
        track: usize,
        offset: usize,
        context: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
