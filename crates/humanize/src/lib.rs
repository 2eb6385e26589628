//! Structure-aware MIDI humanization.
//!
//! ```
//! use humanize::{humanize, HumanizationConfig};
//! use smf::{Event, EventKind, Format, Song, Track};
//!
//! let song = Song::new(
//!     Format::SingleTrack,
//!     480,
//!     vec![Track::from(vec![
//!         Event::new(0, EventKind::NoteOn { channel: 0, note: 60, velocity: 80 }),
//!         Event::new(480, EventKind::NoteOff { channel: 0, note: 60, velocity: 0 }),
//!     ])],
//! );
//! let out = humanize(&song, &HumanizationConfig::default().with_seed(42));
//! assert_eq!(out.song.tracks[0].note_on_count(), 1);
//! ```

pub mod config;
pub mod humanizer;
pub mod pipeline;
pub mod rng;
pub mod style;
pub mod timing;
pub mod velocity;

pub use config::HumanizationConfig;
pub use humanizer::{enforce_spacing, Humanizer, MIN_EVENT_SPACING};
pub use pipeline::{humanize, humanize_with, process, Humanized};
pub use rng::MwcRng;
pub use style::StyleProfile;

pub use midi_analysis::{PhraseDetectionMode, Style};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI decode error: {0}")]
    Decode(#[from] smf::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
