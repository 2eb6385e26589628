use crate::config::HumanizationConfig;
use crate::rng::MwcRng;
use crate::style::StyleProfile;
use crate::timing::TimingShaper;
use crate::velocity::VelocityShaper;
use midi_analysis::{AnalysisResult, TimeBase};
use smf::{Event, EventKind, MetaEvent, Track};
use std::collections::HashMap;
use tracing::debug;

/// Consecutive events in a humanized track are at least this far apart.
pub const MIN_EVENT_SPACING: u64 = 3;

/// Applies timing and velocity shaping to whole tracks.
#[derive(Debug, Clone)]
pub struct Humanizer {
    config: HumanizationConfig,
    profile: StyleProfile,
    ticks_per_quarter: u16,
    timebase: TimeBase,
}

impl Humanizer {
    pub fn new(config: &HumanizationConfig, timebase: TimeBase) -> Self {
        let config = config.sanitized();
        Self {
            profile: StyleProfile::for_style(config.style),
            ticks_per_quarter: timebase.ticks_per_quarter,
            timebase,
            config,
        }
    }

    /// Humanize one track. The input is left untouched.
    ///
    /// Each NoteOn draws its timing offset and then its velocity; the
    /// matching NoteOff reuses the NoteOn's offset so the note keeps its
    /// length. Every other event, meta and sysex included, gets a small
    /// independent jitter. End-of-Track is moved behind everything else (a
    /// non-empty track without one gets one).
    pub fn humanize_track(
        &self,
        track: &Track,
        analysis: &AnalysisResult,
        rng: &mut MwcRng,
    ) -> Track {
        let mut timing = TimingShaper::new(
            self.profile,
            self.config.intensity,
            self.config.timing_variation_scale,
            self.ticks_per_quarter,
        );
        let velocity = VelocityShaper::new(
            self.profile,
            self.config.intensity,
            self.config.velocity_variation_scale,
            self.config.dynamic_range_scale,
            self.timebase,
        );

        // per key: the open note's offset, and the latest time emitted so
        // attacks and releases on one key never swap order
        let mut open_offsets: HashMap<(u8, u8), i64> = HashMap::new();
        let mut key_floor: HashMap<(u8, u8), u64> = HashMap::new();
        let mut out: Vec<Event> = Vec::with_capacity(track.events.len());
        let mut end_of_track: Option<Event> = None;
        let mut held_back = 0usize;

        for event in &track.events {
            if event.is_end_of_track() {
                end_of_track = Some(event.clone());
                continue;
            }

            match (&event.kind, event.note_key()) {
                (EventKind::NoteOn { note, velocity: v, .. }, Some(key)) if *v > 0 => {
                    let offset = timing.note_offset(event.time, analysis, rng);
                    let new_velocity = velocity.velocity(*note, *v, event.time, analysis, rng);
                    let time =
                        floored(shift(event.time, offset), key, &mut key_floor, &mut held_back);
                    open_offsets.insert(key, offset);
                    out.push(event.with_time(time).with_velocity(new_velocity));
                }
                (_, Some(key)) => {
                    let offset = open_offsets.remove(&key).unwrap_or(0);
                    let time =
                        floored(shift(event.time, offset), key, &mut key_floor, &mut held_back);
                    out.push(event.with_time(time));
                }
                (_, None) => {
                    let offset = timing.control_offset(rng);
                    out.push(event.with_time(shift(event.time, offset)));
                }
            }
        }

        out.sort_by_key(|e| e.time);

        if let Some(last) = out.last().map(|e| e.time) {
            let eot = end_of_track
                .unwrap_or_else(|| Event::new(last, EventKind::Meta(MetaEvent::EndOfTrack)));
            out.push(eot.with_time(eot.time.max(last)));
        } else if let Some(eot) = end_of_track {
            out.push(eot);
        }

        let pushed = enforce_spacing(&mut out, MIN_EVENT_SPACING);
        debug!(
            track = analysis.track_index,
            events = out.len(),
            drift = timing.drift(),
            held_back,
            pushed,
            "humanized track"
        );
        Track::from(out)
    }
}

fn shift(time: u64, offset: i64) -> u64 {
    time.saturating_add_signed(offset)
}

/// Keep `time` at or after the last event emitted on `key`.
fn floored(
    time: u64,
    key: (u8, u8),
    key_floor: &mut HashMap<(u8, u8), u64>,
    held_back: &mut usize,
) -> u64 {
    let floor = key_floor.entry(key).or_insert(0);
    if time < *floor {
        *held_back += 1;
    }
    *floor = time.max(*floor);
    *floor
}

/// One forward pass over time-sorted events pushing each event to at least
/// `spacing` ticks after its predecessor. Returns how many events moved.
pub fn enforce_spacing(events: &mut [Event], spacing: u64) -> usize {
    let mut moved = 0;
    for i in 1..events.len() {
        let earliest = events[i - 1].time + spacing;
        if events[i].time < earliest {
            events[i].time = earliest;
            moved += 1;
        }
    }
    moved
}
