//! CLI command implementations

use anyhow::{Context, Result};
use humconf::HumConfig;
use midi_analysis::{analyze_song, flatten_notes, TimeBase};
use serde::Serialize;
use smf::{Division, Song};
use std::path::Path;
use tracing::{debug, info};

use crate::settings;

fn read_song(path: &Path) -> Result<Song> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let song = smf::decode(&bytes)
        .with_context(|| format!("{} is not a valid MIDI file", path.display()))?;
    debug!(
        path = %path.display(),
        bytes = bytes.len(),
        tracks = song.tracks.len(),
        "decoded"
    );
    Ok(song)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Humanize `input` into `output`, optionally dumping the analysis as JSON.
pub fn humanize(
    config: &HumConfig,
    input: &Path,
    output: &Path,
    analysis_path: Option<&Path>,
) -> Result<()> {
    let options = settings::humanization_config(config)?;
    let song = read_song(input)?;

    let humanized = humanize::humanize(&song, &options);
    let bytes = smf::encode(&humanized.song);
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(output = %output.display(), bytes = bytes.len(), "wrote humanized file");

    if let Some(path) = analysis_path {
        let json = serde_json::to_string_pretty(&humanized.analysis)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    println!(
        "{} -> {} ({}, intensity {}, seed {})",
        input.display(),
        output.display(),
        humanized.analysis.summary(),
        options.sanitized().intensity,
        humanized.seed
    );
    Ok(())
}

/// Print the structure analysis of `input`.
pub fn analyze(config: &HumConfig, input: &Path, json: bool) -> Result<()> {
    let options = settings::analysis_options(config)?;
    let song = read_song(input)?;
    let analysis = analyze_song(&song, &options);

    if json {
        return print_json(&analysis);
    }

    println!("{}", analysis.summary());
    println!(
        "{} ticks/quarter at {:.1} BPM",
        analysis.ticks_per_quarter, analysis.bpm
    );
    for track in analysis.tracks.iter().filter(|t| t.note_count > 0) {
        let label = track
            .name
            .clone()
            .unwrap_or_else(|| format!("track {}", track.track_index));
        println!();
        println!("{label}: {} notes", track.note_count);
        for (i, phrase) in track.phrases.iter().enumerate() {
            println!(
                "  phrase {i}: ticks {}..{} ({} events)",
                phrase.start,
                phrase.end,
                phrase.events.len()
            );
        }
        if !track.chords.is_empty() {
            let symbols: Vec<String> = track.chords.iter().map(|c| c.symbol()).collect();
            println!("  chords: {}", symbols.join(" "));
        }
        println!(
            "  melody: {} notes, pitch {}..{}; velocity {}..{} ({:?})",
            track.melody.pitches.len(),
            midi_analysis::pitch_name(track.melody.lowest),
            midi_analysis::pitch_name(track.melody.highest),
            track.dynamics.min_velocity,
            track.dynamics.max_velocity,
            track.dynamics.trend
        );
    }
    Ok(())
}

/// Print every note with tick and second timing as JSON.
pub fn notes(config: &HumConfig, input: &Path) -> Result<()> {
    let song = read_song(input)?;
    let timebase = TimeBase::from_song(&song, config.analysis.honor_tempo);
    print_json(&flatten_notes(&song, &timebase))
}

#[derive(Debug, Serialize)]
struct Inspection {
    format: u16,
    division: Division,
    ticks_per_quarter: u16,
    tempo_bpm: Vec<(u64, f64)>,
    time_signatures: Vec<(u64, String)>,
    tracks: Vec<TrackInspection>,
}

#[derive(Debug, Serialize)]
struct TrackInspection {
    index: usize,
    name: Option<String>,
    events: usize,
    notes: usize,
    end_tick: u64,
}

impl Inspection {
    fn of(song: &Song) -> Self {
        Self {
            format: song.header.format.as_u16(),
            division: song.header.division,
            ticks_per_quarter: song.ticks_per_quarter(),
            tempo_bpm: song
                .tempo_changes()
                .iter()
                .map(|t| (t.tick, t.bpm()))
                .collect(),
            time_signatures: song
                .time_signatures()
                .iter()
                .map(|s| (s.tick, format!("{}/{}", s.numerator, s.denominator)))
                .collect(),
            tracks: song
                .tracks
                .iter()
                .enumerate()
                .map(|(index, track)| TrackInspection {
                    index,
                    name: track.name(),
                    events: track.len(),
                    notes: track.note_on_count(),
                    end_tick: track.end_tick(),
                })
                .collect(),
        }
    }
}

/// Print header fields and per-track event counts.
pub fn inspect(input: &Path, json: bool) -> Result<()> {
    let report = Inspection::of(&read_song(input)?);
    if json {
        return print_json(&report);
    }

    println!(
        "format {}, {} track(s), {} ticks/quarter",
        report.format,
        report.tracks.len(),
        report.ticks_per_quarter
    );
    if let Division::Timecode {
        frames_per_second,
        ticks_per_frame,
    } = report.division
    {
        println!("  timecode division: {frames_per_second} fps x {ticks_per_frame} ticks");
    }
    for (tick, bpm) in &report.tempo_bpm {
        println!("  tempo {bpm:.2} BPM at tick {tick}");
    }
    for (tick, sig) in &report.time_signatures {
        println!("  time signature {sig} at tick {tick}");
    }
    for track in &report.tracks {
        println!(
            "track {}{}: {} events, {} notes, ends at tick {}",
            track.index,
            track
                .name
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default(),
            track.events,
            track.notes,
            track.end_tick
        );
    }
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn show_config(config: &HumConfig, sources: &humconf::ConfigSources) {
    for file in &sources.files {
        println!("# loaded from {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# overridden by ${var}");
    }
    print!("{}", config.to_toml());
}
