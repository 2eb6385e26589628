use crate::config::HumanizationConfig;
use crate::humanizer::Humanizer;
use crate::rng::MwcRng;
use crate::Result;
use midi_analysis::{analyze_song_with, HeuristicAnalyzer, SongAnalysis, TimeBase, TrackAnalyzer};
use serde::Serialize;
use smf::Song;
use tracing::info;

/// A humanized song together with the analysis that shaped it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Humanized {
    pub song: Song,
    pub analysis: SongAnalysis,
    /// Seed actually used; repeat the run by passing it back in
    pub seed: i64,
}

/// Analyze and humanize every track of `song`, returning a new song.
pub fn humanize(song: &Song, config: &HumanizationConfig) -> Humanized {
    humanize_with(&HeuristicAnalyzer, song, config)
}

pub fn humanize_with<A: TrackAnalyzer + ?Sized>(
    analyzer: &A,
    song: &Song,
    config: &HumanizationConfig,
) -> Humanized {
    let config = config.sanitized();
    let options = config.analysis_options();
    let analysis = analyze_song_with(analyzer, song, &options);

    let mut rng = match config.seed {
        Some(seed) => MwcRng::new(seed),
        None => {
            let rng = MwcRng::from_clock();
            info!(seed = rng.seed(), "no seed configured, seeded from clock");
            rng
        }
    };

    let timebase = TimeBase {
        ticks_per_quarter: analysis.ticks_per_quarter,
        bpm: analysis.bpm,
    };
    let humanizer = Humanizer::new(&config, timebase);
    let tracks = song
        .tracks
        .iter()
        .zip(&analysis.tracks)
        .map(|(track, track_analysis)| humanizer.humanize_track(track, track_analysis, &mut rng))
        .collect();

    info!(
        style = %config.style,
        intensity = config.intensity,
        seed = rng.seed(),
        tracks = song.tracks.len(),
        "humanized song"
    );

    Humanized {
        song: Song {
            header: song.header,
            tracks,
        },
        analysis,
        seed: rng.seed(),
    }
}

/// Decode, humanize and re-encode a Standard MIDI File.
pub fn process(bytes: &[u8], config: &HumanizationConfig) -> Result<(Vec<u8>, SongAnalysis)> {
    let song = smf::decode(bytes)?;
    let humanized = humanize(&song, config);
    Ok((smf::encode(&humanized.song), humanized.analysis))
}
