//! Stack Audio render tool
//!
//! Renders the music tracks, one-shot effects or a scripted play session to
//! WAV files, and prints the tuning presets as JSON.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use stack_audio::export::{stream_wav, write_wav};
use stack_audio::synth::TrackStyle;
use stack_audio::{
    AudioSettings, MusicDirector, OneShot, Result, SfxConfig, SfxPlayer, Track, TrackConfig,
    samples_for,
};

#[derive(Parser)]
#[command(name = "stack-audio")]
#[command(about = "Render procedural music and effects for the stack game")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one music track
    RenderTrack {
        #[arg(short, long, value_enum, default_value_t = TrackArg::Gameplay)]
        track: TrackArg,
        /// Tuning JSON to use instead of the preset
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,
        /// Gameplay intensity (0.0 - 1.0)
        #[arg(short, long, default_value_t = 0.0)]
        intensity: f32,
        /// Override the noise seed
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Render a single effect
    RenderSfx {
        #[arg(short, long, value_enum)]
        kind: SfxArg,
        /// Combo count for perfect and combo-tick
        #[arg(long, default_value_t = 0)]
        combo: u32,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Render menu, a run of gameplay with rising intensity, then game over
    Session {
        /// Seconds of gameplay between the two menu sections
        #[arg(short, long, default_value_t = 12.0)]
        seconds: f64,
        /// Audio settings JSON (volumes, mute, crossfade time)
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Print a tuning preset as JSON
    DumpConfig {
        #[arg(short, long, value_enum, default_value_t = ConfigArg::Gameplay)]
        track: ConfigArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TrackArg {
    Menu,
    Gameplay,
}

impl From<TrackArg> for TrackStyle {
    fn from(arg: TrackArg) -> Self {
        match arg {
            TrackArg::Menu => TrackStyle::Menu,
            TrackArg::Gameplay => TrackStyle::Gameplay,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigArg {
    Menu,
    Gameplay,
    Sfx,
}

#[derive(Clone, Copy, ValueEnum)]
enum SfxArg {
    Click,
    Perfect,
    ComboTick,
    GameOver,
    Fall,
    Thud,
    Whoosh,
    ChimeDown,
}

impl SfxArg {
    fn one_shot(self, combo: u32) -> OneShot {
        match self {
            SfxArg::Click => OneShot::Click,
            SfxArg::Perfect => OneShot::Perfect { combo },
            SfxArg::ComboTick => OneShot::ComboTick { combo },
            SfxArg::GameOver => OneShot::GameOver,
            SfxArg::Fall => OneShot::Fall,
            SfxArg::Thud => OneShot::Thud,
            SfxArg::Whoosh => OneShot::Whoosh,
            SfxArg::ChimeDown => OneShot::ChimeDown,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::RenderTrack {
            track,
            config,
            seconds,
            intensity,
            seed,
            out,
        } => {
            let mut config = match config {
                Some(path) => TrackConfig::from_json(&fs::read_to_string(path)?)?,
                None => TrackStyle::from(track).config(),
            };
            if let Some(seed) = seed {
                config.seed = seed;
            }
            config.validate()?;

            let sample_rate = config.sample_rate;
            let mut track = Track::new(config);
            track.set_intensity(intensity);
            track.start();
            log::info!("Rendering '{}' for {seconds}s", track.name());
            stream_wav(&out, sample_rate, samples_for(seconds, sample_rate), |buf| {
                track.fill(buf)
            })?;
        }
        Command::RenderSfx { kind, combo, out } => {
            let mut sfx = SfxPlayer::default();
            sfx.trigger(kind.one_shot(combo));
            let frames = sfx.request_frames(sfx.queued_frames());
            write_wav(&out, &frames, sfx.sample_rate())?;
        }
        Command::Session {
            seconds,
            settings,
            out,
        } => {
            let settings = settings.map(AudioSettings::load).unwrap_or_default();
            let frames = render_session(settings, seconds);
            write_wav(&out, &frames, stack_audio::consts::DEFAULT_SAMPLE_RATE)?;
        }
        Command::DumpConfig { track } => {
            let json = match track {
                ConfigArg::Menu => TrackConfig::menu().to_json()?,
                ConfigArg::Gameplay => TrackConfig::gameplay().to_json()?,
                ConfigArg::Sfx => serde_json::to_string_pretty(&SfxConfig::default())?,
            };
            println!("{json}");
        }
    }

    Ok(())
}

/// Scripted run: menu, gameplay with a block landing every half second, game over
fn render_session(settings: AudioSettings, gameplay_seconds: f64) -> Vec<stack_audio::Frame> {
    let sr = stack_audio::consts::DEFAULT_SAMPLE_RATE;
    let mut director = MusicDirector::new(settings);
    director.start();

    let mut frames = director.request_frames(samples_for(4.0, sr));
    director.enter_gameplay();

    let drops = (gameplay_seconds * 2.0).floor().max(1.0) as u32;
    let per_drop = samples_for(gameplay_seconds / drops as f64, sr);
    for i in 0..drops {
        director.set_intensity(i as f32 / drops as f32);
        if i % 3 == 2 {
            director.trigger(OneShot::Perfect { combo: i / 3 });
        } else {
            director.trigger(OneShot::Thud);
        }
        frames.extend(director.request_frames(per_drop));
    }

    director.game_over();
    frames.extend(director.request_frames(samples_for(4.0, sr)));
    frames
}
