use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use resonance_wave_modeller::{export_parallel, Config, Preset, SystemClock};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Animated intrinsic/extrinsic resonance wave fields", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in configuration to use when no file is given
    #[arg(short, long, value_enum, global = true)]
    preset: Option<Preset>,

    /// Override the output directory for rendered frames
    #[arg(short, long, global = true)]
    output: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate one frame and log its experience and perception ranges
    Snapshot {
        #[arg(short, long, default_value_t = 0)]
        frame: usize,
    },
    /// Render every frame once, in order, with the configured delay
    Sweep,
    /// Play the animation against the wall clock
    Live {
        /// How long to keep playing
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,
    },
    /// Render every frame to PNG as fast as possible
    Export,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = match &args.config {
        Some(path) => Config::read(path)?,
        None => Config::preset(args.preset.unwrap_or(Preset::Scatter)),
    };
    if let Some(output) = &args.output {
        config.visualization.output_dir = output.clone();
    }
    config.validate()?;
    config.log_summary();

    match args.command {
        Commands::Snapshot { frame } => {
            let session = config.build_session();
            if frame >= session.frames().len() {
                return Err(anyhow!(
                    "Frame {} is outside the animation (0..{})",
                    frame,
                    session.frames().len()
                ));
            }
            let snapshot = session.snapshot_at(frame);
            let exp = snapshot.experience_stats();
            let per = snapshot.perception_stats();
            info!("Frame {} at t={:.4}", frame, snapshot.t);
            info!("Experience: min={:.4} max={:.4} mean={:.4}", exp.min, exp.max, exp.mean);
            info!("Perception: min={:.4} max={:.4} mean={:.4}", per.min, per.max, per.mean);
        }
        Commands::Sweep => {
            let session = config.build_session();
            let mut visualiser = config.build_visualiser()?;
            session.run_sweep(&SystemClock, &mut visualiser, config.animation.frame_delay())?;
            info!("Frames saved to {}/", config.visualization.output_dir);
        }
        Commands::Live { seconds } => {
            if !(seconds.is_finite() && seconds > 0.0) {
                return Err(anyhow!("seconds must be positive, got {}", seconds));
            }
            let mut session = config.build_session();
            let mut visualiser = config.build_visualiser()?;
            session.run_live(&SystemClock, &mut visualiser, Duration::from_secs_f64(seconds));
            info!("Frames saved to {}/", config.visualization.output_dir);
        }
        Commands::Export => {
            let params = config.build_params();
            let visualiser = config.build_visualiser()?;
            export_parallel(&params, config.time_sequence(), |frame| visualiser.render(frame))?;
            info!("Frames saved to {}/", config.visualization.output_dir);
        }
    }

    // "ffmpeg -framerate 10 -pattern_type glob -i 'output/frame_*.png' -c:v libx264 -pix_fmt yuv420p output.mp4"
    Ok(())
}
