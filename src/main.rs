//! Jaw kinematics replay tool: measures mouth opening and lateral deviation
//! from recorded facial landmarks.

use anyhow::{Context, Result};
use clap::Parser;
use jaw_kinematics::{
    app::{InputSource, ReplayApp},
    config::{Config, EXAMPLE_CONFIG},
};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-Lines landmark recording to replay
    #[arg(short, long, conflicts_with = "demo")]
    input: Option<PathBuf>,

    /// Run the built-in synthetic exercise instead of a recording
    #[arg(long)]
    demo: bool,

    /// Synthetic landmark jitter in pixels (demo only)
    #[arg(long, default_value = "0.0")]
    jitter: f64,

    /// Random seed for the synthetic jitter (demo only)
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Image width the landmarks were normalized against
    #[arg(long)]
    width: Option<u32>,

    /// Image height the landmarks were normalized against
    #[arg(long)]
    height: Option<u32>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Jaw Kinematics");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }

    let input = match args.input {
        Some(path) => InputSource::Recording(path),
        None if args.demo => InputSource::Demo {
            jitter_px: args.jitter,
            seed: args.seed,
        },
        None => anyhow::bail!("Either --input <FILE> or --demo is required"),
    };

    let mut app = ReplayApp::new(config, &input).context("Failed to start replay")?;
    let outcome = app.run().context("Replay failed")?;

    println!(
        "Frames: {} ({} without tracking)\nPhase: {:?}\nRepetitions: {}\nTare: lateral {:.2} mm, opening {:.2} mm",
        outcome.frames,
        outcome.lost_frames,
        outcome.phase,
        outcome.rep_count,
        outcome.tare.lateral,
        outcome.tare.opening
    );

    if let Some(summary) = &outcome.summary {
        println!(
            "Max opening: {:.2} mm ({})\nMean |deviation|: {:.2} mm\nStability index: {:.1}%\nATM score: {}/100",
            summary.max_opening_mm,
            summary.range,
            summary.mean_abs_deviation_mm,
            summary.stability_index,
            summary.atm_score
        );
    }

    if let Some(report) = &outcome.report {
        println!("\n{report}");
    }

    Ok(())
}
