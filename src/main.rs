use std::path::PathBuf;

use clap::Parser;

use parrysync::config;
use parrysync::sim::{self, SimOptions};

#[derive(Parser, Debug)]
#[command(name = "parrysync", about = "Headless rhythm-parry session runner")]
struct Args {
    /// Seconds of game time to simulate.
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Chance (0..=1) that the auto-player answers a beat correctly.
    #[arg(long, default_value_t = 0.8)]
    accuracy: f32,

    /// Path to the INI config; written with defaults if missing.
    #[arg(long, default_value = config::CONFIG_PATH)]
    config: PathBuf,

    #[arg(long, default_value_t = 60)]
    tick_hz: u32,

    /// JSON file of combos (arrays of beat specs) replayed instead of random ones.
    #[arg(long)]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    let args = Args::parse();
    let cfg = config::load(&args.config);
    log::set_max_level(cfg.log_level.as_level_filter());

    let script = match &args.script {
        Some(path) => Some(sim::load_script(path)?),
        None => None,
    };
    let opts = SimOptions {
        seconds: args.seconds,
        seed: args.seed,
        accuracy: args.accuracy,
        tick_hz: args.tick_hz,
        script,
    };

    let summary = sim::run_session(&cfg, &opts)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
