//! drizzle - raindrops running down a terminal window
//!
//! # Usage
//!
//! ```bash
//! drizzle
//! drizzle --config drizzle.toml --fps 30
//! drizzle --headless --duration 10 --seed 7 --log-level debug
//! ```

#[macro_use]
extern crate tracing;

mod config;
mod render;
mod weather;

use crate::{
    config::Config,
    render::{LogRenderer, Screen, TermRenderer},
    weather::{RandomDroplets, jittered_delay},
};
use anyhow::{Context, Result};
use clap::Parser;
use drizzle::pipeline::{Pipeline, Renderer};
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};


/// drizzle - raindrops running down a terminal window
#[derive(Parser, Debug)]
#[command(name = "drizzle")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "drizzle.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Animation frames per second
    #[arg(long)]
    fps: Option<f64>,

    /// Stop after this many seconds instead of waiting for ctrl-c
    #[arg(short, long)]
    duration: Option<f64>,

    /// Log frames instead of drawing them
    #[arg(long)]
    headless: bool,

    /// Seed for droplet placement and timing
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(fps) = self.fps {
            config.pipeline.frame_rate = fps;
        }
        if self.headless {
            config.display.headless = true;
        }
        if self.seed.is_some() {
            config.rain.seed = self.seed;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let duration = cli.duration
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("invalid duration")?;

    run(&config, duration).await
}

async fn run(config: &Config, duration: Option<Duration>) -> Result<()> {
    let renderer: Box<dyn Renderer + Send> = if config.display.headless {
        Box::new(LogRenderer::default())
    } else {
        Box::new(TermRenderer::stdout(&config.display))
    };

    let pipeline = Pipeline::spawn(
        &config.pipeline_config(),
        jittered_delay(&config.rain),
        RandomDroplets::new(&config.rain, &config.display),
        Screen::new(&config.display),
        renderer,
    )?;
    info!(headless = config.display.headless, "raining");

    match duration {
        Some(duration) => tokio::select! {
            _ = tokio::time::sleep(duration) => debug!("duration elapsed"),
            result = tokio::signal::ctrl_c() => result.context("failed to listen for ctrl-c")?,
        },
        None => tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?,
    }

    pipeline.close();
    let stats = pipeline.join().await.context("pipeline task failed")?;
    info!(generated = stats.generated, frames = stats.frames, "stopped");
    Ok(())
}

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so they do not interleave with frames on stdout.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
