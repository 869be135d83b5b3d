use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use client::{ClientConfig, ClientSession, DEFAULT_HOST, DEFAULT_PORT};
use sim::{run_loop, LocalWorld, RunReport, ScriptedPilot};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "horde-sim",
    version,
    about = "Headless horde client driven by a scripted pilot"
)]
struct Cli {
    /// Relay host.
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    /// Relay port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// RNG seed for the world and the pilot.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Ticks per second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    tick_rate: u32,
    /// Skip connecting and run purely locally.
    #[arg(long)]
    offline: bool,
    /// Write the run summary here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ClientConfig::new(cli.host.clone(), cli.port);
    let mut session = if cli.offline {
        ClientSession::new(config)
    } else {
        ClientSession::connect(config)
    };

    let mut world = LocalWorld::new(cli.seed);
    let mut pilot = ScriptedPilot::new(cli.seed);
    info!(
        ticks = cli.ticks,
        tick_rate = cli.tick_rate,
        state = %session.state(),
        "starting run"
    );
    let report = run_loop(&mut session, &mut world, &mut pilot, cli.ticks, cli.tick_rate);
    session.close();

    match &cli.out {
        Some(path) => write_summary_json(path, &report)?,
        None => {
            let contents = serde_json::to_string_pretty(&report).context("serialize summary")?;
            println!("{contents}");
        }
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
}

fn write_summary_json(path: &Path, report: &RunReport) -> Result<()> {
    let contents = serde_json::to_string_pretty(report).context("serialize summary")?;
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
