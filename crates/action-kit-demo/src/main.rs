//! Action kit demo binary.
//!
//! Builds one of a few sample action trees and drives it with a fixed
//! timestep until it completes or the tick limit is reached. Progress is
//! reported through `tracing`; set `RUST_LOG=action_kit=trace` to also see
//! every node start and finish.
//!
//! ```bash
//! cargo run -p action-kit-demo -- --scenario cutscene --dt 0.1
//! ```

mod scenario;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use action_kit::{ActionKit, ActionKitConfig, ActionRunner};
use scenario::Scenario;

/// Run sample action trees on a fixed timestep
#[derive(Parser, Debug)]
#[command(name = "action-kit-demo")]
#[command(about = "Drive sample action trees frame by frame", long_about = None)]
#[command(version)]
struct Cli {
    /// Which sample tree to run
    #[arg(long, value_enum, default_value_t = Scenario::Cutscene)]
    scenario: Scenario,

    /// Seconds advanced per tick
    #[arg(long, default_value_t = 1.0 / 30.0)]
    dt: f32,

    /// Stop after this many ticks even if the tree is still running
    #[arg(long, default_value_t = 600)]
    ticks: u32,
}

fn main() -> Result<()> {
    // Load .env file if it exists (for RUST_LOG and ACTION_KIT_* pool sizing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    setup_logging();

    if !(cli.dt.is_finite() && cli.dt >= 0.0) {
        anyhow::bail!("--dt must be a non-negative number, got {}", cli.dt);
    }

    let config = ActionKitConfig::from_env();
    tracing::debug!(default_pool = ?config.default_pool, "loaded configuration");

    let kit = ActionKit::new(config);
    let mut runner = ActionRunner::new(kit.clone());
    let report = cli.scenario.install(&kit, &mut runner);

    tracing::info!(scenario = %cli.scenario, dt = cli.dt, "starting");

    let mut tick = 0;
    while !runner.is_idle() && tick < cli.ticks {
        runner.update(cli.dt);
        tick += 1;
    }

    if runner.is_idle() {
        tracing::info!(ticks = tick, elapsed = tick as f32 * cli.dt, "scenario finished");
    } else {
        tracing::warn!(ticks = tick, remaining = runner.len(), "tick limit reached");
        runner.clear();
    }
    report.summarize();

    Ok(())
}

/// Logs go to stderr so scenario output stays readable when piped.
fn setup_logging() {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
