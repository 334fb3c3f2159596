//! Payrun CLI application
//!
//! Command-line front end for the payroll cycle runner.

mod args;
mod cli;
mod renderer;

use std::time::Duration;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use payrun_core::{
    handler::{PayrollApi, SimulatedPayroll},
    CycleBuilder,
};
use renderer::TerminalRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        api_url,
        latency_ms,
        simulate_failure,
        command,
    } = Args::parse();

    let builder = CycleBuilder::new().with_database_path(database_file);
    let builder = match api_url {
        Some(url) => {
            info!("Using payroll API at {url}");
            let api = PayrollApi::new(&url).context("Failed to configure payroll API")?;
            builder.with_handlers(api.handlers()).with_reporting(api)
        }
        None => {
            info!("Using simulated payroll backend ({latency_ms} ms latency)");
            let simulated = simulate_failure.into_iter().fold(
                SimulatedPayroll::new(Duration::from_millis(latency_ms)),
                |simulated, step| simulated.failing(step),
            );
            builder
                .with_handlers(simulated.handlers())
                .with_reporting(simulated)
        }
    };

    let cycle = builder
        .build()
        .await
        .context("Failed to initialize payroll cycle")?;

    Cli::new(cycle, TerminalRenderer::new(!no_color))
        .handle_command(command.unwrap_or(Commands::Status))
        .await
}
