use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use payrun_core::ViewMode;

/// Step-by-step payroll cycle runner
///
/// Runs the payroll cycle one step at a time. Each step is unlocked only
/// when every step before it has completed, submit steps need an explicit
/// acknowledgement, and the incentive calculation waits for its report to
/// be verified. Progress is kept in a local SQLite database between runs.
#[derive(Parser)]
#[command(version, about, name = "payrun")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/payrun/payrun.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Base URL of the payroll API. Without it a simulated backend is used
    #[arg(long, global = true, env = "PAYRUN_API_URL")]
    pub api_url: Option<String>,

    /// Latency of the simulated backend, in milliseconds
    #[arg(
        long,
        global = true,
        env = "PAYRUN_SIMULATED_LATENCY_MS",
        default_value_t = 1500
    )]
    pub latency_ms: u64,

    /// Make the simulated backend fail the given step (repeatable)
    #[arg(long, global = true, value_name = "STEP_ID")]
    pub simulate_failure: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands. Without one, `status` is shown.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the payroll cycle board
    #[command(aliases = ["s", "ls"])]
    Status,
    /// Run or submit a step
    #[command(alias = "r")]
    Run(RunArgs),
    /// Tick the acknowledgement checkbox of a submit step
    Check(StepArgs),
    /// Clear the acknowledgement checkbox of a submit step
    Uncheck(StepArgs),
    /// Review a step's report and mark it verified
    Verify(StepArgs),
    /// Show the process logs of a step
    Logs(StepArgs),
    /// Fetch the report attached to a step
    Report(StepArgs),
    /// Show additional information about a step
    Info(StepArgs),
    /// Start a new payroll cycle, resetting every step
    Reset(ConfirmArgs),
    /// Show the selectable months, or switch to one
    Month(MonthArgs),
    /// Switch the board between cards and a table
    View(ViewArgs),
}

#[derive(ClapArgs)]
pub struct StepArgs {
    #[arg(help = "Id of the step, e.g. incentive-validation")]
    pub step: String,
}

#[derive(ClapArgs)]
pub struct RunArgs {
    #[arg(help = "Id of the step to run or submit")]
    pub step: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(ClapArgs)]
pub struct ConfirmArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(ClapArgs)]
pub struct MonthArgs {
    #[arg(help = "Month to process, e.g. \"February 2026\"")]
    pub month: Option<String>,
}

#[derive(ClapArgs)]
pub struct ViewArgs {
    #[arg(value_enum)]
    pub mode: ViewModeArg,
}

/// Command-line representation of the board layout.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ViewModeArg {
    /// One card per step
    Cards,
    /// A single markdown table
    Table,
}

impl From<ViewModeArg> for ViewMode {
    fn from(val: ViewModeArg) -> Self {
        match val {
            ViewModeArg::Cards => ViewMode::Cards,
            ViewModeArg::Table => ViewMode::Table,
        }
    }
}
