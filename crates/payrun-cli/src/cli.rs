//! Command handlers for the payrun CLI.
//!
//! Each handler drives the [`Orchestrator`] the way an operator would on the
//! board: ask for an action, answer the confirmation dialog, then read the
//! feedback dialog. Dialogs are rendered as markdown; confirmations prompt
//! on stdin unless `--yes` was given.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use jiff::Zoned;
use log::debug;
use payrun_core::{
    registry::available_months, ConfirmOutcome, ExecutionOutcome, Modal, ModalKind, Orchestrator,
    RequestOutcome, VerifyOutcome, ViewMode,
};

use crate::{
    args::{Commands, ConfirmArgs, MonthArgs, RunArgs, StepArgs, ViewArgs},
    renderer::TerminalRenderer,
};

pub struct Cli {
    cycle: Orchestrator,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(cycle: Orchestrator, renderer: TerminalRenderer) -> Self {
        Self { cycle, renderer }
    }

    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        // Feedback left by startup, e.g. a verification picked up from the store.
        self.flush_modal()?;

        match command {
            Commands::Status => self.show_status(),
            Commands::Run(RunArgs { step, yes }) => self.run_step(&step, yes).await,
            Commands::Check(StepArgs { step }) => self.set_checked(&step, true),
            Commands::Uncheck(StepArgs { step }) => self.set_checked(&step, false),
            Commands::Verify(StepArgs { step }) => self.verify(&step).await,
            Commands::Logs(StepArgs { step }) => {
                self.cycle.show_logs(&step).await?;
                self.flush_modal()
            }
            Commands::Report(StepArgs { step }) => {
                let url = self.cycle.view_report(&step).await?;
                self.flush_modal()?;
                if url.is_none() {
                    bail!("No report available for '{step}'");
                }
                Ok(())
            }
            Commands::Info(StepArgs { step }) => {
                self.cycle.show_info(&step)?;
                self.flush_modal()
            }
            Commands::Reset(ConfirmArgs { yes }) => self.reset(yes).await,
            Commands::Month(MonthArgs { month }) => self.month(month.as_deref()),
            Commands::View(ViewArgs { mode }) => {
                self.cycle.set_view_mode(ViewMode::from(mode));
                self.show_status()
            }
        }
    }

    pub fn show_status(&self) -> Result<()> {
        self.renderer.render(&self.cycle.board().to_string())
    }

    async fn run_step(&self, step: &str, yes: bool) -> Result<()> {
        match self.cycle.request_execute(step)? {
            RequestOutcome::AlreadyRunning => {
                println!("Step '{step}' is already running.");
                return Ok(());
            }
            RequestOutcome::Rejected(refusal) => {
                self.flush_modal()?;
                bail!("{refusal}");
            }
            RequestOutcome::AwaitingConfirmation => {}
        }

        if !self.confirm_dialog(yes)? {
            return Ok(());
        }

        let outcome = self.cycle.confirm().await?;
        self.flush_modal()?;
        match outcome {
            ConfirmOutcome::Executed(ExecutionOutcome::Failed(failure)) => {
                bail!("Step '{step}' failed: {failure}")
            }
            ConfirmOutcome::Executed(ExecutionOutcome::Rejected(refusal)) => bail!("{refusal}"),
            _ => Ok(()),
        }
    }

    fn set_checked(&self, step: &str, checked: bool) -> Result<()> {
        if let Some(refusal) = self.cycle.set_checked(step, checked)? {
            self.flush_modal()?;
            bail!("{refusal}");
        }
        let mark = if checked { "[x]" } else { "[ ]" };
        println!("{mark} {step}");
        Ok(())
    }

    async fn verify(&self, step: &str) -> Result<()> {
        match self.cycle.verify_report(step).await? {
            VerifyOutcome::Rejected(refusal) => {
                self.flush_modal()?;
                bail!("{refusal}");
            }
            VerifyOutcome::Failed(failure) => {
                self.flush_modal()?;
                bail!("Failed to load the report: {failure}");
            }
            VerifyOutcome::Posted(link) => {
                let mut review = format!("## Report Review\n\n{}\n", link.message);
                if let Some(url) = &link.url {
                    review.push_str(&format!("\n- **Report**: {url}\n"));
                }
                self.renderer.render(&review)?;
            }
        }

        // Back on the board: pick up the hand-off that was just posted.
        if let Some(outcome) = self.cycle.consume_handoff() {
            debug!("Verification hand-off applied: {outcome:?}");
        }
        self.flush_modal()
    }

    async fn reset(&self, yes: bool) -> Result<()> {
        if let RequestOutcome::Rejected(refusal) = self.cycle.request_reset() {
            self.flush_modal()?;
            bail!("{refusal}");
        }
        if !self.confirm_dialog(yes)? {
            return Ok(());
        }
        let outcome = self.cycle.confirm().await?;
        self.flush_modal()?;
        if let ConfirmOutcome::ResetRejected(refusal) = outcome {
            bail!("{refusal}");
        }
        Ok(())
    }

    fn month(&self, month: Option<&str>) -> Result<()> {
        let available = available_months(Zoned::now().date());
        let selected = self.cycle.selected_month();

        let Some(month) = month else {
            let mut out = String::from("## Payroll Month\n\n");
            for candidate in &available {
                let marker = if *candidate == selected { " (selected)" } else { "" };
                out.push_str(&format!("- {candidate}{marker}\n"));
            }
            if !available.contains(&selected) {
                out.push_str(&format!("\nCurrently selected: {selected}\n"));
            }
            return self.renderer.render(&out);
        };

        let Some(choice) = available
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(month.trim()))
        else {
            bail!(
                "Unknown month '{month}'. Choose one of: {}",
                available.join(", ")
            );
        };
        self.cycle
            .select_month(choice)
            .context("Failed to select month")?;
        println!("Selected month: {choice}");
        Ok(())
    }

    /// Renders the open confirm dialog and asks for an answer. Declining
    /// cancels the dialog.
    fn confirm_dialog(&self, yes: bool) -> Result<bool> {
        if yes {
            return Ok(true);
        }
        if let Some(modal) = self.cycle.modal() {
            self.renderer.render(&modal.to_string())?;
        }
        if prompt("Proceed? [y/N] ")? {
            return Ok(true);
        }
        self.cycle.cancel();
        println!("Cancelled.");
        Ok(false)
    }

    /// Renders and closes the open dialog, if any. Confirm dialogs are left
    /// to [`confirm_dialog`](Self::confirm_dialog).
    fn flush_modal(&self) -> Result<()> {
        if self.cycle.modal().map(|m| m.kind()) == Some(ModalKind::Confirm) {
            return Ok(());
        }
        if let Some(modal) = self.cycle.close_modal() {
            self.render_modal(&modal)?;
        }
        Ok(())
    }

    fn render_modal(&self, modal: &Modal) -> Result<()> {
        self.renderer.render(&modal.to_string())?;
        println!();
        Ok(())
    }
}

fn prompt(question: &str) -> Result<bool> {
    print!("{question}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
