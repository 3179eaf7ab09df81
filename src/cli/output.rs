//! CLI output formatting

use crate::{
    core::{ExecutionStatus, PlannedStep, StepState, Target},
    execution::ExecutionEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over a task's steps
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Horizontal rule as wide as the terminal
pub fn separator() -> String {
    let width = term_size::dimensions_stdout()
        .map(|(w, _)| w)
        .unwrap_or(80);
    "─".repeat(width.min(120))
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Completed { .. } => style("COMPLETED").green().to_string(),
        StepState::Tolerated { exit_code, .. } => {
            style(format!("IGNORED (exit {})", exit_code)).yellow().to_string()
        }
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
        ExecutionStatus::Skipped => style("SKIPPED").yellow().to_string(),
    }
}

/// Final line printed after a run
pub fn format_task_result(task_name: &str, status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Completed => format!(
            "{} {} completed {}",
            CHECK,
            style(task_name).bold(),
            style("successfully").green()
        ),
        ExecutionStatus::Skipped => format!(
            "{} {} {}",
            WARN,
            style(task_name).bold(),
            style("skipped").yellow()
        ),
        _ => format!(
            "{} {} {}",
            CROSS,
            style(task_name).bold(),
            style("failed").red()
        ),
    }
}

/// Format one planned step as a line
pub fn format_planned_step(index: usize, step: &PlannedStep) -> String {
    let target = match step.target {
        Some(Target::Remote) => style("remote").magenta().to_string(),
        Some(Target::Local) | None => style("local ").blue().to_string(),
    };
    format!(
        "{:>3}. [{}] {} {}",
        index + 1,
        target,
        style(&step.id).cyan(),
        style(&step.command).dim()
    )
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::TaskStarted {
            run_id,
            task_name,
            total_steps,
        } => format!(
            "{} Starting {} ({} steps, {})",
            ROCKET,
            style(task_name).bold(),
            total_steps,
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::TaskSkipped { task_name, reason } => {
            format!("{} {} skipped: {}", WARN, style(task_name).yellow(), reason)
        }
        ExecutionEvent::StepStarted {
            step_id,
            index,
            total,
            command,
        } => format!(
            "{} [{}/{}] {} {}",
            SPINNER,
            index,
            total,
            style(step_id).cyan(),
            style(command).dim()
        ),
        ExecutionEvent::StepOutput { step_id, output } => {
            format!("{} Output from {}:\n{}", INFO, style(step_id).dim(), output.trim_end())
        }
        ExecutionEvent::StepCompleted { step_id } => {
            format!("{} {}", CHECK, style(step_id).green())
        }
        ExecutionEvent::StepTolerated { step_id, error } => format!(
            "{} {} failed, continuing: {}",
            WARN,
            style(step_id).yellow(),
            style(error).dim()
        ),
        ExecutionEvent::TaskEndedEarly { step_id, error } => format!(
            "{} {} failed, nothing left to do: {}",
            WARN,
            style(step_id).yellow(),
            style(error).dim()
        ),
        ExecutionEvent::StepFailed { step_id, error } => {
            format!("{} {}: {}", CROSS, style(step_id).red(), style(error).dim())
        }
        ExecutionEvent::TaskCompleted { run_id, status } => format!(
            "{} Run {} {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
