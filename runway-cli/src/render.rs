//! Console rendering of executions

use colored::*;
use runway_core::domain::execution::{Execution, ExecutionStatus};

/// Colorize an execution status for display
pub fn colorize_status(status: ExecutionStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        ExecutionStatus::Queued => status_str.yellow(),
        ExecutionStatus::Running => status_str.cyan(),
        ExecutionStatus::Success => status_str.green(),
        ExecutionStatus::Failed => status_str.red(),
        ExecutionStatus::Unknown => status_str.dimmed(),
    }
}

/// One-entry summary used in listings
pub fn render_summary(execution: &Execution) -> String {
    format!(
        "  {} {} {}\n    Script:  {}\n    Status:  {}\n    Created: {}\n",
        "▸".cyan(),
        execution.name.bold(),
        execution.id.to_string().dimmed(),
        execution.script_id,
        colorize_status(execution.result.status),
        execution
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    )
}

/// Full execution details
pub fn render_details(execution: &Execution) -> String {
    let mut out = String::new();
    let result = &execution.result;

    out.push_str(&format!("{}\n", "Execution Details:".bold()));
    out.push_str(&format!("  ID:        {}\n", execution.id.to_string().cyan()));
    out.push_str(&format!("  Name:      {}\n", execution.name));
    out.push_str(&format!("  Script:    {}\n", execution.script_id));
    out.push_str(&format!("  Namespace: {}\n", execution.namespace));
    out.push_str(&format!(
        "  Type:      {} ({} input)\n",
        execution.spec.script_type, execution.spec.input_type
    ));
    out.push_str(&format!("  Status:    {}\n", colorize_status(result.status)));

    if let Some(started) = result.start_time {
        out.push_str(&format!(
            "  Started:   {}\n",
            started.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    if let Some(ended) = result.end_time {
        out.push_str(&format!(
            "  Ended:     {}\n",
            ended.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    if let Some(duration) = result.duration() {
        out.push_str(&format!("  Duration:  {}\n", format_duration(duration)));
    }

    let params = &execution.parameters.params;
    if !params.is_empty() {
        out.push_str(&format!("\n{}\n", "Variables:".bold()));
        let mut keys: Vec<_> = params.keys().collect();
        keys.sort();
        for key in keys {
            out.push_str(&format!("  {} = {}\n", key.cyan(), params[key]));
        }
    }

    if !result.output.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", "Output:".bold(), result.output));
    }

    if let Some(error) = &result.error_message {
        out.push_str(&format!("\n{}\n{}\n", "Error:".bold(), error.red()));
    }

    out
}

/// Seconds with millisecond precision; skewed backend clocks read as zero
pub fn format_duration(duration: chrono::Duration) -> String {
    let millis = duration.num_milliseconds().max(0);
    format!("{}.{:03}s", millis / 1000, millis % 1000)
}

/// Prints only what is new in an execution's output between snapshots
#[derive(Debug, Default)]
pub struct OutputTail {
    printed: usize,
    last_status: Option<ExecutionStatus>,
}

impl OutputTail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to print for this snapshot; empty when nothing changed
    pub fn advance(&mut self, execution: &Execution) -> String {
        let mut out = String::new();
        let result = &execution.result;

        if self.last_status != Some(result.status) {
            out.push_str(&format!("{} {}\n", "status:".dimmed(), colorize_status(result.status)));
            self.last_status = Some(result.status);
        }

        // Backends may rewrite output; start over when it shrinks
        if result.output.len() < self.printed || !result.output.is_char_boundary(self.printed) {
            self.printed = 0;
        }
        let fresh = &result.output[self.printed..];
        if !fresh.is_empty() {
            out.push_str(fresh);
            if !fresh.ends_with('\n') {
                out.push('\n');
            }
            self.printed = result.output.len();
        }

        out
    }
}
