// src/report.rs

//! Human-readable run summaries.

use std::fmt::Write;

use crate::engine::RunOutcome;
use crate::types::ValidationMode;

/// Render every failure with its diagnostic and every skipped task with
/// its blocker.
pub fn format_outcome(outcome: &RunOutcome, mode: ValidationMode) -> String {
    let mut out = String::new();

    let verdict = if outcome.has_blocking_failure(mode) {
        "FAILED"
    } else {
        "ok"
    };
    let _ = writeln!(
        out,
        "run {}: {} ({} succeeded, {} failed, {} skipped)",
        outcome.run_id,
        verdict,
        outcome.succeeded.len(),
        outcome.failed.len(),
        outcome.skipped.len()
    );

    for (task, diagnostic) in &outcome.failed {
        let advisory = outcome.validators.contains(task) && mode == ValidationMode::Advisory;
        let label = if advisory { "failed (advisory)" } else { "failed" };
        let _ = writeln!(out, "  {task}: {label}");
        for line in diagnostic.lines() {
            let _ = writeln!(out, "    | {line}");
        }
    }

    for (task, blocker) in &outcome.skipped {
        let _ = writeln!(out, "  {task}: skipped (blocked by {blocker})");
    }

    out
}

pub fn print_outcome(outcome: &RunOutcome, mode: ValidationMode) {
    print!("{}", format_outcome(outcome, mode));
}
