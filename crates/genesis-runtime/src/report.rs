//! Human-readable command output.

use std::fmt::Write;

use genesis_orchestrator::{
    Allocation, AllocationTable, GenesisOutcome, LockStatus, RunStatus, Step, StepProgress,
};

pub fn render_plan(steps: &[Step], allocations: &[Allocation], table: &AllocationTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12} {:>8} {:>16} {:>28}  lock", "category", "share", "whole units", "smallest units");
    for allocation in allocations {
        let Some(category) = table.get(&allocation.category) else {
            continue;
        };
        let lock = match category.lock_duration_secs {
            Some(secs) if category.is_time_restricted => format!("{secs}s"),
            _ => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<12} {:>7}% {:>16} {:>28}  {}",
            allocation.category,
            category.percentage.to_string(),
            allocation.whole_units,
            allocation.quantity,
            lock
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "steps:");
    for (i, step) in steps.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {}", i + 1, step);
    }
    out
}

pub fn render_status(status: &RunStatus) -> String {
    let mut out = String::new();
    match status.run_id {
        Some(run_id) => {
            let _ = writeln!(out, "run {run_id}");
        }
        None => {
            let _ = writeln!(out, "no run started");
        }
    }
    for entry in &status.steps {
        let marker = match &entry.progress {
            StepProgress::Complete => "done".to_string(),
            StepProgress::Pending { signature } => format!("pending (tx {})", signature.short()),
            StepProgress::NotStarted => "-".to_string(),
        };
        let _ = writeln!(out, "  {:<24} {}", entry.step.to_string(), marker);
    }
    if let Some(next) = status.next_step() {
        let _ = writeln!(out, "next: {next}");
    }
    out
}

pub fn render_outcome(outcome: &GenesisOutcome) -> String {
    let body = &outcome.manifest.body;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "asset {} ({}) with {} decimals",
        body.asset.symbol, body.asset.asset_id, body.asset.decimals
    );
    for issuance in &body.issuances {
        let _ = writeln!(
            out,
            "  {:<12} {:>28} -> {}",
            issuance.category, issuance.quantity, issuance.destination
        );
    }
    let _ = writeln!(out, "total issued {}", body.total_issued);
    for intent in &body.release_schedule {
        let status = match &intent.status {
            LockStatus::Intended => "intended (not enforced)".to_string(),
            LockStatus::Active { reference, .. } => format!("active ({reference})"),
        };
        let _ = writeln!(
            out,
            "  lock {:<12} until {}  {}",
            intent.category, intent.unlock_at, status
        );
    }
    let _ = writeln!(
        out,
        "steps executed {}, skipped {}",
        outcome.steps_executed.len(),
        outcome.steps_skipped.len()
    );
    let _ = writeln!(out, "manifest digest {}", outcome.manifest.digest);
    out
}
