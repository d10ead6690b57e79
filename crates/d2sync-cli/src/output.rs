//! Human readable rendering of profiles, plans and reports

use colored::Colorize;

use d2sync_core::{
    AccountProfile, ChangeSummary, ConflictPolicy, ExecutionReport, OperationState, SyncAction,
    SyncMode, SyncOperation, SyncPlan,
};

pub fn mode_name(mode: SyncMode) -> &'static str {
    match mode {
        SyncMode::Mirror => "mirror",
        SyncMode::Merge => "merge",
    }
}

pub fn policy_name(policy: ConflictPolicy) -> &'static str {
    match policy {
        ConflictPolicy::PreferSource => "prefer-source",
        ConflictPolicy::PreferDestination => "prefer-destination",
        ConflictPolicy::BackupBoth => "backup-both",
    }
}

pub fn print_profile(profile: &AccountProfile) {
    println!(
        "   {} {} {}",
        "-".green(),
        profile.id.cyan(),
        profile.root.display().to_string().dimmed()
    );
}

pub fn print_summary(changes: &ChangeSummary) {
    println!(
        "   {} added, {} removed, {} modified, {} unchanged",
        changes.added.to_string().green(),
        changes.removed.to_string().red(),
        changes.modified.to_string().yellow(),
        changes.unchanged
    );
}

fn action_marker(action: &SyncAction) -> colored::ColoredString {
    match action {
        SyncAction::CopyToDestination => "+".green(),
        SyncAction::BackupThenOverwrite { .. } => "!".yellow(),
        SyncAction::Delete => "-".red(),
        SyncAction::Skip => "=".dimmed(),
    }
}

fn print_operation(op: &SyncOperation) {
    println!(
        "   {} {:<11} {} ({})",
        action_marker(&op.action),
        op.action.label(),
        op.path.as_str().cyan(),
        op.reason.to_string().dimmed()
    );
    if let SyncAction::BackupThenOverwrite { backup } = &op.action {
        println!("     {} {}", "backup:".dimmed(), backup.display());
    }
}

/// Effective operations only; skips are summarized by count.
pub fn print_plan(plan: &SyncPlan) {
    if plan.is_noop() {
        println!("{} Already in sync. Nothing to do.", "OK".green().bold());
        return;
    }
    println!("{} Planned operations:", "=>".blue().bold());
    for op in plan.effective() {
        print_operation(op);
    }
    let skipped = plan.len() - plan.effective().count();
    if skipped > 0 {
        println!("   {} {} file(s) left as is", "=".dimmed(), skipped);
    }
}

pub fn print_report(report: &ExecutionReport) {
    for outcome in &report.outcomes {
        let op = &outcome.operation;
        match outcome.state {
            OperationState::Committed if outcome.changed => print_operation(op),
            OperationState::Failed => {
                println!(
                    "   {} {} {}: {}",
                    "x".red().bold(),
                    op.action.label(),
                    op.path.as_str().cyan(),
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            OperationState::Pending if op.action.is_effectful() => {
                println!(
                    "   {} {} {} (not run)",
                    "?".dimmed(),
                    op.action.label(),
                    op.path.as_str().dimmed()
                );
            }
            _ => {}
        }
    }

    let failed = report.failed().count();
    if failed > 0 {
        println!(
            "{} {} committed, {} failed, {} not run",
            "PARTIAL".red().bold(),
            report.committed().count(),
            failed,
            report.not_run().count()
        );
    }
}
