//! Terminal reports for sessions and finished runs

use crate::pipeline::{RunOutcome, RunReport};
use crate::state::SessionState;

/// Prints resumable sessions to stdout
///
/// # Arguments
///
/// * `sessions` - Incomplete sessions, as returned by `StateStore::list_active`
pub fn print_sessions(sessions: &[SessionState]) {
    if sessions.is_empty() {
        println!("No active sessions found.");
        return;
    }

    println!("=== Active Sessions ({}) ===\n", sessions.len());

    for session in sessions {
        println!("Session {}:", session.query_hash);
        println!("  Query: {}", session.query);
        println!("  Max results: {}", session.max_results);
        println!("  Output: {}", session.output_file);
        println!(
            "  Progress: {}/{} ({:.1}%)",
            session.processed_count(),
            session.total(),
            session.progress_percentage()
        );
        println!(
            "  Successful: {}, Failed: {}",
            session.success_count, session.failed_count
        );
        println!(
            "  Last updated: {}",
            session.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!();
    }
}

/// Prints the outcome of a run to stdout
pub fn print_run_summary(report: &RunReport) {
    println!("=== Scrape Summary ===\n");

    let outcome = match &report.outcome {
        RunOutcome::Completed => "completed".to_string(),
        RunOutcome::NoResults { diagnostic } => format!("no results ({})", diagnostic),
        RunOutcome::StoppedEarly {
            consecutive_failures,
        } => format!(
            "stopped early after {} consecutive failures",
            consecutive_failures
        ),
        RunOutcome::Interrupted => "interrupted (progress saved)".to_string(),
    };

    println!("Outcome: {}", outcome);
    println!(
        "Session: {}{}",
        report.session_key,
        if report.resumed { " (resumed)" } else { "" }
    );
    println!("Output: {}", report.output_path.display());
    println!();

    println!("Candidates: {}", report.total_candidates);
    println!("  Successful: {}", report.success_count);
    println!("  Failed: {}", report.failed_count);
    println!("  Rows written this run: {}", report.rows_written);
    if report.duplicates_skipped > 0 {
        println!("  Duplicates skipped: {}", report.duplicates_skipped);
    }

    let processed = report.success_count + report.failed_count;
    if processed > 0 {
        println!(
            "\nSuccess Rate: {:.1}% ({} / {} candidates)",
            report.success_count as f64 * 100.0 / processed as f64,
            report.success_count,
            processed
        );
    }

    if matches!(
        report.outcome,
        RunOutcome::Interrupted | RunOutcome::StoppedEarly { .. }
    ) {
        println!("\nRun the same command again to resume.");
    }
}
