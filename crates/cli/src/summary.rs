//! Run summary rendering.

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use acctremap_core::models::{RowOutcome, RunSummary};

/// Print one table row per input row, followed by totals.
pub fn print_summary(summary: &RunSummary) {
    if summary.rows() == 0 {
        println!("No account IDs in input.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Legacy ID", "Result", "Current ID", "Issues"]);

    for outcome in &summary.outcomes {
        match outcome {
            RowOutcome::Skipped { account_id, reason } => {
                table.add_row(vec![
                    Cell::new(account_id),
                    Cell::new(format!("skipped: {}", reason)).fg(Color::Yellow),
                    Cell::new(""),
                    Cell::new(""),
                ]);
            }
            RowOutcome::Replaced {
                old_account_id,
                new_account_id,
                issues,
                dry_run,
            } => {
                let result = if *dry_run {
                    Cell::new("would replace").fg(Color::Cyan)
                } else {
                    Cell::new("replaced").fg(Color::Green)
                };
                table.add_row(vec![
                    Cell::new(old_account_id),
                    result,
                    Cell::new(new_account_id),
                    Cell::new(issues.join(", ")),
                ]);
            }
        }
    }

    println!("{table}");
    println!();
    println!("Rows            : {}", summary.rows());
    println!("Accounts moved  : {}", summary.replaced_rows());
    println!("Issues updated  : {}", summary.issues_updated());
    for (reason, count) in summary.skips_by_reason() {
        println!("Skipped ({reason}) : {count}");
    }
}
