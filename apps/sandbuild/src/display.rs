//! Rendering of diagnostic reports

use crate::error::CliError;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use sandbuild_builder::DiagnosticReport;

/// Print `report` to stdout as a table, or as JSON when `json` is set
pub fn render_report(report: &DiagnosticReport, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let results = report.results();
    if results.is_empty() {
        println!("No diagnostics.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Level", "Rule", "Message"]);
    for result in results {
        table.add_row(vec![
            result.level.as_str().to_string(),
            result.rule_id.clone(),
            result.message.text.clone(),
        ]);
    }
    println!("{table}");
    println!(
        "{} error(s), {} warning(s)",
        report.errors().count(),
        report.warnings().count()
    );
    Ok(())
}
