use anyhow::{bail, Result};

use linkdeck_lib::import::{self, ImportReport, Outcome};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let client = app.client()?;
    let report = import::run_import(&app.config, Box::new(client))?;
    print_report(&report, format)?;

    if report.has_failures() {
        bail!("{} note(s) failed to import", report.summary().failed);
    }
    Ok(())
}

pub fn run_preview(app: &App, format: &OutputFormat) -> Result<()> {
    let report = import::preview_import(&app.config)?;
    print_report(&report, format)
}

fn print_report(report: &ImportReport, format: &OutputFormat) -> Result<()> {
    let summary = report.summary();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "report": report,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if report.notes.is_empty() {
                println!("Nothing to import.");
                return Ok(());
            }

            let max_note_len = report
                .notes
                .iter()
                .map(|n| n.title.as_deref().unwrap_or(&n.note).chars().count())
                .max()
                .unwrap_or(4)
                .max(4);

            println!("{:<width$} {:<10} {:>5}  Detail", "Note", "Status", "Depth", width = max_note_len);
            println!(
                "{} {} {}  {}",
                "\u{2500}".repeat(max_note_len),
                "\u{2500}".repeat(10),
                "\u{2500}".repeat(5),
                "\u{2500}".repeat(6)
            );

            for note in &report.notes {
                let name = note.title.as_deref().unwrap_or(&note.note);
                let detail = match &note.outcome {
                    Outcome::Created { card_id } => format!("note {}", card_id),
                    Outcome::Skipped { reason } | Outcome::Failed { reason } => reason.clone(),
                    Outcome::NotFound => note
                        .linked_from
                        .as_ref()
                        .map(|from| format!("linked from {}", from))
                        .unwrap_or_default(),
                    Outcome::Duplicate | Outcome::Previewed => String::new(),
                };
                println!(
                    "{:<width$} {:<10} {:>5}  {}",
                    name,
                    note.outcome.label(),
                    note.depth,
                    detail,
                    width = max_note_len
                );
                for warning in &note.warnings {
                    println!("{:<width$}   warning: {}", "", warning, width = max_note_len);
                }
            }

            let deck = if report.deck.is_empty() { "-" } else { report.deck.as_str() };
            if report.dry_run {
                println!(
                    "\n{} note(s) would be added to '{}': {} skipped, {} not found",
                    summary.previewed, deck, summary.skipped, summary.not_found
                );
            } else {
                println!(
                    "\n'{}': {} created, {} duplicate, {} skipped, {} not found, {} failed",
                    deck,
                    summary.created,
                    summary.duplicate,
                    summary.skipped,
                    summary.not_found,
                    summary.failed
                );
            }
        }
    }

    Ok(())
}
