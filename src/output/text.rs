//! Human-readable text output.

use std::io::{self, Write};

use yansi::Paint;

use crate::resolver::{DuplicateStatus, ResolveReport};

/// Write the result of `rowdupe count`.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_count<W: Write>(out: &mut W, kind: &str, status: &DuplicateStatus) -> io::Result<()> {
    if !status.has_duplicates() {
        writeln!(out, "{} No duplicate '{}' records.", "✓".green(), kind)?;
        return Ok(());
    }
    writeln!(
        out,
        "{} duplicate group(s) of kind '{}' covering {} record(s).",
        status.groups.yellow().bold(),
        kind,
        status.records
    )?;
    writeln!(
        out,
        "Running `rowdupe clean` would delete {} record(s).",
        status.surplus().bold()
    )
}

/// Write the result of `rowdupe clean`.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_clean<W: Write>(out: &mut W, report: &ResolveReport) -> io::Result<()> {
    if report.groups_found == 0 {
        writeln!(out, "{} No duplicate '{}' records.", "✓".green(), report.kind)?;
        return Ok(());
    }

    let marker = if report.is_complete() {
        "✓".green()
    } else {
        "!".red()
    };
    writeln!(out, "{} {}", marker, report.summary())?;

    for failure in &report.failures {
        writeln!(
            out,
            "  {} {} (kept id {}): {}",
            "failed".red(),
            failure.key.bold(),
            failure.kept_id,
            failure.message
        )?;
    }

    if report.interrupted {
        writeln!(
            out,
            "Interrupted; run `rowdupe clean` again to finish the remaining group(s)."
        )?;
    }
    Ok(())
}
