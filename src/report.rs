//! Plain-text optimisation report included in the compression archive

use crate::types::{BatchTotals, CompressionOutcome};
use chrono::{DateTime, Local};
use std::fmt::Write as _;

const RULE_WIDTH: usize = 110;
const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Per-file table plus batch totals, rendered as fixed-width text
#[derive(Debug, Clone)]
pub struct BatchReport {
    generated_at: DateTime<Local>,
    outcomes: Vec<CompressionOutcome>,
    totals: BatchTotals,
}

impl BatchReport {
    /// Build a report stamped with the current local time
    pub fn new(outcomes: Vec<CompressionOutcome>) -> Self {
        Self::with_timestamp(outcomes, Local::now())
    }

    /// Build a report with an explicit timestamp
    pub fn with_timestamp(outcomes: Vec<CompressionOutcome>, generated_at: DateTime<Local>) -> Self {
        let totals = BatchTotals::from_outcomes(&outcomes);
        Self {
            generated_at,
            outcomes,
            totals,
        }
    }

    /// Outcomes in input order
    pub fn outcomes(&self) -> &[CompressionOutcome] {
        &self.outcomes
    }

    /// Aggregate sizes
    pub fn totals(&self) -> BatchTotals {
        self.totals
    }

    /// Render the report text
    ///
    /// Per-file sizes are in KB, totals in MB, both with two decimals.
    pub fn render(&self) -> String {
        let rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "--- Optimization Report ({}) ---",
            self.generated_at.format("%d/%m/%Y %H:%M:%S")
        );
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "{:<40} | {:>15} | {:>15} | {:>15} | {}",
            "File Name", "Original (KB)", "Final (KB)", "Reduction (%)", "Status"
        );
        let _ = writeln!(out, "{rule}");

        for outcome in &self.outcomes {
            let _ = writeln!(
                out,
                "{:<40} | {:>15.2} | {:>15.2} | {:>15.2}% | {}",
                outcome.filename,
                outcome.original_size as f64 / KIB,
                outcome.final_size as f64 / KIB,
                outcome.reduction_percent(),
                outcome.status_label()
            );
        }

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "### Summary:");
        let _ = writeln!(
            out,
            "Total original size: {:.2} MB",
            self.totals.original_size as f64 / MIB
        );
        let _ = writeln!(
            out,
            "Total final size:    {:.2} MB",
            self.totals.final_size as f64 / MIB
        );
        let _ = write!(
            out,
            "Total reduction:     {:.2} MB ({:.2}%)",
            self.totals.reduction_bytes() as f64 / MIB,
            self.totals.reduction_percent()
        );

        out
    }
}
