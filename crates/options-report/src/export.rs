use anyhow::{Context, Result};
use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::report::{OptionReport, COLUMNS};

pub struct CsvExporter;

impl CsvExporter {
    /// Writes the report to a CSV file that opens directly in a spreadsheet.
    ///
    /// Format: instrument_name,strike_price,side,bid/ask,margin_required,premium_earned
    ///
    /// The header is written even when the report has no rows.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write(path: impl AsRef<Path>, report: &OptionReport) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        Self::write_to(file, report)
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))
    }

    /// Writes the report to any writer.
    ///
    /// # Errors
    /// Returns error if writing fails
    pub fn write_to<W: Write>(writer: W, report: &OptionReport) -> Result<()> {
        let mut writer = Writer::from_writer(writer);

        writer.write_record(COLUMNS)?;
        for row in &report.rows {
            writer.write_record(row.record())?;
        }

        writer.flush()?;
        Ok(())
    }
}
