//! CSV export for balancing pass reports.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::{Outcome, PassReport};

/// Column header for the pass report CSV.
const HEADER: &str =
    "sequence,device_index,device,demand_w,outcome,source_index,source,remaining_after_w";

/// Exports a pass report to a CSV file at the given path.
///
/// Writes a header row followed by one row per serviced device, in service
/// order.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(report: &PassReport, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(report, buf)
}

/// Writes a pass report as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(report: &PassReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for o in &report.outcomes {
        let (label, source_index, source) = match &o.outcome {
            Outcome::Powered { source_index, kind } => {
                ("powered", source_index.to_string(), kind.label())
            }
            Outcome::Unpowered => ("unpowered", String::new(), ""),
            Outcome::WorkerFault { .. } => ("fault", String::new(), ""),
        };
        wtr.write_record(&[
            o.sequence.to_string(),
            o.device_index.to_string(),
            o.device_name.clone(),
            format!("{:.1}", o.demand_w),
            label.to_string(),
            source_index,
            source.to_string(),
            format!("{:.1}", o.remaining_after_w),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
