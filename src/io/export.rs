//! Export the analysis frame to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! one row per date, one column per input series or derived spread.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::AlignedDataset;
use crate::error::AppError;

/// Write `dataset` to a CSV file with header `date,<columns...>`.
pub fn write_dataset_csv(path: &Path, dataset: &AlignedDataset) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut w = BufWriter::new(file);
    write_dataset(&mut w, dataset).map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))?;
    w.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))
}

fn write_dataset<W: Write>(w: &mut W, dataset: &AlignedDataset) -> std::io::Result<()> {
    let names: Vec<&str> = dataset.column_names().collect();
    let columns: Vec<&[f64]> = names.iter().filter_map(|n| dataset.column(n)).collect();

    // Header
    writeln!(w, "date,{}", names.join(","))?;

    for (i, date) in dataset.dates().iter().enumerate() {
        write!(w, "{date}")?;
        for col in &columns {
            write!(w, ",{:.6}", col[i])?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::analysis::TimeSeriesAligner;
    use crate::domain::TimeSeries;

    #[test]
    fn csv_has_header_and_one_row_per_date() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let vix = TimeSeries::from_values(vec![(d(1), 15.0), (d(4), 16.5)]).unwrap();
        let lqd = TimeSeries::from_values(vec![(d(1), 108.25), (d(4), 108.0)]).unwrap();
        let dataset = TimeSeriesAligner::new(2)
            .align([("VIX", &vix), ("LQD", &lqd)])
            .unwrap();

        let mut buf = Vec::new();
        write_dataset(&mut buf, &dataset).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "date,LQD,VIX");
        assert_eq!(lines[1], "2024-03-01,108.250000,15.000000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn unwritable_path_maps_to_exit_code_2() {
        let dataset = AlignedDataset::default();
        let err = write_dataset_csv(Path::new("/nonexistent-dir/out.csv"), &dataset).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
