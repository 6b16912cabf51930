//! Integration Tests for gcvoc
//!
//! This module drives the full pipeline (extraction, peak matching,
//! concentration calculation, CSV output) against synthetic GC report
//! workbooks generated in-memory with rust_xlsxwriter.

use std::io::Cursor;

use gcvoc::{GcVocError, PipelineBuilder};

// Helper module for generating test fixtures
mod fixtures {
    use rust_xlsxwriter::{Workbook, XlsxError};

    /// Report path cell content carrying the canonical test timestamp.
    pub const SIGNALS_PATH: &str = "C:/Chem/GC/Signals/2024-03-25 12-10-52/Report01.D";

    /// Generate a report workbook with the instrument's fixed layout:
    /// Back channel peaks from row 20 terminated by a "Sum" sentinel in
    /// column 5 (with a blank spacer row before it), Front channel starting
    /// 3 rows after the Back sentinel, retention times in column 1, areas
    /// in column 9, and the timestamp-bearing path string in cell H4.
    pub fn generate_report(
        back: &[(f64, f64)],
        front: &[(f64, f64)],
        path_cell: Option<&str>,
    ) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        if let Some(path) = path_cell {
            worksheet.write_string(3, 7, path)?;
        }

        // Back channel region
        let mut row: u32 = 20;
        for &(rt, area) in back {
            worksheet.write_number(row, 1, rt)?;
            worksheet.write_number(row, 9, area)?;
            row += 1;
        }
        row += 1; // blank spacer row
        let back_sentinel = row;
        worksheet.write_string(back_sentinel, 5, "Sum")?;

        // Front channel region starts 3 rows after the Back sentinel
        row = back_sentinel + 3;
        for &(rt, area) in front {
            worksheet.write_number(row, 1, rt)?;
            worksheet.write_number(row, 9, area)?;
            row += 1;
        }
        row += 1; // blank spacer row
        worksheet.write_string(row, 5, "Sum")?;

        workbook.save_to_buffer()
    }

    /// Generate a report missing the "Sum" sentinel in both channels.
    pub fn generate_report_without_sentinel() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_number(20, 1, 9.6)?;
        worksheet.write_number(20, 9, 100.0)?;
        workbook.save_to_buffer()
    }

    /// Generate a report whose Back region contains a row with a
    /// non-numeric retention time cell.
    pub fn generate_report_with_junk_row() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(3, 7, SIGNALS_PATH)?;
        worksheet.write_number(20, 1, 9.6)?;
        worksheet.write_number(20, 9, 100.0)?;
        worksheet.write_string(21, 1, "n.a.")?;
        worksheet.write_number(21, 9, 55.0)?;
        // row 22 blank spacer, sentinel at 23
        worksheet.write_string(23, 5, "Sum")?;
        // Front: starts at 26, empty, sentinel at 27
        worksheet.write_string(27, 5, "Sum")?;
        workbook.save_to_buffer()
    }
}

#[test]
fn test_single_report_ethane_concentration() {
    let bytes =
        fixtures::generate_report(&[(9.6, 100.0)], &[], Some(fixtures::SIGNALS_PATH)).unwrap();
    let pipeline = PipelineBuilder::new().build().unwrap();

    let row = pipeline.process_reader(Cursor::new(bytes)).unwrap();
    let table = pipeline.calibration();

    // One Back peak at rt 9.6 falls in Ethane's window (9.552 ± 2%)
    let ethane = table.position("Ethane").unwrap();
    let expected = (100.0 - 0.464654348) / 39.41618609;
    assert!((row.values[ethane] - expected).abs() < 1e-9);
    assert!((row.values[ethane] - 2.524).abs() < 1e-3);

    // Every calibration compound has a column value
    assert_eq!(row.values.len(), table.len());

    // Compounds with no matching peak report exactly zero
    let nonane = table.position("Nonane").unwrap();
    assert_eq!(row.values[nonane], 0.0);
}

#[test]
fn test_single_report_timestamp_shift() {
    let bytes =
        fixtures::generate_report(&[(9.6, 100.0)], &[], Some(fixtures::SIGNALS_PATH)).unwrap();
    let pipeline = PipelineBuilder::new().build().unwrap();

    let row = pipeline.process_reader(Cursor::new(bytes)).unwrap();

    // Recorded 2024-03-25 12:10:52, shifted back 20 minutes
    assert_eq!(
        row.timestamp,
        chrono::NaiveDateTime::parse_from_str("2024-03-25 11:50:52", "%Y-%m-%d %H:%M:%S").ok()
    );
}

#[test]
fn test_front_channel_is_matched_independently() {
    // A Front peak at rt 17.8 matches Cyclohexane; an identical Back peak
    // must not contribute to any Front compound.
    let bytes = fixtures::generate_report(
        &[(17.8, 999.0)],
        &[(17.8, 42.0)],
        Some(fixtures::SIGNALS_PATH),
    )
    .unwrap();
    let pipeline = PipelineBuilder::new().build().unwrap();

    let row = pipeline.process_reader(Cursor::new(bytes)).unwrap();
    let table = pipeline.calibration();

    let cyclohexane = table.position("Cyclohexane").unwrap();
    let expected = (42.0 - 3.297102174) / 4.433768478;
    assert!((row.values[cyclohexane] - expected).abs() < 1e-9);

    // The Back peak at 17.8 falls in no Back compound window, so every
    // other compound stays at zero.
    for (position, value) in row.values.iter().enumerate() {
        if position != cyclohexane {
            assert_eq!(*value, 0.0, "unexpected concentration at column {position}");
        }
    }
}

#[test]
fn test_window_boundary_is_inclusive() {
    let boundary = 9.552 * 0.98;
    let bytes =
        fixtures::generate_report(&[(boundary, 100.0)], &[], Some(fixtures::SIGNALS_PATH)).unwrap();
    let pipeline = PipelineBuilder::new().build().unwrap();

    let row = pipeline.process_reader(Cursor::new(bytes)).unwrap();
    let ethane = pipeline.calibration().position("Ethane").unwrap();
    let expected = (100.0 - 0.464654348) / 39.41618609;
    assert!((row.values[ethane] - expected).abs() < 1e-9);
}

#[test]
fn test_peak_outside_window_is_excluded() {
    let outside = 9.552 * 0.98 - 1e-6;
    let bytes =
        fixtures::generate_report(&[(outside, 100.0)], &[], Some(fixtures::SIGNALS_PATH)).unwrap();
    let pipeline = PipelineBuilder::new().build().unwrap();

    let row = pipeline.process_reader(Cursor::new(bytes)).unwrap();
    let ethane = pipeline.calibration().position("Ethane").unwrap();
    assert_eq!(row.values[ethane], 0.0);
}

#[test]
fn test_missing_sentinel_is_an_extraction_error() {
    let bytes = fixtures::generate_report_without_sentinel().unwrap();
    let pipeline = PipelineBuilder::new().build().unwrap();

    let result = pipeline.process_reader(Cursor::new(bytes));
    assert!(matches!(result, Err(GcVocError::SentinelNotFound { .. })));
}

#[test]
fn test_report_without_signals_marker_is_flagged_not_dropped() {
    let bytes = fixtures::generate_report(
        &[(9.6, 100.0)],
        &[],
        Some("C:/Chem/GC/Other/2024-03-25 12-10-52/Report01.D"),
    )
    .unwrap();
    let pipeline = PipelineBuilder::new().build().unwrap();

    let row = pipeline.process_reader(Cursor::new(bytes)).unwrap();
    assert!(row.is_flagged());
    // Concentrations are still computed
    let ethane = pipeline.calibration().position("Ethane").unwrap();
    assert!(row.values[ethane] > 0.0);
}

#[test]
fn test_non_numeric_rows_are_excluded() {
    let bytes = fixtures::generate_report_with_junk_row().unwrap();
    let pipeline = PipelineBuilder::new().build().unwrap();

    let row = pipeline.process_reader(Cursor::new(bytes)).unwrap();
    let ethane = pipeline.calibration().position("Ethane").unwrap();
    // Only the numeric row (area 100) contributes to the sum
    let expected = (100.0 - 0.464654348) / 39.41618609;
    assert!((row.values[ethane] - expected).abs() < 1e-9);
}

#[test]
fn test_batch_skips_bad_report_and_continues() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    // Two good reports (one in a nested folder) and one without sentinels.
    // File names control the deterministic (sorted) processing order.
    let first = fixtures::generate_report(
        &[(9.6, 100.0)],
        &[],
        Some("C:/Chem/GC/Signals/2024-03-25 12-10-52/Report01.D"),
    )
    .unwrap();
    std::fs::write(input_dir.path().join("a_run.xlsx"), first).unwrap();

    let bad = fixtures::generate_report_without_sentinel().unwrap();
    std::fs::write(input_dir.path().join("b_run.xlsx"), bad).unwrap();

    let nested = input_dir.path().join("day2");
    std::fs::create_dir(&nested).unwrap();
    let second = fixtures::generate_report(
        &[],
        &[(17.8, 42.0)],
        Some("C:/Chem/GC/Signals/2024-03-25 13-40-52/Report02.D"),
    )
    .unwrap();
    std::fs::write(nested.join("c_run.xlsx"), second).unwrap();

    let pipeline = PipelineBuilder::new().build().unwrap();
    let summary = pipeline
        .process_batch(input_dir.path(), output_dir.path())
        .unwrap();

    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.files_skipped, 1);

    // Combined table is named from the first and last (shifted) timestamps
    assert_eq!(
        summary.combined_path.file_name().unwrap().to_str().unwrap(),
        "2024-03-25 11-50-52 to 2024-03-25 13-20-52.csv"
    );

    let combined = std::fs::read_to_string(&summary.combined_path).unwrap();
    let lines: Vec<&str> = combined.lines().collect();
    assert_eq!(lines.len(), 3); // header + one row per run
    assert!(lines[0].starts_with("date_time,Ethane,"));
    assert!(lines[1].starts_with("2024-03-25 11:50:52,"));
    assert!(lines[2].starts_with("2024-03-25 13:20:52,"));

    // Per-run intermediate files are written by default
    assert!(output_dir
        .path()
        .join("2024-03-25 11-50-52 to 2024-03-25 11-50-52 (0).csv")
        .exists());
    assert!(output_dir
        .path()
        .join("2024-03-25 13-20-52 to 2024-03-25 13-20-52 (1).csv")
        .exists());
}

#[test]
fn test_batch_without_intermediate_files() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    let report =
        fixtures::generate_report(&[(9.6, 100.0)], &[], Some(fixtures::SIGNALS_PATH)).unwrap();
    std::fs::write(input_dir.path().join("run.xlsx"), report).unwrap();

    let pipeline = PipelineBuilder::new()
        .write_intermediate(false)
        .build()
        .unwrap();
    let summary = pipeline
        .process_batch(input_dir.path(), output_dir.path())
        .unwrap();

    assert_eq!(summary.files_processed, 1);
    // Only the combined table is present
    let entries: Vec<_> = std::fs::read_dir(output_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0], summary.combined_path);
}

#[test]
fn test_batch_with_no_reports_is_a_terminal_error() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    let pipeline = PipelineBuilder::new().build().unwrap();
    let result = pipeline.process_batch(input_dir.path(), output_dir.path());
    assert!(matches!(result, Err(GcVocError::NoUsableInput { .. })));
}

#[test]
fn test_batch_where_every_report_fails_is_a_terminal_error() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    let bad = fixtures::generate_report_without_sentinel().unwrap();
    std::fs::write(input_dir.path().join("bad.xlsx"), bad).unwrap();

    let pipeline = PipelineBuilder::new().build().unwrap();
    let result = pipeline.process_batch(input_dir.path(), output_dir.path());
    assert!(matches!(result, Err(GcVocError::NoUsableInput { .. })));
}
