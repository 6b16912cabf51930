//! Batch CLI
//!
//! Command-line batch driver for converting a directory of GC reports
//! into VOC concentration CSV tables.

use std::path::Path;
use std::process;

use gcvoc::{GcVocError, PipelineBuilder, RtWindow};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <input_dir> <output_dir> [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --calibration <file.csv>   Load calibration table from CSV");
        eprintln!("  --rt-window <low> <high>   Retention time window factors (default 0.98 1.02)");
        eprintln!("  --time-shift <minutes>     Timestamp correction in minutes (default 20)");
        eprintln!("  --no-intermediate          Skip per-run CSV files, write only the combined table");
        eprintln!("\nExamples:");
        eprintln!("  {} reports/2024-03-25 out", args[0]);
        eprintln!("  {} reports out --calibration lab_calibration.csv", args[0]);
        eprintln!("  {} reports out --rt-window 0.97 1.03 --no-intermediate", args[0]);
        process::exit(1);
    }

    let input_dir = &args[1];
    let output_dir = &args[2];

    // Parse options
    let mut builder = PipelineBuilder::new();
    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--calibration" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --calibration requires a value");
                    process::exit(1);
                }
                let table = gcvoc::calibration::CalibrationTable::from_csv_path(&args[i + 1])
                    .unwrap_or_else(|e| {
                        eprintln!("Error: Failed to load calibration table: {}", e);
                        process::exit(1);
                    });
                builder = builder.with_calibration(table);
                i += 2;
            }
            "--rt-window" => {
                if i + 2 >= args.len() {
                    eprintln!("Error: --rt-window requires two values");
                    process::exit(1);
                }
                let low = parse_f64(&args[i + 1], "--rt-window low factor");
                let high = parse_f64(&args[i + 2], "--rt-window high factor");
                builder = builder.with_rt_window(RtWindow::new(low, high));
                i += 3;
            }
            "--time-shift" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --time-shift requires a value");
                    process::exit(1);
                }
                let minutes = args[i + 1].parse::<i64>().unwrap_or_else(|_| {
                    eprintln!("Error: Invalid time shift: {}", args[i + 1]);
                    process::exit(1);
                });
                builder = builder.with_time_shift_minutes(minutes);
                i += 2;
            }
            "--no-intermediate" => {
                builder = builder.write_intermediate(false);
                i += 1;
            }
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
    }

    match run_batch(builder, input_dir, output_dir) {
        Ok(()) => {}
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn parse_f64(raw: &str, what: &str) -> f64 {
    raw.parse::<f64>().unwrap_or_else(|_| {
        eprintln!("Error: Invalid {}: {}", what, raw);
        process::exit(1);
    })
}

fn run_batch(builder: PipelineBuilder, input_dir: &str, output_dir: &str) -> Result<(), GcVocError> {
    let pipeline = builder.build()?;
    let summary = pipeline.process_batch(Path::new(input_dir), Path::new(output_dir))?;

    println!(
        "Conversion completed: {} run(s) converted, {} skipped",
        summary.files_processed, summary.files_skipped
    );
    println!("Combined table: {}", summary.combined_path.display());
    Ok(())
}

fn handle_error(error: GcVocError) {
    match error {
        GcVocError::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that the directories exist and you have permission to access them.");
        }
        GcVocError::Workbook(parse_err) => {
            eprintln!("Parse Error: {}", parse_err);
            eprintln!("The file may not be a valid spreadsheet or may be corrupted.");
        }
        GcVocError::Csv(csv_err) => {
            eprintln!("CSV Error: {}", csv_err);
        }
        GcVocError::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
            eprintln!("Please check your window factors and calibration table.");
        }
        GcVocError::Calibration(msg) => {
            eprintln!("Calibration Error: {}", msg);
            eprintln!("Please check the calibration CSV file.");
        }
        GcVocError::NoUsableInput { dir } => {
            eprintln!("No usable input: no report produced a concentration row under '{}'.", dir);
            eprintln!("Please check that the input directory contains .xls/.xlsx reports.");
        }
        other => {
            eprintln!("Error: {}", other);
        }
    }
}
