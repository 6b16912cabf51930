//! gcvoc - Pure-Rust GC report parser and VOC concentration converter
//!
//! This crate converts gas-chromatograph (GC) analytical reports exported as
//! spreadsheet files into time-series VOC concentration tables (CSV). Peak
//! areas are identified by retention time against a fixed calibration table
//! and converted to concentrations (ppb) through linear calibration curves.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use gcvoc::PipelineBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a pipeline with the built-in calibration table
//!     let pipeline = PipelineBuilder::new().build()?;
//!
//!     // Convert every report under `reports/` and write the CSV tables
//!     let summary = pipeline.process_batch(Path::new("reports"), Path::new("out"))?;
//!
//!     println!(
//!         "{} runs converted, {} skipped",
//!         summary.files_processed, summary.files_skipped
//!     );
//!     Ok(())
//! }
//! ```
//!
//! For a single in-memory report, use `Cursor`:
//!
//! ```rust,no_run
//! use std::io::Cursor;
//! use gcvoc::PipelineBuilder;
//!
//! # fn main() -> Result<(), gcvoc::GcVocError> {
//! let pipeline = PipelineBuilder::new().build()?;
//! let report_bytes: Vec<u8> = vec![]; // Your .xls/.xlsx report bytes
//! let row = pipeline.process_reader(Cursor::new(report_bytes))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use gcvoc::{PipelineBuilder, RtWindow};
//! use gcvoc::calibration::CalibrationTable;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a lab-specific calibration table and widen the RT window
//!     let table = CalibrationTable::from_csv_path("calibration.csv")?;
//!     let pipeline = PipelineBuilder::new()
//!         .with_calibration(table)
//!         .with_rt_window(RtWindow::new(0.97, 1.03))
//!         .write_intermediate(false)
//!         .build()?;
//!
//!     let row = pipeline.process_file("reports/run01.xls")?;
//!     println!("{:?}", row.timestamp);
//!     Ok(())
//! }
//! ```

pub mod calibration;
pub mod concentration;
mod error;
pub mod extract;
pub mod matcher;
pub mod output;
mod pipeline;
mod types;

// 公開API
pub use error::GcVocError;
pub use pipeline::{BatchSummary, Pipeline, PipelineBuilder};
pub use types::{ConcentrationRow, Detector, MatchedArea, RawPeak, RtWindow, RunExtract};
