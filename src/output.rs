//! Output Module
//!
//! 濃度行のCSV出力を提供するモジュール。
//!
//! 出力は2種類あります:
//!
//! - 測定1回分の中間ファイル（デバッグ用）: ヘッダー + 1行
//! - バッチ全体の結合テーブル: ヘッダー + 測定ごとの1行
//!
//! 列は常に `date_time` の後にキャリブレーションテーブルの正準順で
//! 全化合物が並びます。ファイル名にはファイルシステムで安全な
//! タイムスタンプ表記（`YYYY-MM-DD HH-MM-SS`）を使用します。

use std::io::Write;

use chrono::NaiveDateTime;

use crate::calibration::CalibrationTable;
use crate::error::GcVocError;
use crate::types::ConcentrationRow;

/// タイムスタンプ列のヘッダー名
pub const TIMESTAMP_COLUMN: &str = "date_time";

/// セル内のタイムスタンプ表記
const CELL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// ファイル名中のタイムスタンプ表記（コロンを含まない）
const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// タイムスタンプを確定できなかった行のファイル名用プレースホルダ
const UNKNOWN_STAMP: &str = "unknown";

/// ヘッダーレコードを組み立てる
fn header(calibration: &CalibrationTable) -> Vec<String> {
    let mut columns = Vec::with_capacity(calibration.len() + 1);
    columns.push(TIMESTAMP_COLUMN.to_string());
    columns.extend(calibration.compound_names().map(str::to_string));
    columns
}

/// 濃度値をセル文字列へ変換する（NaNは空欄）
fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// タイムスタンプをセル文字列へ変換する（フラグ付き行は空欄）
fn format_timestamp(timestamp: Option<NaiveDateTime>) -> String {
    timestamp
        .map(|t| t.format(CELL_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// タイムスタンプをファイル名用の表記へ変換する
fn file_stamp(timestamp: Option<NaiveDateTime>) -> String {
    timestamp
        .map(|t| t.format(FILE_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_STAMP.to_string())
}

/// データレコードを組み立てる
fn record(row: &ConcentrationRow) -> Vec<String> {
    let mut cells = Vec::with_capacity(row.values.len() + 1);
    cells.push(format_timestamp(row.timestamp));
    cells.extend(row.values.iter().map(|&v| format_value(v)));
    cells
}

/// 測定1回分の中間CSVを書き出す
pub fn write_run_csv<W: Write>(
    row: &ConcentrationRow,
    calibration: &CalibrationTable,
    writer: W,
) -> Result<(), GcVocError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header(calibration))?;
    csv_writer.write_record(record(row))?;
    csv_writer.flush()?;
    Ok(())
}

/// バッチ全体の結合CSVを書き出す
///
/// 行はバッチでの処理順のまま出力されます。
pub fn write_combined_csv<W: Write>(
    rows: &[ConcentrationRow],
    calibration: &CalibrationTable,
    writer: W,
) -> Result<(), GcVocError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header(calibration))?;
    for row in rows {
        csv_writer.write_record(record(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// 測定1回分の中間ファイル名を組み立てる
///
/// 例: `2024-03-25 11-50-52 to 2024-03-25 11-50-52 (0).csv`
pub fn run_file_name(row: &ConcentrationRow, index: usize) -> String {
    let stamp = file_stamp(row.timestamp);
    format!("{stamp} to {stamp} ({index}).csv")
}

/// 結合テーブルのファイル名を組み立てる
///
/// バッチの最初と最後の（タイムスタンプを持つ）行の時刻から命名します。
/// どの行もタイムスタンプを持たない場合は`combined.csv`です。
pub fn combined_file_name(rows: &[ConcentrationRow]) -> String {
    let first = rows.iter().find_map(|row| row.timestamp);
    let last = rows.iter().rev().find_map(|row| row.timestamp);
    match (first, last) {
        (Some(first), Some(last)) => {
            format!("{} to {}.csv", file_stamp(Some(first)), file_stamp(Some(last)))
        }
        _ => "combined.csv".to_string(),
    }
}
