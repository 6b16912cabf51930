//! Report Extractor Module
//!
//! calamineを使用してGCレポートのスプレッドシートを解析し、
//! 型付きのピーク列とタイムスタンプ（[`RunExtract`]）へ変換するモジュール。
//!
//! レポートのレイアウトは装置のエクスポート形式で固定されています:
//!
//! - シート0のみを使用する
//! - Backチャンネルのデータは行20から始まり、列5の番兵セル`"Sum"`で終端される
//!   （番兵行の直前は空行のため、データ領域は番兵の1行前まで）
//! - Frontチャンネルは Backの番兵行の3行後から始まり、同じ規則で終端される
//! - 保持時間は列1、ピーク面積は列9
//! - セル(3, 7)のファイルパス文字列に測定タイムスタンプが埋め込まれている
//!
//! 数値化できないセルを持つ行はここで除外され（警告ログ）、
//! 以降の段は生のセルを一切扱いません。

use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use log::warn;

use crate::error::GcVocError;
use crate::types::{Detector, RawPeak, RunExtract};

/// Backチャンネルのデータ開始行（絶対行番号、0始まり）
const BACK_START_ROW: u32 = 20;

/// チャンネルのデータ終端を示す番兵セルの値
const SENTINEL: &str = "Sum";

/// 番兵セルの列
const SENTINEL_COL: u32 = 5;

/// 保持時間の列
const RT_COL: u32 = 1;

/// ピーク面積の列
const AREA_COL: u32 = 9;

/// Backの番兵行からFrontのデータ開始行までのオフセット
const FRONT_GAP: u32 = 3;

/// タイムスタンプを持つファイルパスのセル位置（行, 列）
const PATH_CELL: (u32, u32) = (3, 7);

/// ファイルパス中でタイムスタンプ直前に現れるマーカートークン
const TIMESTAMP_MARKER: &str = "Signals";

/// タイムスタンプ文字列の固定長（`2024-03-25 12-10-52`）
const TIMESTAMP_LEN: usize = 19;

/// レポートファイルから測定1回分のデータを抽出する
///
/// # 発生し得るエラー
///
/// * `GcVocError::Io` - ファイルを開けない場合
/// * `GcVocError::Workbook` - スプレッドシートとして解析できない場合
/// * `GcVocError::SentinelNotFound` - いずれかのチャンネルの番兵行が見つからない場合
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<RunExtract, GcVocError> {
    let mut workbook = open_workbook_auto(path.as_ref())?;
    let range = first_sheet_range(&mut workbook)?;
    extract_range(&range)
}

/// メモリ上のレポートから測定1回分のデータを抽出する
///
/// レガシーの`.xls`（BIFF）と`.xlsx`の両形式が自動判別されます。
pub fn extract_reader<RS: Read + Seek + Clone>(reader: RS) -> Result<RunExtract, GcVocError> {
    let mut workbook = open_workbook_auto_from_rs(reader)?;
    let range = first_sheet_range(&mut workbook)?;
    extract_range(&range)
}

/// ワークブックの先頭シートのセル範囲を取得
fn first_sheet_range<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
) -> Result<Range<Data>, GcVocError> {
    match workbook.worksheet_range_at(0) {
        Some(range) => Ok(range?),
        None => Err(GcVocError::Config(
            "report workbook has no sheets".to_string(),
        )),
    }
}

/// セル範囲から両チャンネルのピークとタイムスタンプを抽出
fn extract_range(range: &Range<Data>) -> Result<RunExtract, GcVocError> {
    let back_sentinel = find_sentinel(range, BACK_START_ROW).ok_or(GcVocError::SentinelNotFound {
        channel: Detector::Back,
    })?;
    let front_start = back_sentinel + FRONT_GAP;
    let front_sentinel = find_sentinel(range, front_start).ok_or(GcVocError::SentinelNotFound {
        channel: Detector::Front,
    })?;

    let mut peaks = Vec::new();
    collect_peaks(range, BACK_START_ROW, back_sentinel - 1, Detector::Back, &mut peaks);
    collect_peaks(range, front_start, front_sentinel - 1, Detector::Front, &mut peaks);

    Ok(RunExtract {
        peaks,
        timestamp: extract_timestamp(range),
    })
}

/// `from_row`以降で最初に番兵セルが現れる行を探す
fn find_sentinel(range: &Range<Data>, from_row: u32) -> Option<u32> {
    let last_row = range.end()?.0;
    (from_row..=last_row).find(|&row| {
        matches!(
            range.get_value((row, SENTINEL_COL)),
            Some(Data::String(s)) if s == SENTINEL
        )
    })
}

/// セル値の数値変換結果
enum Coerced {
    Number(f64),
    Empty,
    Invalid,
}

/// セル値をf64へ変換する
///
/// 数値、および数値として解釈できる文字列を受け付けます。
fn coerce_cell(cell: Option<&Data>) -> Coerced {
    match cell {
        None | Some(Data::Empty) => Coerced::Empty,
        Some(Data::Float(f)) => Coerced::Number(*f),
        Some(Data::Int(i)) => Coerced::Number(*i as f64),
        Some(Data::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Coerced::Empty
            } else {
                match trimmed.parse::<f64>() {
                    Ok(value) => Coerced::Number(value),
                    Err(_) => Coerced::Invalid,
                }
            }
        }
        Some(_) => Coerced::Invalid,
    }
}

/// `[start_row, end_row)` の範囲からピーク行を収集する
///
/// 保持時間・面積の両方が数値化できた行のみを採用します。
/// どちらかが数値化できない行は警告の上で除外し、完全な空行は黙ってスキップします。
fn collect_peaks(
    range: &Range<Data>,
    start_row: u32,
    end_row: u32,
    detector: Detector,
    peaks: &mut Vec<RawPeak>,
) {
    for row in start_row..end_row {
        let rt = coerce_cell(range.get_value((row, RT_COL)));
        let area = coerce_cell(range.get_value((row, AREA_COL)));
        match (rt, area) {
            (Coerced::Number(retention_time), Coerced::Number(area)) => {
                peaks.push(RawPeak {
                    retention_time,
                    area,
                    detector,
                });
            }
            (Coerced::Empty, Coerced::Empty) => {}
            _ => {
                warn!(
                    "excluding {} peak at row {}: non-numeric retention time or area",
                    detector,
                    row + 1
                );
            }
        }
    }
}

/// ファイルパスのセルから生のタイムスタンプ文字列を切り出す
///
/// マーカートークンの後に区切り文字1つを挟んで固定長のタイムスタンプが続きます。
/// マーカーがない、セルが文字列でない、長さが足りない場合はいずれも
/// `None`（警告ログ、致命的ではない）。
fn extract_timestamp(range: &Range<Data>) -> Option<String> {
    let path = match range.get_value(PATH_CELL) {
        Some(Data::String(s)) => s,
        _ => {
            warn!("report path cell is missing or not text; run timestamp unavailable");
            return None;
        }
    };
    let marker = match path.find(TIMESTAMP_MARKER) {
        Some(position) => position,
        None => {
            warn!("'{TIMESTAMP_MARKER}' marker not found in report path: {path}");
            return None;
        }
    };
    let start = marker + TIMESTAMP_MARKER.len() + 1;
    match path.get(start..start + TIMESTAMP_LEN) {
        Some(stamp) => Some(stamp.to_string()),
        None => {
            warn!("report path too short after '{TIMESTAMP_MARKER}' marker: {path}");
            None
        }
    }
}
