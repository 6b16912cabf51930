//! Concentration Calculator Module
//!
//! 集計済みのピーク面積をキャリブレーション直線の逆算で濃度（ppb）へ変換し、
//! 測定1回分を1つのタイムスタンプ付き行へピボットするモジュール。
//!
//! タイムスタンプには固定の時刻補正を適用します。装置のサンプリング窓は
//! 45分幅で、記録される時刻はサンプル終了時点を指すため、経験的に定めた
//! 20分を差し引いた時刻を代表時刻として使用します（過去データとの互換の
//! ためリテラル値を維持）。

use chrono::{Duration, NaiveDateTime};
use log::error;

use crate::calibration::CalibrationTable;
use crate::error::GcVocError;
use crate::types::{ConcentrationRow, MatchedArea};

/// 測定タイムスタンプの固定フォーマット
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// 時刻補正のデフォルト値（分）
pub const DEFAULT_TIME_SHIFT_MINUTES: i64 = 20;

/// 生のタイムスタンプ文字列を日時として解析する
///
/// # 発生し得るエラー
///
/// * `GcVocError::TimestampParse` - `YYYY-MM-DD HH-MM-SS`形式に一致しない場合
pub fn parse_run_timestamp(raw: &str) -> Result<NaiveDateTime, GcVocError> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(|_| {
        GcVocError::TimestampParse {
            raw: raw.to_string(),
        }
    })
}

/// 集計結果を濃度行へ変換する
///
/// キャリブレーションテーブルの全エントリについて:
///
/// 1. 面積のないエントリ（一致なし）は濃度0
/// 2. 面積のあるエントリは `(area - intercept) / slope` で濃度を計算。
///    傾きが0の場合はエラーをログに記録し、そのセルのみNaN（出力では空欄）
///
/// 測定のタイムスタンプはいずれかの[`MatchedArea`]が持つ生文字列から確定し、
/// 解析後に`time_shift_minutes`分を差し引きます。タイムスタンプがない、
/// または解析できない場合もエラーをログに記録した上で行は必ず出力されます
/// （`timestamp: None`のフラグ付き行）。
///
/// 時刻補正はこの関数でのみ適用されるため、測定1回につき正確に1回です。
pub fn compute(
    matches: &[MatchedArea],
    calibration: &CalibrationTable,
    time_shift_minutes: i64,
) -> ConcentrationRow {
    let mut values = Vec::with_capacity(calibration.len());
    for entry in calibration.entries() {
        let area = matches
            .iter()
            .find(|m| m.compound == entry.compound)
            .and_then(|m| m.area);
        let ppb = match area {
            None => 0.0,
            Some(area) => match entry.invert(area) {
                Ok(concentration) => concentration,
                Err(e) => {
                    error!("{e}; emitting empty cell");
                    f64::NAN
                }
            },
        };
        values.push(ppb);
    }

    let timestamp = match matches.iter().find_map(|m| m.timestamp.as_deref()) {
        None => {
            error!("run carries no timestamp; row will be emitted flagged");
            None
        }
        Some(raw) => match parse_run_timestamp(raw) {
            Ok(parsed) => Some(parsed - Duration::minutes(time_shift_minutes)),
            Err(e) => {
                error!("{e}; row will be emitted flagged");
                None
            }
        },
    };

    ConcentrationRow { timestamp, values }
}
