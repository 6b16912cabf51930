//! Peak Matcher Module
//!
//! 抽出された測定データをキャリブレーションテーブルと突き合わせるモジュール。
//! 各化合物の期待保持時間の周りに許容ウィンドウを取り、
//! 同一検出器チャンネルでウィンドウ内に入ったピークの面積を合計します。

use log::warn;

use crate::calibration::CalibrationTable;
use crate::types::{MatchedArea, RtWindow, RunExtract};

/// 測定1回分のピークをキャリブレーションエントリごとに集計する
///
/// キャリブレーションエントリごとに、検出器チャンネルが一致し、かつ保持時間が
/// `[rt × window.low, rt × window.high]`（両端含む）に入るピークの面積を合計します。
/// 合計は可換な加算のみで構成され、ピークの入力順に依存しません。
///
/// 一致するピークがなかったエントリも`area: None`として必ず結果に含まれます
/// （後段のピボットで全化合物の列を保つため）。検出器チャンネルを持たない
/// エントリは警告の上、常に不一致として扱われます。
///
/// # 引数
///
/// * `run` - 抽出された測定データ
/// * `calibration` - 参照テーブル
/// * `window` - 保持時間の許容ウィンドウ
///
/// # 戻り値
///
/// キャリブレーションテーブルの正準順で、エントリ1件につき1つの[`MatchedArea`]
pub fn sum_areas(
    run: &RunExtract,
    calibration: &CalibrationTable,
    window: &RtWindow,
) -> Vec<MatchedArea> {
    calibration
        .entries()
        .iter()
        .map(|entry| {
            let detector = match entry.detector {
                Some(detector) => detector,
                None => {
                    warn!(
                        "calibration entry '{}' has no detector channel; treating as unmatched",
                        entry.compound
                    );
                    return MatchedArea {
                        compound: entry.compound.clone(),
                        area: None,
                        timestamp: None,
                    };
                }
            };

            let (low, high) = window.bounds(entry.retention_time);
            let mut summed = 0.0;
            let mut matched = 0usize;
            for peak in &run.peaks {
                if peak.detector == detector
                    && peak.retention_time >= low
                    && peak.retention_time <= high
                {
                    summed += peak.area;
                    matched += 1;
                }
            }

            if matched == 0 {
                MatchedArea {
                    compound: entry.compound.clone(),
                    area: None,
                    timestamp: None,
                }
            } else {
                MatchedArea {
                    compound: entry.compound.clone(),
                    area: Some(summed),
                    timestamp: run.timestamp.clone(),
                }
            }
        })
        .collect()
}
