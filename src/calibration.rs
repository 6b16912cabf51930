//! Calibration Module
//!
//! VOC化合物の参照データセット（期待保持時間、検出器チャンネル、
//! 線形キャリブレーション係数）を定義するモジュール。
//! テーブルは起動時に一度構築され、プロセスの生存期間中は不変です。
//!
//! 組み込みデータセットに加えて、CSVファイル
//! （`compound,detector,retention_time,intercept,slope`）からの読み込みにも
//! 対応しています。

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error::GcVocError;
use crate::types::Detector;

/// 組み込みの参照データセット
///
/// (化合物名, 期待保持時間[分], 検出器, 切片, 傾き)
const BUILTIN: &[(&str, f64, Detector, f64, f64)] = &[
    ("Ethane", 9.552, Detector::Back, 0.464654348, 39.41618609),
    ("Ethylene", 9.596, Detector::Back, -1.564774348, 57.04490739),
    ("Propane", 9.693, Detector::Back, -0.105978261, 9.122931522),
    ("Propylene", 13.108, Detector::Back, 0.485695652, 23.9541287),
    ("Acetylene", 14.95, Detector::Back, 0.000478261, 13.31210217),
    ("Trans-2-butene", 15.606, Detector::Back, -5.85432, 52.671),
    ("1-Butene", 20.511, Detector::Back, -1.427391304, 17.75965217),
    ("i-butane", 21.772, Detector::Back, -1.303391304, 13.32366261),
    ("Cyclopentane", 21.895, Detector::Back, -1.556898261, 59.27553261),
    ("Isopentane", 22.49, Detector::Back, -0.827953043, 67.21774348),
    ("n-pentane", 23.467, Detector::Back, 7.649956522, 9.644302957),
    ("1-pentene", 24.878, Detector::Back, 2.269217391, 12.14508522),
    ("Trans-2-pentene", 25.784, Detector::Back, -1.647565217, 14.23729043),
    ("2,2-dimethyl-butane", 26.209, Detector::Back, -3.003652174, 9.618815217),
    ("2,3-dimethyl-butane", 27.511, Detector::Back, 8.501695652, 39.246224348),
    ("2-methylpentane", 27.603, Detector::Back, -79.24636957, 93.97274891),
    ("Isoprene", 28.059, Detector::Back, 0.010310872, 63.82877242),
    ("Hexane", 15.215, Detector::Front, 0.883981304, 154.71614087),
    ("Methyl-cyclopentane", 15.737, Detector::Front, -1.031217391, 22.62563478),
    ("2,4-dimethylpentane", 16.051, Detector::Front, 0.629946957, 14.87566435),
    ("2-methylhexane", 16.197, Detector::Front, 2.724028696, 20.85892717),
    ("Benzene", 16.527, Detector::Front, -0.266615652, 32.74605217),
    ("Cyclohexane", 17.78, Detector::Front, 3.297102174, 4.433768478),
    ("2,3-dimethyl-pentane", 19.035, Detector::Front, 2.497007391, 4.439050174),
    ("3-methylhexane", 20.476, Detector::Front, -3.538778261, 38.463490435),
    ("Heptane", 20.727, Detector::Front, 8.593491304, 11.92473391),
    ("2,3,4-trimethylpentane", 21.169, Detector::Front, -2.240989225, 36.503130311),
    ("Toluene", 21.554, Detector::Front, -3.85139687, 46.373871696),
    ("2-methylheptane", 22.78, Detector::Front, 1.670566087, 7.416391304),
    ("n-octane", 25.216, Detector::Front, 5.617443478, 40.509308696),
    ("Ethylbenzene", 25.588, Detector::Front, 0.580217391, 18.538845217),
    ("isooctane", 26.371, Detector::Front, 1.127471304, 9.654591304),
    ("mp-xylene", 26.611, Detector::Front, -7.632040435, 25.476620652),
    ("Styrene", 27.183, Detector::Front, 1.274698696, 5.106779348),
    ("o-xylene", 27.952, Detector::Front, 8.40189414, 8.064055894),
    ("Propyl-benzene", 28.5535, Detector::Front, 0.152173913, 12.22304348),
    ("Nonane", 29.155, Detector::Front, 0.892750087, 8.525983304),
    ("4-Ethyltoluene", 29.728, Detector::Front, 2.401063043, 18.22815652),
    ("1,3,5-TMB", 30.168, Detector::Front, 0.808134348, 45.413045217),
    ("2-ethyltoluene", 30.738, Detector::Front, 1.819353119, 8.673984628),
    ("1,2,4-TMB", 31.097, Detector::Front, 0.150913043, 115.732791304),
    ("Decane", 31.844, Detector::Front, 5.066173913, 10.442743478),
    ("1,23,TMB", 32.724, Detector::Front, 0.669321739, 11.50169217),
    ("1,3-diethyl benzene", 32.981, Detector::Front, 0.678695652, 10.104805435),
    ("1,4-diethyl benzene", 34.659, Detector::Front, 1.710173913, 16.287812174),
    ("undecane", 37.87, Detector::Front, 0.447521739, 10.44833043),
];

/// CSVキャリブレーションファイルの1行（serde用の生レコード）
#[derive(Debug, Deserialize)]
struct RawCalibrationRecord {
    compound: String,
    detector: String,
    retention_time: f64,
    intercept: f64,
    slope: f64,
}

/// キャリブレーションテーブルの1エントリ
///
/// 化合物1つ分の参照データです。`detector`が`None`になるのは、
/// 外部ファイルから読み込んだ行の検出器ラベルが未知だった場合のみで、
/// そのエントリはウィンドウ照合の対象外（常に不一致）として扱われます。
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationEntry {
    /// 化合物名（テーブル内で一意）
    pub compound: String,

    /// 期待保持時間（分）
    pub retention_time: f64,

    /// 検出器チャンネルの割り当て
    pub detector: Option<Detector>,

    /// キャリブレーション直線の切片
    pub intercept: f64,

    /// キャリブレーション直線の傾き
    pub slope: f64,
}

impl CalibrationEntry {
    /// キャリブレーション直線を逆算し、ピーク面積から濃度（ppb）を求める
    ///
    /// `concentration = (area - intercept) / slope`
    ///
    /// # 戻り値
    ///
    /// * `Ok(f64)` - 濃度（ppb）
    /// * `Err(GcVocError::ZeroSlope)` - 傾きが0で逆算できない場合
    pub fn invert(&self, area: f64) -> Result<f64, GcVocError> {
        if self.slope == 0.0 {
            return Err(GcVocError::ZeroSlope {
                compound: self.compound.clone(),
            });
        }
        Ok((area - self.intercept) / self.slope)
    }
}

/// VOC化合物の参照テーブル
///
/// エントリの並び順は出力テーブルの正準的な列順としてそのまま使用されます。
/// 構築後は不変で、パイプラインの各段に参照として渡されます。
///
/// # 使用例
///
/// ```rust
/// use gcvoc::calibration::CalibrationTable;
///
/// let table = CalibrationTable::builtin();
/// let ethane = table.get("Ethane").unwrap();
/// assert_eq!(ethane.retention_time, 9.552);
/// ```
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    /// エントリ（正準順）
    entries: Vec<CalibrationEntry>,

    /// 化合物名からエントリ位置への索引
    index: HashMap<String, usize>,
}

impl CalibrationTable {
    /// エントリ列からテーブルを構築する
    ///
    /// # 発生し得るエラー
    ///
    /// * `GcVocError::Calibration` - 化合物名が重複している場合
    pub fn new(entries: Vec<CalibrationEntry>) -> Result<Self, GcVocError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.compound.clone(), position).is_some() {
                return Err(GcVocError::Calibration(format!(
                    "duplicate compound name '{}'",
                    entry.compound
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// 組み込みの参照データセットからテーブルを構築する
    pub fn builtin() -> Self {
        let entries: Vec<CalibrationEntry> = BUILTIN
            .iter()
            .map(
                |&(compound, retention_time, detector, intercept, slope)| CalibrationEntry {
                    compound: compound.to_string(),
                    retention_time,
                    detector: Some(detector),
                    intercept,
                    slope,
                },
            )
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.compound.clone(), position))
            .collect();
        Self { entries, index }
    }

    /// CSVリーダーからテーブルを読み込む
    ///
    /// 期待するヘッダーは `compound,detector,retention_time,intercept,slope` です。
    /// 未知の検出器ラベルを持つ行は警告の上、検出器なしのエントリとして保持されます
    /// （化合物の列は出力から消えず、濃度は常に0になります）。
    ///
    /// # 発生し得るエラー
    ///
    /// * `GcVocError::Csv` - CSVの形式が不正な場合
    /// * `GcVocError::Calibration` - 化合物名が重複している場合
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, GcVocError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut entries = Vec::new();
        for record in csv_reader.deserialize() {
            let raw: RawCalibrationRecord = record?;
            let detector = Detector::from_label(&raw.detector);
            if detector.is_none() {
                warn!(
                    "unknown detector label '{}' for compound '{}'; entry will never match",
                    raw.detector, raw.compound
                );
            }
            entries.push(CalibrationEntry {
                compound: raw.compound,
                retention_time: raw.retention_time,
                detector,
                intercept: raw.intercept,
                slope: raw.slope,
            });
        }
        Self::new(entries)
    }

    /// CSVファイルからテーブルを読み込む
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, GcVocError> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// エントリを正準順で取得
    pub fn entries(&self) -> &[CalibrationEntry] {
        &self.entries
    }

    /// 化合物名でエントリを検索
    pub fn get(&self, compound: &str) -> Option<&CalibrationEntry> {
        self.index.get(compound).map(|&position| &self.entries[position])
    }

    /// 化合物名の正準順での位置を検索
    pub fn position(&self, compound: &str) -> Option<usize> {
        self.index.get(compound).copied()
    }

    /// エントリ数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// テーブルが空かどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 化合物名を正準順で列挙
    pub fn compound_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.compound.as_str())
    }
}
