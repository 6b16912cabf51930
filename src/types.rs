//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! 抽出器がスプレッドシートの生セルを型付きの行に変換した後、
//! パイプラインの各段はここで定義された型のみを扱う。

use chrono::NaiveDateTime;

/// GC装置の検出器チャンネル
///
/// 装置には独立した2つの測定経路（FrontとBack）があり、
/// それぞれ固有の保持時間キャリブレーションを持ちます。
/// 化合物ごとの検出器割り当てはキャリブレーションテーブルで固定されています。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detector {
    /// Front検出器チャンネル
    Front,

    /// Back検出器チャンネル
    Back,
}

impl Detector {
    /// レポートやキャリブレーションファイル中のラベル文字列から検出器を判定
    ///
    /// # 戻り値
    ///
    /// * `Some(Detector)` - ラベルが`"Front"`または`"Back"`の場合
    /// * `None` - 未知のラベルの場合
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Front" => Some(Detector::Front),
            "Back" => Some(Detector::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detector::Front => write!(f, "Front"),
            Detector::Back => write!(f, "Back"),
        }
    }
}

/// 保持時間の許容ウィンドウ（乗算係数のペア）
///
/// 保持時間は装置の変動により測定ごとにわずかにドリフトするため、
/// 期待値との完全一致ではなくウィンドウ照合を行います。
/// ピークの保持時間が `[rt × low, rt × high]`（両端含む）に入る場合に一致とみなします。
///
/// デフォルトは過去データとの出力互換性を保つため、リテラル係数 `0.98` / `1.02` です。
///
/// # 使用例
///
/// ```rust
/// use gcvoc::RtWindow;
///
/// let window = RtWindow::default();
/// assert!(window.contains(10.0, 10.0));
/// assert!(window.contains(10.0, 10.0 * 1.02));
/// assert!(!window.contains(10.0, 10.3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtWindow {
    /// 下限係数
    pub low: f64,

    /// 上限係数
    pub high: f64,
}

impl Default for RtWindow {
    fn default() -> Self {
        Self {
            low: 0.98,
            high: 1.02,
        }
    }
}

impl RtWindow {
    /// 新しいウィンドウを生成
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// 期待保持時間に対するウィンドウの絶対境界を計算
    pub fn bounds(&self, retention_time: f64) -> (f64, f64) {
        (retention_time * self.low, retention_time * self.high)
    }

    /// 観測された保持時間がウィンドウ内（両端含む）かを判定
    pub fn contains(&self, expected: f64, observed: f64) -> bool {
        let (low, high) = self.bounds(expected);
        observed >= low && observed <= high
    }
}

/// レポートから抽出された1つのピーク
///
/// 抽出器が数値変換を済ませた後の型付きの行です。
/// 保持時間または面積が数値化できなかった行はここに到達しません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPeak {
    /// 保持時間（分）
    pub retention_time: f64,

    /// ピーク面積
    pub area: f64,

    /// 検出器チャンネル
    pub detector: Detector,
}

/// 1つのレポートから抽出された測定1回分のデータ
#[derive(Debug, Clone, PartialEq)]
pub struct RunExtract {
    /// 両検出器チャンネルのピーク列
    pub peaks: Vec<RawPeak>,

    /// レポートに埋め込まれたファイルパスから切り出した生のタイムスタンプ文字列
    /// （`YYYY-MM-DD HH-MM-SS`形式）。マーカーが見つからない場合は`None`。
    /// 日時への変換は濃度計算段で行われます。
    pub timestamp: Option<String>,
}

impl RunExtract {
    /// ピークを持たない空の抽出結果を生成
    pub fn empty() -> Self {
        Self {
            peaks: Vec::new(),
            timestamp: None,
        }
    }
}

/// キャリブレーションエントリ1件に対するウィンドウ照合の結果
///
/// 一致の有無にかかわらず、エントリごとに必ず1件生成されます
/// （ピボット段での列の完全性を保つため）。
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedArea {
    /// 化合物名
    pub compound: String,

    /// ウィンドウ内のピーク面積の合計。
    /// 一致するピークがなかった場合は`None`（面積0のピークとは区別される）。
    pub area: Option<f64>,

    /// 測定のタイムスタンプ（生文字列）。ピークが1つも一致しなかった場合は`None`。
    pub timestamp: Option<String>,
}

/// 測定1回分の濃度行
///
/// `values`はキャリブレーションテーブルのエントリ順と対応しており、
/// 常にエントリ数と同じ長さを持ちます（疎な行は存在しない）。
/// 一致がなかった化合物は濃度0、ゼロ傾きで計算不能だったセルはNaNです。
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationRow {
    /// 時刻補正適用後のタイムスタンプ。
    /// 測定にタイムスタンプがない、または解析不能だった場合は`None`
    /// （行は破棄されず、フラグ付きとして出力されます）。
    pub timestamp: Option<NaiveDateTime>,

    /// 化合物ごとの濃度（ppb）、キャリブレーションテーブル順
    pub values: Vec<f64>,
}

impl ConcentrationRow {
    /// タイムスタンプを確定できなかった行かどうか
    pub fn is_flagged(&self) -> bool {
        self.timestamp.is_none()
    }
}
