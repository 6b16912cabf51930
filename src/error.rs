//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

use crate::types::Detector;

/// gcvocクレート全体で使用するエラー型
///
/// レポートの読み込み、抽出、濃度計算、CSV出力の各処理で発生する
/// エラーを統一的に扱うために使用されます。
///
/// ファイル単位・セル単位で回復可能な事象（数値変換の失敗、未知の検出器ラベル、
/// タイムスタンプの解析失敗など）はバッチ全体を止めず、`log`経由で警告として
/// 記録されます。バッチ全体が失敗するのは、利用可能な入力が1件もない場合
/// （`NoUsableInput`）のみです。
///
/// # 使用例
///
/// ```rust,no_run
/// use gcvoc::GcVocError;
/// use std::fs::File;
///
/// fn open_report(path: &str) -> Result<(), GcVocError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum GcVocError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// レポートワークブックの解析中に発生したエラー
    ///
    /// calamineクレートがスプレッドシートを解析する際に発生したエラーです。
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    #[error("Failed to parse report workbook: {0}")]
    Workbook(#[from] calamine::Error),

    /// CSVの読み書き中に発生したエラー
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// 設定の検証に失敗したエラー
    ///
    /// `PipelineBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。例えば、保持時間ウィンドウの下限が上限より大きい場合です。
    #[error("Configuration error: {0}")]
    Config(String),

    /// キャリブレーションテーブルの構築に失敗したエラー
    ///
    /// 化合物名の重複など、テーブルのデータ整合性違反で発生します。
    #[error("Calibration error: {0}")]
    Calibration(String),

    /// 検出器チャンネルのデータ終端を示す番兵行が見つからなかったエラー
    ///
    /// レポート内で該当チャンネルのデータ範囲を確定できないため、
    /// そのファイルの抽出は失敗します。バッチ処理ではこのファイルを
    /// スキップして続行します。
    #[error("'Sum' sentinel row not found for {channel} detector channel")]
    SentinelNotFound {
        /// 番兵行が見つからなかったチャンネル
        channel: Detector,
    },

    /// 測定タイムスタンプの解析に失敗したエラー
    ///
    /// 濃度行は破棄されず、タイムスタンプなしのフラグ付き行として出力されます。
    #[error("run timestamp '{raw}' does not match format YYYY-MM-DD HH-MM-SS")]
    TimestampParse {
        /// 解析できなかった生文字列
        raw: String,
    },

    /// キャリブレーション傾きが0のため濃度を計算できないエラー
    ///
    /// 該当化合物のセルのみが空欄（NaN）となり、行全体は出力されます。
    #[error("calibration slope is zero for compound '{compound}'")]
    ZeroSlope {
        /// 対象の化合物名
        compound: String,
    },

    /// 利用可能な入力が1件も見つからなかったエラー
    ///
    /// 発見できたレポートファイルが0件、または全ファイルの処理に失敗して
    /// 濃度行が0行だった場合に発生する、バッチ全体の終端エラーです。
    #[error("no usable report data found under '{dir}'")]
    NoUsableInput {
        /// 探索した入力ディレクトリ
        dir: String,
    },
}
