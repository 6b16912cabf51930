//! Pipeline Module
//!
//! Fluent Builder APIを提供し、抽出→照合→濃度計算→CSV出力の
//! パイプラインを段階的に構築・実行するモジュール。
//!
//! バッチ処理は厳密に逐次で、共有される可変状態はありません。
//! ファイル単位の失敗は記録の上でスキップされ、バッチは続行します。

use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::calibration::CalibrationTable;
use crate::concentration::{self, DEFAULT_TIME_SHIFT_MINUTES};
use crate::error::GcVocError;
use crate::extract;
use crate::matcher;
use crate::output;
use crate::types::{ConcentrationRow, RtWindow, RunExtract};

/// パイプラインの設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct PipelineConfig {
    /// 参照テーブル
    pub calibration: CalibrationTable,

    /// 保持時間の許容ウィンドウ
    pub rt_window: RtWindow,

    /// 時刻補正（分）
    pub time_shift_minutes: i64,

    /// 測定ごとの中間CSVを出力するか
    pub write_intermediate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationTable::builtin(),
            rt_window: RtWindow::default(),
            time_shift_minutes: DEFAULT_TIME_SHIFT_MINUTES,
            write_intermediate: true,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、
/// 必要な設定のみをオーバーライドできます。
///
/// # デフォルト設定
///
/// - キャリブレーション: 組み込みの46化合物テーブル
/// - 保持時間ウィンドウ: 係数 0.98 / 1.02
/// - 時刻補正: 20分
/// - 中間CSV: 出力する
///
/// # 使用例
///
/// ```rust,no_run
/// use gcvoc::{PipelineBuilder, RtWindow};
///
/// # fn main() -> Result<(), gcvoc::GcVocError> {
/// let pipeline = PipelineBuilder::new()
///     .with_rt_window(RtWindow::new(0.97, 1.03))
///     .with_time_shift_minutes(20)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    /// 内部設定（構築中）
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// 使用するキャリブレーションテーブルを指定する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use gcvoc::PipelineBuilder;
    /// use gcvoc::calibration::CalibrationTable;
    ///
    /// # fn main() -> Result<(), gcvoc::GcVocError> {
    /// let table = CalibrationTable::from_csv_path("calibration.csv")?;
    /// let pipeline = PipelineBuilder::new().with_calibration(table).build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_calibration(mut self, calibration: CalibrationTable) -> Self {
        self.config.calibration = calibration;
        self
    }

    /// 保持時間の許容ウィンドウを指定する
    ///
    /// デフォルトの係数 0.98 / 1.02 は過去の出力との互換性を保つ値です。
    pub fn with_rt_window(mut self, window: RtWindow) -> Self {
        self.config.rt_window = window;
        self
    }

    /// 時刻補正（分）を指定する
    ///
    /// 記録されたタイムスタンプから差し引く分数です。デフォルトは20分。
    pub fn with_time_shift_minutes(mut self, minutes: i64) -> Self {
        self.config.time_shift_minutes = minutes;
        self
    }

    /// 測定ごとの中間CSVを出力するかを指定する
    ///
    /// # 引数
    ///
    /// * `write`:
    ///   * `true`: 結合テーブルに加えて測定ごとのCSVも出力（デフォルト）
    ///   * `false`: 結合テーブルのみ出力
    pub fn write_intermediate(mut self, write: bool) -> Self {
        self.config.write_intermediate = write;
        self
    }

    /// 設定を検証し、`Pipeline`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `GcVocError::Config` - 設定の検証に失敗した場合
    ///   * キャリブレーションテーブルが空
    ///   * 保持時間ウィンドウの係数が正でない、または下限 > 上限
    pub fn build(self) -> Result<Pipeline, GcVocError> {
        // 1. キャリブレーションテーブルの検証
        if self.config.calibration.is_empty() {
            return Err(GcVocError::Config(
                "calibration table is empty".to_string(),
            ));
        }

        // 2. 保持時間ウィンドウの検証
        let window = self.config.rt_window;
        if !window.low.is_finite() || !window.high.is_finite() || window.low <= 0.0 {
            return Err(GcVocError::Config(format!(
                "invalid retention time window factors: {} / {}",
                window.low, window.high
            )));
        }
        if window.low > window.high {
            return Err(GcVocError::Config(format!(
                "retention time window low factor ({}) > high factor ({})",
                window.low, window.high
            )));
        }

        // 3. Pipelineインスタンス生成
        Ok(Pipeline {
            config: self.config,
        })
    }
}

/// バッチ処理の実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// 濃度行まで処理できたファイル数
    pub files_processed: usize,

    /// 失敗してスキップしたファイル数
    pub files_skipped: usize,

    /// 書き出した結合テーブルのパス
    pub combined_path: PathBuf,
}

/// 変換パイプラインのファサード
///
/// レポートファイルを濃度行へ変換するためのメインエントリーポイントです。
/// `PipelineBuilder`を使用して構築された設定に基づいて処理を実行します。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::path::Path;
/// use gcvoc::PipelineBuilder;
///
/// # fn main() -> Result<(), gcvoc::GcVocError> {
/// let pipeline = PipelineBuilder::new().build()?;
/// let summary = pipeline.process_batch(Path::new("reports"), Path::new("out"))?;
/// println!("{} runs converted", summary.files_processed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    /// パイプライン設定
    config: PipelineConfig,
}

impl Pipeline {
    /// 使用中のキャリブレーションテーブルを取得
    pub fn calibration(&self) -> &CalibrationTable {
        &self.config.calibration
    }

    /// 抽出済みの測定データを濃度行へ変換する
    pub fn convert_run(&self, run: &RunExtract) -> ConcentrationRow {
        let matches = matcher::sum_areas(run, &self.config.calibration, &self.config.rt_window);
        concentration::compute(
            &matches,
            &self.config.calibration,
            self.config.time_shift_minutes,
        )
    }

    /// メモリ上のレポート1件を濃度行へ変換する
    ///
    /// # 発生し得るエラー
    ///
    /// 抽出段のエラー（[`extract::extract_reader`]参照）がそのまま伝播します。
    pub fn process_reader<RS: Read + Seek + Clone>(
        &self,
        reader: RS,
    ) -> Result<ConcentrationRow, GcVocError> {
        let run = extract::extract_reader(reader)?;
        Ok(self.convert_run(&run))
    }

    /// レポートファイル1件を濃度行へ変換する
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<ConcentrationRow, GcVocError> {
        let run = extract::extract_file(path)?;
        Ok(self.convert_run(&run))
    }

    /// 入力ディレクトリ以下のレポートを一括変換し、CSVを出力する
    ///
    /// # 処理フロー
    ///
    /// 1. 入力ディレクトリを再帰的に探索し、レポートファイルを列挙（パス順）
    /// 2. 各ファイルを 抽出→照合→濃度計算 で変換
    ///    - ファイル単位の失敗は警告を記録してスキップ（バッチは止めない）
    ///    - 設定に応じて測定ごとの中間CSVを出力
    /// 3. 全行を結合テーブルとして出力ディレクトリへ書き出す
    ///
    /// # 発生し得るエラー
    ///
    /// * `GcVocError::NoUsableInput` - レポートが1件も見つからない、
    ///   または全ファイルの変換に失敗した場合
    /// * `GcVocError::Io` / `GcVocError::Csv` - 結合テーブルを書き出せない場合
    pub fn process_batch(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<BatchSummary, GcVocError> {
        let files = discover_reports(input_dir)?;
        if files.is_empty() {
            return Err(GcVocError::NoUsableInput {
                dir: input_dir.display().to_string(),
            });
        }
        info!("{} report file(s) found under {}", files.len(), input_dir.display());

        let mut rows: Vec<ConcentrationRow> = Vec::new();
        let mut skipped = 0usize;
        for path in &files {
            match self.process_file(path) {
                Ok(row) => {
                    info!("processed {}", path.display());
                    if self.config.write_intermediate {
                        self.write_intermediate_csv(&row, rows.len(), output_dir);
                    }
                    rows.push(row);
                }
                Err(e) => {
                    skipped += 1;
                    warn!("skipping {}: {}", path.display(), e);
                }
            }
        }

        if rows.is_empty() {
            return Err(GcVocError::NoUsableInput {
                dir: input_dir.display().to_string(),
            });
        }

        let combined_path = output_dir.join(output::combined_file_name(&rows));
        let file = File::create(&combined_path)?;
        output::write_combined_csv(&rows, &self.config.calibration, file)?;
        info!("combined table written to {}", combined_path.display());

        Ok(BatchSummary {
            files_processed: rows.len(),
            files_skipped: skipped,
            combined_path,
        })
    }

    /// 測定ごとの中間CSVを書き出す（失敗してもバッチは続行）
    fn write_intermediate_csv(&self, row: &ConcentrationRow, index: usize, output_dir: &Path) {
        let path = output_dir.join(output::run_file_name(row, index));
        let result = File::create(&path)
            .map_err(GcVocError::from)
            .and_then(|file| output::write_run_csv(row, &self.config.calibration, file));
        if let Err(e) = result {
            warn!("failed to write intermediate CSV {}: {}", path.display(), e);
        }
    }
}

/// 入力ディレクトリ以下のレポートファイルを再帰的に列挙する
///
/// 拡張子`.xls`/`.xlsx`（大文字小文字は区別しない）のファイルを、
/// 決定的な処理順のためパスのソート順で返します。
fn discover_reports(dir: &Path) -> Result<Vec<PathBuf>, GcVocError> {
    let mut files = Vec::new();
    walk(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), GcVocError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if is_report_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_report_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ext == "xls" || ext == "xlsx"
        })
        .unwrap_or(false)
}
