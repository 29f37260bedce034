//! キーフレーム処理パイプライン
//!
//! 発見済みのキーフレームを発見順に1枚ずつ処理し、結果をタグ付きで返す。
//! 1枚の失敗で全体を止めることはない。

use crate::analyzer::EmotionAnalyzer;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use shot_emotion_common::{
    parse_keyframe_name, Detection, EmotionObservation, KeyframeRecord, ResultTable,
};
use std::path::PathBuf;

/// キーフレーム1枚の処理結果
#[derive(Debug, Clone)]
pub enum FrameOutcome {
    /// 感情を検出
    Detected {
        record: KeyframeRecord,
        detection: Detection,
    },
    /// ファイル名が命名規則に合わない
    Skipped { path: PathBuf },
    /// 解析器は動いたが顔・感情なし
    NoDetection { record: KeyframeRecord },
    /// 解析器の実行失敗
    Failed {
        record: KeyframeRecord,
        cause: String,
    },
}

impl FrameOutcome {
    /// 観測値（スキップしたファイルは観測値を持たない）
    pub fn observation(&self) -> Option<EmotionObservation> {
        match self {
            FrameOutcome::Detected { record, detection } => {
                Some(EmotionObservation::from_detection(record, Some(detection.clone())))
            }
            FrameOutcome::NoDetection { record } | FrameOutcome::Failed { record, .. } => {
                Some(EmotionObservation::absent(record))
            }
            FrameOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub discovered: usize,
    pub detected: usize,
    pub skipped: usize,
    pub no_detection: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub fps: f64,
    pub show_progress: bool,
    pub verbose: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fps: shot_emotion_common::DEFAULT_FPS,
            show_progress: false,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    outcomes: Vec<FrameOutcome>,
}

impl PipelineRun {
    pub fn outcomes(&self) -> &[FrameOutcome] {
        &self.outcomes
    }

    /// スキップ以外の全キーフレームの観測値（発見順）
    pub fn observations(&self) -> Vec<EmotionObservation> {
        self.outcomes.iter().filter_map(FrameOutcome::observation).collect()
    }

    /// 感情なしの行を落とした結果テーブル
    pub fn table(&self) -> ResultTable {
        ResultTable::from_observations(self.observations())
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            discovered: self.outcomes.len(),
            ..RunSummary::default()
        };
        for outcome in &self.outcomes {
            match outcome {
                FrameOutcome::Detected { .. } => summary.detected += 1,
                FrameOutcome::Skipped { .. } => summary.skipped += 1,
                FrameOutcome::NoDetection { .. } => summary.no_detection += 1,
                FrameOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// キーフレームを順に解析する
pub fn run_pipeline<A>(paths: &[PathBuf], analyzer: &mut A, options: &PipelineOptions) -> PipelineRun
where
    A: EmotionAnalyzer + ?Sized,
{
    let pb = if options.show_progress {
        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut outcomes = Vec::with_capacity(paths.len());

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        pb.set_message(name.clone());

        let outcome = match parse_keyframe_name(path, options.fps) {
            None => {
                tracing::debug!(file = %name, "命名規則に合わないためスキップ");
                FrameOutcome::Skipped { path: path.clone() }
            }
            Some(record) => match analyzer.analyze(path) {
                Ok(Some(detection)) => {
                    if options.verbose {
                        pb.suspend(|| {
                            println!(
                                "  {} → {} ({:.1})",
                                name, detection.label, detection.confidence
                            )
                        });
                    }
                    FrameOutcome::Detected { record, detection }
                }
                Ok(None) => {
                    if options.verbose {
                        pb.suspend(|| println!("  {} → 顔なし", name));
                    }
                    FrameOutcome::NoDetection { record }
                }
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "感情解析に失敗");
                    pb.suspend(|| println!("  ⚠ {} の処理エラー: {}", name, e));
                    FrameOutcome::Failed {
                        record,
                        cause: e.to_string(),
                    }
                }
            },
        };

        outcomes.push(outcome);
        pb.inc(1);
    }

    pb.finish_and_clear();

    PipelineRun { outcomes }
}
