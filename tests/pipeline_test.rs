//! パイプライン統合テスト
//!
//! 偽の解析器でキーフレーム探索からCSV出力までを検証

use shot_emotion::analyzer::EmotionAnalyzer;
use shot_emotion::error::{Result, ShotEmotionError};
use shot_emotion::export::csv::{read_csv, write_csv};
use shot_emotion::pipeline::{run_pipeline, FrameOutcome, PipelineOptions};
use shot_emotion::scanner::discover_keyframes;
use shot_emotion_common::{Detection, KEYFRAME_GLOB};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// ファイル名ごとに決めた結果を返す解析器
#[derive(Default)]
struct FakeAnalyzer {
    responses: HashMap<String, std::result::Result<Option<Detection>, String>>,
    calls: Vec<PathBuf>,
}

impl FakeAnalyzer {
    fn with(mut self, file: &str, response: std::result::Result<Option<Detection>, String>) -> Self {
        self.responses.insert(file.to_string(), response);
        self
    }
}

impl EmotionAnalyzer for FakeAnalyzer {
    fn analyze(&mut self, image: &Path) -> Result<Option<Detection>> {
        self.calls.push(image.to_path_buf());
        let name = image.file_name().unwrap().to_string_lossy().to_string();
        match self.responses.get(&name) {
            Some(Ok(d)) => Ok(d.clone()),
            Some(Err(msg)) => Err(ShotEmotionError::Analyzer(msg.clone())),
            None => Ok(None),
        }
    }
}

fn touch(dir: &Path, names: &[&str]) {
    for name in names {
        File::create(dir.join(name)).unwrap();
    }
}

/// 2枚のうち1枚だけ感情が出るケース
#[test]
fn test_reference_scenario_single_row() {
    let dir = tempdir().unwrap();
    touch(dir.path(), &["shot_001_frame_0030.jpg", "shot_001_frame_0060.jpg"]);

    let keyframes = discover_keyframes(dir.path(), KEYFRAME_GLOB).unwrap();
    let mut analyzer = FakeAnalyzer::default()
        .with("shot_001_frame_0030.jpg", Ok(Some(Detection::new("happy", 87.5))))
        .with("shot_001_frame_0060.jpg", Ok(None));

    let run = run_pipeline(&keyframes, &mut analyzer, &PipelineOptions::default());
    let table = run.table();

    let csv_path = dir.path().join("out").join("shot_emotions.csv");
    write_csv(&table, &csv_path).unwrap();

    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content, "shot_id,timestamp,emotion,confidence\n1,1.0,happy,87.5\n");
}

/// 空フォルダはヘッダーのみ
#[test]
fn test_empty_folder_writes_header_only() {
    let dir = tempdir().unwrap();
    let keyframes = discover_keyframes(dir.path(), KEYFRAME_GLOB).unwrap();
    let mut analyzer = FakeAnalyzer::default();

    let run = run_pipeline(&keyframes, &mut analyzer, &PipelineOptions::default());
    assert!(run.outcomes().is_empty());

    let csv_path = dir.path().join("shot_emotions.csv");
    write_csv(&run.table(), &csv_path).unwrap();
    assert_eq!(
        std::fs::read_to_string(&csv_path).unwrap(),
        "shot_id,timestamp,emotion,confidence\n"
    );
    assert!(analyzer.calls.is_empty());
}

/// 解析失敗は次のファイルへ進み、失敗として区別される
#[test]
fn test_failures_are_tagged_and_do_not_stop_run() {
    let dir = tempdir().unwrap();
    touch(
        dir.path(),
        &[
            "shot_1_frame_30.jpg",
            "shot_2_frame_60.jpg",
            "shot_3_frame_90.jpg",
            "shot_x_frame_y.jpg",
        ],
    );

    let keyframes = discover_keyframes(dir.path(), KEYFRAME_GLOB).unwrap();
    let mut analyzer = FakeAnalyzer::default()
        .with("shot_1_frame_30.jpg", Err("corrupt image".into()))
        .with("shot_2_frame_60.jpg", Ok(Some(Detection::new("sad", 40.0))))
        .with("shot_3_frame_90.jpg", Ok(None));

    let run = run_pipeline(&keyframes, &mut analyzer, &PipelineOptions::default());

    let summary = run.summary();
    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.detected, 1);
    assert_eq!(summary.no_detection, 1);
    assert_eq!(summary.skipped, 1);

    // 命名規則に合わないファイルは解析器に渡さない
    assert_eq!(analyzer.calls.len(), 3);

    match &run.outcomes()[0] {
        FrameOutcome::Failed { record, cause } => {
            assert_eq!(record.shot_id, 1);
            assert!(cause.contains("corrupt image"));
        }
        other => panic!("Failedのはず: {:?}", other),
    }
    assert!(matches!(run.outcomes()[3], FrameOutcome::Skipped { .. }));

    // 失敗・顔なしも観測値としては残る（感情なし、confidence 0.0）
    let observations = run.observations();
    assert_eq!(observations.len(), 3);
    assert_eq!(observations[0].emotion, None);
    assert_eq!(observations[0].confidence, 0.0);

    let table = run.table();
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].shot_id, 2);
    assert_eq!(table.rows()[0].timestamp, 2.0);
}

/// 出力行数 ≤ 検出ファイル数、感情なしの行は含まない
#[test]
fn test_row_count_bounded_and_no_absent_labels() {
    let dir = tempdir().unwrap();
    let names: Vec<String> = (0..12).map(|i| format!("shot_{}_frame_{}.jpg", i / 3, i * 15)).collect();
    let name_refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
    touch(dir.path(), &name_refs);
    touch(dir.path(), &["poster.jpg", "shot_1_frame_1.png"]);

    let keyframes = discover_keyframes(dir.path(), KEYFRAME_GLOB).unwrap();
    assert_eq!(keyframes.len(), 12);

    let mut analyzer = FakeAnalyzer::default();
    for (i, name) in names.iter().enumerate() {
        let response = if i % 2 == 0 {
            Ok(Some(Detection::new("neutral", 50.0 + i as f64)))
        } else {
            Ok(None)
        };
        analyzer = analyzer.with(name, response);
    }

    let run = run_pipeline(&keyframes, &mut analyzer, &PipelineOptions::default());
    let table = run.table();
    assert!(table.len() <= keyframes.len());
    assert_eq!(table.len(), 6);
    assert!(table.rows().iter().all(|r| !r.emotion.is_empty()));
}

/// 同じショットの複数フレームはそれぞれ独立した行になる
#[test]
fn test_multiple_frames_per_shot_are_separate_rows() {
    let dir = tempdir().unwrap();
    touch(dir.path(), &["shot_5_frame_30.jpg", "shot_5_frame_90.jpg"]);

    let keyframes = discover_keyframes(dir.path(), KEYFRAME_GLOB).unwrap();
    let mut analyzer = FakeAnalyzer::default()
        .with("shot_5_frame_30.jpg", Ok(Some(Detection::new("fear", 70.0))))
        .with("shot_5_frame_90.jpg", Ok(Some(Detection::new("surprise", 65.0))));

    let table = run_pipeline(&keyframes, &mut analyzer, &PipelineOptions::default()).table();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[0].timestamp, 1.0);
    assert_eq!(table.rows()[1].timestamp, 3.0);
}

/// 同じテーブルからは同じバイト列
#[test]
fn test_persist_is_idempotent_and_reloadable() {
    let dir = tempdir().unwrap();
    touch(dir.path(), &["shot_1_frame_10.jpg", "shot_2_frame_45.jpg"]);

    let keyframes = discover_keyframes(dir.path(), KEYFRAME_GLOB).unwrap();
    let mut analyzer = FakeAnalyzer::default()
        .with("shot_1_frame_10.jpg", Ok(Some(Detection::new("angry", 33.3))))
        .with("shot_2_frame_45.jpg", Ok(Some(Detection::new("happy", 91.25))));
    let table = run_pipeline(&keyframes, &mut analyzer, &PipelineOptions::default()).table();

    let path = dir.path().join("shot_emotions.csv");
    write_csv(&table, &path).unwrap();
    let first = std::fs::read(&path).unwrap();
    write_csv(&table, &path).unwrap();
    let second = std::fs::read(&path).unwrap();
    assert_eq!(first, second);

    let reloaded = read_csv(&path).unwrap();
    assert_eq!(reloaded, table);
}

/// fps設定がタイムスタンプに反映される
#[test]
fn test_custom_fps() {
    let dir = tempdir().unwrap();
    touch(dir.path(), &["shot_1_frame_48.jpg"]);

    let keyframes = discover_keyframes(dir.path(), KEYFRAME_GLOB).unwrap();
    let mut analyzer = FakeAnalyzer::default()
        .with("shot_1_frame_48.jpg", Ok(Some(Detection::new("sad", 10.0))));
    let options = PipelineOptions {
        fps: 24.0,
        ..PipelineOptions::default()
    };

    let table = run_pipeline(&keyframes, &mut analyzer, &options).table();
    assert_eq!(table.rows()[0].timestamp, 2.0);
}
