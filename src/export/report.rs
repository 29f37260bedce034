//! 実行レポート（JSON）
//!
//! 検出・顔なし・失敗・スキップを区別して残す。

use crate::error::Result;
use crate::pipeline::{FrameOutcome, PipelineRun, RunSummary};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    pub file: String,
    pub cause: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub generated_at: String,
    pub fps: f64,
    pub detector_backend: String,
    pub summary: RunSummary,
    pub failures: Vec<FailureEntry>,
    pub skipped: Vec<String>,
    pub no_detection: Vec<String>,
}

impl RunReport {
    pub fn from_run(run: &PipelineRun, fps: f64, detector_backend: &str) -> Self {
        let mut failures = Vec::new();
        let mut skipped = Vec::new();
        let mut no_detection = Vec::new();

        for outcome in run.outcomes() {
            match outcome {
                FrameOutcome::Failed { record, cause } => failures.push(FailureEntry {
                    file: record.file_name(),
                    cause: cause.clone(),
                }),
                FrameOutcome::Skipped { path } => skipped.push(path.display().to_string()),
                FrameOutcome::NoDetection { record } => no_detection.push(record.file_name()),
                FrameOutcome::Detected { .. } => {}
            }
        }

        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            fps,
            detector_backend: detector_backend.to_string(),
            summary: run.summary(),
            failures,
            skipped,
            no_detection,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
