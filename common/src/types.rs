//! データモデル
//!
//! - KeyframeRecord: ファイル名から得たショット情報
//! - EmotionObservation: キーフレーム1枚ごとの解析結果（感情なしを含む）
//! - ResultTable: 感情が検出された行だけを保持する結果テーブル

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// キーフレーム画像1枚分の情報（生成後は不変）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframeRecord {
    pub path: PathBuf,
    pub shot_id: u32,
    pub frame_number: u64,
    /// 秒（frame_number / fps）
    pub timestamp: f64,
}

impl KeyframeRecord {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// 解析器が返した支配的感情とそのスコア
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// 0.0〜100.0
    pub confidence: f64,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 100.0),
        }
    }
}

/// キーフレーム1枚ごとの観測値
///
/// `emotion` が `None` の場合は顔・感情が検出されなかったことを表し、
/// `confidence` は 0.0 になる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionObservation {
    pub shot_id: u32,
    pub timestamp: f64,
    pub emotion: Option<String>,
    pub confidence: f64,
}

impl EmotionObservation {
    pub fn from_detection(record: &KeyframeRecord, detection: Option<Detection>) -> Self {
        match detection {
            Some(d) => Self {
                shot_id: record.shot_id,
                timestamp: record.timestamp,
                emotion: Some(d.label),
                confidence: d.confidence,
            },
            None => Self::absent(record),
        }
    }

    pub fn absent(record: &KeyframeRecord) -> Self {
        Self {
            shot_id: record.shot_id,
            timestamp: record.timestamp,
            emotion: None,
            confidence: 0.0,
        }
    }
}

/// 結果テーブルの1行（感情ラベルは必ず存在する）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionRow {
    pub shot_id: u32,
    pub timestamp: f64,
    pub emotion: String,
    pub confidence: f64,
}

/// 感情なしの行を除いた順序付き結果テーブル
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    rows: Vec<EmotionRow>,
}

impl ResultTable {
    /// 観測値の順序を保ったまま、感情なしの行を落とす
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = EmotionObservation>,
    {
        let rows = observations
            .into_iter()
            .filter_map(|o| {
                o.emotion.map(|emotion| EmotionRow {
                    shot_id: o.shot_id,
                    timestamp: o.timestamp,
                    emotion,
                    confidence: o.confidence,
                })
            })
            .collect();
        Self { rows }
    }

    pub fn from_rows(rows: Vec<EmotionRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[EmotionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
