//! 感情解析器レスポンスパーサー
//!
//! 外部解析器の標準出力からJSONを取り出し、顔ごとの結果を読み取る。
//! 出力は単一オブジェクトか、検出した顔ごとのオブジェクト配列のどちらか。

use crate::error::{Error, Result};
use crate::types::Detection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 顔の矩形
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Region {
    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }
}

/// 顔1つ分の解析結果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceResult {
    #[serde(default)]
    pub dominant_emotion: Option<String>,

    /// ラベル → スコア（0〜100）
    #[serde(default)]
    pub emotion: HashMap<String, f64>,

    #[serde(default)]
    pub region: Option<Region>,
}

impl FaceResult {
    /// 支配的ラベルとそのスコア
    ///
    /// スコア表に支配的ラベルが無い場合は最大スコアを使う。
    pub fn dominant(&self) -> Option<Detection> {
        let label = self.dominant_emotion.as_deref()?.trim();
        if label.is_empty() {
            return None;
        }

        let score = self
            .emotion
            .get(label)
            .copied()
            .or_else(|| self.emotion.values().copied().reduce(f64::max))
            .unwrap_or(0.0);

        Some(Detection::new(label, score))
    }
}

/// 複数の顔が返ったときの選び方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaceSelection {
    /// 解析器が返した順で先頭
    #[default]
    First,
    /// 矩形面積が最大の顔（矩形が無ければ先頭）
    Largest,
    /// 支配的スコアが最大の顔
    MostConfident,
}

impl std::str::FromStr for FaceSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(FaceSelection::First),
            "largest" => Ok(FaceSelection::Largest),
            "most-confident" | "confident" => Ok(FaceSelection::MostConfident),
            _ => Err(format!(
                "Unknown face selection: {}. Use first, largest, or most-confident",
                s
            )),
        }
    }
}

impl std::fmt::Display for FaceSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaceSelection::First => write!(f, "first"),
            FaceSelection::Largest => write!(f, "largest"),
            FaceSelection::MostConfident => write!(f, "most-confident"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnalyzerOutput {
    Many(Vec<FaceResult>),
    One(FaceResult),
}

/// 出力からJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 末尾から見て `[` か `{` で始まる行のうち、JSONとして読める行
/// 3. 最初の括弧から最後の括弧まで
pub fn extract_json(output: &str) -> Result<&str> {
    if let Some(start_marker) = output.find("```json") {
        let start = start_marker + 7;
        if let Some(end_offset) = output[start..].find("```") {
            return Ok(output[start..start + end_offset].trim());
        }
    }

    // 解析器はログを先に出すことがあるので、JSON単独行を優先する
    for line in output.lines().rev() {
        let line = line.trim();
        if (line.starts_with('[') || line.starts_with('{'))
            && serde_json::from_str::<serde_json::Value>(line).is_ok()
        {
            return Ok(line);
        }
    }

    let start = output.find(['[', '{']);
    let end = output.rfind([']', '}']);
    match (start, end) {
        (Some(s), Some(e)) if e > s => Ok(&output[s..=e]),
        _ => Err(Error::Parse("JSONが見つかりません".into())),
    }
}

/// 解析器の出力を顔ごとの結果に変換
pub fn parse_analyzer_output(output: &str) -> Result<Vec<FaceResult>> {
    let json_str = extract_json(output)?;
    let parsed: AnalyzerOutput = serde_json::from_str(json_str)
        .map_err(|e| Error::Parse(format!("解析器JSONパースエラー: {}", e)))?;

    Ok(match parsed {
        AnalyzerOutput::Many(faces) => faces,
        AnalyzerOutput::One(face) => vec![face],
    })
}

/// 顔を1つ選び、支配的感情を返す（顔なしは `None`）
pub fn select_face(faces: &[FaceResult], selection: FaceSelection) -> Option<Detection> {
    let chosen = match selection {
        FaceSelection::First => faces.first(),
        FaceSelection::Largest => {
            if faces.iter().any(|f| f.region.is_some()) {
                faces.iter().enumerate().max_by(|(ia, a), (ib, b)| {
                    let aa = a.region.map(|r| r.area()).unwrap_or(0.0);
                    let ab = b.region.map(|r| r.area()).unwrap_or(0.0);
                    // 同面積なら先に来た顔
                    aa.total_cmp(&ab).then(ib.cmp(ia))
                })
                .map(|(_, f)| f)
            } else {
                faces.first()
            }
        }
        FaceSelection::MostConfident => faces
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.dominant().map(|d| (i, f, d.confidence)))
            .max_by(|(ia, _, ca), (ib, _, cb)| ca.total_cmp(cb).then(ib.cmp(ia)))
            .map(|(_, f, _)| f),
    };

    chosen.and_then(FaceResult::dominant)
}
