//! 感情ラベルの序数スケール
//!
//! タイムライン描画用に既知の7ラベルへ 1〜7 を割り当てる。
//! 未知ラベルは既知の帯と重ならない番兵値に置くか、除外する。

use serde::{Deserialize, Serialize};

/// 既知ラベルと序数（angry=1 … neutral=7）
pub const KNOWN_EMOTIONS: [(&str, u8); 7] = [
    ("angry", 1),
    ("disgust", 2),
    ("fear", 3),
    ("happy", 4),
    ("sad", 5),
    ("surprise", 6),
    ("neutral", 7),
];

/// 未知ラベル用の番兵序数
pub const UNKNOWN_ORDINAL: u8 = 8;

/// 未知ラベルの表示名
pub const UNKNOWN_LABEL: &str = "other";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordinal {
    Known(u8),
    Unknown,
}

impl Ordinal {
    /// 描画用のy値
    pub fn value(&self) -> u8 {
        match self {
            Ordinal::Known(v) => *v,
            Ordinal::Unknown => UNKNOWN_ORDINAL,
        }
    }
}

/// 未知ラベルの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownLabelPolicy {
    /// 番兵序数の専用帯に置く
    #[default]
    Separate,
    /// タイムラインから除外する
    Exclude,
}

impl std::str::FromStr for UnknownLabelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "separate" => Ok(UnknownLabelPolicy::Separate),
            "exclude" => Ok(UnknownLabelPolicy::Exclude),
            _ => Err(format!("Unknown label policy: {}. Use separate or exclude", s)),
        }
    }
}

impl std::fmt::Display for UnknownLabelPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnknownLabelPolicy::Separate => write!(f, "separate"),
            UnknownLabelPolicy::Exclude => write!(f, "exclude"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionScale;

impl EmotionScale {
    /// ラベルを序数へ変換（大文字小文字は区別しない）
    pub fn ordinal(&self, label: &str) -> Ordinal {
        let label = label.trim().to_lowercase();
        KNOWN_EMOTIONS
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, v)| Ordinal::Known(*v))
            .unwrap_or(Ordinal::Unknown)
    }

    /// y軸の目盛り（序数, ラベル）
    pub fn ticks(&self, policy: UnknownLabelPolicy) -> Vec<(u8, &'static str)> {
        let mut ticks: Vec<(u8, &'static str)> =
            KNOWN_EMOTIONS.iter().map(|(name, v)| (*v, *name)).collect();
        if policy == UnknownLabelPolicy::Separate {
            ticks.push((UNKNOWN_ORDINAL, UNKNOWN_LABEL));
        }
        ticks
    }

    pub fn max_ordinal(&self) -> u8 {
        UNKNOWN_ORDINAL
    }
}
