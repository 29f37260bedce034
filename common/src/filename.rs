//! キーフレームのファイル名解析
//!
//! `shot_<shot_id>_frame_<frame_number>.jpg` からショットIDとフレーム番号を取り出し、
//! 固定fpsでタイムスタンプを求める。

use crate::types::KeyframeRecord;
use regex::Regex;
use std::path::Path;

/// フレーム番号から秒への換算に使うfps（実動画からは計測しない）
pub const DEFAULT_FPS: f64 = 30.0;

/// キーフレーム探索用のglobパターン
pub const KEYFRAME_GLOB: &str = "shot_*_frame_*.jpg";

lazy_static::lazy_static! {
    static ref KEYFRAME_RE: Regex = Regex::new(r"shot_(\d+)_frame_(\d+)").unwrap();
}

/// ファイル名を解析する
///
/// 命名規則に合わない場合や数値が範囲外の場合は `None`。
/// 判定はファイル名部分のみで行い、ディレクトリ名は見ない。
///
/// # Examples
/// ```
/// use shot_emotion_common::parse_keyframe_name;
/// use std::path::Path;
///
/// let record = parse_keyframe_name(Path::new("shot_001_frame_0030.jpg"), 30.0).unwrap();
/// assert_eq!(record.shot_id, 1);
/// assert_eq!(record.frame_number, 30);
/// assert_eq!(record.timestamp, 1.0);
/// ```
pub fn parse_keyframe_name(path: &Path, fps: f64) -> Option<KeyframeRecord> {
    if fps <= 0.0 || !fps.is_finite() {
        return None;
    }

    let name = path.file_name()?.to_str()?;
    let caps = KEYFRAME_RE.captures(name)?;
    let shot_id: u32 = caps.get(1)?.as_str().parse().ok()?;
    let frame_number: u64 = caps.get(2)?.as_str().parse().ok()?;

    Some(KeyframeRecord {
        path: path.to_path_buf(),
        shot_id,
        frame_number,
        timestamp: frame_number as f64 / fps,
    })
}
