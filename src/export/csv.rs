//! CSV保存・読み込み

use crate::error::{Result, ShotEmotionError};
use shot_emotion_common::{parse_csv, to_csv_string, ResultTable};
use std::path::Path;

/// テーブルをCSVで保存（既存ファイルは上書き）
pub fn write_csv(table: &ResultTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, to_csv_string(table))?;
    Ok(())
}

/// 保存済みCSVを読み込む
pub fn read_csv(path: &Path) -> Result<ResultTable> {
    if !path.is_file() {
        return Err(ShotEmotionError::FileNotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    parse_csv(&text).map_err(|e| ShotEmotionError::Csv(format!("{}: {}", path.display(), e)))
}
