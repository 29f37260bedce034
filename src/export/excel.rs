//! Excel生成（CLI版）
//!
//! 共通ライブラリでバッファを作り、ファイルに書き出す

use crate::error::{Result, ShotEmotionError};
use shot_emotion_common::export::excel_core::generate_excel_buffer;
use shot_emotion_common::{ResultTable, UnknownLabelPolicy};
use std::path::Path;

pub fn generate_excel(
    table: &ResultTable,
    output_path: &Path,
    title: &str,
    policy: UnknownLabelPolicy,
) -> Result<()> {
    let buffer = generate_excel_buffer(table, title, policy)
        .map_err(ShotEmotionError::ExcelGeneration)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, buffer)?;
    Ok(())
}
