use crate::error::{Result, ShotEmotionError};
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// フォルダ直下からglobに一致するキーフレームを探す
///
/// 結果はパスの辞書順。該当なしはエラーではなく空のVec。
pub fn discover_keyframes(folder: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(ShotEmotionError::FolderNotFound(folder.display().to_string()));
    }

    let pattern = Pattern::new(pattern)
        .map_err(|e| ShotEmotionError::Config(format!("globパターンが不正: {}: {}", pattern, e)))?;

    let mut keyframes: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|name| pattern.matches(name))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    keyframes.sort();

    Ok(keyframes)
}
