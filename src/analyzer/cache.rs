//! 解析結果キャッシュモジュール
//!
//! 画像のSHA-256と解析設定をキーにして検出結果をキャッシュし、
//! 同じキーフレームの再解析をスキップする。失敗した解析はキャッシュしない。

use super::EmotionAnalyzer;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shot_emotion_common::Detection;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".emotion-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// キー → 検出結果のマップ
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub file_name: String,
    pub file_size: u64,
    /// `None` は「顔なし」という結果
    pub detection: Option<Detection>,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 1;

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み（壊れていれば空から作り直す）
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %cache_path.display(), error = %e, "キャッシュを開けません");
                return Self::default();
            }
        };

        match serde_json::from_reader::<_, CacheFile>(BufReader::new(file)) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => cache,
            Ok(_) => {
                tracing::warn!("キャッシュバージョン不一致、再生成します");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "キャッシュが壊れています、再生成します");
                Self::default()
            }
        }
    }

    pub fn save(&self, folder: &Path) -> Result<()> {
        let file = File::create(Self::cache_path(folder))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（存在しなければ `false`）
    pub fn clear(folder: &Path) -> Result<bool> {
        let path = Self::cache_path(folder);
        if path.exists() {
            std::fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, file_name: String, file_size: u64, detection: Option<Detection>) {
        self.entries.insert(key, CacheEntry {
            file_name,
            file_size,
            detection,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// 画像ファイルのSHA-256（16進）
pub fn compute_file_hash(path: &Path) -> Result<(String, u64)> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok((hex::encode(digest), bytes.len() as u64))
}

/// キャッシュ付きの解析器ラッパー
pub struct CachedAnalyzer<A> {
    inner: A,
    cache: CacheFile,
    hits: usize,
    misses: usize,
}

impl<A: EmotionAnalyzer> CachedAnalyzer<A> {
    pub fn new(inner: A, cache: CacheFile) -> Self {
        Self {
            inner,
            cache,
            hits: 0,
            misses: 0,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn into_cache(self) -> CacheFile {
        self.cache
    }
}

impl<A: EmotionAnalyzer> EmotionAnalyzer for CachedAnalyzer<A> {
    fn analyze(&mut self, image: &Path) -> Result<Option<Detection>> {
        let hashed = compute_file_hash(image);
        let (key, file_size) = match &hashed {
            Ok((hash, size)) => (Some(format!("{}:{}", hash, self.inner.fingerprint())), *size),
            Err(e) => {
                // ハッシュ計算失敗時は未キャッシュとして扱う
                tracing::debug!(image = %image.display(), error = %e, "ハッシュ計算に失敗");
                (None, 0)
            }
        };

        if let Some(entry) = key.as_deref().and_then(|k| self.cache.get(k)) {
            self.hits += 1;
            return Ok(entry.detection.clone());
        }

        self.misses += 1;
        let detection = self.inner.analyze(image)?;

        if let Some(key) = key {
            let file_name = image
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            self.cache.insert(key, file_name, file_size, detection.clone());
        }

        Ok(detection)
    }

    fn fingerprint(&self) -> String {
        self.inner.fingerprint()
    }
}
