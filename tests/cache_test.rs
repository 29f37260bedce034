//! キャッシュ機能テスト
//!
//! 解析結果キャッシュの動作を検証

use shot_emotion::analyzer::cache::compute_file_hash;
use shot_emotion::analyzer::{CacheFile, CachedAnalyzer, EmotionAnalyzer};
use shot_emotion::error::{Result, ShotEmotionError};
use shot_emotion_common::Detection;
use std::path::Path;
use tempfile::tempdir;

/// 呼び出し回数を数える解析器
struct CountingAnalyzer {
    calls: usize,
    fail: bool,
    settings: String,
}

impl CountingAnalyzer {
    fn new(settings: &str) -> Self {
        Self {
            calls: 0,
            fail: false,
            settings: settings.to_string(),
        }
    }
}

impl EmotionAnalyzer for CountingAnalyzer {
    fn analyze(&mut self, _image: &Path) -> Result<Option<Detection>> {
        self.calls += 1;
        if self.fail {
            return Err(ShotEmotionError::Analyzer("解析器が落ちました".into()));
        }
        Ok(Some(Detection::new("happy", 80.0)))
    }

    fn fingerprint(&self) -> String {
        self.settings.clone()
    }
}

/// 空のキャッシュファイル
#[test]
fn test_cache_file_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache = CacheFile::load(dir.path());

    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
}

/// キャッシュの保存と読み込み
#[test]
fn test_cache_save_and_load() {
    let dir = tempdir().expect("Failed to create temp dir");

    let mut cache = CacheFile::load(dir.path());
    cache.insert(
        "abc123".to_string(),
        "shot_1_frame_30.jpg".to_string(),
        1024,
        Some(Detection::new("sad", 55.5)),
    );
    cache.insert("def456".to_string(), "shot_2_frame_60.jpg".to_string(), 2048, None);

    cache.save(dir.path()).expect("キャッシュ保存失敗");

    let loaded = CacheFile::load(dir.path());
    assert_eq!(loaded.len(), 2);

    let cached = loaded.get("abc123").expect("キャッシュが見つからない");
    assert_eq!(cached.file_name, "shot_1_frame_30.jpg");
    assert_eq!(cached.detection, Some(Detection::new("sad", 55.5)));

    // 顔なしの結果もキャッシュされる
    let no_face = loaded.get("def456").expect("キャッシュが見つからない");
    assert_eq!(no_face.detection, None);
}

/// 壊れたキャッシュは空として扱う
#[test]
fn test_corrupt_cache_is_ignored() {
    let dir = tempdir().unwrap();
    std::fs::write(CacheFile::cache_path(dir.path()), "{ not json").unwrap();

    let cache = CacheFile::load(dir.path());
    assert!(cache.is_empty());
}

/// キャッシュ削除
#[test]
fn test_cache_clear() {
    let dir = tempdir().unwrap();
    CacheFile::default().save(dir.path()).unwrap();

    assert!(CacheFile::clear(dir.path()).unwrap());
    assert!(!CacheFile::cache_path(dir.path()).exists());
    assert!(!CacheFile::clear(dir.path()).unwrap());
}

/// 同じ内容のファイルは同じハッシュ
#[test]
fn test_file_hash_depends_on_content() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.jpg");
    let b = dir.path().join("b.jpg");
    let c = dir.path().join("c.jpg");
    std::fs::write(&a, b"frame").unwrap();
    std::fs::write(&b, b"frame").unwrap();
    std::fs::write(&c, b"other").unwrap();

    let (hash_a, size_a) = compute_file_hash(&a).unwrap();
    let (hash_b, _) = compute_file_hash(&b).unwrap();
    let (hash_c, _) = compute_file_hash(&c).unwrap();

    assert_eq!(hash_a, hash_b);
    assert_ne!(hash_a, hash_c);
    assert_eq!(hash_a.len(), 64);
    assert_eq!(size_a, 5);
}

/// 2回目はキャッシュヒットで解析器を呼ばない
#[test]
fn test_cached_analyzer_hit() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("shot_1_frame_30.jpg");
    std::fs::write(&image, b"jpeg bytes").unwrap();

    let mut cached = CachedAnalyzer::new(CountingAnalyzer::new("opencv"), CacheFile::default());

    let first = cached.analyze(&image).unwrap();
    let second = cached.analyze(&image).unwrap();

    assert_eq!(first, second);
    assert_eq!(cached.misses(), 1);
    assert_eq!(cached.hits(), 1);
    assert_eq!(cached.into_cache().len(), 1);
}

/// 保存したキャッシュは次回の実行でも効く
#[test]
fn test_cached_analyzer_persists_between_runs() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("shot_1_frame_30.jpg");
    std::fs::write(&image, b"jpeg bytes").unwrap();

    let mut first_run = CachedAnalyzer::new(CountingAnalyzer::new("opencv"), CacheFile::load(dir.path()));
    first_run.analyze(&image).unwrap();
    first_run.into_cache().save(dir.path()).unwrap();

    let mut second_run = CachedAnalyzer::new(CountingAnalyzer::new("opencv"), CacheFile::load(dir.path()));
    let result = second_run.analyze(&image).unwrap();
    assert_eq!(result, Some(Detection::new("happy", 80.0)));
    assert_eq!(second_run.hits(), 1);
    assert_eq!(second_run.misses(), 0);
}

/// 解析設定が変わればキャッシュは効かない
#[test]
fn test_cached_analyzer_respects_fingerprint() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("shot_1_frame_30.jpg");
    std::fs::write(&image, b"jpeg bytes").unwrap();

    let mut opencv = CachedAnalyzer::new(CountingAnalyzer::new("opencv"), CacheFile::default());
    opencv.analyze(&image).unwrap();
    let cache = opencv.into_cache();

    let mut retina = CachedAnalyzer::new(CountingAnalyzer::new("retinaface"), cache);
    retina.analyze(&image).unwrap();
    assert_eq!(retina.hits(), 0);
    assert_eq!(retina.misses(), 1);
    assert_eq!(retina.into_cache().len(), 2);
}

/// 失敗した解析はキャッシュしない
#[test]
fn test_cached_analyzer_does_not_cache_errors() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("shot_1_frame_30.jpg");
    std::fs::write(&image, b"jpeg bytes").unwrap();

    let mut inner = CountingAnalyzer::new("opencv");
    inner.fail = true;
    let mut cached = CachedAnalyzer::new(inner, CacheFile::default());

    assert!(cached.analyze(&image).is_err());
    assert!(cached.analyze(&image).is_err());
    assert_eq!(cached.misses(), 2);
    assert!(cached.into_cache().is_empty());
}
