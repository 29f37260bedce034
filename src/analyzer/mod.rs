//! 感情解析アダプタ
//!
//! 外部の顔・感情解析器を `EmotionAnalyzer` の背後に置き、
//! パイプラインからは `analyze(image) -> Option<Detection>` だけを見る。

pub mod cache;
mod deepface;

pub use cache::{CacheFile, CachedAnalyzer};
pub use deepface::{DeepFaceAnalyzer, DEEPFACE_SCRIPT};

use crate::error::Result;
use shot_emotion_common::Detection;
use std::path::Path;

pub trait EmotionAnalyzer {
    /// 画像1枚を解析する
    ///
    /// - `Ok(Some(_))`: 支配的感情を検出
    /// - `Ok(None)`: 顔・感情なし
    /// - `Err(_)`: 解析器の実行失敗や出力不正
    fn analyze(&mut self, image: &Path) -> Result<Option<Detection>>;

    /// キャッシュキーに含める設定の要約
    fn fingerprint(&self) -> String {
        String::new()
    }
}

impl<A: EmotionAnalyzer + ?Sized> EmotionAnalyzer for Box<A> {
    fn analyze(&mut self, image: &Path) -> Result<Option<Detection>> {
        (**self).analyze(image)
    }

    fn fingerprint(&self) -> String {
        (**self).fingerprint()
    }
}
