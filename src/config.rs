use crate::error::{Result, ShotEmotionError};
use serde::{Deserialize, Serialize};
use shot_emotion_common::{FaceSelection, UnknownLabelPolicy, DEFAULT_FPS, KEYFRAME_GLOB};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// フレーム番号→秒の換算に使うfps
    pub fps: f64,
    pub keyframe_glob: String,
    pub detector_backend: String,
    /// trueなら顔が見つからない画像を解析失敗として扱う
    pub enforce_detection: bool,
    pub python: String,
    /// 組み込みのDeepFaceランナーの代わりに使うコマンド（引数込み）
    pub analyzer_command: Option<Vec<String>>,
    pub face_selection: FaceSelection,
    pub unknown_labels: UnknownLabelPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            keyframe_glob: KEYFRAME_GLOB.into(),
            detector_backend: "opencv".into(),
            enforce_detection: false,
            python: "python3".into(),
            analyzer_command: None,
            face_selection: FaceSelection::First,
            unknown_labels: UnknownLabelPolicy::Separate,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content).map_err(|e| {
                ShotEmotionError::Config(format!("設定ファイルが不正です: {}: {}", path.display(), e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ShotEmotionError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("shot-emotion").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ShotEmotionError::Config(format!("fpsは正の数が必要です: {}", self.fps)));
        }
        if self.keyframe_glob.trim().is_empty() {
            return Err(ShotEmotionError::Config("keyframe_globが空です".into()));
        }
        if let Some(cmd) = &self.analyzer_command {
            if cmd.is_empty() {
                return Err(ShotEmotionError::Config("analyzer_commandが空です".into()));
            }
        }
        Ok(())
    }
}
