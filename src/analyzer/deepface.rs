//! DeepFace連携
//!
//! 解析器は別プロセスで実行し、標準出力のJSONを読む。
//! 引数は `<画像パス> <enforce 0|1> <検出バックエンド>` の順。

use super::EmotionAnalyzer;
use crate::config::Config;
use crate::error::{Result, ShotEmotionError};
use sha2::{Digest, Sha256};
use shot_emotion_common::{parse_analyzer_output, select_face, Detection, FaceSelection};
use std::path::Path;
use std::process::Command;

/// `python -c` で実行する組み込みランナー
pub const DEEPFACE_SCRIPT: &str = r#"import json, sys
from deepface import DeepFace
result = DeepFace.analyze(
    img_path=sys.argv[1],
    actions=['emotion'],
    enforce_detection=sys.argv[2] == '1',
    detector_backend=sys.argv[3],
    silent=True,
)
print(json.dumps(result, default=float))
"#;

/// enforce_detection有効時に顔なしでDeepFaceが出すメッセージ
const NO_FACE_MARKER: &str = "Face could not be detected";

#[derive(Debug, Clone)]
pub struct DeepFaceAnalyzer {
    program: String,
    base_args: Vec<String>,
    detector_backend: String,
    enforce_detection: bool,
    face_selection: FaceSelection,
    verbose: bool,
}

impl DeepFaceAnalyzer {
    pub fn from_config(config: &Config, verbose: bool) -> Result<Self> {
        let (program, base_args) = match &config.analyzer_command {
            Some(cmd) => {
                let (program, args) = cmd
                    .split_first()
                    .ok_or_else(|| ShotEmotionError::Config("analyzer_commandが空です".into()))?;
                (program.clone(), args.to_vec())
            }
            None => (
                config.python.clone(),
                vec!["-c".to_string(), DEEPFACE_SCRIPT.to_string()],
            ),
        };

        Ok(Self {
            program,
            base_args,
            detector_backend: config.detector_backend.clone(),
            enforce_detection: config.enforce_detection,
            face_selection: config.face_selection,
            verbose,
        })
    }

    fn build_command(&self, image: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .arg(image)
            .arg(if self.enforce_detection { "1" } else { "0" })
            .arg(&self.detector_backend);
        cmd
    }
}

impl EmotionAnalyzer for DeepFaceAnalyzer {
    fn analyze(&mut self, image: &Path) -> Result<Option<Detection>> {
        tracing::debug!(
            program = %self.program,
            image = %image.display(),
            backend = %self.detector_backend,
            "解析器を起動"
        );

        let output = self
            .build_command(image)
            .output()
            .map_err(|e| ShotEmotionError::Analyzer(format!("{} の起動に失敗: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if self.enforce_detection && stderr.contains(NO_FACE_MARKER) {
                return Ok(None);
            }
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(ShotEmotionError::Analyzer(format!(
                "解析器が失敗 (code {:?}): {}",
                output.status.code(),
                last_line.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);

        if self.verbose {
            let preview: String = stdout.chars().take(300).collect();
            tracing::debug!(response = %preview, "解析器レスポンス");
        }

        let faces = parse_analyzer_output(&stdout)
            .map_err(|e| ShotEmotionError::AnalyzerParse(e.to_string()))?;

        Ok(select_face(&faces, self.face_selection))
    }

    /// 検出設定に加えて解析コマンド自体のハッシュを含める
    fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.program.as_bytes());
        for arg in &self.base_args {
            hasher.update([0u8]);
            hasher.update(arg.as_bytes());
        }
        let command_hash = hex::encode(hasher.finalize());

        format!(
            "{}|{}|{}|{}",
            self.detector_backend,
            if self.enforce_detection { "enforce" } else { "lenient" },
            self.face_selection,
            &command_hash[..16]
        )
    }
}
