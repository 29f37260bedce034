//! 動画メタデータ・音声・フレームの取り出し
//!
//! ffprobe/ffmpeg を子プロセスとして呼び出す。各呼び出しは終了まで待つので
//! コマンド終了後に開いたままのリソースは残らない。

use crate::error::{Result, ShotEmotionError};
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 波形描画用にデコードするサンプルレート
pub const WAVEFORM_SAMPLE_RATE: u32 = 22_050;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub duration_secs: f64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
    pub audio_sample_rate: Option<u32>,
    pub audio_channels: Option<u32>,
}

/// "30000/1001" や "29.97" をfpsに変換
pub fn parse_frame_rate(value: &str) -> Option<f64> {
    let value = value.trim();
    let fps = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn as_u32(v: &Value) -> Option<u32> {
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// `ffprobe -print_format json -show_format -show_streams` の出力を解釈
pub fn parse_ffprobe_json(json: &Value) -> Result<VideoMetadata> {
    let streams = json["streams"]
        .as_array()
        .ok_or_else(|| ShotEmotionError::Probe("ストリーム情報がありません".into()))?;

    let video = streams
        .iter()
        .find(|s| s["codec_type"].as_str() == Some("video"))
        .ok_or_else(|| ShotEmotionError::Probe("映像ストリームがありません".into()))?;
    let audio = streams
        .iter()
        .find(|s| s["codec_type"].as_str() == Some("audio"));

    // r_frame_rate が 0/0 の場合は avg_frame_rate を使う
    let fps = ["r_frame_rate", "avg_frame_rate"]
        .iter()
        .find_map(|key| video[*key].as_str().and_then(parse_frame_rate))
        .ok_or_else(|| ShotEmotionError::Probe("フレームレートを取得できません".into()))?;

    let duration_secs = as_f64(&json["format"]["duration"])
        .or_else(|| as_f64(&video["duration"]))
        .unwrap_or(0.0);

    Ok(VideoMetadata {
        duration_secs,
        fps,
        width: as_u32(&video["width"]).unwrap_or(0),
        height: as_u32(&video["height"]).unwrap_or(0),
        has_audio: audio.is_some(),
        audio_sample_rate: audio.and_then(|a| as_u32(&a["sample_rate"])),
        audio_channels: audio.and_then(|a| as_u32(&a["channels"])),
    })
}

/// 検索パスから実行可能ファイルを探す（実行権限のないファイルは対象外）
fn find_executable(name: &str, search_path: &OsStr, cwd: &Path) -> Result<PathBuf> {
    which::which_in(name, Some(search_path), cwd)
        .map_err(|_| ShotEmotionError::ToolNotFound(name.to_string()))
}

#[derive(Debug, Clone)]
pub struct MediaTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl MediaTools {
    /// `PATH` から ffmpeg / ffprobe を探す
    pub fn locate() -> Result<Self> {
        let search_path = std::env::var_os("PATH").unwrap_or_default();
        let cwd = std::env::current_dir()?;
        Self::locate_in(&search_path, &cwd)
    }

    pub fn locate_in(search_path: &OsStr, cwd: &Path) -> Result<Self> {
        Ok(Self {
            ffmpeg: find_executable("ffmpeg", search_path, cwd)?,
            ffprobe: find_executable("ffprobe", search_path, cwd)?,
        })
    }

    fn run(&self, cmd: &mut Command, what: &str) -> Result<Vec<u8>> {
        tracing::debug!(command = ?cmd, "{}", what);
        let output = cmd
            .output()
            .map_err(|e| ShotEmotionError::Probe(format!("{}の起動に失敗: {}", what, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(ShotEmotionError::Probe(format!(
                "{}に失敗 (code {:?}): {}",
                what,
                output.status.code(),
                last_line.trim()
            )));
        }

        Ok(output.stdout)
    }

    /// 動画のメタデータ
    pub fn probe(&self, video: &Path) -> Result<VideoMetadata> {
        ensure_file(video)?;
        let stdout = self.run(
            Command::new(&self.ffprobe)
                .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
                .arg(video),
            "ffprobe",
        )?;
        let json: Value = serde_json::from_slice(&stdout)?;
        parse_ffprobe_json(&json)
    }

    /// 指定時刻のフレームをJPEGで保存
    pub fn extract_frame(&self, video: &Path, at_secs: f64, output: &Path) -> Result<()> {
        ensure_file(video)?;
        ensure_parent(output)?;
        let seek = format!("{:.3}", at_secs.max(0.0));
        self.run(
            Command::new(&self.ffmpeg)
                .args(["-v", "error", "-y", "-ss", seek.as_str(), "-i"])
                .arg(video)
                .args(["-frames:v", "1", "-q:v", "2"])
                .arg(output),
            "フレーム抽出",
        )?;

        if !output.is_file() {
            return Err(ShotEmotionError::Probe(format!(
                "{:.2}秒のフレームを取得できませんでした",
                at_secs
            )));
        }
        Ok(())
    }

    /// 音声トラックを16bit PCMのWAVで保存
    pub fn extract_audio(&self, video: &Path, output: &Path) -> Result<()> {
        ensure_file(video)?;
        ensure_parent(output)?;
        self.run(
            Command::new(&self.ffmpeg)
                .args(["-v", "error", "-y", "-i"])
                .arg(video)
                .args(["-vn", "-acodec", "pcm_s16le"])
                .arg(output),
            "音声抽出",
        )?;
        Ok(())
    }

    /// 音声をモノラル16bitにデコードしてサンプル列を返す
    pub fn decode_mono_pcm(&self, audio: &Path) -> Result<Vec<i16>> {
        ensure_file(audio)?;
        let stdout = self.run(
            Command::new(&self.ffmpeg)
                .args(["-v", "error", "-i"])
                .arg(audio)
                .args(["-f", "s16le", "-acodec", "pcm_s16le", "-ac", "1", "-ar"])
                .arg(WAVEFORM_SAMPLE_RATE.to_string())
                .arg("-"),
            "音声デコード",
        )?;
        Ok(pcm_s16le_to_samples(&stdout))
    }
}

/// リトルエンディアン16bitのバイト列をサンプルに変換（端数バイトは捨てる）
pub fn pcm_s16le_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

fn ensure_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ShotEmotionError::FileNotFound(path.display().to_string()))
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("24"), Some(24.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_parse_ffprobe_json() {
        let json = json!({
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "24000/1001"},
                {"codec_type": "audio", "sample_rate": "48000", "channels": 2}
            ],
            "format": {"duration": "147.313000"}
        });
        let meta = parse_ffprobe_json(&json).unwrap();
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert!((meta.fps - 23.976).abs() < 0.001);
        assert!((meta.duration_secs - 147.313).abs() < 1e-9);
        assert!(meta.has_audio);
        assert_eq!(meta.audio_sample_rate, Some(48000));
        assert_eq!(meta.audio_channels, Some(2));
    }

    #[test]
    fn test_parse_ffprobe_json_avg_rate_fallback_and_no_audio() {
        let json = json!({
            "streams": [
                {"codec_type": "video", "width": 640, "height": 360,
                 "r_frame_rate": "0/0", "avg_frame_rate": "25/1", "duration": "10.0"}
            ],
            "format": {}
        });
        let meta = parse_ffprobe_json(&json).unwrap();
        assert_eq!(meta.fps, 25.0);
        assert_eq!(meta.duration_secs, 10.0);
        assert!(!meta.has_audio);
        assert_eq!(meta.audio_sample_rate, None);
    }

    #[test]
    fn test_parse_ffprobe_json_without_video() {
        let json = json!({"streams": [{"codec_type": "audio"}], "format": {}});
        assert!(matches!(parse_ffprobe_json(&json), Err(ShotEmotionError::Probe(_))));
    }

    #[test]
    fn test_pcm_conversion() {
        let bytes = [0x01, 0x00, 0xff, 0x7f, 0x00, 0x80, 0x05];
        assert_eq!(pcm_s16le_to_samples(&bytes), vec![1, i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_missing_video_is_file_not_found() {
        let tools = MediaTools {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        };
        let result = tools.probe(Path::new("/nonexistent/sample_trailer.mp4"));
        assert!(matches!(result, Err(ShotEmotionError::FileNotFound(_))));
    }

    #[test]
    fn test_find_executable_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_executable("definitely-not-a-real-tool-xyz", dir.path().as_os_str(), dir.path()),
            Err(ShotEmotionError::ToolNotFound(_))
        ));
    }

    #[cfg(unix)]
    fn write_tool(dir: &Path, name: &str, mode: u32) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    /// 実行権限のない同名ファイルは見つからない扱い
    #[cfg(unix)]
    #[test]
    fn test_locate_rejects_non_executable_tools() {
        let dir = tempfile::tempdir().unwrap();
        write_tool(dir.path(), "ffmpeg", 0o644);
        write_tool(dir.path(), "ffprobe", 0o644);

        let result = MediaTools::locate_in(dir.path().as_os_str(), dir.path());
        assert!(matches!(result, Err(ShotEmotionError::ToolNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_finds_executable_tools() {
        let dir = tempfile::tempdir().unwrap();
        write_tool(dir.path(), "ffmpeg", 0o755);
        write_tool(dir.path(), "ffprobe", 0o755);

        let tools = MediaTools::locate_in(dir.path().as_os_str(), dir.path()).unwrap();
        assert_eq!(tools.ffmpeg.file_name().unwrap(), "ffmpeg");
        assert_eq!(tools.ffprobe.file_name().unwrap(), "ffprobe");
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_requires_both_tools() {
        let dir = tempfile::tempdir().unwrap();
        write_tool(dir.path(), "ffmpeg", 0o755);

        match MediaTools::locate_in(dir.path().as_os_str(), dir.path()) {
            Err(ShotEmotionError::ToolNotFound(name)) => assert_eq!(name, "ffprobe"),
            other => panic!("ToolNotFoundのはず: {:?}", other),
        }
    }
}
