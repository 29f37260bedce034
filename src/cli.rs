use clap::{Parser, Subcommand};
use shot_emotion_common::{FaceSelection, UnknownLabelPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shot-emotion")]
#[command(about = "ショットのキーフレームから感情タイムラインを作成", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// キーフレームの感情を解析してCSV/Excelとチャートを出力
    Detect {
        /// キーフレームフォルダ
        #[arg(default_value = "outputs/shots")]
        folder: PathBuf,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long, default_value = "outputs/shot_emotions.csv")]
        output: PathBuf,

        /// 出力形式 (csv/excel/both)
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// チャートPNGの出力先（省略時は出力ファイルと同じ場所）
        #[arg(long)]
        charts_dir: Option<PathBuf>,

        /// チャートを生成しない
        #[arg(long)]
        no_charts: bool,

        /// キャッシュを使用（再解析をスキップ）
        #[arg(long)]
        use_cache: bool,

        /// 同じショットの行を1行にまとめる
        #[arg(long)]
        merge_shots: bool,

        /// フレーム番号→秒の換算fps
        #[arg(long)]
        fps: Option<f64>,

        /// 顔検出バックエンド (opencv/retinaface/mtcnn/...)
        #[arg(long)]
        detector_backend: Option<String>,

        /// 複数の顔の選び方 (first/largest/most-confident)
        #[arg(long)]
        face_selection: Option<FaceSelection>,

        /// 顔が見つからない画像を解析失敗として扱う
        #[arg(long)]
        enforce_detection: bool,

        /// チャート/Excelのタイトル
        #[arg(short, long, default_value = "shot_emotions")]
        title: String,
    },

    /// 保存済みCSVからチャートを再生成
    Charts {
        /// 入力CSVファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ディレクトリ（省略時はCSVと同じ場所）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 未知ラベルの扱い (separate/exclude)
        #[arg(long)]
        unknown_labels: Option<UnknownLabelPolicy>,
    },

    /// 動画のメタデータ表示・音声抽出・フレーム抽出
    Probe {
        /// 動画ファイル
        #[arg(default_value = "data/sample_trailer.mp4")]
        video: PathBuf,

        /// 出力ディレクトリ
        #[arg(short, long, default_value = "outputs")]
        output: PathBuf,

        /// 抽出するフレームの時刻（秒）
        #[arg(long, default_value = "0")]
        frame_at: f64,

        /// 音声を抽出しない
        #[arg(long)]
        no_audio: bool,

        /// 波形PNGを生成しない
        #[arg(long)]
        no_waveform: bool,
    },

    /// 設定を表示/編集
    Config {
        /// fpsを設定
        #[arg(long)]
        set_fps: Option<f64>,

        /// 顔検出バックエンドを設定
        #[arg(long)]
        set_detector_backend: Option<String>,

        /// Pythonインタプリタを設定
        #[arg(long)]
        set_python: Option<String>,

        /// 複数の顔の選び方を設定
        #[arg(long)]
        set_face_selection: Option<FaceSelection>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はoutputs/shots）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use csv, excel, or both", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Excel => write!(f, "excel"),
            ExportFormat::Both => write!(f, "both"),
        }
    }
}
