use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShotEmotionError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("感情解析エラー: {0}")]
    Analyzer(String),

    #[error("解析器レスポンスのパースに失敗: {0}")]
    AnalyzerParse(String),

    #[error("CSVエラー: {0}")]
    Csv(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("チャート描画エラー: {0}")]
    ChartRender(String),

    #[error("動画解析エラー: {0}")]
    Probe(String),

    #[error("外部コマンドが見つかりません: {0}")]
    ToolNotFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] shot_emotion_common::Error),
}

pub type Result<T> = std::result::Result<T, ShotEmotionError>;
