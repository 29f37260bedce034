//! Shot Emotion Common Library
//!
//! CLIから利用されるデータモデルと副作用のない処理:
//! ファイル名解析、解析器レスポンスの解釈、CSV、チャート用データ

pub mod types;
pub mod error;
pub mod filename;
pub mod emotion;
pub mod response;
pub mod table_csv;
pub mod chart;
pub mod merge;
pub mod export;

pub use types::{Detection, EmotionObservation, EmotionRow, KeyframeRecord, ResultTable};
pub use error::{Error, Result};
pub use filename::{parse_keyframe_name, DEFAULT_FPS, KEYFRAME_GLOB};
pub use emotion::{EmotionScale, Ordinal, UnknownLabelPolicy};
pub use response::{extract_json, parse_analyzer_output, select_face, FaceResult, FaceSelection, Region};
pub use table_csv::{parse_csv, to_csv_string, CSV_HEADER};
pub use chart::{frequency_counts, timeline_points, TimelinePoint};
pub use merge::merge_by_shot;
