//! 結果テーブルのCSV表現
//!
//! 列は `shot_id,timestamp,emotion,confidence`、カンマ区切り、ヘッダー行あり。
//! 同じテーブルからは常にバイト単位で同じ文字列を生成する。

use crate::error::{Error, Result};
use crate::types::{EmotionRow, ResultTable};

pub const CSV_HEADER: &str = "shot_id,timestamp,emotion,confidence";

/// 浮動小数点を出力用に整形
///
/// 最短の往復可能表現を使い、整数値だけは `1.0` のように小数1桁を残す。
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// カンマ・引用符・改行を含む値だけを引用符で囲む
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// テーブルをCSV文字列に変換
pub fn to_csv_string(table: &ResultTable) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + table.len() * 32);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for row in table.rows() {
        out.push_str(&format!(
            "{},{},{},{}\n",
            row.shot_id,
            format_float(row.timestamp),
            csv_escape(&row.emotion),
            format_float(row.confidence),
        ));
    }

    out
}

/// CSV文字列をテーブルに戻す
///
/// ヘッダーで列位置を決めるので列順は問わない。感情が空の行は読み飛ばす。
pub fn parse_csv(text: &str) -> Result<ResultTable> {
    let mut lines = text.lines();

    let header_line = lines
        .next()
        .ok_or_else(|| Error::Parse("CSVが空です".into()))?;
    let headers: Vec<String> = parse_csv_line(header_line.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::Parse(format!("列が見つかりません: {}", name)))
    };
    let shot_col = column("shot_id")?;
    let time_col = column("timestamp")?;
    let emotion_col = column("emotion")?;
    let confidence_col = column("confidence")?;

    let mut rows = Vec::new();

    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 2;
        let values = parse_csv_line(line);
        let get = |col: usize| values.get(col).map(|s| s.trim()).unwrap_or("");

        let emotion = get(emotion_col);
        if emotion.is_empty() {
            continue;
        }

        let shot_id = parse_number::<u32>(get(shot_col), "shot_id", line_no)?;
        let timestamp = parse_number::<f64>(get(time_col), "timestamp", line_no)?;
        let confidence = parse_number::<f64>(get(confidence_col), "confidence", line_no)?;

        rows.push(EmotionRow {
            shot_id,
            timestamp,
            emotion: emotion.to_string(),
            confidence,
        });
    }

    Ok(ResultTable::from_rows(rows))
}

fn parse_number<T: std::str::FromStr>(value: &str, column: &str, line_no: usize) -> Result<T> {
    value.parse::<T>().map_err(|_| {
        Error::Parse(format!("{}行目: {}が数値ではありません: {:?}", line_no, column, value))
    })
}

/// 1行を引用符を考慮して分割
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            result.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    result.push(current);
    result
}
