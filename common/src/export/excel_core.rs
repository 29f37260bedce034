//! Excel生成（共通ライブラリ）
//!
//! 結果テーブルのシートと、頻度・タイムラインのネイティブチャートを生成

use crate::chart::{frequency_counts, timeline_points, TimelinePoint};
use crate::emotion::{EmotionScale, UnknownLabelPolicy};
use crate::table_csv::CSV_HEADER;
use crate::types::ResultTable;
use rust_xlsxwriter::*;

pub const DATA_SHEET: &str = "emotions";
pub const FREQUENCY_SHEET: &str = "frequency";
pub const TIMELINE_SHEET: &str = "timeline";

/// Excelをバッファに生成
///
/// # Arguments
/// * `table` - 結果テーブル
/// * `title` - チャートタイトルの接頭辞
/// * `policy` - タイムラインでの未知ラベルの扱い
pub fn generate_excel_buffer(
    table: &ResultTable,
    title: &str,
    policy: UnknownLabelPolicy,
) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA));

    // 結果シート
    {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(DATA_SHEET)
            .map_err(|e| format!("シート名設定エラー: {}", e))?;

        for (col, name) in CSV_HEADER.split(',').enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, name, &header_format)
                .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
        }

        for (i, row) in table.rows().iter().enumerate() {
            let r = i as u32 + 1;
            worksheet
                .write_number(r, 0, row.shot_id as f64)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
            worksheet
                .write_number(r, 1, row.timestamp)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
            worksheet
                .write_string(r, 2, &row.emotion)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
            worksheet
                .write_number(r, 3, row.confidence)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
        }
    }

    // 頻度シート + 縦棒グラフ
    {
        let counts = frequency_counts(table);
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(FREQUENCY_SHEET)
            .map_err(|e| format!("シート名設定エラー: {}", e))?;
        worksheet
            .write_string_with_format(0, 0, "emotion", &header_format)
            .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
        worksheet
            .write_string_with_format(0, 1, "count", &header_format)
            .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;

        for (i, (label, count)) in counts.iter().enumerate() {
            let r = i as u32 + 1;
            worksheet
                .write_string(r, 0, label)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
            worksheet
                .write_number(r, 1, *count as f64)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
        }

        // 系列が空のチャートは保存できないのでデータがある時だけ
        if !counts.is_empty() {
            let last = counts.len() as u32;
            let mut chart = Chart::new(ChartType::Column);
            chart
                .add_series()
                .set_name("count")
                .set_categories((FREQUENCY_SHEET, 1, 0, last, 0))
                .set_values((FREQUENCY_SHEET, 1, 1, last, 1));
            chart.title().set_name(&format!("{} - Distribution of Emotions", title));
            chart.x_axis().set_name("Emotion");
            chart.y_axis().set_name("Count");
            chart.legend().set_hidden();

            worksheet
                .insert_chart(1, 3, &chart)
                .map_err(|e| format!("チャート挿入エラー: {}", e))?;
        }
    }

    // タイムラインシート + 散布図（序数ごとに1系列）
    {
        let scale = EmotionScale;
        let points = timeline_points(table, &scale, policy);
        let groups = group_by_ordinal(&points);

        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(TIMELINE_SHEET)
            .map_err(|e| format!("シート名設定エラー: {}", e))?;
        for (col, name) in ["timestamp", "ordinal", "emotion", "confidence"].iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *name, &header_format)
                .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
        }

        let mut chart = Chart::new(ChartType::Scatter);
        let mut r: u32 = 1;
        for (label, group) in &groups {
            let first = r;
            for p in group {
                worksheet
                    .write_number(r, 0, p.timestamp)
                    .map_err(|e| format!("値書き込みエラー: {}", e))?;
                worksheet
                    .write_number(r, 1, p.ordinal as f64)
                    .map_err(|e| format!("値書き込みエラー: {}", e))?;
                worksheet
                    .write_string(r, 2, &p.label)
                    .map_err(|e| format!("値書き込みエラー: {}", e))?;
                worksheet
                    .write_number(r, 3, p.confidence)
                    .map_err(|e| format!("値書き込みエラー: {}", e))?;
                r += 1;
            }
            let last = r - 1;

            // Excelのマーカーサイズは系列単位なので平均confidenceから決める
            let mean_conf = group.iter().map(|p| p.confidence).sum::<f64>() / group.len() as f64;
            let marker_size = (2.0 + mean_conf / 10.0).round().clamp(2.0, 72.0) as u8;

            chart
                .add_series()
                .set_name(label.as_str())
                .set_categories((TIMELINE_SHEET, first, 0, last, 0))
                .set_values((TIMELINE_SHEET, first, 1, last, 1))
                .set_marker(
                    &ChartMarker::new()
                        .set_type(ChartMarkerType::Circle)
                        .set_size(marker_size),
                );
        }

        if !groups.is_empty() {
            chart.title().set_name(&format!("{} - Emotion Progression", title));
            chart.x_axis().set_name("Time (seconds)");
            chart.y_axis()
                .set_name("Detected Emotion")
                .set_min(0.0)
                .set_max(scale.max_ordinal() as f64 + 1.0);

            worksheet
                .insert_chart(1, 5, &chart)
                .map_err(|e| format!("チャート挿入エラー: {}", e))?;
        }
    }

    workbook.save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}

/// 序数の昇順で点をまとめる（各グループ内はタイムスタンプ昇順のまま）
fn group_by_ordinal(points: &[TimelinePoint]) -> Vec<(String, Vec<&TimelinePoint>)> {
    let mut groups: Vec<(u8, String, Vec<&TimelinePoint>)> = Vec::new();
    for p in points {
        match groups.iter_mut().find(|(o, _, _)| *o == p.ordinal) {
            Some((_, _, g)) => g.push(p),
            None => groups.push((p.ordinal, p.label.clone(), vec![p])),
        }
    }
    groups.sort_by_key(|(o, _, _)| *o);
    groups.into_iter().map(|(_, label, g)| (label, g)).collect()
}
