//! ショット単位の集約
//!
//! 同じショットの複数キーフレームを1行にまとめる（既定では行わない）。

use crate::types::{EmotionRow, ResultTable};

/// ショットごとに1行へまとめる
///
/// - ラベル: 最頻ラベル（同数なら平均confidenceが高い方、さらに同じなら初出）
/// - timestamp: そのショットで最も早い行
/// - confidence: 採用ラベルの平均
///
/// 出力順はショットの初出順。
pub fn merge_by_shot(table: &ResultTable) -> ResultTable {
    let mut shots: Vec<(u32, Vec<&EmotionRow>)> = Vec::new();
    for row in table.rows() {
        match shots.iter_mut().find(|(id, _)| *id == row.shot_id) {
            Some((_, rows)) => rows.push(row),
            None => shots.push((row.shot_id, vec![row])),
        }
    }

    let merged = shots
        .into_iter()
        .filter_map(|(shot_id, rows)| {
            // (ラベル, 件数, confidence合計)
            let mut tally: Vec<(&str, usize, f64)> = Vec::new();
            for row in &rows {
                match tally.iter_mut().find(|(label, _, _)| *label == row.emotion) {
                    Some((_, n, sum)) => {
                        *n += 1;
                        *sum += row.confidence;
                    }
                    None => tally.push((row.emotion.as_str(), 1, row.confidence)),
                }
            }

            let mut best: Option<(&str, usize, f64)> = None;
            for (label, n, sum) in tally {
                let mean = sum / n as f64;
                let better = match best {
                    None => true,
                    Some((_, bn, bmean)) => n > bn || (n == bn && mean > bmean),
                };
                if better {
                    best = Some((label, n, mean));
                }
            }
            let (label, _, mean) = best?;

            let timestamp = rows
                .iter()
                .map(|r| r.timestamp)
                .fold(f64::INFINITY, f64::min);

            Some(EmotionRow {
                shot_id,
                timestamp,
                emotion: label.to_string(),
                confidence: mean,
            })
        })
        .collect();

    ResultTable::from_rows(merged)
}
