//! チャート用データ
//!
//! 描画方式（PNG/Excel）に依存しない集計だけを行う。

use crate::emotion::{EmotionScale, Ordinal, UnknownLabelPolicy, UNKNOWN_LABEL};
use crate::types::ResultTable;

/// タイムライン上のマーカーサイズ倍率（confidence * 3）
pub const MARKER_SCALE: f64 = 3.0;

/// ラベルごとの件数（件数の降順、同数は初出順）
pub fn frequency_counts(table: &ResultTable) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for row in table.rows() {
        match counts.iter_mut().find(|(label, _)| *label == row.emotion) {
            Some((_, n)) => *n += 1,
            None => counts.push((row.emotion.clone(), 1)),
        }
    }

    // stable sortなので同数は初出順のまま
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// 散布図の1点
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePoint {
    pub shot_id: u32,
    pub timestamp: f64,
    pub ordinal: u8,
    /// 軸に表示するラベル（未知ラベルは `other`）
    pub label: String,
    pub confidence: f64,
    pub marker_size: f64,
}

/// タイムスタンプ昇順の散布図データ
pub fn timeline_points(
    table: &ResultTable,
    scale: &EmotionScale,
    policy: UnknownLabelPolicy,
) -> Vec<TimelinePoint> {
    let mut points: Vec<TimelinePoint> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let ordinal = scale.ordinal(&row.emotion);
            let label = match (ordinal, policy) {
                (Ordinal::Unknown, UnknownLabelPolicy::Exclude) => return None,
                (Ordinal::Unknown, UnknownLabelPolicy::Separate) => UNKNOWN_LABEL.to_string(),
                (Ordinal::Known(_), _) => row.emotion.trim().to_lowercase(),
            };
            Some(TimelinePoint {
                shot_id: row.shot_id,
                timestamp: row.timestamp,
                ordinal: ordinal.value(),
                label,
                confidence: row.confidence,
                marker_size: row.confidence * MARKER_SCALE,
            })
        })
        .collect();

    points.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::UNKNOWN_ORDINAL;
    use crate::types::EmotionRow;

    fn table(rows: &[(u32, f64, &str, f64)]) -> ResultTable {
        ResultTable::from_rows(
            rows.iter()
                .map(|(s, t, e, c)| EmotionRow {
                    shot_id: *s,
                    timestamp: *t,
                    emotion: e.to_string(),
                    confidence: *c,
                })
                .collect(),
        )
    }

    #[test]
    fn test_frequency_sorted_desc_ties_first_seen() {
        let t = table(&[
            (1, 0.0, "sad", 1.0),
            (2, 1.0, "happy", 1.0),
            (3, 2.0, "happy", 1.0),
            (4, 3.0, "fear", 1.0),
            (5, 4.0, "sad", 1.0),
            (6, 5.0, "happy", 1.0),
        ]);
        assert_eq!(
            frequency_counts(&t),
            vec![
                ("happy".to_string(), 3),
                ("sad".to_string(), 2),
                ("fear".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_empty_table_gives_empty_series() {
        let t = ResultTable::default();
        assert!(frequency_counts(&t).is_empty());
        assert!(timeline_points(&t, &EmotionScale, UnknownLabelPolicy::Separate).is_empty());
    }

    #[test]
    fn test_timeline_sorted_and_sized() {
        let t = table(&[(2, 5.0, "happy", 80.0), (1, 1.0, "angry", 10.0)]);
        let points = timeline_points(&t, &EmotionScale, UnknownLabelPolicy::Separate);
        assert_eq!(points[0].timestamp, 1.0);
        assert_eq!(points[0].ordinal, 1);
        assert_eq!(points[1].ordinal, 4);
        assert_eq!(points[1].marker_size, 240.0);
    }

    #[test]
    fn test_unknown_labels_by_policy() {
        let t = table(&[(1, 1.0, "contempt", 50.0), (2, 2.0, "angry", 50.0)]);

        let separate = timeline_points(&t, &EmotionScale, UnknownLabelPolicy::Separate);
        assert_eq!(separate.len(), 2);
        assert_eq!(separate[0].ordinal, UNKNOWN_ORDINAL);
        assert_eq!(separate[0].label, "other");
        assert_ne!(separate[0].ordinal, separate[1].ordinal);

        let excluded = timeline_points(&t, &EmotionScale, UnknownLabelPolicy::Exclude);
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].label, "angry");
    }
}
