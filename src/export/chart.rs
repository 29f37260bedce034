//! チャートPNG描画
//!
//! - 感情の頻度（縦棒グラフ）
//! - 感情の推移（散布図、マーカー面積はconfidenceに比例）
//! - 音声波形
//!
//! 文字は描かない。ラベル付きのチャートはExcel出力側が持つ。

use super::raster::{Canvas, PlotArea, GRID};
use crate::error::Result;
use image::Rgb;
use shot_emotion_common::chart::TimelinePoint;
use shot_emotion_common::emotion::UNKNOWN_ORDINAL;
use shot_emotion_common::{frequency_counts, timeline_points, EmotionScale, ResultTable, UnknownLabelPolicy};
use std::path::{Path, PathBuf};

pub const FREQUENCY_FILE: &str = "emotion_frequency.png";
pub const TIMELINE_FILE: &str = "emotion_timeline.png";
pub const WAVEFORM_FILE_SUFFIX: &str = "_waveform.png";

const BAR_COLOR: Rgb<u8> = Rgb([135, 206, 235]);
const WAVE_COLOR: Rgb<u8> = Rgb([31, 119, 180]);
const MARKER_ALPHA: f64 = 0.7;
const DPI: f64 = 100.0;

/// 序数ごとの色（viridis相当、番兵はグレー）
fn ordinal_color(ordinal: u8) -> Rgb<u8> {
    match ordinal {
        1 => Rgb([68, 1, 84]),
        2 => Rgb([70, 50, 126]),
        3 => Rgb([54, 92, 141]),
        4 => Rgb([39, 127, 142]),
        5 => Rgb([31, 161, 135]),
        6 => Rgb([74, 193, 109]),
        7 => Rgb([160, 218, 57]),
        _ => Rgb([150, 150, 150]),
    }
}

/// 目盛り間隔（線が10本以下になる整数）
fn grid_step(max: usize) -> usize {
    max.div_ceil(10).max(1)
}

/// 頻度の縦棒グラフ
pub fn render_frequency_png(counts: &[(String, usize)], path: &Path) -> Result<()> {
    let mut canvas = Canvas::new(1200, 600);
    let area = PlotArea::with_margin(canvas.width(), canvas.height(), 60);

    let max_count = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let y_max = max_count.max(1) as f64;

    let step = grid_step(max_count);
    let mut tick = step;
    while tick <= max_count {
        let y = area.y(tick as f64, y_max).round() as i64;
        canvas.hline(y, area.left as i64, area.right as i64, GRID);
        tick += step;
    }

    if !counts.is_empty() {
        let slot = area.width() / counts.len() as f64;
        let bar_width = slot * 0.6;
        for (i, (_, count)) in counts.iter().enumerate() {
            let x0 = area.left as f64 + slot * i as f64 + (slot - bar_width) / 2.0;
            let y_top = area.y(*count as f64, y_max);
            canvas.fill_rect(
                x0.round() as i64,
                y_top.round() as i64,
                (x0 + bar_width).round() as i64,
                area.bottom as i64,
                BAR_COLOR,
            );
        }
    }

    canvas.axes(&area);
    canvas.save(path)
}

/// matplotlibの `s`（pt²）相当の面積からピクセル半径へ
fn marker_radius(marker_size: f64) -> f64 {
    let radius_pt = (marker_size.max(0.0) / std::f64::consts::PI).sqrt();
    (radius_pt * DPI / 72.0).max(1.5)
}

/// 感情推移の散布図
pub fn render_timeline_png(points: &[TimelinePoint], path: &Path) -> Result<()> {
    let mut canvas = Canvas::new(1500, 800);
    let area = PlotArea::with_margin(canvas.width(), canvas.height(), 80);

    let y_max = UNKNOWN_ORDINAL as f64 + 1.0;
    let t_max = points
        .iter()
        .map(|p| p.timestamp)
        .fold(0.0_f64, f64::max);
    let x_max = if t_max > 0.0 { t_max * 1.05 } else { 1.0 };

    for ordinal in 1..=UNKNOWN_ORDINAL {
        let y = area.y(ordinal as f64, y_max).round() as i64;
        canvas.hline(y, area.left as i64, area.right as i64, GRID);
    }

    for p in points {
        canvas.fill_circle(
            area.x(p.timestamp, x_max),
            area.y(p.ordinal as f64, y_max),
            marker_radius(p.marker_size),
            ordinal_color(p.ordinal),
            MARKER_ALPHA,
        );
    }

    canvas.axes(&area);
    canvas.save(path)
}

/// 波形（1列ごとの最小・最大を縦線で描く）
pub fn render_waveform_png(samples: &[i16], path: &Path) -> Result<()> {
    let mut canvas = Canvas::new(1400, 500);
    let area = PlotArea::with_margin(canvas.width(), canvas.height(), 50);
    let mid = (area.top as f64 + area.bottom as f64) / 2.0;
    let half = area.height() / 2.0;

    canvas.hline(mid.round() as i64, area.left as i64, area.right as i64, GRID);

    let columns = area.width() as usize;
    if !samples.is_empty() && columns > 0 {
        let per_column = samples.len().div_ceil(columns).max(1);
        for (i, chunk) in samples.chunks(per_column).enumerate() {
            let lo = chunk.iter().copied().min().unwrap_or(0) as f64 / i16::MAX as f64;
            let hi = chunk.iter().copied().max().unwrap_or(0) as f64 / i16::MAX as f64;
            let x = area.left as i64 + i as i64;
            let y_top = (mid - hi.clamp(-1.0, 1.0) * half).round() as i64;
            let y_bottom = (mid - lo.clamp(-1.0, 1.0) * half).round() as i64;
            canvas.vline(x, y_top, y_bottom + 1, WAVE_COLOR);
        }
    }

    canvas.axes(&area);
    canvas.save(path)
}

/// 頻度・推移の2枚を出力ディレクトリに書き出す
pub fn render_charts(
    table: &ResultTable,
    output_dir: &Path,
    policy: UnknownLabelPolicy,
) -> Result<Vec<PathBuf>> {
    let counts = frequency_counts(table);
    let points = timeline_points(table, &EmotionScale, policy);

    let frequency_path = output_dir.join(FREQUENCY_FILE);
    render_frequency_png(&counts, &frequency_path)?;

    let timeline_path = output_dir.join(TIMELINE_FILE);
    render_timeline_png(&points, &timeline_path)?;

    Ok(vec![frequency_path, timeline_path])
}
