//! PNG描画用の最小限のキャンバス

use crate::error::{Result, ShotEmotionError};
use image::{Rgb, RgbImage};
use std::path::Path;

pub(crate) const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub(crate) const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
pub(crate) const GRID: Rgb<u8> = Rgb([225, 225, 225]);

/// 描画領域（ピクセル座標、右下は含まない）
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlotArea {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PlotArea {
    pub fn with_margin(width: u32, height: u32, margin: u32) -> Self {
        Self {
            left: margin,
            top: margin / 2,
            right: width.saturating_sub(margin / 2),
            bottom: height.saturating_sub(margin),
        }
    }

    pub fn width(&self) -> f64 {
        (self.right - self.left) as f64
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top) as f64
    }

    /// データ値 → x座標
    pub fn x(&self, value: f64, max: f64) -> f64 {
        self.left as f64 + value / max * self.width()
    }

    /// データ値 → y座標（上が大きい値）
    pub fn y(&self, value: f64, max: f64) -> f64 {
        self.bottom as f64 - value / max * self.height()
    }
}

pub(crate) struct Canvas {
    img: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbImage::from_pixel(width, height, WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgb<u8>, alpha: f64) {
        if x < 0 || y < 0 || x >= self.img.width() as i64 || y >= self.img.height() as i64 {
            return;
        }
        let px = self.img.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            let v = px.0[c] as f64 * (1.0 - alpha) + color.0[c] as f64 * alpha;
            px.0[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }

    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        for y in y0.min(y1)..y0.max(y1) {
            for x in x0.min(x1)..x0.max(x1) {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    pub fn hline(&mut self, y: i64, x0: i64, x1: i64, color: Rgb<u8>) {
        self.fill_rect(x0, y, x1, y + 1, color);
    }

    pub fn vline(&mut self, x: i64, y0: i64, y1: i64, color: Rgb<u8>) {
        self.fill_rect(x, y0, x + 1, y1, color);
    }

    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb<u8>, alpha: f64) {
        let r = radius.max(0.5);
        let (x0, x1) = ((cx - r).floor() as i64, (cx + r).ceil() as i64);
        let (y0, y1) = ((cy - r).floor() as i64, (cy + r).ceil() as i64);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.blend(x, y, color, alpha);
                }
            }
        }
    }

    /// 枠線（左と下の軸）
    pub fn axes(&mut self, area: &PlotArea) {
        self.vline(area.left as i64, area.top as i64, area.bottom as i64 + 1, AXIS);
        self.hline(area.bottom as i64, area.left as i64, area.right as i64, AXIS);
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.img
            .save(path)
            .map_err(|e| ShotEmotionError::ChartRender(format!("{}: {}", path.display(), e)))
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.img.get_pixel(x, y)
    }
}
