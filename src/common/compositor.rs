//! 1 ピクセル分の合成（シェーダーの `fs_main` と同じ処理）
//!
//! 優先順位: 区切り線 > ラベル文字 > ラベル背景 > バー

use super::bars::{bar_height, bar_nits, layout};
use super::colors::encode_luminance;
use super::config::FrameParams;
use super::constants::{FONT_SCALE, GLYPH_SPACING, GLYPH_WIDTH, LABEL_CHAR_BUDGET, LABEL_PADDING, LABEL_X};
use super::font::{sample_value, CELL_HEIGHT};

/// ラベル背景の幅（ピクセル）
pub const LABEL_WIDTH: i32 = LABEL_CHAR_BUDGET * (GLYPH_WIDTH + GLYPH_SPACING) * FONT_SCALE + LABEL_PADDING;

const BLACK: [f32; 3] = [0.0, 0.0, 0.0];

/// 各ピクセルで成り立つ条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCoverage {
    pub bar_index: i32,
    pub bar_nits: f32,
    pub is_separator: bool,
    pub in_label: bool,
    pub is_text: bool,
}

/// バー内で縦中央に置いたラベルの上端 Y
pub fn label_top(bar_index: i32, bar_h: f32) -> i32 {
    (bar_index as f32 * bar_h + (bar_h - CELL_HEIGHT as f32) * 0.5) as i32
}

/// 座標 (x, y)（ピクセル中心）の判定を行う
pub fn coverage(params: &FrameParams, x: f32, y: f32) -> PixelCoverage {
    let bar = layout(y, params.viewport_h, params.num_bars);
    let nits = bar_nits(bar.index, params.num_bars, params.start_nits, params.end_nits);

    let bar_h = bar_height(params.viewport_h, params.num_bars);
    let origin = (LABEL_X, label_top(bar.index, bar_h));
    let screen = (x as i32, y as i32);

    PixelCoverage {
        bar_index: bar.index,
        bar_nits: nits,
        is_separator: bar.is_separator,
        in_label: screen.0 < LABEL_WIDTH,
        is_text: sample_value(nits, screen, origin),
    }
}

/// 最終色 (RGBA)。アルファは常に 1
pub fn shade(params: &FrameParams, x: f32, y: f32) -> [f32; 4] {
    let cov = coverage(params, x, y);
    let mode = params.mode();

    let bar_color = encode_luminance(cov.bar_nits, mode);
    let label_color = encode_luminance(params.label_nits, mode);

    let mut result = bar_color;
    if cov.in_label {
        result = BLACK;
    }
    if cov.is_text {
        result = label_color;
    }
    if cov.is_separator {
        result = BLACK;
    }

    [result[0], result[1], result[2], 1.0]
}

/// 整数ピクセル (px, py) の色。中心座標 (px + 0.5, py + 0.5) で評価する
#[inline]
pub fn shade_pixel(params: &FrameParams, px: u32, py: u32) -> [f32; 4] {
    shade(params, px as f32 + 0.5, py as f32 + 0.5)
}
