//! テストパターンの設定とフレームごとのパラメータブロック

use bytemuck::{Pod, Zeroable};

use super::colors::OutputMode;
use super::constants::*;

/// 1 フレーム分のテストパターン設定
///
/// UI 側が作り、コアはフレームの間だけ読み取り専用で使う。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestPatternConfig {
    pub start_nits: f32,
    pub end_nits: f32,
    pub viewport_size: (f32, f32),
    pub num_bars: i32,
    pub output_mode: OutputMode,
    /// ラベル文字の輝度
    pub label_nits: f32,
}

impl Default for TestPatternConfig {
    fn default() -> Self {
        Self {
            start_nits: DEFAULT_START_NITS,
            end_nits: DEFAULT_END_NITS,
            viewport_size: (WINDOW_WIDTH as f32, WINDOW_HEIGHT as f32),
            num_bars: DEFAULT_NUM_BARS,
            output_mode: OutputMode::PqHdr10,
            label_nits: DEFAULT_LABEL_NITS,
        }
    }
}

impl TestPatternConfig {
    /// 入力範囲に収める（UI 側で行う処理。コア自身はクランプしない）
    pub fn clamped(self) -> Self {
        let nits = |v: f32| {
            if v.is_nan() {
                MIN_NITS
            } else {
                v.clamp(MIN_NITS, MAX_NITS)
            }
        };
        Self {
            start_nits: nits(self.start_nits),
            end_nits: nits(self.end_nits),
            viewport_size: (self.viewport_size.0.max(1.0), self.viewport_size.1.max(1.0)),
            num_bars: self.num_bars.clamp(MIN_BARS, MAX_BARS),
            output_mode: self.output_mode,
            label_nits: nits(self.label_nits),
        }
    }

    pub fn with_viewport(self, width: u32, height: u32) -> Self {
        Self {
            viewport_size: (width as f32, height as f32),
            ..self
        }
    }

    pub fn with_mode(self, output_mode: OutputMode) -> Self {
        Self {
            output_mode,
            ..self
        }
    }

    /// シェーダーに渡すブロックに変換
    pub fn to_params(&self) -> FrameParams {
        FrameParams {
            start_nits: self.start_nits,
            end_nits: self.end_nits,
            viewport_w: self.viewport_size.0,
            viewport_h: self.viewport_size.1,
            num_bars: self.num_bars,
            output_mode: self.output_mode.as_i32(),
            label_nits: self.label_nits,
            _padding: 0.0,
        }
    }
}

/// GPU に渡すパラメータ構造体（フィールド順と型はシェーダー側と一致させる）
///
/// 32 バイト。uniform バッファの 16 バイト境界に合わせてある。
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct FrameParams {
    pub start_nits: f32,
    pub end_nits: f32,
    pub viewport_w: f32,
    pub viewport_h: f32,
    pub num_bars: i32,
    pub output_mode: i32,
    pub label_nits: f32,
    pub _padding: f32,
}

impl FrameParams {
    pub fn mode(&self) -> OutputMode {
        OutputMode::from_i32(self.output_mode)
    }
}
