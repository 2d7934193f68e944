//! CPU 版バックエンド
//!
//! ピクセルプログラム (`common::compositor`) を Rayon で行ごとに並列実行する。
//! GPU の無い環境でのプレビュー・スナップショット・テストに使う。

use rayon::prelude::*;

use super::backend::PresentBackend;
use super::surface::{ColorSpace, SurfaceDescriptor, SurfaceFormat};
use crate::common::colors::quantize_unorm;
use crate::common::compositor::shade_pixel;
use crate::common::config::FrameParams;
use crate::common::constants::{WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::error::PatternError;

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// CPU 側のフレームバッファ
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub format: SurfaceFormat,
    pub color_space: ColorSpace,
    pub pixels: Vec<[f32; 4]>,
}

impl Framebuffer {
    pub fn new(desc: &SurfaceDescriptor) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            color_space: desc.color_space,
            pixels: vec![CLEAR_COLOR; desc.width as usize * desc.height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// 10bit フォーマットのときの RGB コード値
    pub fn code_values(&self, x: u32, y: u32) -> Option<[u32; 3]> {
        match self.format {
            SurfaceFormat::Rgb10a2Unorm => {
                let p = self.pixel(x, y);
                Some([
                    quantize_unorm(p[0], 10),
                    quantize_unorm(p[1], 10),
                    quantize_unorm(p[2], 10),
                ])
            }
            SurfaceFormat::Rgba16Float => None,
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(CLEAR_COLOR);
    }

    /// minifb 表示用 (0x00RRGGBB)。エンコード後の値をそのまま 8bit に落とす
    pub fn to_preview_u32(&self) -> Vec<u32> {
        self.pixels
            .iter()
            .map(|p| {
                let r = (p[0].clamp(0.0, 1.0) * 255.0).round() as u32;
                let g = (p[1].clamp(0.0, 1.0) * 255.0).round() as u32;
                let b = (p[2].clamp(0.0, 1.0) * 255.0).round() as u32;
                (r << 16) | (g << 8) | b
            })
            .collect()
    }
}

/// フォーマットに書き込める値に変換
fn store(format: SurfaceFormat, color: [f32; 4]) -> [f32; 4] {
    match format {
        SurfaceFormat::Rgb10a2Unorm => [
            quantize_unorm(color[0], 10) as f32 / 1023.0,
            quantize_unorm(color[1], 10) as f32 / 1023.0,
            quantize_unorm(color[2], 10) as f32 / 1023.0,
            quantize_unorm(color[3], 2) as f32 / 3.0,
        ],
        // half への丸めは行わず、リニア値をそのまま保持する
        SurfaceFormat::Rgba16Float => color,
    }
}

struct SoftwareSurface {
    descriptor: SurfaceDescriptor,
    back: Framebuffer,
    front: Option<Framebuffer>,
}

/// CPU 版バックエンド
pub struct SoftwareBackend {
    client_size: (u32, u32),
    advertised: Option<ColorSpace>,
    initialized: bool,
    surface: Option<SoftwareSurface>,
    view: bool,
    params: Option<FrameParams>,
    frames_presented: u64,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(WINDOW_WIDTH, WINDOW_HEIGHT)
    }
}

impl SoftwareBackend {
    /// HDR (PQ / BT.2020) ディスプレイにつながっている想定で作る
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            client_size: (width, height),
            advertised: Some(ColorSpace::RgbFullPqBt2020),
            initialized: false,
            surface: None,
            view: false,
            params: None,
            frames_presented: 0,
        }
    }

    pub fn with_output_color_space(mut self, advertised: Option<ColorSpace>) -> Self {
        self.advertised = advertised;
        self
    }

    /// ウィンドウ側のクライアント領域サイズを更新する（リサイズ通知は別途）
    pub fn set_client_size(&mut self, width: u32, height: u32) {
        self.client_size = (width, height);
    }

    /// 最後に表示したフレーム
    pub fn front_buffer(&self) -> Option<&Framebuffer> {
        self.surface.as_ref().and_then(|s| s.front.as_ref())
    }

    pub fn surface_descriptor(&self) -> Option<&SurfaceDescriptor> {
        self.surface.as_ref().map(|s| &s.descriptor)
    }

    /// 最後に書き込まれたパラメータブロック
    pub fn parameter_block(&self) -> Option<&FrameParams> {
        self.params.as_ref()
    }

    pub fn has_view(&self) -> bool {
        self.view
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn surface_error(desc: &SurfaceDescriptor, reason: &str) -> PatternError {
        PatternError::SurfaceCreation {
            format: desc.format,
            width: desc.width,
            height: desc.height,
            reason: reason.to_string(),
        }
    }
}

impl PresentBackend for SoftwareBackend {
    fn initialize(&mut self) -> Result<(), PatternError> {
        self.params = Some(FrameParams::default());
        self.initialized = true;
        log::info!("CPU レンダラー: {} スレッド", rayon::current_num_threads());
        Ok(())
    }

    fn client_size(&self) -> (u32, u32) {
        self.client_size
    }

    fn output_color_space(&self) -> Option<ColorSpace> {
        self.advertised
    }

    fn create_surface(&mut self, desc: &SurfaceDescriptor) -> Result<(), PatternError> {
        if !self.initialized {
            return Err(Self::surface_error(desc, "デバイスが準備されていません"));
        }
        self.view = false;
        self.surface = Some(SoftwareSurface {
            descriptor: *desc,
            back: Framebuffer::new(desc),
            front: None,
        });
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), PatternError> {
        let Some(surface) = self.surface.as_mut() else {
            return Err(PatternError::Present("サーフェスがありません".to_string()));
        };
        let descriptor = surface.descriptor.resized(width, height);
        surface.descriptor = descriptor;
        surface.back = Framebuffer::new(&descriptor);
        surface.front = None;
        Ok(())
    }

    fn create_view(&mut self) -> Result<(), PatternError> {
        if self.surface.is_none() {
            return Err(PatternError::Present("サーフェスがありません".to_string()));
        }
        self.view = true;
        Ok(())
    }

    fn release_view(&mut self) {
        self.view = false;
    }

    fn release_surface(&mut self) {
        self.view = false;
        self.surface = None;
    }

    fn draw(&mut self, params: &FrameParams) -> Result<(), PatternError> {
        if !self.view {
            return Err(PatternError::Present("ビューがありません".to_string()));
        }
        let Some(surface) = self.surface.as_mut() else {
            return Err(PatternError::Present("サーフェスがありません".to_string()));
        };
        self.params = Some(*params);

        let back = &mut surface.back;
        back.clear();

        let width = back.width as usize;
        let format = back.format;
        back.pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.iter_mut().enumerate() {
                    *px = store(format, shade_pixel(params, x as u32, y as u32));
                }
            });

        surface.front = Some(back.clone());
        self.frames_presented += 1;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.release_surface();
        self.params = None;
        self.initialized = false;
    }
}
