//! サーフェスのフォーマットと色空間の組み合わせ

use crate::common::colors::OutputMode;

/// バックバッファのフォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceFormat {
    /// 10bit 固定小数点 (HDR10)
    Rgb10a2Unorm,
    /// 16bit 浮動小数点 (scRGB)
    Rgba16Float,
}

impl SurfaceFormat {
    pub fn for_mode(mode: OutputMode) -> Self {
        match mode {
            OutputMode::PqHdr10 => SurfaceFormat::Rgb10a2Unorm,
            OutputMode::ScrgbLinear => SurfaceFormat::Rgba16Float,
        }
    }

    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            SurfaceFormat::Rgb10a2Unorm => wgpu::TextureFormat::Rgb10a2Unorm,
            SurfaceFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        }
    }

    /// 浮動小数点フォーマットは `Rgba16Float`、それ以外は 10bit 扱い
    pub fn from_wgpu(format: wgpu::TextureFormat) -> Self {
        match format {
            wgpu::TextureFormat::Rgba16Float => SurfaceFormat::Rgba16Float,
            _ => SurfaceFormat::Rgb10a2Unorm,
        }
    }
}

impl std::fmt::Display for SurfaceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceFormat::Rgb10a2Unorm => write!(f, "R10G10B10A2_UNORM"),
            SurfaceFormat::Rgba16Float => write!(f, "R16G16B16A16_FLOAT"),
        }
    }
}

/// 出力色空間（すべてフルレンジ RGB）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// PQ (ST.2084) / BT.2020
    RgbFullPqBt2020,
    /// リニア (1.0 = 80 nits) / BT.709
    RgbFullLinearBt709,
    /// ガンマ 2.2 / BT.709 (SDR)
    RgbFullGamma22Bt709,
}

impl ColorSpace {
    pub fn for_mode(mode: OutputMode) -> Self {
        match mode {
            OutputMode::PqHdr10 => ColorSpace::RgbFullPqBt2020,
            OutputMode::ScrgbLinear => ColorSpace::RgbFullLinearBt709,
        }
    }

    pub fn transfer(self) -> &'static str {
        match self {
            ColorSpace::RgbFullPqBt2020 => "PQ (ST.2084)",
            ColorSpace::RgbFullLinearBt709 => "linear",
            ColorSpace::RgbFullGamma22Bt709 => "gamma 2.2",
        }
    }

    pub fn primaries(self) -> &'static str {
        match self {
            ColorSpace::RgbFullPqBt2020 => "BT.2020",
            ColorSpace::RgbFullLinearBt709 | ColorSpace::RgbFullGamma22Bt709 => "BT.709",
        }
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RGB full / {} / {}", self.transfer(), self.primaries())
    }
}

/// 作成するサーフェスの記述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    pub mode: OutputMode,
    pub format: SurfaceFormat,
    pub color_space: ColorSpace,
    pub width: u32,
    pub height: u32,
}

impl SurfaceDescriptor {
    /// モードからフォーマットと色空間を選ぶ。サイズは 1x1 以上に切り上げる
    pub fn for_mode(mode: OutputMode, width: u32, height: u32) -> Self {
        Self {
            mode,
            format: SurfaceFormat::for_mode(mode),
            color_space: ColorSpace::for_mode(mode),
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// 同じフォーマットのままサイズだけ変える
    pub fn resized(self, width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hdr10_pairs_ten_bit_with_pq_bt2020() {
        let desc = SurfaceDescriptor::for_mode(OutputMode::PqHdr10, 1280, 800);
        assert_eq!(desc.format, SurfaceFormat::Rgb10a2Unorm);
        assert_eq!(desc.color_space, ColorSpace::RgbFullPqBt2020);
        assert_eq!(desc.format.to_wgpu(), wgpu::TextureFormat::Rgb10a2Unorm);
    }

    #[test]
    fn scrgb_pairs_half_float_with_linear_bt709() {
        let desc = SurfaceDescriptor::for_mode(OutputMode::ScrgbLinear, 1280, 800);
        assert_eq!(desc.format, SurfaceFormat::Rgba16Float);
        assert_eq!(desc.color_space, ColorSpace::RgbFullLinearBt709);
        assert_eq!(desc.format.to_wgpu(), wgpu::TextureFormat::Rgba16Float);
    }

    #[test]
    fn zero_size_is_clamped() {
        let desc = SurfaceDescriptor::for_mode(OutputMode::PqHdr10, 0, 0);
        assert_eq!((desc.width, desc.height), (1, 1));
        let resized = desc.resized(0, 720);
        assert_eq!((resized.width, resized.height), (1, 720));
        assert_eq!(resized.format, desc.format);
        assert_eq!(resized.color_space, desc.color_space);
    }

    #[test]
    fn color_space_names() {
        assert_eq!(
            ColorSpace::RgbFullPqBt2020.to_string(),
            "RGB full / PQ (ST.2084) / BT.2020"
        );
        assert_eq!(SurfaceFormat::Rgba16Float.to_string(), "R16G16B16A16_FLOAT");
    }
}
