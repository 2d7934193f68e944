//! フレームの画像保存
//!
//! HDR10 のフレームは 10bit の PQ コード値を 16bit に広げて PNG へ、
//! scRGB のフレームはリニア値のまま 32bit float の OpenEXR へ書き出す。

use std::path::{Path, PathBuf};

use image::{ImageBuffer, ImageFormat, Rgb, Rgba};
use log::{info, warn};

use crate::common::colors::{quantize_unorm, OutputMode};
use crate::display::{Framebuffer, SurfaceFormat};
use crate::error::PatternError;

/// 10bit コードを上位ビットの複製で 16bit に広げる (0 -> 0, 1023 -> 65535)
pub fn widen_10_to_16(code: u32) -> u16 {
    let code = code.min(1023);
    ((code << 6) | (code >> 4)) as u16
}

/// 保存ファイル名 (連番 + モードに合った拡張子)
pub fn snapshot_filename(counter: u32, mode: OutputMode) -> String {
    match mode {
        OutputMode::PqHdr10 => format!("pq_bars_{:03}.png", counter),
        OutputMode::ScrgbLinear => format!("pq_bars_{:03}.exr", counter),
    }
}

/// サーフェスのフォーマットに対応する画像形式
pub fn image_format(format: SurfaceFormat) -> ImageFormat {
    match format {
        SurfaceFormat::Rgb10a2Unorm => ImageFormat::Png,
        SurfaceFormat::Rgba16Float => ImageFormat::OpenExr,
    }
}

/// 実際に書き出すパス。拡張子が形式と合わなければ付け替える
pub fn snapshot_path(path: &Path, format: SurfaceFormat) -> PathBuf {
    let wanted = image_format(format);
    if ImageFormat::from_path(path).ok() == Some(wanted) {
        return path.to_path_buf();
    }
    let extension = match wanted {
        ImageFormat::OpenExr => "exr",
        _ => "png",
    };
    path.with_extension(extension)
}

/// フレームバッファを画像として保存し、書き出したパスを返す
///
/// 形式はフレームのフォーマットで決まる（HDR10 は PNG、scRGB は EXR）。
pub fn save_framebuffer(frame: &Framebuffer, path: &Path) -> Result<PathBuf, PatternError> {
    let out = snapshot_path(path, frame.format);
    if out != path {
        warn!(
            "{} は {} で保存できないため {} に保存します",
            path.display(),
            frame.format,
            out.display()
        );
    }
    let format = image_format(frame.format);

    match frame.format {
        SurfaceFormat::Rgb10a2Unorm => {
            let img: ImageBuffer<Rgb<u16>, Vec<u16>> =
                ImageBuffer::from_fn(frame.width, frame.height, |x, y| {
                    let p = frame.pixel(x, y);
                    Rgb([
                        widen_10_to_16(quantize_unorm(p[0], 10)),
                        widen_10_to_16(quantize_unorm(p[1], 10)),
                        widen_10_to_16(quantize_unorm(p[2], 10)),
                    ])
                });
            img.save_with_format(&out, format)?;
        }
        SurfaceFormat::Rgba16Float => {
            let img: ImageBuffer<Rgba<f32>, Vec<f32>> =
                ImageBuffer::from_fn(frame.width, frame.height, |x, y| Rgba(frame.pixel(x, y)));
            img.save_with_format(&out, format)?;
        }
    }
    info!(
        "画像を保存しました: {} ({}x{} {})",
        out.display(),
        frame.width,
        frame.height,
        frame.format
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{PresentBackend, SoftwareBackend, SurfaceDescriptor};
    use crate::common::config::TestPatternConfig;

    fn render(mode: OutputMode) -> Framebuffer {
        let mut backend = SoftwareBackend::new(300, 40);
        backend.initialize().unwrap();
        backend
            .create_surface(&SurfaceDescriptor::for_mode(mode, 300, 40))
            .unwrap();
        backend.create_view().unwrap();
        let config = TestPatternConfig {
            start_nits: 1000.0,
            end_nits: 0.0,
            num_bars: 2,
            ..TestPatternConfig::default()
        }
        .with_viewport(300, 40)
        .with_mode(mode);
        backend.draw(&config.to_params()).unwrap();
        backend.front_buffer().unwrap().clone()
    }

    #[test]
    fn widening_keeps_black_and_peak() {
        assert_eq!(widen_10_to_16(0), 0);
        assert_eq!(widen_10_to_16(1023), 65535);
        assert_eq!(widen_10_to_16(512), (512 << 6) | (512 >> 4));
        // 範囲外は 1023 扱い
        assert_eq!(widen_10_to_16(5000), 65535);
    }

    #[test]
    fn filename_extension_follows_mode() {
        assert_eq!(snapshot_filename(1, OutputMode::PqHdr10), "pq_bars_001.png");
        assert_eq!(snapshot_filename(12, OutputMode::ScrgbLinear), "pq_bars_012.exr");
    }

    #[test]
    fn pq_frame_is_saved_as_16bit_png() {
        let frame = render(OutputMode::PqHdr10);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        assert_eq!(save_framebuffer(&frame, &path).unwrap(), path);

        let loaded = image::open(&path).unwrap().into_rgb16();
        assert_eq!(loaded.dimensions(), (300, 40));
        // 2 本目 (0 nits) のバー本体は黒
        assert_eq!(loaded.get_pixel(260, 30), &Rgb([0, 0, 0]));
        let code = frame.code_values(260, 10).unwrap()[0];
        assert_eq!(loaded.get_pixel(260, 10)[0], widen_10_to_16(code));
    }

    #[test]
    fn scrgb_frame_is_saved_as_float_exr() {
        let frame = render(OutputMode::ScrgbLinear);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.exr");
        assert_eq!(save_framebuffer(&frame, &path).unwrap(), path);

        let loaded = image::open(&path).unwrap().into_rgba32f();
        assert_eq!(loaded.dimensions(), (300, 40));
        // 1000 nits / 80 = 12.5 (1.0 を超える値も保持される)
        assert_eq!(loaded.get_pixel(260, 10)[0], 12.5);
    }

    #[test]
    fn mismatched_extension_follows_frame_format() {
        let dir = tempfile::tempdir().unwrap();

        let frame = render(OutputMode::ScrgbLinear);
        let written = save_framebuffer(&frame, &dir.path().join("frame.png")).unwrap();
        assert_eq!(written, dir.path().join("frame.exr"));
        let loaded = image::open(&written).unwrap().into_rgba32f();
        assert_eq!(loaded.get_pixel(260, 10)[0], 12.5);

        let frame = render(OutputMode::PqHdr10);
        let written = save_framebuffer(&frame, &dir.path().join("frame.exr")).unwrap();
        assert_eq!(written, dir.path().join("frame.png"));
        assert_eq!(
            image::open(&written).unwrap().color(),
            image::ColorType::Rgb16
        );
    }

    #[test]
    fn missing_extension_is_added() {
        assert_eq!(
            snapshot_path(Path::new("out/frame"), SurfaceFormat::Rgb10a2Unorm),
            PathBuf::from("out/frame.png")
        );
        assert_eq!(
            snapshot_path(Path::new("frame.EXR"), SurfaceFormat::Rgba16Float),
            PathBuf::from("frame.EXR")
        );
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let frame = render(OutputMode::PqHdr10);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("frame.png");
        let err = save_framebuffer(&frame, &path).unwrap_err();
        assert!(matches!(err, PatternError::Snapshot(_)));
    }
}
