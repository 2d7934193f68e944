//! 輝度 (nits) から出力値への変換

use super::constants::{PQ_MAX_NITS, SCRGB_REFERENCE_NITS};

/// 出力モード
///
/// 数値はフレームごとのパラメータブロックに書き込む値そのもの。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum OutputMode {
    /// HDR10: 10bit 固定小数点、PQ (ST.2084) エンコード
    #[default]
    #[value(name = "pq")]
    PqHdr10,
    /// FP16 scRGB: 16bit 浮動小数点、リニア (1.0 = 80 nits)
    #[value(name = "scrgb")]
    ScrgbLinear,
}

impl OutputMode {
    pub fn as_i32(self) -> i32 {
        match self {
            OutputMode::PqHdr10 => 0,
            OutputMode::ScrgbLinear => 1,
        }
    }

    /// ブロック上の値から復元（1 以外はすべて PQ として扱う、シェーダーと同じ）
    pub fn from_i32(value: i32) -> Self {
        if value == 1 {
            OutputMode::ScrgbLinear
        } else {
            OutputMode::PqHdr10
        }
    }

    /// もう一方のモード
    pub fn toggled(self) -> Self {
        match self {
            OutputMode::PqHdr10 => OutputMode::ScrgbLinear,
            OutputMode::ScrgbLinear => OutputMode::PqHdr10,
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::PqHdr10 => write!(f, "HDR10 PQ"),
            OutputMode::ScrgbLinear => write!(f, "FP16 scRGB"),
        }
    }
}

// ST.2084 の定数
const PQ_M1: f32 = 0.1593017578125;
const PQ_M2: f32 = 78.84375;
const PQ_C1: f32 = 0.8359375;
const PQ_C2: f32 = 18.8515625;
const PQ_C3: f32 = 18.6875;

/// ST.2084 PQ の順方向カーブ: 正規化輝度 [0,1] -> PQ [0,1]
///
/// 式のままだと 0 に対して c1^m2 (約 7e-7) が残るので、黒は 0 に固定する。
#[inline]
pub fn apply_pq(y: f32) -> f32 {
    if y <= 0.0 {
        return 0.0;
    }
    let ym1 = y.powf(PQ_M1);
    let num = PQ_C1 + PQ_C2 * ym1;
    let den = 1.0 + PQ_C3 * ym1;
    (num / den).powf(PQ_M2)
}

/// 輝度をモードに応じた出力値 (R, G, B) に変換
///
/// 常に無彩色なので 3 チャンネルとも同じ値になる。
/// scRGB は 80 nits を超えると 1.0 を超える（クランプしない）。
pub fn encode_luminance(nits: f32, mode: OutputMode) -> [f32; 3] {
    let v = match mode {
        OutputMode::PqHdr10 => apply_pq(nits / PQ_MAX_NITS),
        OutputMode::ScrgbLinear => nits / SCRGB_REFERENCE_NITS,
    };
    [v, v, v]
}

/// 正規化値を `bits` ビットの UNORM コード値に量子化（クランプしてから丸める）
pub fn quantize_unorm(value: f32, bits: u32) -> u32 {
    let max = ((1u32 << bits) - 1) as f32;
    (value.clamp(0.0, 1.0) * max).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pq_black_is_exactly_zero() {
        assert_eq!(encode_luminance(0.0, OutputMode::PqHdr10), [0.0, 0.0, 0.0]);
        assert_eq!(apply_pq(-1.0), 0.0);
        // 0.001 nits でも 0 にはならず、10bit でもコードが立つ
        let dim = apply_pq(1e-7);
        assert!(dim > 0.0);
        assert!(quantize_unorm(dim, 10) > 0);
    }

    #[test]
    fn pq_peak_is_one() {
        let [r, g, b] = encode_luminance(10000.0, OutputMode::PqHdr10);
        for v in [r, g, b] {
            assert!((v - 1.0).abs() < 1e-6, "{v}");
        }
        assert_eq!(quantize_unorm(r, 10), 1023);
    }

    #[test]
    fn pq_reference_points() {
        // 100 nits ≈ 0.508, 1000 nits ≈ 0.752
        let sdr_white = apply_pq(100.0 / 10000.0);
        assert!((sdr_white - 0.5081).abs() < 1e-3, "{sdr_white}");
        let thousand = apply_pq(1000.0 / 10000.0);
        assert!((thousand - 0.7518).abs() < 1e-3, "{thousand}");
    }

    #[test]
    fn pq_clamps_negative_input() {
        assert_eq!(apply_pq(-1.0), apply_pq(0.0));
    }

    #[test]
    fn pq_is_monotonic() {
        let mut prev = apply_pq(0.0);
        for i in 1..=1000 {
            let v = apply_pq(i as f32 / 1000.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn encoding_is_reproducible() {
        let a = encode_luminance(0.00248, OutputMode::PqHdr10);
        let b = encode_luminance(0.00248, OutputMode::PqHdr10);
        assert_eq!(a.map(f32::to_bits), b.map(f32::to_bits));
    }

    #[test]
    fn scrgb_is_linear_and_unclamped() {
        assert_eq!(encode_luminance(80.0, OutputMode::ScrgbLinear), [1.0, 1.0, 1.0]);
        assert_eq!(encode_luminance(0.0, OutputMode::ScrgbLinear), [0.0, 0.0, 0.0]);
        assert_eq!(encode_luminance(800.0, OutputMode::ScrgbLinear), [10.0, 10.0, 10.0]);
    }

    #[test]
    fn mode_block_values() {
        assert_eq!(OutputMode::PqHdr10.as_i32(), 0);
        assert_eq!(OutputMode::ScrgbLinear.as_i32(), 1);
        assert_eq!(OutputMode::from_i32(1), OutputMode::ScrgbLinear);
        assert_eq!(OutputMode::from_i32(0), OutputMode::PqHdr10);
        assert_eq!(OutputMode::from_i32(7), OutputMode::PqHdr10);
        assert_eq!(OutputMode::PqHdr10.toggled(), OutputMode::ScrgbLinear);
    }
}
