//! 3x5 ビットマップフォントと数値ラベルのサンプリング
//!
//! 各グリフは 15 ビットに詰めてある。上の行から順に 3 ビットずつ、
//! 行 0 が bit 14..12、行 4 が bit 2..0 を占める。
//! 各行の中では bit2 = 左、bit1 = 中央、bit0 = 右。
//! つまり (x, y) のドットは `row*3 + col` 番目を MSB 側から数えた位置にある。
//! シェーダー (`shaders/pq_bars.wgsl`) も同じテーブルと同じビット順を使う。

use super::constants::{FONT_SCALE, FRACTION_DIGITS, GLYPH_HEIGHT, GLYPH_SPACING, GLYPH_WIDTH};

/// 3x5 ビットマップフォント（0-9）
pub const DIGIT_GLYPHS: [u32; 10] = [
    0b111_101_101_101_111, // 0 = 31599
    0b010_110_010_010_111, // 1 = 11415
    0b111_001_111_100_111, // 2 = 29671
    0b111_001_111_001_111, // 3 = 29647
    0b101_101_111_001_001, // 4 = 23497
    0b111_100_111_001_111, // 5 = 31183
    0b111_100_111_101_111, // 6 = 31215
    0b111_001_001_001_001, // 7 = 29257
    0b111_101_111_101_111, // 8 = 31727
    0b111_101_111_001_111, // 9 = 31695
];

/// 1 文字分のセル幅（スペース込み、ピクセル）
pub const CELL_WIDTH: i32 = (GLYPH_WIDTH + GLYPH_SPACING) * FONT_SCALE;
/// 1 文字分のセル高さ（ピクセル）
pub const CELL_HEIGHT: i32 = GLYPH_HEIGHT * FONT_SCALE;

/// グリフ内の (x, y) が点灯しているか
///
/// セル外の座標や 0-9 以外の数字は `false`。
pub fn sample_glyph(digit: u32, x: i32, y: i32) -> bool {
    if x < 0 || x >= GLYPH_WIDTH || y < 0 || y >= GLYPH_HEIGHT {
        return false;
    }
    let Some(&bits) = DIGIT_GLYPHS.get(digit as usize) else {
        return false;
    };
    let bit_idx = (GLYPH_HEIGHT - 1 - y) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - x);
    (bits >> bit_idx) & 1 == 1
}

fn pow10(n: i32) -> i32 {
    let mut divisor = 1i32;
    for _ in 0..n {
        divisor = divisor.wrapping_mul(10);
    }
    divisor
}

/// 整数部の桁数（最低 1 桁、負数は 0 として数える）
pub fn integer_digit_count(int_part: i32) -> i32 {
    let mut tmp = int_part.max(0);
    if tmp == 0 {
        return 1;
    }
    let mut digits = 0;
    while tmp > 0 {
        digits += 1;
        tmp /= 10;
    }
    digits
}

/// 輝度値を整数部と小数 5 桁に分解する
///
/// 小数部は偶数丸め。シェーダーの `round` と同じ結果になる。
pub fn split_value(nits: f32) -> (i32, i32) {
    let int_part = nits as i32;
    let frac_val = ((nits - int_part as f32) * 100000.0).round_ties_even() as i32;
    (int_part, frac_val)
}

/// `origin` を左上とする "整数部.小数5桁" の描画で `screen` が点灯ピクセルか
pub fn sample_value(nits: f32, screen: (i32, i32), origin: (i32, i32)) -> bool {
    let lx = screen.0 - origin.0;
    let ly = screen.1 - origin.1;

    if ly < 0 || ly >= CELL_HEIGHT || lx < 0 {
        return false;
    }

    let (int_part, frac_val) = split_value(nits);
    let int_digits = integer_digit_count(int_part);
    let total_chars = int_digits + 1 + FRACTION_DIGITS;

    let char_idx = lx / CELL_WIDTH;
    if char_idx >= total_chars {
        return false;
    }

    let fx = (lx % CELL_WIDTH) / FONT_SCALE;
    let fy = ly / FONT_SCALE;
    // 文字間スペース
    if fx >= GLYPH_WIDTH {
        return false;
    }

    if char_idx < int_digits {
        let divisor = pow10(int_digits - 1 - char_idx);
        let digit = (int_part / divisor) % 10;
        sample_glyph(digit.clamp(0, 9) as u32, fx, fy)
    } else if char_idx == int_digits {
        // 小数点: 下段中央の 1 ドットのみ
        fx == 1 && fy == GLYPH_HEIGHT - 1
    } else {
        let frac_idx = char_idx - int_digits - 1;
        let divisor = pow10(FRACTION_DIGITS - 1 - frac_idx);
        let digit = (frac_val / divisor) % 10;
        sample_glyph(digit.clamp(0, 9) as u32, fx, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// テーブルを人が読める 3x5 のドット絵に戻す
    fn glyph_rows(digit: u32) -> Vec<String> {
        (0..GLYPH_HEIGHT)
            .map(|y| {
                (0..GLYPH_WIDTH)
                    .map(|x| if sample_glyph(digit, x, y) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    /// ラベル 1 文字分をグリフ座標で読み出す
    fn read_slot(nits: f32, origin: (i32, i32), slot: i32) -> Vec<String> {
        (0..GLYPH_HEIGHT)
            .map(|y| {
                (0..GLYPH_WIDTH)
                    .map(|x| {
                        let px = origin.0 + slot * CELL_WIDTH + x * FONT_SCALE;
                        let py = origin.1 + y * FONT_SCALE;
                        if sample_value(nits, (px, py), origin) {
                            '#'
                        } else {
                            '.'
                        }
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn table_values_match_packed_constants() {
        assert_eq!(
            DIGIT_GLYPHS,
            [31599, 11415, 29671, 29647, 23497, 31183, 31215, 29257, 31727, 31695]
        );
    }

    #[test]
    fn glyph_shapes_are_not_mirrored() {
        assert_eq!(glyph_rows(1), [".#.", "##.", ".#.", ".#.", "###"]);
        assert_eq!(glyph_rows(4), ["#.#", "#.#", "###", "..#", "..#"]);
        assert_eq!(glyph_rows(7), ["###", "..#", "..#", "..#", "..#"]);
        assert_eq!(glyph_rows(2), ["###", "..#", "###", "#..", "###"]);
    }

    #[test]
    fn glyph_round_trip_reproduces_bit_pattern() {
        for digit in 0..10u32 {
            let mut packed = 0u32;
            for y in 0..GLYPH_HEIGHT {
                for x in 0..GLYPH_WIDTH {
                    if sample_glyph(digit, x, y) {
                        packed |= 1 << (14 - (y * 3 + x));
                    }
                }
            }
            assert_eq!(packed, DIGIT_GLYPHS[digit as usize], "digit {digit}");
        }
    }

    #[test]
    fn glyph_outside_cell_is_unlit() {
        for digit in 0..10u32 {
            assert!(!sample_glyph(digit, -1, 0));
            assert!(!sample_glyph(digit, 3, 0));
            assert!(!sample_glyph(digit, 0, -1));
            assert!(!sample_glyph(digit, 0, 5));
        }
        assert!(!sample_glyph(10, 0, 0));
    }

    #[test]
    fn digit_count_and_split() {
        assert_eq!(integer_digit_count(0), 1);
        assert_eq!(integer_digit_count(-7), 1);
        assert_eq!(integer_digit_count(9), 1);
        assert_eq!(integer_digit_count(10), 2);
        assert_eq!(integer_digit_count(10000), 5);

        assert_eq!(split_value(5.0), (5, 0));
        assert_eq!(split_value(0.5), (0, 50000));
    }

    #[test]
    fn five_renders_leading_digit_and_zero_fraction() {
        let origin = (10, 40);
        assert_eq!(read_slot(5.0, origin, 0), glyph_rows(5));
        assert_eq!(read_slot(5.0, origin, 1), ["...", "...", "...", "...", ".#."]);
        for slot in 2..7 {
            assert_eq!(read_slot(5.0, origin, slot), glyph_rows(0), "slot {slot}");
        }
        // 8 文字目以降は何も描かれない
        assert_eq!(read_slot(5.0, origin, 7), ["..."; 5]);
    }

    #[test]
    fn fraction_digits_are_most_significant_first() {
        let origin = (0, 0);
        // 0.00248 -> "0.00248"
        let expected = [0u32, 0, 0, 2, 4, 8];
        let slots = [0, 2, 3, 4, 5, 6];
        for (slot, digit) in slots.iter().zip(expected) {
            assert_eq!(read_slot(0.00248, origin, *slot), glyph_rows(digit), "slot {slot}");
        }
    }

    #[test]
    fn multi_digit_integer_part() {
        let origin = (0, 0);
        // 1234.5 -> "1234.50000"
        for (slot, digit) in [(0, 1u32), (1, 2), (2, 3), (3, 4), (5, 5), (6, 0)] {
            assert_eq!(read_slot(1234.5, origin, slot), glyph_rows(digit), "slot {slot}");
        }
    }

    #[test]
    fn spacing_column_and_outside_extent_are_unlit() {
        let origin = (10, 10);
        // 8 は全行で左右が点灯しているので、スペース列だけが消えているはず
        for y in 0..CELL_HEIGHT {
            for x in GLYPH_WIDTH * FONT_SCALE..CELL_WIDTH {
                assert!(!sample_value(8.0, (origin.0 + x, origin.1 + y), origin));
            }
        }
        assert!(!sample_value(8.0, (origin.0 - 1, origin.1), origin));
        assert!(!sample_value(8.0, (origin.0, origin.1 - 1), origin));
        assert!(!sample_value(8.0, (origin.0, origin.1 + CELL_HEIGHT), origin));
        assert!(sample_value(8.0, origin, origin));
    }

    #[test]
    fn every_pixel_of_a_dot_is_lit() {
        let origin = (0, 0);
        for dy in 0..FONT_SCALE {
            for dx in 0..FONT_SCALE {
                assert!(sample_value(8.0, (dx, dy), origin));
            }
        }
    }
}
